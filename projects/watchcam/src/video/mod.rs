//! Frame capture sources.
//!
//! The pipeline never touches a device directly: the capture stage owns a
//! single `FrameSource` and is the only stage that pulls frames from it.
//! Real deployments plug in a camera or stream backend here; the bundled
//! synthetic source keeps the binary runnable without hardware.

pub mod synthetic;

pub use synthetic::SyntheticSource;

use crate::pipeline::types::Frame;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to open capture source {uri:?}")]
    Open { uri: String },
    #[error("capture device failure: {0}")]
    Device(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A blocking frame supplier. One `acquire` call yields exactly one frame;
/// the call may stall for bounded device latency. Any error is fatal to the
/// pipeline; there is no fallback frame source.
#[async_trait]
pub trait FrameSource: Send {
    async fn acquire(&mut self) -> Result<Frame, CaptureError>;
}
