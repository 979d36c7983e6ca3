//! Object detection backends.
//!
//! Inference is opaque to the pipeline: one call per frame, producing zero
//! or more detections with normalized bounding boxes. Real deployments plug
//! a model runtime in here; the stub backend keeps the binary runnable and
//! the tests deterministic.

pub mod stub;

pub use stub::StubDetector;

use crate::pipeline::types::{DetectedObjects, Frame};
use anyhow::Result;
use async_trait::async_trait;

/// Detector backend trait.
///
/// Implementations must treat the frame's pixel buffer as read-only and
/// ephemeral. Inference latency is expected to exceed the capture interval;
/// the pipeline's conflation policy absorbs the difference.
#[async_trait]
pub trait ObjectDetector: Send {
    /// One-time model load/warm-up. A failure here means there is no
    /// detector to run and is fatal to the pipeline.
    async fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }

    /// Run detection on a frame. A failure is recoverable: the caller skips
    /// this frame and keeps the previous result.
    async fn detect(&mut self, frame: &Frame) -> Result<DetectedObjects>;
}
