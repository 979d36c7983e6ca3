//! Recording sinks.
//!
//! The recorder stage persists displayed frames into time-bounded segment
//! files through an opaque encoder seam: open a segment sized to the
//! incoming frames, write frames, close. Exactly one segment is open at a
//! time. The bundled raw sink dumps BGR bytes per segment so the binary
//! runs without a codec.

pub mod raw;

pub use raw::RawFileSink;

use crate::pipeline::types::Frame;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("failed to open segment {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write frame")]
    Write(#[source] std::io::Error),
    #[error("failed to close segment")]
    Close(#[source] std::io::Error),
}

/// Factory for segment writers. One sink serves the whole recorder stage.
#[async_trait]
pub trait RecordingSink: Send {
    /// File extension for segments produced by this sink.
    fn extension(&self) -> &'static str {
        "mp4"
    }

    /// Open a new segment at `path`, sized to the incoming frames.
    async fn open_segment(
        &mut self,
        path: &Path,
        width: u32,
        height: u32,
    ) -> Result<Box<dyn SegmentWriter>, RecordError>;
}

/// An open segment. Dropped only after `close` has flushed it.
#[async_trait]
pub trait SegmentWriter: Send {
    async fn write_frame(&mut self, frame: &Frame) -> Result<(), RecordError>;

    async fn close(&mut self) -> Result<(), RecordError>;
}
