use super::{RecordError, RecordingSink, SegmentWriter};
use crate::pipeline::types::Frame;
use async_trait::async_trait;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// Codec-free sink: each segment is a file of concatenated packed BGR
/// frames. Useful for headless runs and as a reference implementation of
/// the seam; a real deployment substitutes an encoder here.
pub struct RawFileSink;

impl RawFileSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RawFileSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordingSink for RawFileSink {
    fn extension(&self) -> &'static str {
        "bgr"
    }

    async fn open_segment(
        &mut self,
        path: &Path,
        _width: u32,
        _height: u32,
    ) -> Result<Box<dyn SegmentWriter>, RecordError> {
        let file = File::create(path).await.map_err(|source| RecordError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Box::new(RawSegmentWriter { file }))
    }
}

struct RawSegmentWriter {
    file: File,
}

#[async_trait]
impl SegmentWriter for RawSegmentWriter {
    async fn write_frame(&mut self, frame: &Frame) -> Result<(), RecordError> {
        self.file
            .write_all(&frame.pixels)
            .await
            .map_err(RecordError::Write)
    }

    async fn close(&mut self) -> Result<(), RecordError> {
        self.file.flush().await.map_err(RecordError::Close)
    }
}
