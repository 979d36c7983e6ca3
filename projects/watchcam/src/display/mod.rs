//! Display surfaces.
//!
//! The compositor renders annotated frames to a `DisplaySurface` and stops
//! the whole pipeline once the surface reports it is no longer active. A
//! closed window is the designed shutdown trigger, not an error.

use crate::pipeline::types::AnnotatedFrame;
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait DisplaySurface: Send {
    /// True while the surface can still present frames.
    fn is_active(&self) -> bool;

    /// Present one annotated frame. An error means the surface is gone and
    /// is fatal to the pipeline.
    async fn render(&mut self, frame: &AnnotatedFrame) -> Result<()>;
}

/// Headless stand-in for a window: logs instead of drawing, stays active
/// until the process is cancelled.
pub struct LoggingDisplay {
    frames_rendered: u64,
}

impl LoggingDisplay {
    pub fn new() -> Self {
        Self { frames_rendered: 0 }
    }
}

impl Default for LoggingDisplay {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DisplaySurface for LoggingDisplay {
    fn is_active(&self) -> bool {
        true
    }

    async fn render(&mut self, frame: &AnnotatedFrame) -> Result<()> {
        self.frames_rendered += 1;
        if self.frames_rendered % 30 == 1 {
            tracing::debug!(
                "Display heartbeat: frame #{}, {}, {} box(es)",
                frame.frame.seq,
                frame.overlay.fps_label(),
                frame.overlay.boxes.len()
            );
        }
        Ok(())
    }
}
