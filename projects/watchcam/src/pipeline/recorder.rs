// Recorder stage: persists displayed frames into time-bounded segments.

use crate::pipeline::channel::LatestReceiver;
use crate::pipeline::types::Frame;
use crate::record::{RecordingSink, SegmentWriter};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Seconds of video written to each segment before rotating.
    pub segment_seconds: u64,
    /// Directory segments are written into.
    pub output_dir: PathBuf,
}

struct OpenSegment {
    writer: Box<dyn SegmentWriter>,
    path: PathBuf,
    start_ms: i64,
}

/// Segment path for a rotation starting at `start_ms`, named from the epoch
/// second of the triggering frame.
pub fn segment_path(dir: &Path, start_ms: i64, extension: &str) -> PathBuf {
    dir.join(format!("output-{}.{}", start_ms / 1000, extension))
}

/// Receive displayed frames and write each one into the currently open
/// segment, rotating whenever the configured window is exceeded.
///
/// Rotation opens the new segment before writing, so the triggering frame
/// always lands in the segment it opened, never lost. A failed segment
/// open is fatal for this stage only; a failed frame write is logged and
/// the segment is retried on the next frame. On shutdown the open segment
/// is closed so its tail is flushed.
pub async fn recorder_loop(
    mut sink: Box<dyn RecordingSink>,
    mut frames: LatestReceiver<Frame>,
    config: RecorderConfig,
    cancel: CancellationToken,
) -> Result<()> {
    let window_ms = (config.segment_seconds * 1000) as i64;
    let mut current: Option<OpenSegment> = None;
    let mut segments_opened: u64 = 0;
    let mut frames_written: u64 = 0;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            received = frames.recv() => {
                let Ok(frame) = received else { break };

                let rotate = match &current {
                    None => true,
                    Some(segment) => frame.timestamp_ms - segment.start_ms > window_ms,
                };
                if rotate {
                    if let Some(segment) = current.take() {
                        close_segment(segment).await;
                    }
                    let path =
                        segment_path(&config.output_dir, frame.timestamp_ms, sink.extension());
                    let writer = sink
                        .open_segment(&path, frame.width, frame.height)
                        .await
                        .with_context(|| format!("opening segment {}", path.display()))
                        .context("recording stage failed")?;
                    tracing::info!(
                        "Opened segment {} ({}x{})",
                        path.display(),
                        frame.width,
                        frame.height
                    );
                    current = Some(OpenSegment {
                        writer,
                        path,
                        start_ms: frame.timestamp_ms,
                    });
                    segments_opened += 1;
                }

                if let Some(segment) = current.as_mut() {
                    match segment.writer.write_frame(&frame).await {
                        Ok(()) => frames_written += 1,
                        Err(err) => tracing::warn!(
                            "Frame write failed on {}: {err}",
                            segment.path.display()
                        ),
                    }
                }
            }
        }
    }

    if let Some(segment) = current.take() {
        close_segment(segment).await;
    }
    tracing::info!(
        "Recorder summary: {}",
        serde_json::json!({
            "segments_opened": segments_opened,
            "frames_written": frames_written,
        })
    );
    Ok(())
}

async fn close_segment(segment: OpenSegment) {
    let OpenSegment {
        mut writer, path, ..
    } = segment;
    if let Err(err) = writer.close().await {
        tracing::warn!("Failed to close segment {}: {err}", path.display());
    } else {
        tracing::debug!("Closed segment {}", path.display());
    }
}
