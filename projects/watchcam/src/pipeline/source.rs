// Capture stage: pulls frames from the device and fans them out.

use crate::pipeline::channel::LatestSender;
use crate::pipeline::types::Frame;
use crate::video::FrameSource;
use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

/// Acquire frames at the device's native rate and publish each one toward
/// the compositor and the detector.
///
/// This is the only stage with access to the capture handle; it owns
/// acquisition pacing. A device error is fatal to the whole pipeline.
pub async fn source_loop(
    mut source: Box<dyn FrameSource>,
    display_tx: LatestSender<Frame>,
    detect_tx: LatestSender<Frame>,
    cancel: CancellationToken,
) -> Result<()> {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = source.acquire() => {
                let frame = result.context("capture stage failed")?;
                if frame.seq % 300 == 0 {
                    tracing::debug!(
                        "Capture heartbeat: frame #{} ({}x{})",
                        frame.seq,
                        frame.width,
                        frame.height
                    );
                }
                // The detector going away is survivable: the display keeps
                // running unannotated. The compositor going away means the
                // pipeline is shutting down.
                let _ = detect_tx.publish(frame.clone());
                if display_tx.publish(frame).is_err() {
                    break;
                }
            }
        }
    }
    Ok(())
}
