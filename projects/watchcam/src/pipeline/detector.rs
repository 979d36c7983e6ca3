// Detection stage: runs inference on whatever frame is newest.

use crate::detect::ObjectDetector;
use crate::pipeline::channel::{LatestReceiver, LatestSender};
use crate::pipeline::types::{DetectedObjects, Frame};
use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

/// Receive frames, run the detector, publish results toward the compositor.
///
/// Inference latency usually exceeds the capture interval, so this stage
/// silently misses frames that were overwritten upstream and has its own
/// results overwritten downstream. That is accepted lossy behavior, never an
/// error. A single failed inference call is recoverable: the previous
/// result stays downstream and the loop moves on.
pub async fn detector_loop(
    mut detector: Box<dyn ObjectDetector>,
    mut frames: LatestReceiver<Frame>,
    results_tx: LatestSender<DetectedObjects>,
    cancel: CancellationToken,
) -> Result<()> {
    detector.warm_up().await.context("detection stage failed")?;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            received = frames.recv() => {
                let Ok(frame) = received else { break };
                match detector.detect(&frame).await {
                    Ok(objects) => {
                        if !objects.is_empty() {
                            tracing::trace!(
                                "Frame #{}: {} object(s) detected",
                                frame.seq,
                                objects.len()
                            );
                        }
                        if results_tx.publish(objects).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        tracing::warn!("Inference failed on frame #{}: {err:#}", frame.seq);
                    }
                }
            }
        }
    }
    Ok(())
}
