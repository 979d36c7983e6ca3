// Compositor stage: merges the frame stream and the detection stream into
// one annotated output stream at capture rate.
//
// Frames arrive at capture rate, detections at inference rate. The loop
// waits on both channels at once and services whichever is ready first,
// frame clause first when both are ready. A detection event only updates
// state; rendering happens at the next frame event, so annotations lag by
// up to one frame interval plus inference latency and never come from a
// later detection.

use crate::display::DisplaySurface;
use crate::pipeline::channel::{LatestReceiver, LatestSender};
use crate::pipeline::overlay;
use crate::pipeline::types::{AnnotatedFrame, DetectedObjects, Frame};
use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

/// Render loop. Returns when the display surface reports inactive (the
/// pipeline's designed shutdown trigger) or the frame stream ends; a render
/// failure is fatal.
pub async fn compositor_loop(
    mut display: Box<dyn DisplaySurface>,
    mut frames: LatestReceiver<Frame>,
    mut detections: LatestReceiver<DetectedObjects>,
    recorder_tx: LatestSender<Frame>,
    cancel: CancellationToken,
) -> Result<()> {
    // Owned solely by this loop, carried across iterations. None means no
    // detection has completed yet: frames render unannotated.
    let mut last_detections: Option<DetectedObjects> = None;
    let mut last_frame_ts: Option<i64> = None;
    let mut detections_open = true;

    while display.is_active() {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            received = frames.recv() => {
                let Ok(frame) = received else { break };
                let fps = match last_frame_ts {
                    Some(prev) => overlay::frame_rate(prev, frame.timestamp_ms),
                    None => 0.0,
                };
                last_frame_ts = Some(frame.timestamp_ms);

                let annotated = AnnotatedFrame {
                    overlay: overlay::build_overlay(&frame, fps, last_detections.as_ref()),
                    frame: frame.clone(),
                };
                display
                    .render(&annotated)
                    .await
                    .context("display stage failed")?;

                // Forward the frame just displayed. The recorder being gone
                // is survivable; the display keeps running.
                let _ = recorder_tx.publish(frame);
            }
            received = detections.recv(), if detections_open => {
                match received {
                    Ok(objects) => last_detections = Some(objects),
                    // Detector gone: keep the last result on screen.
                    Err(_) => detections_open = false,
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::channel::latest;
    use crate::pipeline::types::{Detection, NormalizedBox, PixelRect};
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    struct CapturingDisplay {
        rendered: Arc<Mutex<Vec<AnnotatedFrame>>>,
        renders_before_close: Arc<AtomicUsize>,
        fail_render: bool,
    }

    #[async_trait::async_trait]
    impl DisplaySurface for CapturingDisplay {
        fn is_active(&self) -> bool {
            self.renders_before_close.load(Ordering::SeqCst) > 0
        }

        async fn render(&mut self, frame: &AnnotatedFrame) -> Result<()> {
            if self.fail_render {
                return Err(anyhow!("surface lost"));
            }
            self.rendered.lock().unwrap().push(frame.clone());
            self.renders_before_close.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn display(
        renders_before_close: usize,
    ) -> (
        CapturingDisplay,
        Arc<Mutex<Vec<AnnotatedFrame>>>,
        Arc<AtomicUsize>,
    ) {
        let rendered = Arc::new(Mutex::new(Vec::new()));
        let remaining = Arc::new(AtomicUsize::new(renders_before_close));
        (
            CapturingDisplay {
                rendered: rendered.clone(),
                renders_before_close: remaining.clone(),
                fail_render: false,
            },
            rendered,
            remaining,
        )
    }

    fn frame(seq: u64, timestamp_ms: i64) -> Frame {
        Frame::new(seq, 640, 480, vec![0u8; 640 * 480 * 3], timestamp_ms)
    }

    fn person() -> DetectedObjects {
        DetectedObjects::new(vec![Detection {
            class_name: "person".to_string(),
            probability: 0.92,
            bbox: NormalizedBox {
                x: 0.1,
                y: 0.1,
                w: 0.3,
                h: 0.4,
            },
        }])
    }

    async fn wait_for(cond: impl Fn() -> bool) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while !cond() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_fps_and_late_detection_scenario() {
        let (frames_tx, frames_rx) = latest();
        let (detections_tx, detections_rx) = latest();
        let (recorder_tx, mut recorder_rx) = latest();
        let cancel = CancellationToken::new();
        let (surface, rendered, _) = display(usize::MAX);

        let task = tokio::spawn(compositor_loop(
            Box::new(surface),
            frames_rx,
            detections_rx,
            recorder_tx,
            cancel.clone(),
        ));

        // Three frames at t=0, 100, 200ms; a detection lands between the
        // second and third.
        frames_tx.publish(frame(0, 0)).unwrap();
        wait_for(|| rendered.lock().unwrap().len() == 1).await;
        frames_tx.publish(frame(1, 100)).unwrap();
        wait_for(|| rendered.lock().unwrap().len() == 2).await;

        detections_tx.publish(person()).unwrap();
        settle().await;

        frames_tx.publish(frame(2, 200)).unwrap();
        wait_for(|| rendered.lock().unwrap().len() == 3).await;

        {
            let rendered = rendered.lock().unwrap();
            // First frame has no interval yet; the rest run at 10 fps.
            assert_eq!(rendered[0].overlay.fps, 0.0);
            assert!((rendered[1].overlay.fps - 10.0).abs() < 1e-9);
            assert!((rendered[2].overlay.fps - 10.0).abs() < 1e-9);

            // The detection arrived after frame 2 was displayed, so it can
            // only show up on frame 3, never retroactively.
            assert!(rendered[0].overlay.boxes.is_empty());
            assert!(rendered[1].overlay.boxes.is_empty());
            assert_eq!(rendered[2].overlay.boxes.len(), 1);
            let annotated = &rendered[2].overlay.boxes[0];
            assert_eq!(
                annotated.rect,
                PixelRect {
                    x: 64,
                    y: 48,
                    w: 192,
                    h: 192
                }
            );
            assert_eq!(annotated.label, "person 92.0%");
        }

        // Every displayed frame was forwarded to the recorder, pixel buffer
        // and all.
        let forwarded = recorder_rx.recv().await.unwrap();
        assert_eq!(forwarded.seq, 2);
        assert!(Arc::ptr_eq(
            &forwarded.pixels,
            &rendered.lock().unwrap()[2].frame.pixels
        ));

        cancel.cancel();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_detection_event_alone_does_not_render_or_forward() {
        let (_frames_tx, frames_rx) = latest::<Frame>();
        let (detections_tx, detections_rx) = latest();
        let (recorder_tx, mut recorder_rx) = latest::<Frame>();
        let cancel = CancellationToken::new();
        let (surface, rendered, _) = display(usize::MAX);

        let task = tokio::spawn(compositor_loop(
            Box::new(surface),
            frames_rx,
            detections_rx,
            recorder_tx,
            cancel.clone(),
        ));

        detections_tx.publish(person()).unwrap();
        settle().await;
        assert!(rendered.lock().unwrap().is_empty());

        cancel.cancel();
        task.await.unwrap().unwrap();
        assert!(recorder_rx.recv().await.is_err());
    }

    #[tokio::test]
    async fn test_stops_when_display_closes() {
        let (frames_tx, frames_rx) = latest();
        let (_detections_tx, detections_rx) = latest::<DetectedObjects>();
        let (recorder_tx, _recorder_rx) = latest();
        let (surface, rendered, _) = display(2);

        let task = tokio::spawn(compositor_loop(
            Box::new(surface),
            frames_rx,
            detections_rx,
            recorder_tx,
            CancellationToken::new(),
        ));

        frames_tx.publish(frame(0, 0)).unwrap();
        wait_for(|| rendered.lock().unwrap().len() == 1).await;
        frames_tx.publish(frame(1, 100)).unwrap();

        // Second render exhausts the surface; the loop exits on its own.
        task.await.unwrap().unwrap();
        assert_eq!(rendered.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_render_failure_is_fatal() {
        let (frames_tx, frames_rx) = latest();
        let (_detections_tx, detections_rx) = latest::<DetectedObjects>();
        let (recorder_tx, _recorder_rx) = latest();
        let surface = CapturingDisplay {
            rendered: Arc::new(Mutex::new(Vec::new())),
            renders_before_close: Arc::new(AtomicUsize::new(usize::MAX)),
            fail_render: true,
        };

        let task = tokio::spawn(compositor_loop(
            Box::new(surface),
            frames_rx,
            detections_rx,
            recorder_tx,
            CancellationToken::new(),
        ));

        frames_tx.publish(frame(0, 0)).unwrap();
        let err = task.await.unwrap().unwrap_err();
        assert!(format!("{err:#}").contains("display stage failed"));
    }
}
