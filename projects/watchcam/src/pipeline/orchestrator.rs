// Pipeline orchestrator: wires the four stages together and supervises
// their lifecycle.
//
// Topology: Source -> {Compositor, Detector}; Detector -> Compositor;
// Compositor -> Recorder. Every edge is a single-slot latest-value-wins
// channel, so no stage ever stalls another beyond that conflation policy.
// The whole pipeline is cancelled as a unit: the compositor's exit (display
// closed) or any fatal stage error tears everything down and flushes the
// open segment.

use crate::detect::ObjectDetector;
use crate::display::DisplaySurface;
use crate::pipeline::channel::latest;
use crate::pipeline::compositor::compositor_loop;
use crate::pipeline::detector::detector_loop;
use crate::pipeline::recorder::{recorder_loop, RecorderConfig};
use crate::pipeline::source::source_loop;
use crate::pipeline::types::{DetectedObjects, Frame};
use crate::record::RecordingSink;
use crate::video::FrameSource;
use anyhow::{anyhow, Result};
use std::path::PathBuf;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Seconds of video written to each output segment.
    pub segment_seconds: u64,
    /// Directory for recorded segments.
    pub output_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            segment_seconds: 30,
            output_dir: PathBuf::from("."),
        }
    }
}

/// Run the pipeline until the display closes, the token is cancelled, or a
/// fatal stage error occurs. Fatal errors carry the failing stage in their
/// context chain and surface as a non-zero exit from main.
pub async fn run(
    config: PipelineConfig,
    source: Box<dyn FrameSource>,
    detector: Box<dyn ObjectDetector>,
    display: Box<dyn DisplaySurface>,
    sink: Box<dyn RecordingSink>,
    cancel: CancellationToken,
) -> Result<()> {
    let (display_tx, display_rx) = latest::<Frame>();
    let (detect_tx, detect_rx) = latest::<Frame>();
    let (results_tx, results_rx) = latest::<DetectedObjects>();
    let (record_tx, record_rx) = latest::<Frame>();

    let recorder_config = RecorderConfig {
        segment_seconds: config.segment_seconds,
        output_dir: config.output_dir.clone(),
    };

    let mut source_task = tokio::spawn(source_loop(
        source,
        display_tx,
        detect_tx,
        cancel.clone(),
    ));
    let mut detector_task = tokio::spawn(detector_loop(
        detector,
        detect_rx,
        results_tx,
        cancel.clone(),
    ));
    let mut compositor_task = tokio::spawn(compositor_loop(
        display,
        display_rx,
        results_rx,
        record_tx,
        cancel.clone(),
    ));
    let mut recorder_task = tokio::spawn(recorder_loop(
        sink,
        record_rx,
        recorder_config,
        cancel.clone(),
    ));

    tracing::info!("Pipeline started");

    let mut fatal: Option<anyhow::Error> = None;
    let mut source_done = false;
    let mut detector_done = false;
    let mut recorder_done = false;

    // The compositor owns the shutdown decision; the other stages are
    // watched so a fatal error cancels everything instead of leaving a
    // partially-alive pipeline. A dead recorder is the one tolerated loss:
    // the pipeline keeps displaying, recording stays down.
    let compositor_result = loop {
        tokio::select! {
            result = &mut compositor_task => break result,
            result = &mut source_task, if !source_done => {
                source_done = true;
                if let Err(err) = join_result("capture", result) {
                    tracing::error!("Capture stage ended: {err:#}");
                    fatal.get_or_insert(err);
                    cancel.cancel();
                }
            }
            result = &mut detector_task, if !detector_done => {
                detector_done = true;
                if let Err(err) = join_result("detection", result) {
                    tracing::error!("Detection stage ended: {err:#}");
                    fatal.get_or_insert(err);
                    cancel.cancel();
                }
            }
            result = &mut recorder_task, if !recorder_done => {
                recorder_done = true;
                if let Err(err) = join_result("recording", result) {
                    tracing::error!("Recording stopped, pipeline continues: {err:#}");
                }
            }
        }
    };

    cancel.cancel();
    if let Err(err) = join_result("display", compositor_result) {
        tracing::error!("Display stage ended: {err:#}");
        fatal.get_or_insert(err);
    }

    // Drain the remaining stages so the recorder flushes its open segment
    // before we report the outcome.
    if !source_done {
        if let Err(err) = join_result("capture", (&mut source_task).await) {
            tracing::error!("Capture stage ended: {err:#}");
            fatal.get_or_insert(err);
        }
    }
    if !detector_done {
        if let Err(err) = join_result("detection", (&mut detector_task).await) {
            tracing::error!("Detection stage ended: {err:#}");
            fatal.get_or_insert(err);
        }
    }
    if !recorder_done {
        if let Err(err) = join_result("recording", (&mut recorder_task).await) {
            tracing::error!("Recording stopped during shutdown: {err:#}");
        }
    }

    match fatal {
        Some(err) => Err(err),
        None => {
            tracing::info!("Pipeline stopped");
            Ok(())
        }
    }
}

fn join_result(stage: &str, result: Result<Result<()>, JoinError>) -> Result<()> {
    match result {
        Ok(inner) => inner,
        Err(err) => Err(anyhow!("{stage} stage task panicked: {err}")),
    }
}
