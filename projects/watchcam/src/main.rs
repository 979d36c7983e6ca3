mod cli;
mod detect;
mod display;
mod pipeline;
mod record;
mod video;

use anyhow::Result;
use cli::Args;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let args = Args::parse_args();

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Ctrl+C received, stopping...");
        ctrl_c.cancel();
    });

    tracing::info!(
        "Capture source {} ({}x{} @ {} fps, synthetic backend)",
        args.source,
        args.width,
        args.height,
        args.source_fps
    );

    let config = pipeline::PipelineConfig {
        segment_seconds: args.segment_seconds,
        output_dir: args.output_dir,
    };

    pipeline::run(
        config,
        Box::new(video::SyntheticSource::new(
            args.width,
            args.height,
            args.source_fps,
        )),
        Box::new(detect::StubDetector::new(&args.model)),
        Box::new(display::LoggingDisplay::new()),
        Box::new(record::RawFileSink::new()),
        cancel,
    )
    .await
}
