use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Capture source: device index or stream URI
    #[arg(long, default_value = "0", env = "WATCHCAM_SOURCE")]
    pub source: String,

    /// Object detection model identifier
    #[arg(long, default_value = "yolov5s", env = "WATCHCAM_MODEL")]
    pub model: String,

    /// Seconds of video written to each output segment
    #[arg(long, default_value_t = 30, env = "WATCHCAM_SEGMENT_SECONDS")]
    pub segment_seconds: u64,

    /// Directory for recorded segments
    #[arg(long, default_value = ".", env = "WATCHCAM_OUTPUT_ROOT")]
    pub output_dir: PathBuf,

    /// Capture width in pixels
    #[arg(long, default_value_t = 640)]
    pub width: u32,

    /// Capture height in pixels
    #[arg(long, default_value_t = 480)]
    pub height: u32,

    /// Capture rate of the synthetic source, frames per second
    #[arg(long, default_value_t = 30)]
    pub source_fps: u32,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
