use super::{CaptureError, FrameSource};
use crate::pipeline::types::Frame;
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::{interval, Interval, MissedTickBehavior};

/// Paced generator of gradient test frames.
///
/// Stands in for a camera backend: frames arrive at a fixed rate, stamped
/// with wall-clock capture time, with a pattern that shifts every frame so
/// downstream motion is visible.
pub struct SyntheticSource {
    width: u32,
    height: u32,
    ticker: Interval,
    seq: u64,
}

impl SyntheticSource {
    pub fn new(width: u32, height: u32, fps: u32) -> Self {
        let period = Duration::from_millis(1000 / u64::from(fps.max(1)));
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            width,
            height,
            ticker,
            seq: 0,
        }
    }

    fn render_pattern(&self) -> Vec<u8> {
        let mut pixels = Vec::with_capacity((self.width * self.height * 3) as usize);
        let shift = self.seq as u32;
        for y in 0..self.height {
            for x in 0..self.width {
                pixels.push(((x + shift) % 256) as u8); // B
                pixels.push((y % 256) as u8); // G
                pixels.push(64); // R
            }
        }
        pixels
    }
}

#[async_trait]
impl FrameSource for SyntheticSource {
    async fn acquire(&mut self) -> Result<Frame, CaptureError> {
        self.ticker.tick().await;
        let frame = Frame::new(
            self.seq,
            self.width,
            self.height,
            self.render_pattern(),
            chrono::Utc::now().timestamp_millis(),
        );
        self.seq += 1;
        Ok(frame)
    }
}
