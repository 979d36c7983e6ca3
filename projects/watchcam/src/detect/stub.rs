use super::ObjectDetector;
use crate::pipeline::types::{DetectedObjects, Detection, Frame, NormalizedBox};
use anyhow::Result;
use async_trait::async_trait;

/// Stub backend for testing and hardware-free runs.
///
/// Emits one "person" box sweeping left to right, so the overlay path is
/// exercised end to end without a model runtime.
pub struct StubDetector {
    model: String,
    calls: u64,
}

impl StubDetector {
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            calls: 0,
        }
    }
}

#[async_trait]
impl ObjectDetector for StubDetector {
    async fn warm_up(&mut self) -> Result<()> {
        tracing::info!("Loaded model '{}' (stub backend)", self.model);
        Ok(())
    }

    async fn detect(&mut self, _frame: &Frame) -> Result<DetectedObjects> {
        let step = self.calls % 50;
        self.calls += 1;
        Ok(DetectedObjects::new(vec![Detection {
            class_name: "person".to_string(),
            probability: 0.92,
            bbox: NormalizedBox {
                x: step as f32 / 100.0,
                y: 0.25,
                w: 0.2,
                h: 0.5,
            },
        }]))
    }
}
