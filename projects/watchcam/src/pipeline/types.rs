//! Data types flowing through the capture/detect/display/record pipeline.

use serde::Serialize;
use std::sync::Arc;

/// A raw BGR frame captured from a video source.
///
/// Cloning a frame is cheap: the pixel buffer is shared, never copied. Every
/// stage downstream of the source holds the same capture.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Sequence number assigned by the capture stage, for log correlation.
    pub seq: u64,
    pub width: u32,
    pub height: u32,
    /// Packed BGR bytes, `width * height * 3` long.
    pub pixels: Arc<Vec<u8>>,
    /// Capture timestamp, milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
}

impl Frame {
    pub fn new(seq: u64, width: u32, height: u32, pixels: Vec<u8>, timestamp_ms: i64) -> Self {
        Self {
            seq,
            width,
            height,
            pixels: Arc::new(pixels),
            timestamp_ms,
        }
    }
}

/// A normalized bounding box: all coordinates are fractions of the frame
/// dimensions, independent of resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormalizedBox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

/// One detected object.
#[derive(Debug, Clone, Serialize)]
pub struct Detection {
    pub class_name: String,
    /// Confidence in [0, 1].
    pub probability: f32,
    pub bbox: NormalizedBox,
}

/// The result of a single inference call: zero or more detections.
/// Immutable after creation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DetectedObjects {
    pub objects: Vec<Detection>,
}

impl DetectedObjects {
    pub fn new(objects: Vec<Detection>) -> Self {
        Self { objects }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// An axis-aligned rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

/// One annotation box, fully resolved to pixel space for rendering.
#[derive(Debug, Clone)]
pub struct OverlayBox {
    pub rect: PixelRect,
    /// e.g. "person 92.0%"
    pub label: String,
    /// Where the label is drawn, just above the box.
    pub label_origin: (i32, i32),
}

/// Drawing parameters for an overlay, renderer-agnostic. RGBA colors.
#[derive(Debug, Clone)]
pub struct OverlayStyle {
    pub label_rgba: [u8; 4],
    pub stroke_rgba: [u8; 4],
    pub stroke_width: u32,
    pub fill_rgba: [u8; 4],
    /// Label height as a fraction of frame height.
    pub font_scale: f32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            label_rgba: [255, 255, 255, 255],
            stroke_rgba: [255, 0, 0, 255],
            stroke_width: 2,
            fill_rgba: [0, 0, 255, 30],
            font_scale: 0.03,
        }
    }
}

/// Annotations drawn on top of one frame.
#[derive(Debug, Clone)]
pub struct Overlay {
    /// Instantaneous frame rate (0.0 on the first frame, before any interval
    /// exists).
    pub fps: f64,
    /// Where the FPS label is drawn.
    pub fps_origin: (i32, i32),
    pub boxes: Vec<OverlayBox>,
    pub style: OverlayStyle,
}

impl Overlay {
    pub fn fps_label(&self) -> String {
        format!("FPS: {}", self.fps.round() as i64)
    }
}

/// A frame plus its overlay: the transient artifact handed to the display.
#[derive(Debug, Clone)]
pub struct AnnotatedFrame {
    pub frame: Frame,
    pub overlay: Overlay,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_clone_shares_pixels() {
        let frame = Frame::new(1, 2, 2, vec![0u8; 12], 1000);
        let copy = frame.clone();
        assert!(Arc::ptr_eq(&frame.pixels, &copy.pixels));
    }

    #[test]
    fn test_fps_label_rounds() {
        let overlay = Overlay {
            fps: 9.96,
            fps_origin: (5, 14),
            boxes: vec![],
            style: OverlayStyle::default(),
        };
        assert_eq!(overlay.fps_label(), "FPS: 10");
    }
}
