// Annotation geometry: pure functions turning detections and frame timing
// into a pixel-space overlay the display can draw directly.

use crate::pipeline::types::{
    DetectedObjects, Detection, Frame, NormalizedBox, Overlay, OverlayBox, OverlayStyle, PixelRect,
};

/// Vertical gap between a box and its label, in pixels.
const LABEL_GAP: i32 = 5;

/// Left margin of the FPS label.
const FPS_MARGIN: i32 = 5;

/// Instantaneous frame rate from two consecutive capture timestamps.
/// A non-positive interval yields 0.0 rather than a nonsense rate.
pub fn frame_rate(prev_ms: i64, now_ms: i64) -> f64 {
    let delta = now_ms - prev_ms;
    if delta <= 0 {
        return 0.0;
    }
    1000.0 / delta as f64
}

/// Scale a normalized box to pixel coordinates for the given frame size.
pub fn scale_box(bbox: &NormalizedBox, width: u32, height: u32) -> PixelRect {
    PixelRect {
        x: (bbox.x * width as f32) as i32,
        y: (bbox.y * height as f32) as i32,
        w: (bbox.w * width as f32) as i32,
        h: (bbox.h * height as f32) as i32,
    }
}

/// Label text for one detection, e.g. "person 92.0%".
pub fn detection_label(detection: &Detection) -> String {
    format!(
        "{} {:.1}%",
        detection.class_name,
        detection.probability * 100.0
    )
}

/// Assemble the overlay for one frame: FPS label plus one box per entry of
/// the most recent detection result (if any).
pub fn build_overlay(frame: &Frame, fps: f64, detections: Option<&DetectedObjects>) -> Overlay {
    let style = OverlayStyle::default();
    let fps_origin = (FPS_MARGIN, (frame.height as f32 * style.font_scale) as i32);

    let boxes = detections
        .map(|result| {
            result
                .objects
                .iter()
                .map(|detection| {
                    let rect = scale_box(&detection.bbox, frame.width, frame.height);
                    OverlayBox {
                        rect,
                        label: detection_label(detection),
                        label_origin: (rect.x, rect.y - LABEL_GAP),
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    Overlay {
        fps,
        fps_origin,
        boxes,
        style,
    }
}
