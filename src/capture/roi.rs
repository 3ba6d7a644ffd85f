//! Pointer-relative region of interest.

use serde::{Deserialize, Serialize};

use crate::tooltip::geometry::PixelRect;

/// Extent of the captured area around the pointer, in pixels.
///
/// Tooltips open to the left of and above the pointer, hence the asymmetry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            left: 450,
            right: 160,
            top: 600,
            bottom: 800,
        }
    }
}

/// The area around `pointer`, clamped to a `screen` of (width, height).
///
/// A span collapsed by clamping is widened by 10px and clamped again, so the
/// result can still be empty when the screen itself is.
pub fn pointer_roi(pointer: (i32, i32), screen: (u32, u32), cfg: &CaptureConfig) -> PixelRect {
    let sw = screen.0 as i32;
    let sh = screen.1 as i32;
    let (x, y) = pointer;

    let x1 = (x - cfg.left).clamp(0, sw);
    let y1 = (y - cfg.top).clamp(0, sh);
    let mut x2 = (x + cfg.right).clamp(0, sw);
    let mut y2 = (y + cfg.bottom).clamp(0, sh);

    if x2 <= x1 {
        x2 = (x1 + 10).clamp(0, sw);
    }
    if y2 <= y1 {
        y2 = (y1 + 10).clamp(0, sh);
    }

    PixelRect::new(x1, y1, x2, y2)
}

/// Translates an absolute screen point into `roi`-local coordinates.
pub fn to_local(point: (i32, i32), roi: &PixelRect) -> (i32, i32) {
    (point.0 - roi.x1, point.1 - roi.y1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roi_inside_screen() {
        let roi = pointer_roi((1000, 700), (1920, 1080), &CaptureConfig::default());
        assert_eq!(roi, PixelRect::new(550, 100, 1160, 1080));
    }

    #[test]
    fn test_roi_clamped_at_origin() {
        let roi = pointer_roi((100, 50), (1920, 1080), &CaptureConfig::default());
        assert_eq!(roi, PixelRect::new(0, 0, 260, 850));
    }

    #[test]
    fn test_degenerate_span_is_widened() {
        // Pointer far off the right edge collapses the horizontal span
        let roi = pointer_roi((3000, 500), (1920, 1080), &CaptureConfig::default());
        assert_eq!((roi.x1, roi.x2), (1920, 1920));

        let cfg = CaptureConfig {
            left: 0,
            right: 0,
            top: 0,
            bottom: 0,
        };
        let roi = pointer_roi((100, 100), (1920, 1080), &cfg);
        assert_eq!(roi, PixelRect::new(100, 100, 110, 110));
    }

    #[test]
    fn test_to_local() {
        let roi = PixelRect::new(550, 100, 1160, 1080);
        assert_eq!(to_local((1000, 700), &roi), (450, 600));
    }

    #[test]
    fn test_partial_config() {
        let cfg: CaptureConfig = serde_json::from_str(r#"{"left": 300}"#).unwrap();
        assert_eq!(cfg.left, 300);
        assert_eq!(cfg.bottom, 800);
    }
}
