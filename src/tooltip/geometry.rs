//! Pixel rectangles shared by the detector and the field locator.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in pixel coordinates, `x2`/`y2` exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelRect {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl PixelRect {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Builds a rectangle from a top-left corner and a size.
    pub fn from_xywh(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self {
            x1: x,
            y1: y,
            x2: x + w,
            y2: y + h,
        }
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    pub fn area(&self) -> i64 {
        self.width().max(0) as i64 * self.height().max(0) as i64
    }

    /// True when the rectangle has positive width and height.
    pub fn is_valid(&self) -> bool {
        self.x2 > self.x1 && self.y2 > self.y1
    }

    /// Smallest rectangle containing both `self` and `other`.
    pub fn union(&self, other: &PixelRect) -> PixelRect {
        PixelRect {
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
            x2: self.x2.max(other.x2),
            y2: self.y2.max(other.y2),
        }
    }

    /// Union of every rectangle in the iterator, or `None` when it is empty.
    pub fn union_all<I>(rects: I) -> Option<PixelRect>
    where
        I: IntoIterator<Item = PixelRect>,
    {
        rects.into_iter().reduce(|acc, r| acc.union(&r))
    }

    /// Moves the rectangle by (`dx`, `dy`).
    pub fn translate(&self, dx: i32, dy: i32) -> PixelRect {
        PixelRect {
            x1: self.x1 + dx,
            y1: self.y1 + dy,
            x2: self.x2 + dx,
            y2: self.y2 + dy,
        }
    }

    /// Clamps the rectangle to `[0, width) x [0, height)`.
    pub fn clamp_to(&self, width: u32, height: u32) -> PixelRect {
        let w = width as i32;
        let h = height as i32;
        PixelRect {
            x1: self.x1.clamp(0, w),
            y1: self.y1.clamp(0, h),
            x2: self.x2.clamp(0, w),
            y2: self.y2.clamp(0, h),
        }
    }
}
