//! Screen capture and pointer position.
//!
//! The pipeline only sees the [`FrameSource`] and [`PointerSource`] traits; the
//! Win32 GDI implementation lives in `screen` and is only built on Windows.

pub mod roi;
#[cfg(windows)]
pub mod screen;

use anyhow::Result;
use image::DynamicImage;

use crate::tooltip::geometry::PixelRect;

pub use roi::{pointer_roi, to_local, CaptureConfig};
#[cfg(windows)]
pub use screen::GdiScreen;

/// Something that can grab pixels from the screen.
pub trait FrameSource {
    /// Size of the capturable area as (width, height).
    fn screen_size(&self) -> Result<(u32, u32)>;

    /// Captures `region`, given in absolute screen coordinates.
    fn capture(&self, region: &PixelRect) -> Result<DynamicImage>;
}

/// Reports where the pointer is, in the same coordinates as [`FrameSource`].
pub trait PointerSource {
    fn position(&self) -> Result<(i32, i32)>;
}
