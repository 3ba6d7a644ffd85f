//! Desktop capture through GDI.

use anyhow::{anyhow, Result};
use image::{DynamicImage, ImageBuffer, Rgba};
use std::ffi::c_void;

use windows::Win32::Foundation::{HWND, POINT};
use windows::Win32::Graphics::Gdi::{
    BitBlt, CreateCompatibleBitmap, CreateCompatibleDC, DeleteDC, DeleteObject, GetDC, GetDIBits,
    ReleaseDC, SelectObject, BITMAPINFO, BITMAPINFOHEADER, BI_RGB, CAPTUREBLT, DIB_RGB_COLORS,
    SRCCOPY,
};
use windows::Win32::UI::WindowsAndMessaging::{GetCursorPos, GetSystemMetrics, SM_CXSCREEN, SM_CYSCREEN};

use super::{FrameSource, PointerSource};
use crate::tooltip::geometry::PixelRect;

/// The primary monitor, read with `BitBlt` from the desktop DC.
#[derive(Clone, Copy, Debug, Default)]
pub struct GdiScreen;

impl FrameSource for GdiScreen {
    fn screen_size(&self) -> Result<(u32, u32)> {
        let (w, h) = unsafe { (GetSystemMetrics(SM_CXSCREEN), GetSystemMetrics(SM_CYSCREEN)) };
        if w <= 0 || h <= 0 {
            return Err(anyhow!("GetSystemMetrics returned an empty screen ({}x{})", w, h));
        }
        Ok((w as u32, h as u32))
    }

    fn capture(&self, region: &PixelRect) -> Result<DynamicImage> {
        let width = region.width();
        let height = region.height();
        if width <= 0 || height <= 0 {
            return Err(anyhow!("Cannot capture empty region {:?}", region));
        }

        unsafe {
            let screen_dc = GetDC(HWND::default());
            if screen_dc.is_invalid() {
                return Err(anyhow!("GetDC failed for the desktop"));
            }
            let mem_dc = CreateCompatibleDC(screen_dc);
            let bitmap = CreateCompatibleBitmap(screen_dc, width, height);
            let previous = SelectObject(mem_dc, bitmap);

            let blit = BitBlt(
                mem_dc,
                0,
                0,
                width,
                height,
                screen_dc,
                region.x1,
                region.y1,
                SRCCOPY | CAPTUREBLT,
            );

            let mut info = BITMAPINFO {
                bmiHeader: BITMAPINFOHEADER {
                    biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                    biWidth: width,
                    // Negative height: top-down rows
                    biHeight: -height,
                    biPlanes: 1,
                    biBitCount: 32,
                    biCompression: BI_RGB.0,
                    ..Default::default()
                },
                ..Default::default()
            };
            let mut buffer = vec![0u8; (width * height * 4) as usize];
            let rows = GetDIBits(
                mem_dc,
                bitmap,
                0,
                height as u32,
                Some(buffer.as_mut_ptr() as *mut c_void),
                &mut info,
                DIB_RGB_COLORS,
            );

            SelectObject(mem_dc, previous);
            let _ = DeleteObject(bitmap);
            let _ = DeleteDC(mem_dc);
            ReleaseDC(HWND::default(), screen_dc);

            blit.map_err(|e| anyhow!("BitBlt failed: {}", e))?;
            if rows != height {
                return Err(anyhow!("GetDIBits copied {} of {} rows", rows, height));
            }

            // BGRA -> RGBA, alpha forced opaque
            for px in buffer.chunks_exact_mut(4) {
                px.swap(0, 2);
                px[3] = 255;
            }

            let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
                ImageBuffer::from_raw(width as u32, height as u32, buffer)
                    .ok_or_else(|| anyhow!("Captured buffer does not match {}x{}", width, height))?;
            Ok(DynamicImage::ImageRgba8(img))
        }
    }
}

impl PointerSource for GdiScreen {
    fn position(&self) -> Result<(i32, i32)> {
        let mut pt = POINT::default();
        unsafe { GetCursorPos(&mut pt)? };
        Ok((pt.x, pt.y))
    }
}
