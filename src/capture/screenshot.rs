//! Region capture using GDI `BitBlt`.

use image::{ImageBuffer, Rgba, RgbaImage};

use windows::Win32::Foundation::HWND;
use windows::Win32::Graphics::Gdi::{
    BitBlt, CreateCompatibleBitmap, CreateCompatibleDC, DeleteDC, DeleteObject, GetDC, GetDIBits,
    ReleaseDC, SelectObject, BITMAPINFO, BITMAPINFOHEADER, BI_RGB, DIB_RGB_COLORS, HBITMAP, HDC,
    SRCCOPY,
};

use super::{CaptureError, CaptureRegion, RegionCapture, WindowRect};

/// Copies a region of the screen through a memory DC.
///
/// Reads from the desktop DC so the captured pixels are whatever is visible
/// on screen at the window's position.
#[derive(Debug, Default, Clone, Copy)]
pub struct GdiCapture;

impl RegionCapture for GdiCapture {
    fn capture(
        &self,
        window: &WindowRect,
        region: &CaptureRegion,
    ) -> Result<RgbaImage, CaptureError> {
        let (x, y) = region.resolve(window)?;
        let width = region.width as i32;
        let height = region.height as i32;

        unsafe {
            let screen_dc = GetDC(HWND::default());
            if screen_dc.is_invalid() {
                return Err(platform("GetDC", "no screen device context"));
            }
            let result = blit_region(screen_dc, x, y, width, height);
            ReleaseDC(HWND::default(), screen_dc);
            result
        }
    }
}

unsafe fn blit_region(
    screen_dc: HDC,
    x: i32,
    y: i32,
    width: i32,
    height: i32,
) -> Result<RgbaImage, CaptureError> {
    unsafe {
        let mem_dc = CreateCompatibleDC(screen_dc);
        if mem_dc.is_invalid() {
            return Err(platform("CreateCompatibleDC", "returned null"));
        }
        let bitmap = CreateCompatibleBitmap(screen_dc, width, height);
        if bitmap.is_invalid() {
            let _ = DeleteDC(mem_dc);
            return Err(platform("CreateCompatibleBitmap", "returned null"));
        }

        let previous = SelectObject(mem_dc, bitmap);
        let result = BitBlt(mem_dc, 0, 0, width, height, screen_dc, x, y, SRCCOPY)
            .map_err(|e| platform("BitBlt", &e.to_string()))
            .and_then(|()| read_bitmap(mem_dc, bitmap, width, height));

        SelectObject(mem_dc, previous);
        let _ = DeleteObject(bitmap);
        let _ = DeleteDC(mem_dc);
        result
    }
}

/// Reads a 32-bit top-down DIB and converts it from BGRA to RGBA.
unsafe fn read_bitmap(
    dc: HDC,
    bitmap: HBITMAP,
    width: i32,
    height: i32,
) -> Result<RgbaImage, CaptureError> {
    let mut info = BITMAPINFO {
        bmiHeader: BITMAPINFOHEADER {
            biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
            biWidth: width,
            // Negative height requests top-down rows
            biHeight: -height,
            biPlanes: 1,
            biBitCount: 32,
            biCompression: BI_RGB.0,
            ..Default::default()
        },
        ..Default::default()
    };

    let mut data = vec![0u8; (width * height * 4) as usize];
    let lines = unsafe {
        GetDIBits(
            dc,
            bitmap,
            0,
            height as u32,
            Some(data.as_mut_ptr() as *mut _),
            &mut info,
            DIB_RGB_COLORS,
        )
    };
    if lines == 0 {
        return Err(platform("GetDIBits", "copied no scan lines"));
    }

    for px in data.chunks_exact_mut(4) {
        px.swap(0, 2);
        px[3] = 255;
    }

    let img: Option<ImageBuffer<Rgba<u8>, Vec<u8>>> =
        ImageBuffer::from_raw(width as u32, height as u32, data);
    img.ok_or_else(|| platform("GetDIBits", "buffer size mismatch"))
}

fn platform(call: &'static str, detail: &str) -> CaptureError {
    CaptureError::Platform {
        call,
        detail: detail.to_string(),
    }
}
