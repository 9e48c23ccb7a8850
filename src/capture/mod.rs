//! Screen capture of the flame stat boxes.
//!
//! This module provides:
//! - Window discovery (`WindowLocator`)
//! - Region capture relative to the window (`RegionCapture`)
//! - A simulated screen for running without the game
//!
//! The Win32 implementations are only compiled on Windows.

#[cfg(windows)]
pub mod screenshot;
#[cfg(windows)]
pub mod window;

#[cfg(windows)]
pub use screenshot::GdiCapture;
#[cfg(windows)]
pub use window::TitleWindowLocator;

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by window discovery and region capture.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("window '{0}' not found. Is the game running?")]
    WindowNotFound(String),
    #[error("capture region {region:?} does not fit window {width}x{height}")]
    RegionOutOfBounds {
        region: CaptureRegion,
        width: i32,
        height: i32,
    },
    #[error("{call} failed: {detail}")]
    Platform { call: &'static str, detail: String },
}

/// Screen rectangle of the game window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WindowRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl WindowRect {
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

/// Capture area given as a pixel offset from the window's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRegion {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl CaptureRegion {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns the absolute screen position of the region.
    ///
    /// Fails if the region is empty or reaches outside the window.
    pub fn resolve(&self, window: &WindowRect) -> Result<(i32, i32), CaptureError> {
        let out_of_bounds = || CaptureError::RegionOutOfBounds {
            region: *self,
            width: window.width(),
            height: window.height(),
        };

        if self.width == 0 || self.height == 0 || self.x < 0 || self.y < 0 {
            return Err(out_of_bounds());
        }
        let right = i64::from(self.x) + i64::from(self.width);
        let bottom = i64::from(self.y) + i64::from(self.height);
        if right > i64::from(window.width()) || bottom > i64::from(window.height()) {
            return Err(out_of_bounds());
        }

        Ok((window.left + self.x, window.top + self.y))
    }
}

/// Finds the game window on screen.
pub trait WindowLocator {
    fn locate(&self) -> Result<WindowRect, CaptureError>;
}

/// Grabs a bitmap of one region of the game window.
pub trait RegionCapture {
    fn capture(&self, window: &WindowRect, region: &CaptureRegion)
    -> Result<RgbaImage, CaptureError>;
}

/// Stand-in for the game window used by `--simulate`.
///
/// Captures are blank images of the requested size; the simulated OCR
/// engine supplies the text.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedScreen {
    pub rect: WindowRect,
}

impl Default for SimulatedScreen {
    fn default() -> Self {
        Self {
            rect: WindowRect {
                left: 0,
                top: 0,
                right: 1366,
                bottom: 768,
            },
        }
    }
}

impl WindowLocator for SimulatedScreen {
    fn locate(&self) -> Result<WindowRect, CaptureError> {
        Ok(self.rect)
    }
}

impl RegionCapture for SimulatedScreen {
    fn capture(
        &self,
        window: &WindowRect,
        region: &CaptureRegion,
    ) -> Result<RgbaImage, CaptureError> {
        region.resolve(window)?;
        Ok(RgbaImage::from_pixel(
            region.width,
            region.height,
            Rgba([0, 0, 0, 255]),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> WindowRect {
        WindowRect {
            left: 100,
            top: 50,
            right: 1124,
            bottom: 818,
        }
    }

    #[test]
    fn test_window_rect_size() {
        assert_eq!(window().width(), 1024);
        assert_eq!(window().height(), 768);
    }

    #[test]
    fn test_region_resolves_to_screen_coordinates() {
        let region = CaptureRegion::new(607, 350, 167, 118);
        assert_eq!(region.resolve(&window()).unwrap(), (707, 400));
    }

    #[test]
    fn test_region_outside_window_is_rejected() {
        let region = CaptureRegion::new(900, 350, 167, 118);
        let err = region.resolve(&window()).unwrap_err();
        assert!(matches!(err, CaptureError::RegionOutOfBounds { .. }));
    }

    #[test]
    fn test_empty_region_is_rejected() {
        let region = CaptureRegion::new(0, 0, 0, 10);
        assert!(region.resolve(&window()).is_err());
    }

    #[test]
    fn test_simulated_capture_matches_region_size() {
        let screen = SimulatedScreen::default();
        let rect = screen.locate().unwrap();
        let img = screen
            .capture(&rect, &CaptureRegion::new(607, 495, 167, 118))
            .unwrap();
        assert_eq!(img.dimensions(), (167, 118));
    }
}
