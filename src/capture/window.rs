//! Window discovery for the MapleStory client.

use std::ffi::OsString;
use std::os::windows::ffi::OsStringExt;

use windows::core::PCWSTR;
use windows::Win32::Foundation::{BOOL, HWND, LPARAM, RECT, TRUE};
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, FindWindowW, GetWindowRect, GetWindowTextLengthW, GetWindowTextW,
    IsWindowVisible, SetForegroundWindow,
};

use super::{CaptureError, WindowLocator, WindowRect};

/// Locates the game window by its title.
///
/// An exact title match via `FindWindowW` is tried first; if that fails the
/// visible top-level windows are enumerated and the first one whose title
/// starts with the configured title is used.
pub struct TitleWindowLocator {
    title: String,
}

impl TitleWindowLocator {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    fn find_hwnd(&self) -> Option<HWND> {
        let wide: Vec<u16> = self.title.encode_utf16().chain(std::iter::once(0)).collect();
        if let Ok(hwnd) = unsafe { FindWindowW(PCWSTR::null(), PCWSTR(wide.as_ptr())) } {
            if !hwnd.is_invalid() {
                return Some(hwnd);
            }
        }
        tracing::debug!("No exact title match for '{}', enumerating windows", self.title);
        find_by_title_prefix(&self.title)
    }
}

impl WindowLocator for TitleWindowLocator {
    fn locate(&self) -> Result<WindowRect, CaptureError> {
        let hwnd = self
            .find_hwnd()
            .ok_or_else(|| CaptureError::WindowNotFound(self.title.clone()))?;

        let mut rect = RECT::default();
        unsafe { GetWindowRect(hwnd, &mut rect) }.map_err(|e| CaptureError::Platform {
            call: "GetWindowRect",
            detail: e.to_string(),
        })?;

        // Input goes to the foreground window, so bring the game forward.
        unsafe {
            let _ = SetForegroundWindow(hwnd);
        }

        tracing::debug!(
            "Window '{}' at ({}, {})-({}, {})",
            self.title,
            rect.left,
            rect.top,
            rect.right,
            rect.bottom
        );
        Ok(WindowRect {
            left: rect.left,
            top: rect.top,
            right: rect.right,
            bottom: rect.bottom,
        })
    }
}

fn window_title(hwnd: HWND) -> String {
    unsafe {
        let len = GetWindowTextLengthW(hwnd);
        if len <= 0 {
            return String::new();
        }
        let mut buf: Vec<u16> = vec![0; (len + 1) as usize];
        let copied = GetWindowTextW(hwnd, &mut buf).max(0) as usize;
        OsString::from_wide(&buf[..copied.min(len as usize)])
            .to_string_lossy()
            .to_string()
    }
}

fn find_by_title_prefix(prefix: &str) -> Option<HWND> {
    struct EnumData<'a> {
        prefix: &'a str,
        hwnd: Option<HWND>,
    }

    unsafe extern "system" fn enum_callback(hwnd: HWND, lparam: LPARAM) -> BOOL {
        unsafe {
            let data = &mut *(lparam.0 as *mut EnumData);
            if !IsWindowVisible(hwnd).as_bool() {
                return TRUE;
            }
            let title = window_title(hwnd);
            if !title.is_empty() && title.starts_with(data.prefix) {
                data.hwnd = Some(hwnd);
                return BOOL(0); // Stop enumeration
            }
            TRUE
        }
    }

    let mut data = EnumData { prefix, hwnd: None };
    unsafe {
        // EnumWindows reports an error when the callback stops it early
        let _ = EnumWindows(Some(enum_callback), LPARAM(&mut data as *mut _ as isize));
    }
    data.hwnd
}
