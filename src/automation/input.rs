//! Reroll input and stop polling.
//!
//! The reroll loop only sees the `RerollTrigger` and `StopSignal` traits. On
//! Windows the trigger clicks the reroll button with `SendInput` and presses
//! Enter through the confirmation dialogs; the stop signal is Ctrl+F1 polled
//! with `GetAsyncKeyState`.

use anyhow::Result;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use crate::capture::WindowRect;

/// Performs one reroll in the game.
pub trait RerollTrigger {
    fn trigger(&self, window: &WindowRect) -> Result<()>;
}

/// Reports whether the operator asked to stop.
pub trait StopSignal {
    fn stop_requested(&self) -> bool;
}

impl<A: StopSignal, B: StopSignal> StopSignal for (A, B) {
    fn stop_requested(&self) -> bool {
        self.0.stop_requested() || self.1.stop_requested()
    }
}

/// Shared stop flag that can be raised from any thread.
#[derive(Debug, Clone, Default)]
pub struct AbortFlag(Arc<AtomicBool>);

impl AbortFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl StopSignal for AbortFlag {
    fn stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Reroll trigger for simulated runs; only counts invocations.
#[derive(Debug, Default)]
pub struct NoopTrigger {
    count: AtomicU32,
}

impl NoopTrigger {
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::SeqCst)
    }
}

impl RerollTrigger for NoopTrigger {
    fn trigger(&self, _window: &WindowRect) -> Result<()> {
        let n = self.count.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!("Simulated reroll #{}", n);
        Ok(())
    }
}

#[cfg(windows)]
pub use self::win::{HotkeyStop, SendInputTrigger};

#[cfg(windows)]
mod win {
    use anyhow::{anyhow, Result};
    use std::thread::sleep;
    use std::time::Duration;

    use windows::Win32::UI::Input::KeyboardAndMouse::{
        GetAsyncKeyState, SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, INPUT_MOUSE, KEYBDINPUT,
        KEYEVENTF_KEYUP, MOUSEEVENTF_ABSOLUTE, MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP,
        MOUSEEVENTF_MOVE, MOUSEINPUT, VIRTUAL_KEY, VK_CONTROL, VK_F1, VK_RETURN,
    };
    use windows::Win32::UI::WindowsAndMessaging::{GetSystemMetrics, SM_CXSCREEN, SM_CYSCREEN};

    use super::{RerollTrigger, StopSignal};
    use crate::automation::config::ClickOffset;
    use crate::capture::WindowRect;

    /// Clicks the reroll button and confirms with Enter.
    ///
    /// WARNING: This moves the actual cursor.
    pub struct SendInputTrigger {
        click: ClickOffset,
        confirm_presses: u32,
    }

    impl SendInputTrigger {
        pub fn new(click: ClickOffset, confirm_presses: u32) -> Self {
            Self {
                click,
                confirm_presses,
            }
        }
    }

    impl RerollTrigger for SendInputTrigger {
        fn trigger(&self, window: &WindowRect) -> Result<()> {
            let x = window.left + self.click.x;
            let y = window.top + self.click.y;
            tracing::debug!("Clicking reroll at screen ({}, {})", x, y);

            let (norm_x, norm_y) = normalize_screen_point(x, y)?;
            send_mouse(norm_x, norm_y, MOUSEEVENTF_MOVE | MOUSEEVENTF_ABSOLUTE)?;
            sleep(Duration::from_millis(300));
            send_mouse(
                norm_x,
                norm_y,
                MOUSEEVENTF_LEFTDOWN | MOUSEEVENTF_ABSOLUTE | MOUSEEVENTF_MOVE,
            )?;
            sleep(Duration::from_millis(50));
            send_mouse(
                norm_x,
                norm_y,
                MOUSEEVENTF_LEFTUP | MOUSEEVENTF_ABSOLUTE | MOUSEEVENTF_MOVE,
            )?;

            for _ in 0..self.confirm_presses {
                sleep(Duration::from_millis(50));
                press_key(VK_RETURN)?;
            }
            Ok(())
        }
    }

    /// Ctrl+F1 held down.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct HotkeyStop;

    impl StopSignal for HotkeyStop {
        fn stop_requested(&self) -> bool {
            is_down(VK_CONTROL) && is_down(VK_F1)
        }
    }

    fn is_down(key: VIRTUAL_KEY) -> bool {
        // High bit set = key currently down
        unsafe { (GetAsyncKeyState(key.0 as i32) as u16 & 0x8000) != 0 }
    }

    /// Maps screen pixels to the 0-65535 range `MOUSEEVENTF_ABSOLUTE` expects.
    fn normalize_screen_point(x: i32, y: i32) -> Result<(i32, i32)> {
        let screen_width = unsafe { GetSystemMetrics(SM_CXSCREEN) };
        let screen_height = unsafe { GetSystemMetrics(SM_CYSCREEN) };
        if screen_width <= 0 || screen_height <= 0 {
            return Err(anyhow!("GetSystemMetrics returned no screen size"));
        }
        let norm_x = ((x as i64 * 65535) / screen_width as i64) as i32;
        let norm_y = ((y as i64 * 65535) / screen_height as i64) as i32;
        Ok((norm_x, norm_y))
    }

    fn send_mouse(
        dx: i32,
        dy: i32,
        flags: windows::Win32::UI::Input::KeyboardAndMouse::MOUSE_EVENT_FLAGS,
    ) -> Result<()> {
        let input = INPUT {
            r#type: INPUT_MOUSE,
            Anonymous: INPUT_0 {
                mi: MOUSEINPUT {
                    dx,
                    dy,
                    dwFlags: flags,
                    ..Default::default()
                },
            },
        };
        send(&[input])
    }

    fn press_key(key: VIRTUAL_KEY) -> Result<()> {
        let key_input = |flags| INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 {
                ki: KEYBDINPUT {
                    wVk: key,
                    dwFlags: flags,
                    ..Default::default()
                },
            },
        };
        send(&[key_input(Default::default())])?;
        sleep(Duration::from_millis(50));
        send(&[key_input(KEYEVENTF_KEYUP)])
    }

    fn send(inputs: &[INPUT]) -> Result<()> {
        let sent = unsafe { SendInput(inputs, std::mem::size_of::<INPUT>() as i32) };
        if sent as usize != inputs.len() {
            return Err(anyhow!("SendInput sent {} of {} inputs", sent, inputs.len()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abort_flag_is_shared() {
        let flag = AbortFlag::new();
        let other = flag.clone();
        assert!(!flag.stop_requested());
        other.request();
        assert!(flag.stop_requested());
    }

    #[test]
    fn test_pair_stops_when_either_does() {
        let a = AbortFlag::new();
        let b = AbortFlag::new();
        let both = (a.clone(), b.clone());
        assert!(!both.stop_requested());
        b.request();
        assert!(both.stop_requested());
    }

    #[test]
    fn test_noop_trigger_counts() {
        let trigger = NoopTrigger::default();
        trigger.trigger(&WindowRect::default()).unwrap();
        trigger.trigger(&WindowRect::default()).unwrap();
        assert_eq!(trigger.count(), 2);
    }
}
