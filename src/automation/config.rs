//! Configuration types for the reroll loop.
//!
//! Loads settings from config.json at startup. Provides capture regions,
//! click positions, and timing parameters. Every field has a default, so a
//! partial file only overrides what it names.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::capture::CaptureRegion;

/// A point relative to the game window's top-left corner, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickOffset {
    pub x: i32,
    pub y: i32,
}

impl Default for ClickOffset {
    fn default() -> Self {
        Self { x: 700, y: 630 }
    }
}

/// Complete automation configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationConfig {
    /// Title of the game window
    pub window_title: String,
    /// Stat box showing the current flame
    pub before_region: CaptureRegion,
    /// Stat box showing the newly rolled flame
    pub after_region: CaptureRegion,
    /// Position of the reroll button
    pub reroll_click: ClickOffset,
    /// Enter presses after the click to dismiss the confirmation dialogs
    pub confirm_presses: u32,
    /// Pause before each capture so the stat box finishes drawing (milliseconds)
    pub capture_settle_ms: u64,
    /// Wait after triggering a reroll (milliseconds)
    pub reroll_delay_ms: u64,
    /// Number of slices the reroll wait is split into for stop polling
    pub reroll_delay_slices: u32,
    /// Terminal redraw interval (milliseconds)
    pub render_interval_ms: u64,
    /// Integer upscale factor applied before OCR
    pub ocr_upscale: u32,
    /// Explicit Tesseract executable; searched for when unset
    pub tesseract_path: Option<PathBuf>,
    /// Extra capture/OCR attempts per observation before giving up
    pub capture_retries: u32,
    /// Substitute placeholder text when OCR keeps failing
    pub placeholder_on_ocr_failure: bool,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            window_title: "MapleStory".to_string(),
            before_region: CaptureRegion::new(607, 350, 167, 118),
            after_region: CaptureRegion::new(607, 495, 167, 118),
            reroll_click: ClickOffset::default(),
            confirm_presses: 3,
            capture_settle_ms: 500,
            reroll_delay_ms: 500,
            reroll_delay_slices: 8,
            render_interval_ms: 1000,
            ocr_upscale: 2,
            tesseract_path: None,
            capture_retries: 2,
            placeholder_on_ocr_failure: false,
        }
    }
}

impl AutomationConfig {
    pub fn capture_settle(&self) -> Duration {
        Duration::from_millis(self.capture_settle_ms)
    }

    pub fn render_interval(&self) -> Duration {
        Duration::from_millis(self.render_interval_ms.max(50))
    }

    /// One slice of the reroll wait; the stop signal is polled after each.
    pub fn reroll_delay_slice(&self) -> Duration {
        let slices = self.reroll_delay_slices.max(1);
        Duration::from_millis(self.reroll_delay_ms) / slices
    }
}

/// Returns config.json next to the executable.
pub fn default_config_path() -> PathBuf {
    crate::paths::get_exe_dir().join("config.json")
}

/// Loads configuration from `path` or returns defaults.
///
/// A missing or malformed file is not fatal; the problem is logged and the
/// defaults are used.
pub fn load_config(path: &Path) -> AutomationConfig {
    tracing::info!("Looking for config at: {}", path.display());

    if !path.exists() {
        tracing::info!("{} not found. Using default config.", path.display());
        return AutomationConfig::default();
    }

    match fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(config) => {
                tracing::info!("Config loaded from {}", path.display());
                config
            }
            Err(e) => {
                tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                AutomationConfig::default()
            }
        },
        Err(e) => {
            tracing::warn!("Failed to read {}: {}. Using defaults.", path.display(), e);
            AutomationConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = load_config(&dir.path().join("config.json"));
        assert_eq!(config, AutomationConfig::default());
    }

    #[test]
    fn test_partial_file_overrides_named_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "window_title": "MapleStory (KMS)", "confirm_presses": 2,
                 "after_region": { "x": 600, "y": 500, "width": 170, "height": 120 } }"#,
        )
        .unwrap();

        let config = load_config(&path);
        assert_eq!(config.window_title, "MapleStory (KMS)");
        assert_eq!(config.confirm_presses, 2);
        assert_eq!(config.after_region, CaptureRegion::new(600, 500, 170, 120));
        assert_eq!(config.before_region, AutomationConfig::default().before_region);
        assert_eq!(config.reroll_delay_ms, 500);
    }

    #[test]
    fn test_malformed_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_config(&path), AutomationConfig::default());
    }

    #[test]
    fn test_reroll_delay_slices() {
        let config = AutomationConfig::default();
        assert_eq!(config.reroll_delay_slice(), Duration::from_micros(62_500));

        let config = AutomationConfig {
            reroll_delay_slices: 0,
            ..Default::default()
        };
        assert_eq!(config.reroll_delay_slice(), Duration::from_millis(500));
    }
}
