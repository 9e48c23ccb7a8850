//! Live terminal display of the reroll loop.
//!
//! This module provides:
//! - `AttemptReport`, the immutable per-attempt state handed to the display
//! - `ResultPublisher`, the latest-value handoff between loop and renderer
//! - A renderer thread that redraws the latest report at a fixed interval

pub mod publisher;
pub mod render;
pub mod state;

pub use publisher::ResultPublisher;
pub use render::render_report;
pub use state::AttemptReport;

use anyhow::Result;
use crossterm::{cursor, execute, terminal};
use std::io::{stdout, Write};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::automation::input::{AbortFlag, StopSignal};

/// Spawns the renderer thread.
///
/// The thread redraws every `interval` and exits after drawing a finished
/// report, or when `shutdown` is raised.
pub fn spawn_renderer(
    publisher: ResultPublisher,
    interval: Duration,
    shutdown: AbortFlag,
) -> JoinHandle<()> {
    thread::spawn(move || {
        tracing::debug!("Renderer started");
        loop {
            let latest = publisher.latest();
            if let Some(report) = &latest {
                if let Err(e) = draw(report) {
                    tracing::warn!("Renderer failed to draw: {}", e);
                }
                if report.finished {
                    break;
                }
            }
            if shutdown.stop_requested() {
                break;
            }
            thread::sleep(interval);
        }
        tracing::debug!("Renderer finished");
    })
}

fn draw(report: &AttemptReport) -> Result<()> {
    let mut stdout = stdout();
    execute!(
        stdout,
        cursor::MoveTo(0, 0),
        terminal::Clear(terminal::ClearType::All)
    )?;
    write!(stdout, "{}", render_report(report, true))?;
    stdout.flush()?;
    Ok(())
}
