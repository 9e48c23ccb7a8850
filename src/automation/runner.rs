//! Reroll runner - main entry point for the reroll loop.
//!
//! Coordinates the session state machine, the attempt log writer thread,
//! and the optional renderer thread.

use anyhow::{Context, Result};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use crate::analysis::{AnalysisConfig, Decision};
use crate::automation::config::AutomationConfig;
use crate::automation::csv_writer::init_csv;
use crate::automation::input::AbortFlag;
use crate::automation::queue::create_record_queue;
use crate::automation::record_writer::run_record_writer;
use crate::automation::state::{Collaborators, RerollSession, SessionState};
use crate::display::{spawn_renderer, ResultPublisher};

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The decision engine returned a stop
    Decided(Decision),
    /// The operator pressed the stop combination
    Cancelled,
    /// `max_attempts` was reached
    AttemptLimit,
    /// A collaborator failed
    Failed(String),
}

impl RunOutcome {
    /// Process exit code: only failures are non-zero.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Failed(_) => 1,
            _ => 0,
        }
    }
}

impl From<SessionState> for RunOutcome {
    fn from(state: SessionState) -> Self {
        match state {
            SessionState::Decided(decision) => RunOutcome::Decided(decision),
            SessionState::Cancelled => RunOutcome::Cancelled,
            SessionState::AttemptLimit => RunOutcome::AttemptLimit,
            SessionState::Error(msg) => RunOutcome::Failed(msg),
            other => RunOutcome::Failed(format!("session ended in state '{}'", other)),
        }
    }
}

/// Per-run options that are not part of config.json.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Safety cap on attempts; 0 = unlimited
    pub max_attempts: u32,
    /// Draw the live terminal display
    pub display: bool,
    /// Parent directory for the timestamped session folder; no attempt log
    /// is written when unset
    pub sessions_dir: Option<PathBuf>,
}

/// Creates `<sessions_dir>/YYYYMMDD_HHMMSS/attempts.csv` with its header.
fn prepare_session_csv(sessions_dir: &Path) -> Result<PathBuf> {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let session_dir = sessions_dir.join(&timestamp);
    fs::create_dir_all(&session_dir).context("Failed to create session directory")?;

    let csv_path = session_dir.join("attempts.csv");
    init_csv(&csv_path).context("Failed to initialize attempt log")?;
    Ok(csv_path)
}

/// Runs the reroll loop to completion on the calling thread.
///
/// Returns an error only if the session could not be set up; failures during
/// the loop are reported as [`RunOutcome::Failed`].
pub fn run(
    analysis: AnalysisConfig,
    config: AutomationConfig,
    collab: Collaborators<'_>,
    options: RunOptions,
) -> Result<RunOutcome> {
    let csv_path = options
        .sessions_dir
        .as_deref()
        .map(prepare_session_csv)
        .transpose()?;

    let (sender, writer) = match csv_path {
        Some(path) => {
            tracing::info!("Attempt log: {}", path.display());
            let (sender, receiver) = create_record_queue();
            let handle = thread::spawn(move || run_record_writer(receiver, path));
            (Some(sender), Some(handle))
        }
        None => (None, None),
    };

    let publisher = ResultPublisher::new();
    let renderer_shutdown = AbortFlag::new();
    let renderer = options.display.then(|| {
        spawn_renderer(
            publisher.clone(),
            config.render_interval(),
            renderer_shutdown.clone(),
        )
    });

    tracing::info!(
        "Starting reroll loop: main={} secondary={} attack={} ignore_cp_increase={} max_attempts={}",
        analysis.main,
        analysis.secondary,
        analysis.attack.display_name(),
        analysis.ignore_cp_increase,
        options.max_attempts
    );

    let mut session = RerollSession::new(
        analysis,
        config,
        collab,
        publisher,
        sender,
        options.max_attempts,
    );

    loop {
        match session.step() {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                session.fail(&e);
                break;
            }
        }
    }

    let outcome = RunOutcome::from(session.state.clone());
    // Dropping the session closes the record channel
    drop(session);

    if let Some(handle) = writer {
        if let Err(e) = handle.join() {
            tracing::error!("Record writer thread panicked: {:?}", e);
        }
    }
    if let Some(handle) = renderer {
        renderer_shutdown.request();
        if let Err(e) = handle.join() {
            tracing::error!("Renderer thread panicked: {:?}", e);
        }
    }

    tracing::info!("Run finished: {:?}", outcome);
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AttackFamily, StatKind, TextSource};
    use crate::automation::input::{NoopTrigger, StopSignal};
    use crate::capture::{CaptureError, CaptureRegion, RegionCapture, SimulatedScreen, WindowRect};
    use crate::ocr::{OcrEngine, OcrError, OcrText, PlaceholderOcr};
    use image::RgbaImage;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use tempfile::tempdir;

    /// Returns scripted (before, after) text pairs; the last pair repeats.
    struct ScriptedOcr {
        pairs: RefCell<VecDeque<(&'static str, &'static str)>>,
        next_is_before: Cell<bool>,
        current: Cell<(&'static str, &'static str)>,
    }

    impl ScriptedOcr {
        fn new(pairs: &[(&'static str, &'static str)]) -> Self {
            Self {
                pairs: RefCell::new(pairs.iter().copied().collect()),
                next_is_before: Cell::new(true),
                current: Cell::new(("", "")),
            }
        }
    }

    impl OcrEngine for ScriptedOcr {
        fn recognize(&self, _image: &RgbaImage) -> Result<OcrText, OcrError> {
            if self.next_is_before.get() {
                let mut pairs = self.pairs.borrow_mut();
                if pairs.len() > 1 {
                    self.current.set(pairs.pop_front().unwrap());
                } else if let Some(last) = pairs.front() {
                    self.current.set(*last);
                }
                self.next_is_before.set(false);
                Ok(OcrText::ocr(self.current.get().0))
            } else {
                self.next_is_before.set(true);
                Ok(OcrText::ocr(self.current.get().1))
            }
        }
    }

    struct FailingCapture {
        calls: Cell<u32>,
    }

    impl RegionCapture for FailingCapture {
        fn capture(
            &self,
            _window: &WindowRect,
            _region: &CaptureRegion,
        ) -> Result<RgbaImage, CaptureError> {
            self.calls.set(self.calls.get() + 1);
            Err(CaptureError::Platform {
                call: "BitBlt",
                detail: "test".to_string(),
            })
        }
    }

    /// Requests a stop after a number of polls.
    struct StopAfter {
        remaining: Cell<u32>,
    }

    impl StopSignal for StopAfter {
        fn stop_requested(&self) -> bool {
            let left = self.remaining.get();
            if left == 0 {
                return true;
            }
            self.remaining.set(left - 1);
            false
        }
    }

    struct Never;

    impl StopSignal for Never {
        fn stop_requested(&self) -> bool {
            false
        }
    }

    fn analysis() -> AnalysisConfig {
        AnalysisConfig::new(StatKind::Str, StatKind::Dex, AttackFamily::Physical, false)
    }

    fn fast_config() -> AutomationConfig {
        AutomationConfig {
            capture_settle_ms: 0,
            reroll_delay_ms: 0,
            capture_retries: 1,
            ..Default::default()
        }
    }

    fn options(max_attempts: u32) -> RunOptions {
        RunOptions {
            max_attempts,
            display: false,
            sessions_dir: None,
        }
    }

    fn run_with(
        ocr: &dyn OcrEngine,
        trigger: &NoopTrigger,
        stop: &dyn StopSignal,
        opts: RunOptions,
    ) -> RunOutcome {
        let screen = SimulatedScreen::default();
        let collab = Collaborators {
            locator: &screen,
            capture: &screen,
            ocr,
            trigger,
            stop,
        };
        run(analysis(), fast_config(), collab, opts).unwrap()
    }

    #[test]
    fn test_better_roll_stops_on_first_attempt() {
        let ocr = ScriptedOcr::new(&[("STR: +9", "STR: +30")]);
        let trigger = NoopTrigger::default();
        let outcome = run_with(&ocr, &trigger, &Never, options(0));

        assert!(matches!(outcome, RunOutcome::Decided(Decision::StopSuccess { .. })));
        assert_eq!(trigger.count(), 0);
        assert_eq!(outcome.exit_code(), 0);
    }

    #[test]
    fn test_rerolls_until_success() {
        let ocr = ScriptedOcr::new(&[
            ("STR: +30", "STR: +3"),
            ("STR: +30", "STR: +12"),
            ("STR: +30", "STR: +45"),
        ]);
        let trigger = NoopTrigger::default();
        let outcome = run_with(&ocr, &trigger, &Never, options(0));

        assert!(matches!(outcome, RunOutcome::Decided(Decision::StopSuccess { .. })));
        assert_eq!(trigger.count(), 2);
    }

    #[test]
    fn test_cp_override_stops_lower_roll() {
        let ocr = ScriptedOcr::new(&[("STR: +30", "STR: +3\nCP Increase: +5")]);
        let trigger = NoopTrigger::default();
        let outcome = run_with(&ocr, &trigger, &Never, options(0));
        assert!(matches!(outcome, RunOutcome::Decided(Decision::StopOverride { .. })));
    }

    #[test]
    fn test_unchanging_screen_is_stuck() {
        let ocr = ScriptedOcr::new(&[("STR: +30", "STR: +3")]);
        let trigger = NoopTrigger::default();
        let outcome = run_with(&ocr, &trigger, &Never, options(0));

        assert!(matches!(outcome, RunOutcome::Decided(Decision::StopStuck { .. })));
        // Attempts 1 and 2 rerolled, attempt 3 stopped
        assert_eq!(trigger.count(), 2);
    }

    #[test]
    fn test_attempt_limit_skips_final_reroll() {
        let ocr = ScriptedOcr::new(&[
            ("STR: +30", "STR: +1"),
            ("STR: +30", "STR: +2"),
            ("STR: +30", "STR: +3"),
        ]);
        let trigger = NoopTrigger::default();
        let outcome = run_with(&ocr, &trigger, &Never, options(2));

        assert_eq!(outcome, RunOutcome::AttemptLimit);
        assert_eq!(trigger.count(), 1);
    }

    #[test]
    fn test_stop_signal_cancels() {
        let ocr = ScriptedOcr::new(&[("STR: +30", "STR: +1"), ("STR: +30", "STR: +2")]);
        let trigger = NoopTrigger::default();
        let stop = StopAfter {
            remaining: Cell::new(4),
        };
        let outcome = run_with(&ocr, &trigger, &stop, options(0));
        assert_eq!(outcome, RunOutcome::Cancelled);
        assert_eq!(outcome.exit_code(), 0);
    }

    #[test]
    fn test_stop_during_capture_discards_reading() {
        let dir = tempdir().unwrap();
        // Polls: idle, starting, capturing; the fourth poll comes after OCR
        let stop = StopAfter {
            remaining: Cell::new(3),
        };
        let ocr = ScriptedOcr::new(&[("STR: +30", "STR: +1")]);
        let trigger = NoopTrigger::default();
        let opts = RunOptions {
            max_attempts: 0,
            display: false,
            sessions_dir: Some(dir.path().to_path_buf()),
        };
        let outcome = run_with(&ocr, &trigger, &stop, opts);

        assert_eq!(outcome, RunOutcome::Cancelled);
        assert_eq!(trigger.count(), 0);
        let session = std::fs::read_dir(dir.path())
            .unwrap()
            .next()
            .unwrap()
            .unwrap()
            .path();
        let content = std::fs::read_to_string(session.join("attempts.csv")).unwrap();
        assert_eq!(content.lines().count(), 1, "only the header should be written");
    }

    #[test]
    fn test_capture_failure_is_retried_then_fails() {
        let screen = SimulatedScreen::default();
        let capture = FailingCapture {
            calls: Cell::new(0),
        };
        let ocr = PlaceholderOcr::new();
        let trigger = NoopTrigger::default();
        let collab = Collaborators {
            locator: &screen,
            capture: &capture,
            ocr: &ocr,
            trigger: &trigger,
            stop: &Never,
        };

        let outcome = run(analysis(), fast_config(), collab, options(0)).unwrap();
        assert!(matches!(outcome, RunOutcome::Failed(ref msg) if msg.contains("before")));
        assert_eq!(outcome.exit_code(), 1);
        // capture_retries = 1 means two tries
        assert_eq!(capture.calls.get(), 2);
    }

    #[test]
    fn test_placeholder_run_is_flagged() {
        let ocr = PlaceholderOcr::new();
        let trigger = NoopTrigger::default();
        let outcome = run_with(&ocr, &trigger, &Never, options(20));

        match outcome {
            RunOutcome::Decided(decision) => {
                assert!(decision.reason().contains(crate::analysis::decision::SIMULATED_TAG));
            }
            RunOutcome::AttemptLimit => {}
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_attempt_log_is_written() {
        let dir = tempdir().unwrap();
        let ocr = ScriptedOcr::new(&[("STR: +30", "STR: +3"), ("STR: +30", "STR: +40")]);
        let trigger = NoopTrigger::default();
        let opts = RunOptions {
            max_attempts: 0,
            display: false,
            sessions_dir: Some(dir.path().to_path_buf()),
        };
        run_with(&ocr, &trigger, &Never, opts);

        let session = std::fs::read_dir(dir.path())
            .unwrap()
            .next()
            .unwrap()
            .unwrap()
            .path();
        let content = std::fs::read_to_string(session.join("attempts.csv")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains(",continue,"));
        assert!(lines[2].contains(",success,"));
        assert!(lines[2].contains(TextSource::Ocr.as_str()));
    }
}
