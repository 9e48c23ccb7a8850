//! Reroll session state machine.
//!
//! The state machine sequences through: Locate → Attempt → Capture → Reroll →
//! Wait → Attempt ... until the decision engine returns a stop, the operator
//! presses the stop combination, or a collaborator fails. The stop signal is
//! checked before every state transition.

use anyhow::{anyhow, Result};
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

use crate::analysis::{analyze, AnalysisConfig, Decision, DecisionEngine, StatSnapshot};
use crate::automation::config::AutomationConfig;
use crate::automation::input::{RerollTrigger, StopSignal};
use crate::automation::queue::AttemptRecord;
use crate::capture::{CaptureRegion, RegionCapture, WindowLocator, WindowRect};
use crate::display::{AttemptReport, ResultPublisher};
use crate::ocr::OcrEngine;

pub const STOP_MESSAGE: &str = "Ctrl+F1 detected. Exiting...";

/// The external collaborators a session drives.
pub struct Collaborators<'a> {
    pub locator: &'a dyn WindowLocator,
    pub capture: &'a dyn RegionCapture,
    pub ocr: &'a dyn OcrEngine,
    pub trigger: &'a dyn RerollTrigger,
    pub stop: &'a dyn StopSignal,
}

/// Reroll session states.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Not started; the game window has not been located yet
    Idle,
    /// About to begin the next attempt
    StartingAttempt,
    /// Capturing and reading both stat boxes
    Capturing,
    /// Clicking the reroll button
    Rerolling,
    /// Waiting for the reroll to take effect
    Waiting,
    /// The decision engine returned a stop
    Decided(Decision),
    /// The attempt cap was reached without a stop decision
    AttemptLimit,
    /// The operator requested a stop
    Cancelled,
    /// A collaborator failed
    Error(String),
}

impl SessionState {
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            SessionState::Decided(_)
                | SessionState::AttemptLimit
                | SessionState::Cancelled
                | SessionState::Error(_)
        )
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Idle => write!(f, "Idle"),
            SessionState::StartingAttempt => write!(f, "Starting attempt"),
            SessionState::Capturing => write!(f, "Capturing"),
            SessionState::Rerolling => write!(f, "Rerolling"),
            SessionState::Waiting => write!(f, "Waiting"),
            SessionState::Decided(decision) => write!(f, "{}", decision),
            SessionState::AttemptLimit => write!(f, "Attempt limit reached"),
            SessionState::Cancelled => write!(f, "Cancelled"),
            SessionState::Error(msg) => write!(f, "Error: {}", msg),
        }
    }
}

/// Session context holding the decision engine and its collaborators.
pub struct RerollSession<'a> {
    /// Current state
    pub state: SessionState,
    collab: Collaborators<'a>,
    config: AutomationConfig,
    engine: DecisionEngine,
    publisher: ResultPublisher,
    records: Option<Sender<AttemptRecord>>,
    /// Safety cap on attempts; 0 = unlimited
    max_attempts: u32,
    window: Option<WindowRect>,
    start_time: Instant,
}

impl<'a> RerollSession<'a> {
    pub fn new(
        analysis: AnalysisConfig,
        config: AutomationConfig,
        collab: Collaborators<'a>,
        publisher: ResultPublisher,
        records: Option<Sender<AttemptRecord>>,
        max_attempts: u32,
    ) -> Self {
        Self {
            state: SessionState::Idle,
            collab,
            config,
            engine: DecisionEngine::new(analysis),
            publisher,
            records,
            max_attempts,
            window: None,
            start_time: Instant::now(),
        }
    }

    /// Number of the current attempt (0 before the first one starts).
    pub fn attempt(&self) -> u32 {
        self.engine.state().attempt
    }

    fn analysis(&self) -> AnalysisConfig {
        *self.engine.config()
    }

    /// Advances the state machine by one step.
    ///
    /// Returns `Ok(true)` if the session should continue, `Ok(false)` once it
    /// has finished.
    pub fn step(&mut self) -> Result<bool> {
        if self.state.is_finished() {
            return Ok(false);
        }

        if self.collab.stop.stop_requested() {
            self.cancel();
            return Ok(false);
        }

        match &self.state {
            SessionState::Idle => {
                let window = self.collab.locator.locate()?;
                tracing::info!(
                    "Found game window {}x{} at ({}, {})",
                    window.width(),
                    window.height(),
                    window.left,
                    window.top
                );
                self.window = Some(window);
                self.state = SessionState::StartingAttempt;
                Ok(true)
            }

            SessionState::StartingAttempt => {
                let attempt = self.engine.begin_attempt();
                tracing::debug!(attempt, "Starting attempt");
                self.publisher
                    .publish(AttemptReport::starting(self.analysis(), attempt));
                self.state = SessionState::Capturing;
                Ok(true)
            }

            SessionState::Capturing => {
                let before = self.observe(self.config.before_region, "before")?;
                let after = self.observe(self.config.after_region, "after")?;

                // A stop pressed while OCR was running discards this result
                if self.collab.stop.stop_requested() {
                    self.cancel();
                    return Ok(false);
                }

                self.decide(before, after);
                Ok(!self.state.is_finished())
            }

            SessionState::Rerolling => {
                // The window may have moved since the last attempt
                let window = self.collab.locator.locate()?;
                self.window = Some(window);
                self.collab.trigger.trigger(&window)?;
                self.state = SessionState::Waiting;
                Ok(true)
            }

            SessionState::Waiting => {
                let slice = self.config.reroll_delay_slice();
                for _ in 0..self.config.reroll_delay_slices.max(1) {
                    sleep_if_nonzero(slice);
                    if self.collab.stop.stop_requested() {
                        self.cancel();
                        return Ok(false);
                    }
                }
                self.state = SessionState::StartingAttempt;
                Ok(true)
            }

            SessionState::Decided(_)
            | SessionState::AttemptLimit
            | SessionState::Cancelled
            | SessionState::Error(_) => Ok(false),
        }
    }

    /// Captures one region and turns it into a scored snapshot.
    ///
    /// Capture and OCR failures are retried `capture_retries` times.
    fn observe(&self, region: CaptureRegion, label: &str) -> Result<StatSnapshot> {
        let window = self
            .window
            .ok_or_else(|| anyhow!("game window has not been located"))?;
        let attempts = self.config.capture_retries.saturating_add(1);
        let mut last_error = None;

        for n in 1..=attempts {
            sleep_if_nonzero(self.config.capture_settle());

            let result = self
                .collab
                .capture
                .capture(&window, &region)
                .map_err(anyhow::Error::from)
                .and_then(|img| self.collab.ocr.recognize(&img).map_err(anyhow::Error::from));

            match result {
                Ok(text) => {
                    let snapshot = analyze(&text.text, text.source, self.engine.config());
                    tracing::debug!(
                        attempt = self.attempt(),
                        score = snapshot.score,
                        "Read {} stats: {:?}",
                        label,
                        snapshot.raw_text
                    );
                    return Ok(snapshot);
                }
                Err(e) => {
                    tracing::warn!(
                        attempt = self.attempt(),
                        "Reading {} stats failed ({}/{}): {:#}",
                        label,
                        n,
                        attempts,
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| anyhow!("no capture attempts made"))
            .context(format!("failed to read {} stats", label)))
    }

    fn decide(&mut self, before: StatSnapshot, after: StatSnapshot) {
        let attempt = self.attempt();
        let decision = self.engine.evaluate(&before, &after);
        tracing::info!(
            attempt,
            before = before.score,
            after = after.score,
            decision = decision.kind(),
            "{}",
            decision.reason()
        );

        if let Some(sender) = &self.records {
            if let Err(e) = sender.send(AttemptRecord::new(attempt, decision.clone(), &before, &after)) {
                tracing::warn!("Failed to queue attempt record: {}", e);
            }
        }

        let report = AttemptReport::starting(self.analysis(), attempt)
            .with_snapshots(before, after)
            .with_decision(decision.clone());

        if decision.is_terminal() {
            let message = exit_message(&decision);
            tracing::info!(
                "Stopped after {} attempts in {:.1}s: {}",
                attempt,
                self.start_time.elapsed().as_secs_f32(),
                message
            );
            self.publisher.publish(report.finish(message));
            self.state = SessionState::Decided(decision);
        } else if self.max_attempts > 0 && attempt >= self.max_attempts {
            let message = format!("Reached the limit of {} attempts. Stopping.", self.max_attempts);
            tracing::info!("{}", message);
            self.publisher.publish(report.finish(message));
            self.state = SessionState::AttemptLimit;
        } else {
            let repeats = self.engine.state().score_repeat.count();
            let delay = self.config.reroll_delay_ms as f64 / 1000.0;
            let status = if repeats > 1 {
                format!(
                    "Score unchanged for {} attempts. Rerolling in {:.1} seconds...",
                    repeats, delay
                )
            } else {
                format!("After score is lower. Rerolling in {:.1} seconds...", delay)
            };
            self.publisher.publish(report.with_status(status));
            self.state = SessionState::Rerolling;
        }
    }

    fn cancel(&mut self) {
        tracing::info!("Stop requested at attempt {}", self.attempt());
        let mut report = match self.publisher.latest() {
            Some(latest) => (*latest).clone(),
            None => AttemptReport::starting(self.analysis(), self.attempt()),
        };
        report.attempt = self.attempt();
        self.publisher.publish(report.finish(STOP_MESSAGE));
        self.state = SessionState::Cancelled;
    }

    /// Moves the session into the error state and publishes the message.
    pub fn fail(&mut self, error: &anyhow::Error) {
        let message = format!("{:#}", error);
        tracing::error!("Reroll session failed: {}", message);
        let report = AttemptReport::starting(self.analysis(), self.attempt())
            .finish(format!("Error: {}", message));
        self.publisher.publish(report);
        self.state = SessionState::Error(message);
    }
}

fn exit_message(decision: &Decision) -> String {
    match decision {
        Decision::StopOverride { reason } => {
            format!("POSITIVE CP INCREASE DETECTED ({}). Stopping here.", reason)
        }
        Decision::StopSuccess { reason } => {
            format!("Got a better or equal score ({}). Stopping here.", reason)
        }
        Decision::StopStuck { reason } => format!("Stuck: {}. Stopping.", reason),
        Decision::Continue => "Continuing".to_string(),
    }
}

fn sleep_if_nonzero(duration: Duration) {
    if !duration.is_zero() {
        std::thread::sleep(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_display() {
        assert_eq!(format!("{}", SessionState::Idle), "Idle");
        assert_eq!(format!("{}", SessionState::Waiting), "Waiting");
        assert_eq!(
            format!("{}", SessionState::Error("test".to_string())),
            "Error: test"
        );
    }

    #[test]
    fn test_finished_states() {
        assert!(!SessionState::Capturing.is_finished());
        assert!(SessionState::Cancelled.is_finished());
        assert!(SessionState::Decided(Decision::StopSuccess {
            reason: String::new()
        })
        .is_finished());
    }

    #[test]
    fn test_exit_messages_carry_reason() {
        let msg = exit_message(&Decision::StopOverride {
            reason: "CP increased by 5".to_string(),
        });
        assert!(msg.contains("CP increased by 5"));
    }
}
