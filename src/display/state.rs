//! Published per-attempt state for the live display.

use serde::Serialize;

use crate::analysis::{AnalysisConfig, Decision, StatSnapshot, TextSource};

/// Immutable snapshot of the most recent attempt.
///
/// Built completely by the reroll loop and then handed to the publisher; it
/// is never modified after publication.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptReport {
    pub config: AnalysisConfig,
    pub attempt: u32,
    pub before: Option<StatSnapshot>,
    pub after: Option<StatSnapshot>,
    /// Transient progress line ("After score is lower. Rerolling...").
    pub status: Option<String>,
    /// Final message shown when the run ends.
    pub exit_message: Option<String>,
    pub decision: Option<Decision>,
    /// Set when either snapshot came from placeholder text.
    pub degraded: bool,
    /// The renderer exits after drawing a finished report.
    pub finished: bool,
}

impl AttemptReport {
    /// Report for an attempt that has not captured anything yet.
    pub fn starting(config: AnalysisConfig, attempt: u32) -> Self {
        Self {
            config,
            attempt,
            before: None,
            after: None,
            status: None,
            exit_message: None,
            decision: None,
            degraded: false,
            finished: false,
        }
    }

    /// Attaches the bracketing snapshots and derives the degraded flag.
    pub fn with_snapshots(mut self, before: StatSnapshot, after: StatSnapshot) -> Self {
        self.degraded = before.source == TextSource::Placeholder
            || after.source == TextSource::Placeholder;
        self.before = Some(before);
        self.after = Some(after);
        self
    }

    pub fn with_decision(mut self, decision: Decision) -> Self {
        self.decision = Some(decision);
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Marks the report as the last one of the run.
    pub fn finish(mut self, exit_message: impl Into<String>) -> Self {
        self.exit_message = Some(exit_message.into());
        self.status = None;
        self.finished = true;
        self
    }

    /// After-score minus before-score, when both are known.
    pub fn score_delta(&self) -> Option<f64> {
        match (&self.before, &self.after) {
            (Some(before), Some(after)) => Some(after.score - before.score),
            _ => None,
        }
    }
}
