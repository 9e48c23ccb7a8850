//! Stop/continue decision state machine.
//!
//! Given the `before` and `after` snapshots bracketing one reroll, the engine
//! decides whether to keep the roll, give up, or reroll again. Rules are
//! checked in a fixed order: CP override, score success, stuck, continue.

use std::fmt;

use serde::Serialize;

use super::config::AnalysisConfig;
use super::extract::{StatSnapshot, TextSource};
use super::history::{ScoreRepeat, TextHistory, STUCK_THRESHOLD};

/// Appended to the reason of any decision reached on placeholder text.
pub const SIMULATED_TAG: &str = "[simulated reading]";

/// Outcome of a single attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Decision {
    /// Reroll and try again.
    Continue,
    /// The new roll is at least as good as the previous one.
    StopSuccess { reason: String },
    /// Observations stopped changing; the reroll likely did not register.
    StopStuck { reason: String },
    /// A positive CP change outranks the score comparison.
    StopOverride { reason: String },
}

impl Decision {
    /// True for every stop variant.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Decision::Continue)
    }

    pub fn reason(&self) -> &str {
        match self {
            Decision::Continue => "score decreased, rerolling",
            Decision::StopSuccess { reason }
            | Decision::StopStuck { reason }
            | Decision::StopOverride { reason } => reason,
        }
    }

    /// Short tag used in logs and the attempt CSV.
    pub fn kind(&self) -> &'static str {
        match self {
            Decision::Continue => "continue",
            Decision::StopSuccess { .. } => "success",
            Decision::StopStuck { .. } => "stuck",
            Decision::StopOverride { .. } => "override",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Continue => write!(f, "Continue"),
            Decision::StopSuccess { reason } => write!(f, "Stop (success): {}", reason),
            Decision::StopStuck { reason } => write!(f, "Stop (stuck): {}", reason),
            Decision::StopOverride { reason } => write!(f, "Stop (override): {}", reason),
        }
    }
}

/// Working state owned by the decision loop. Nothing is persisted.
#[derive(Debug, Clone, Default)]
pub struct DecisionState {
    /// Attempt counter; the first attempt is 1. Never reset.
    pub attempt: u32,
    pub text_history: TextHistory,
    pub score_repeat: ScoreRepeat,
}

impl DecisionState {
    pub fn text_stuck(&self) -> bool {
        self.text_history.is_stuck()
    }

    pub fn score_stuck(&self) -> bool {
        self.score_repeat.is_stuck()
    }
}

pub struct DecisionEngine {
    config: AnalysisConfig,
    state: DecisionState,
}

impl DecisionEngine {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            state: DecisionState::default(),
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn state(&self) -> &DecisionState {
        &self.state
    }

    /// Starts a new attempt and returns its number.
    pub fn begin_attempt(&mut self) -> u32 {
        self.state.attempt = self.state.attempt.saturating_add(1);
        self.state.attempt
    }

    /// Decides the outcome of the current attempt.
    ///
    /// Both stuck detectors are fed on every call, whichever rule ends up
    /// deciding, so their counters always reflect the full attempt sequence.
    pub fn evaluate(&mut self, before: &StatSnapshot, after: &StatSnapshot) -> Decision {
        self.state.text_history.record(&after.raw_text);
        self.state.score_repeat.record(after.score);

        let text_stuck = self.state.text_stuck();
        let score_stuck = self.state.score_stuck();

        let decision = if after.has_cp_gain() && !self.config.ignore_cp_increase {
            Decision::StopOverride {
                reason: format!(
                    "CP increased by {}",
                    after.cp_delta.unwrap_or_default()
                ),
            }
        } else if after.score >= before.score {
            Decision::StopSuccess {
                reason: format!(
                    "score {:.2} >= previous {:.2}",
                    after.score, before.score
                ),
            }
        } else if text_stuck || score_stuck {
            let what = match (text_stuck, score_stuck) {
                (true, true) => "text and score",
                (true, false) => "text",
                _ => "score",
            };
            Decision::StopStuck {
                reason: format!("{} unchanged for {} attempts", what, STUCK_THRESHOLD),
            }
        } else {
            Decision::Continue
        };

        let degraded =
            before.source == TextSource::Placeholder || after.source == TextSource::Placeholder;
        if degraded && decision.is_terminal() {
            tracing::warn!(
                attempt = self.state.attempt,
                "Decision reached on placeholder text: {}",
                decision
            );
            return tag_simulated(decision);
        }
        decision
    }
}

fn tag_simulated(decision: Decision) -> Decision {
    let tag = |reason: String| format!("{} {}", reason, SIMULATED_TAG);
    match decision {
        Decision::Continue => Decision::Continue,
        Decision::StopSuccess { reason } => Decision::StopSuccess { reason: tag(reason) },
        Decision::StopStuck { reason } => Decision::StopStuck { reason: tag(reason) },
        Decision::StopOverride { reason } => Decision::StopOverride { reason: tag(reason) },
    }
}
