//! Flame text analysis and the reroll decision engine.
//!
//! This module provides:
//! - OCR text normalization with an explicit correction table
//! - Stat extraction into a scored [`StatSnapshot`]
//! - Score calculation and per-term breakdown
//! - Stuck detection and the stop/continue decision state machine

pub mod config;
pub mod decision;
pub mod extract;
pub mod history;
pub mod normalize;
pub mod score;

pub use config::{AnalysisConfig, AttackFamily, StatKind};
pub use decision::{Decision, DecisionEngine};
pub use extract::{StatSnapshot, TextSource};
pub use score::{breakdown, ScoreTerm};

use extract::extract;
use normalize::normalize;

/// Runs raw OCR text through normalization and extraction.
pub fn analyze(raw: &str, source: TextSource, config: &AnalysisConfig) -> StatSnapshot {
    let mut snapshot = extract(&normalize(raw), config);
    snapshot.source = source;
    snapshot
}
