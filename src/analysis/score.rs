//! Flame score calculation.
//!
//! `score = main + 4 × attack + 10 × all_stat% + secondary / 8`
//!
//! The weights mirror the in-game value of each line and are not configurable.

use serde::Serialize;

use super::config::AnalysisConfig;
use super::extract::StatSnapshot;

pub const ATTACK_WEIGHT: i64 = 4;
pub const ALL_STAT_WEIGHT: i64 = 10;
pub const SECONDARY_DIVISOR: f64 = 8.0;

/// A single weighted term of the score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreTerm {
    pub label: String,
    pub raw: i64,
    pub weighted: f64,
}

/// Labelled per-term view of a snapshot's score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub main: ScoreTerm,
    pub attack: ScoreTerm,
    pub all_stat: ScoreTerm,
    pub secondary: ScoreTerm,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        // Integer terms are summed first; the secondary division is the only
        // fractional step.
        let integral = self
            .main
            .raw
            .saturating_add(self.attack.raw.saturating_mul(ATTACK_WEIGHT))
            .saturating_add(self.all_stat.raw.saturating_mul(ALL_STAT_WEIGHT));
        integral as f64 + self.secondary.weighted
    }

    pub fn terms(&self) -> [&ScoreTerm; 4] {
        [&self.main, &self.secondary, &self.attack, &self.all_stat]
    }
}

/// Splits a snapshot's score into labelled terms.
pub fn breakdown(snapshot: &StatSnapshot, config: &AnalysisConfig) -> ScoreBreakdown {
    ScoreBreakdown {
        main: ScoreTerm {
            label: format!("Main Stat ({})", config.main),
            raw: snapshot.main_stat,
            weighted: snapshot.main_stat as f64,
        },
        attack: ScoreTerm {
            label: config.attack.display_name().to_string(),
            raw: snapshot.primary_attack,
            weighted: snapshot.primary_attack.saturating_mul(ATTACK_WEIGHT) as f64,
        },
        all_stat: ScoreTerm {
            label: "All Stat %".to_string(),
            raw: snapshot.all_stat_percent,
            weighted: snapshot.all_stat_percent.saturating_mul(ALL_STAT_WEIGHT) as f64,
        },
        secondary: ScoreTerm {
            label: format!("Secondary ({})", config.secondary),
            raw: snapshot.secondary_stat,
            weighted: snapshot.secondary_stat as f64 / SECONDARY_DIVISOR,
        },
    }
}

/// Computes the flame score. Pure and total.
pub fn score(snapshot: &StatSnapshot, config: &AnalysisConfig) -> f64 {
    breakdown(snapshot, config).total()
}
