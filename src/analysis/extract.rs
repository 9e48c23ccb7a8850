//! Stat extraction from normalized flame text.
//!
//! Each line is checked against every rule independently, so a single line can
//! feed more than one field. A label without a readable number leaves the field
//! at its default; absence is never an error.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use super::config::{AnalysisConfig, AttackFamily};
use super::score;

/// Spellings of the "All Stats" line accepted as a main-stat alias.
pub const ALL_STATS_ALIASES: [&str; 4] = ["all stats", "all stat", "allstats", "allstat"];

const WEAPON_ATTACK_LABELS: [&str; 2] = ["weapon attack", "weapon att"];
const MAGIC_ATTACK_LABELS: [&str; 2] = ["magic attack", "magic att"];
const ALL_STATS_LABEL: &str = "all stats";
const CP_INCREASE_LABEL: &str = "cp increase";

/// Where the text behind a snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextSource {
    /// A real OCR reading of the screen.
    #[default]
    Ocr,
    /// Fixed stand-in text used when OCR is unavailable.
    Placeholder,
}

impl TextSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextSource::Ocr => "ocr",
            TextSource::Placeholder => "placeholder",
        }
    }
}

/// One scored observation of a flame stat box.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StatSnapshot {
    pub main_stat: i64,
    pub secondary_stat: i64,
    /// Weapon or magic attack, depending on the configured attack family.
    pub primary_attack: i64,
    pub all_stat_percent: i64,
    /// Present only when the text carried a CP change line.
    pub cp_delta: Option<i64>,
    pub raw_text: String,
    pub score: f64,
    pub source: TextSource,
}

impl StatSnapshot {
    /// True when a positive CP change was read.
    pub fn has_cp_gain(&self) -> bool {
        self.cp_delta.is_some_and(|delta| delta > 0)
    }

    /// Number of lines carrying the main stat or an All Stats alias.
    ///
    /// Reported for display; the decision rules do not use it.
    pub fn prime_line_count(&self, config: &AnalysisConfig) -> usize {
        let label = config.main.label();
        self.raw_text
            .lines()
            .filter(|line| line.contains(label) || is_all_stats_line(line))
            .count()
    }

    /// Number of weapon-flame lines: the configured attack family, boss
    /// damage and ignore defense. Display only.
    pub fn weapon_line_count(&self, config: &AnalysisConfig) -> usize {
        let attack_labels: &[&str] = match config.attack {
            AttackFamily::Physical => &WEAPON_ATTACK_LABELS,
            AttackFamily::Magic => &MAGIC_ATTACK_LABELS,
        };
        self.raw_text
            .lines()
            .map(|line| {
                usize::from(contains_any(line, attack_labels))
                    + usize::from(line.contains("boss") && line.contains("damage"))
                    + usize::from(line.contains("ignore") && line.contains("defense"))
            })
            .sum()
    }
}

/// Compiles `pattern` once. A bad pattern is logged and disables its rule.
fn compiled(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::error!("Invalid extraction pattern '{}': {}", pattern, e);
            None
        }
    })
    .as_ref()
}

fn plus_number() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    compiled(&RE, r"\+(\d+)")
}

fn plus_percent() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    compiled(&RE, r"\+(\d+)%")
}

fn minus_number() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    compiled(&RE, r"-(\d+)")
}

/// First capture of `re` in `line` parsed as an integer.
fn capture_number(re: Option<&Regex>, line: &str) -> Option<i64> {
    re?.captures(line)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn is_all_stats_line(line: &str) -> bool {
    ALL_STATS_ALIASES.iter().any(|alias| line.contains(alias))
}

fn contains_any(line: &str, labels: &[&str]) -> bool {
    labels.iter().any(|label| line.contains(label))
}

/// Signed CP change: `+N` first, then `-N`, else zero.
fn signed_cp_delta(line: &str) -> i64 {
    if let Some(value) = capture_number(plus_number(), line) {
        return value;
    }
    if let Some(value) = capture_number(minus_number(), line) {
        return -value;
    }
    0
}

/// Extracts stat fields from canonical text and scores them.
///
/// Lines are processed in order; for each field the last matching line wins.
/// An explicit main-stat line always takes precedence over an All Stats alias,
/// which only fills the main stat when no explicit line exists.
pub fn extract(canonical: &str, config: &AnalysisConfig) -> StatSnapshot {
    let mut snapshot = StatSnapshot {
        raw_text: canonical.to_string(),
        ..Default::default()
    };

    let main_label = config.main.label();
    let secondary_label = config.secondary.label();
    let mut explicit_main: Option<i64> = None;
    let mut alias_main: Option<i64> = None;

    for line in canonical.lines().map(|l| l.to_lowercase()) {
        if line.contains(main_label) {
            if let Some(value) = capture_number(plus_number(), &line) {
                explicit_main = Some(value);
            }
        } else if is_all_stats_line(&line) {
            if let Some(value) = capture_number(plus_number(), &line) {
                alias_main = Some(value);
            }
        }

        if line.contains(secondary_label) {
            if let Some(value) = capture_number(plus_number(), &line) {
                snapshot.secondary_stat = value;
            }
        }

        if config.attack == AttackFamily::Physical && contains_any(&line, &WEAPON_ATTACK_LABELS) {
            if let Some(value) = capture_number(plus_number(), &line) {
                snapshot.primary_attack = value;
            }
        }

        if config.attack == AttackFamily::Magic && contains_any(&line, &MAGIC_ATTACK_LABELS) {
            if let Some(value) = capture_number(plus_number(), &line) {
                snapshot.primary_attack = value;
            }
        }

        if line.contains(ALL_STATS_LABEL) {
            if let Some(value) = capture_number(plus_percent(), &line) {
                snapshot.all_stat_percent = value;
            }
        }

        if line.contains(CP_INCREASE_LABEL) {
            snapshot.cp_delta = Some(signed_cp_delta(&line));
        }
    }

    snapshot.main_stat = explicit_main.or(alias_main).unwrap_or(0);
    snapshot.score = score::score(&snapshot, config);
    snapshot
}
