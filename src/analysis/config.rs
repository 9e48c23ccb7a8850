//! Per-run analysis configuration.
//!
//! Built once from the command line before the reroll loop starts and never
//! mutated afterwards. Unknown stat or attack identifiers are rejected here so
//! a bad invocation fails before any capture happens.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while building an [`AnalysisConfig`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid stat '{0}' (valid options: STR, DEX, INT, LUK)")]
    UnknownStat(String),
    #[error("invalid attack family '{0}' (valid options: weapon, magic)")]
    UnknownAttackFamily(String),
}

/// One of the four canonical character stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatKind {
    Str,
    Dex,
    Int,
    Luk,
}

impl StatKind {
    /// Display name as it appears in the game ("STR", "DEX", ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            StatKind::Str => "STR",
            StatKind::Dex => "DEX",
            StatKind::Int => "INT",
            StatKind::Luk => "LUK",
        }
    }

    /// Label searched for in normalized (lowercase) OCR text.
    pub fn label(&self) -> &'static str {
        match self {
            StatKind::Str => "str",
            StatKind::Dex => "dex",
            StatKind::Int => "int",
            StatKind::Luk => "luk",
        }
    }
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "STR" => Ok(StatKind::Str),
            "DEX" => Ok(StatKind::Dex),
            "INT" => Ok(StatKind::Int),
            "LUK" => Ok(StatKind::Luk),
            _ => Err(ConfigError::UnknownStat(s.to_string())),
        }
    }
}

/// Which attack line feeds the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackFamily {
    /// "Weapon Attack" lines.
    Physical,
    /// "Magic Attack" lines.
    Magic,
}

impl AttackFamily {
    /// Mages (INT main) score magic attack, everyone else weapon attack.
    pub fn default_for(main: StatKind) -> Self {
        if main == StatKind::Int {
            AttackFamily::Magic
        } else {
            AttackFamily::Physical
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AttackFamily::Physical => "Weapon Attack",
            AttackFamily::Magic => "Magic Attack",
        }
    }
}

impl FromStr for AttackFamily {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weapon" | "physical" | "att" => Ok(AttackFamily::Physical),
            "magic" | "matt" => Ok(AttackFamily::Magic),
            _ => Err(ConfigError::UnknownAttackFamily(s.to_string())),
        }
    }
}

/// Immutable per-run analysis configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub main: StatKind,
    pub secondary: StatKind,
    pub attack: AttackFamily,
    /// When set, a positive CP change no longer forces a stop.
    pub ignore_cp_increase: bool,
}

impl AnalysisConfig {
    pub fn new(
        main: StatKind,
        secondary: StatKind,
        attack: AttackFamily,
        ignore_cp_increase: bool,
    ) -> Self {
        Self {
            main,
            secondary,
            attack,
            ignore_cp_increase,
        }
    }

    /// Builds a configuration from raw command line identifiers.
    ///
    /// `attack` may be omitted, in which case it follows the main stat.
    pub fn from_identifiers(
        main: &str,
        secondary: &str,
        attack: Option<&str>,
        ignore_cp_increase: bool,
    ) -> Result<Self, ConfigError> {
        let main: StatKind = main.parse()?;
        let secondary: StatKind = secondary.parse()?;
        let attack = match attack {
            Some(raw) => raw.parse()?,
            None => AttackFamily::default_for(main),
        };
        Ok(Self::new(main, secondary, attack, ignore_cp_increase))
    }
}
