//! Reroll automation for the flame window.
//!
//! This module provides:
//! - Configuration loaded from config.json
//! - Reroll input and stop polling
//! - The reroll session state machine and its runner
//! - A CSV attempt log written from a worker thread

pub mod config;
pub mod csv_writer;
pub mod input;
pub mod queue;
pub mod record_writer;
pub mod runner;
pub mod state;

pub use config::{default_config_path, load_config, AutomationConfig};
pub use input::{AbortFlag, NoopTrigger};
pub use runner::{run, RunOptions, RunOutcome};
pub use state::Collaborators;
