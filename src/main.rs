//! Flame Reroll
//!
//! A terminal tool that rerolls MapleStory flames until the after-roll stats
//! score at least as well as the current ones, combat power goes up, or the
//! readings stop changing.

mod analysis;
mod automation;
mod capture;
mod display;
mod logging;
mod ocr;
mod paths;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use crate::analysis::AnalysisConfig;
use crate::automation::state::STOP_MESSAGE;
use crate::automation::{
    default_config_path, load_config, AbortFlag, AutomationConfig, Collaborators, NoopTrigger,
    RunOptions, RunOutcome,
};
use crate::capture::SimulatedScreen;
use crate::ocr::PlaceholderOcr;

#[derive(Parser, Debug)]
#[command(name = "flame-reroll", version, about = "Automated flame rerolling with stat scoring")]
struct Cli {
    /// Main stat to optimize (str, dex, int, luk)
    #[arg(long = "main", value_name = "STAT")]
    main_stat: String,

    /// Secondary stat (str, dex, int, luk)
    #[arg(long, value_name = "STAT")]
    secondary: String,

    /// Attack family to score (weapon, magic); follows the main stat if omitted
    #[arg(long, value_name = "FAMILY")]
    attack: Option<String>,

    /// Do not stop just because combat power went up
    #[arg(long)]
    ignore_cp_increase: bool,

    /// Run against a simulated window with placeholder readings
    #[arg(long)]
    simulate: bool,

    /// Stop after this many attempts (0 = unlimited)
    #[arg(long, default_value_t = 0, value_name = "N")]
    max_attempts: u32,

    /// Disable the live terminal display and log to the console instead
    #[arg(long)]
    no_display: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Path to config.json (defaults to the one next to the executable)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let logs_dir = paths::get_logs_dir();
    logging::install_panic_hook(&logs_dir);
    paths::ensure_directories().context("Failed to create output directories")?;
    let guard = logging::setup_logging(&logs_dir, cli.debug, cli.no_display)?;

    let analysis = AnalysisConfig::from_identifiers(
        &cli.main_stat,
        &cli.secondary,
        cli.attack.as_deref(),
        cli.ignore_cp_increase,
    )
    .context("Invalid stat configuration")?;

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let config = load_config(&config_path);

    let options = RunOptions {
        max_attempts: cli.max_attempts,
        display: !cli.no_display,
        sessions_dir: Some(paths::get_sessions_dir()),
    };

    let outcome = if cli.simulate {
        tracing::info!("Simulation mode: placeholder readings, no input is sent");
        run_simulated(analysis, config, options)?
    } else {
        run_live(analysis, config, options)?
    };

    print_outcome(&outcome, cli.no_display);

    // process::exit skips destructors; flush the log writer first
    drop(guard);
    std::process::exit(outcome.exit_code());
}

fn run_simulated(
    analysis: AnalysisConfig,
    config: AutomationConfig,
    options: RunOptions,
) -> Result<RunOutcome> {
    let screen = SimulatedScreen::default();
    let ocr = PlaceholderOcr::new();
    let trigger = NoopTrigger::default();
    let stop = AbortFlag::new();

    let collab = Collaborators {
        locator: &screen,
        capture: &screen,
        ocr: &ocr,
        trigger: &trigger,
        stop: &stop,
    };
    let outcome = automation::run(analysis, config, collab, options)?;
    tracing::info!("Simulated rerolls triggered: {}", trigger.count());
    Ok(outcome)
}

#[cfg(windows)]
fn run_live(
    analysis: AnalysisConfig,
    config: AutomationConfig,
    options: RunOptions,
) -> Result<RunOutcome> {
    use crate::automation::input::{HotkeyStop, SendInputTrigger};
    use crate::capture::{GdiCapture, TitleWindowLocator};

    let locator = TitleWindowLocator::new(config.window_title.clone());
    let capture = GdiCapture;
    let ocr = build_ocr(&config)?;
    let trigger = SendInputTrigger::new(config.reroll_click, config.confirm_presses);
    let stop = HotkeyStop;

    let collab = Collaborators {
        locator: &locator,
        capture: &capture,
        ocr: ocr.as_ref(),
        trigger: &trigger,
        stop: &stop,
    };
    automation::run(analysis, config, collab, options)
}

#[cfg(not(windows))]
fn run_live(
    _analysis: AnalysisConfig,
    _config: AutomationConfig,
    _options: RunOptions,
) -> Result<RunOutcome> {
    anyhow::bail!("Driving the game window is only supported on Windows; use --simulate")
}

/// Picks the OCR engine for a live run.
///
/// With `placeholder_on_ocr_failure` set, a missing or failing Tesseract
/// degrades to placeholder readings instead of ending the run.
#[cfg(windows)]
fn build_ocr(config: &AutomationConfig) -> Result<Box<dyn ocr::OcrEngine>> {
    use crate::ocr::{FallbackOcr, TesseractOcr};

    let located = TesseractOcr::locate(config.tesseract_path.as_deref(), config.ocr_upscale);
    match located {
        Ok(engine) if config.placeholder_on_ocr_failure => Ok(Box::new(FallbackOcr::new(engine))),
        Ok(engine) => Ok(Box::new(engine)),
        Err(e) if config.placeholder_on_ocr_failure => {
            tracing::warn!("{}; all readings will be placeholders", e);
            Ok(Box::new(PlaceholderOcr::new()))
        }
        Err(e) => Err(anyhow::Error::from(e).context("Tesseract is required for live runs")),
    }
}

/// The live display already shows the exit message; only echo it when the
/// display is off.
fn print_outcome(outcome: &RunOutcome, no_display: bool) {
    match outcome {
        RunOutcome::Decided(decision) => tracing::info!("Finished: {}", decision),
        RunOutcome::Cancelled => tracing::info!("Finished: cancelled"),
        RunOutcome::AttemptLimit => tracing::info!("Finished: attempt limit reached"),
        RunOutcome::Failed(msg) => tracing::error!("Finished with error: {}", msg),
    }

    if !no_display {
        return;
    }
    match outcome {
        RunOutcome::Decided(decision) => println!("{}", decision),
        RunOutcome::Cancelled => println!("{}", STOP_MESSAGE),
        RunOutcome::AttemptLimit => println!("Attempt limit reached."),
        RunOutcome::Failed(msg) => eprintln!("Error: {}", msg),
    }
}
