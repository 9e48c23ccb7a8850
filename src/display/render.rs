//! Text rendering of an [`AttemptReport`].
//!
//! Produces the side-by-side BEFORE | AFTER table. Colouring uses crossterm
//! styles and can be switched off for log output and tests.

use crossterm::style::{Color, Stylize};
use std::fmt::Write;

use super::state::AttemptReport;
use crate::analysis::{breakdown, decision::SIMULATED_TAG, ScoreTerm};

const LABEL_WIDTH: usize = 22;
const VALUE_WIDTH: usize = 12;
const SEPARATOR_WIDTH: usize = 62;

fn paint(text: String, color: Color, colored: bool) -> String {
    if colored {
        text.with(color).to_string()
    } else {
        text
    }
}

/// Green when `after` improves on `before`, red when worse, white otherwise.
fn delta_color(before: f64, after: f64) -> Color {
    if after > before {
        Color::Green
    } else if after < before {
        Color::Red
    } else {
        Color::White
    }
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.3}", value)
    }
}

fn write_term_row(out: &mut String, before: &ScoreTerm, after: &ScoreTerm, colored: bool) {
    let after_cell = paint(
        format!("{:<VALUE_WIDTH$}", format!("{} ({})", after.raw, format_value(after.weighted))),
        delta_color(before.weighted, after.weighted),
        colored,
    );
    let _ = writeln!(
        out,
        "{:<LABEL_WIDTH$}{:<VALUE_WIDTH$}{}",
        before.label,
        format!("{} ({})", before.raw, format_value(before.weighted)),
        after_cell
    );
}

/// Renders the report as a multi-line string.
pub fn render_report(report: &AttemptReport, colored: bool) -> String {
    let config = &report.config;
    let separator = "-".repeat(SEPARATOR_WIDTH);
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Flame Reroll | Attempt: {} | Press Ctrl+F1 to exit",
        paint(report.attempt.to_string(), Color::Green, colored)
    );
    let _ = writeln!(
        out,
        "Main: {}  Secondary: {}  Attack: {}  CP override: {}",
        config.main,
        config.secondary,
        config.attack.display_name(),
        if config.ignore_cp_increase { "off" } else { "on" }
    );
    let _ = writeln!(out, "{}", separator);

    match (&report.before, &report.after) {
        (Some(before), Some(after)) => {
            let _ = writeln!(
                out,
                "{:<LABEL_WIDTH$}{:<VALUE_WIDTH$}{}",
                "",
                "BEFORE",
                "AFTER"
            );
            let b = breakdown(before, config);
            let a = breakdown(after, config);
            for (before_term, after_term) in b.terms().into_iter().zip(a.terms()) {
                write_term_row(&mut out, before_term, after_term, colored);
            }

            let cp = |delta: Option<i64>| match delta {
                Some(d) => format!("{:+}", d),
                None => "-".to_string(),
            };
            let _ = writeln!(
                out,
                "{:<LABEL_WIDTH$}{:<VALUE_WIDTH$}{}",
                "CP Increase",
                cp(before.cp_delta),
                cp(after.cp_delta)
            );
            let _ = writeln!(
                out,
                "{:<LABEL_WIDTH$}{:<VALUE_WIDTH$}{}",
                "Prime lines",
                before.prime_line_count(config),
                after.prime_line_count(config)
            );
            let _ = writeln!(
                out,
                "{:<LABEL_WIDTH$}{:<VALUE_WIDTH$}{}",
                "Weapon lines",
                before.weapon_line_count(config),
                after.weapon_line_count(config)
            );
            let _ = writeln!(out, "{}", separator);

            let diff = report.score_delta().unwrap_or_default();
            let _ = writeln!(
                out,
                "{:<LABEL_WIDTH$}{:<VALUE_WIDTH$}{} {}",
                "Score",
                format!("{:.2}", before.score),
                paint(
                    format!("{:.2}", after.score),
                    delta_color(before.score, after.score),
                    colored
                ),
                paint(
                    format!("({:+.2})", diff),
                    delta_color(before.score, after.score),
                    colored
                )
            );
        }
        _ => {
            let _ = writeln!(out, "Capturing flame stats...");
        }
    }

    if report.degraded {
        let _ = writeln!(
            out,
            "{}",
            paint(
                format!("{} OCR unavailable, showing placeholder text", SIMULATED_TAG),
                Color::Yellow,
                colored
            )
        );
    }
    if let Some(status) = &report.status {
        let _ = writeln!(out, "{}", status);
    }
    if let Some(message) = &report.exit_message {
        let _ = writeln!(out, "{}", paint(message.clone(), Color::Green, colored));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{analyze, AnalysisConfig, AttackFamily, StatKind, TextSource};

    fn config() -> AnalysisConfig {
        AnalysisConfig::new(StatKind::Str, StatKind::Dex, AttackFamily::Physical, false)
    }

    fn report() -> AttemptReport {
        let before = analyze(
            "STR: +9\nAll Stats: +2%\nWeapon Attack: +3",
            TextSource::Ocr,
            &config(),
        );
        let after = analyze(
            "STR: +30\nDEX: +16\nWeapon Attack: +1\nCP Increase: -20",
            TextSource::Ocr,
            &config(),
        );
        AttemptReport::starting(config(), 7).with_snapshots(before, after)
    }

    #[test]
    fn test_render_plain_table() {
        let text = render_report(&report(), false);
        assert!(text.contains("Attempt: 7"));
        assert!(text.contains("Main: STR  Secondary: DEX  Attack: Weapon Attack"));
        assert!(text.contains("Main Stat (STR)"));
        assert!(text.contains("Secondary (DEX)"));
        assert!(text.contains("BEFORE"));
        assert!(text.contains("AFTER"));
        assert!(text.contains("CP Increase"));
        assert!(text.contains("-20"));
        assert!(text.contains("Weapon lines"));
        // before = 9 + 12 + 20 = 41, after = 30 + 4 + 2 = 36
        assert!(text.contains("41.00"));
        assert!(text.contains("36.00"));
        assert!(text.contains("(-5.00)"));
        assert!(!text.contains('\x1b'));
    }

    #[test]
    fn test_render_without_snapshots() {
        let text = render_report(&AttemptReport::starting(config(), 1), false);
        assert!(text.contains("Capturing flame stats..."));
        assert!(!text.contains("BEFORE"));
    }

    #[test]
    fn test_render_flags_degraded_and_exit() {
        let mut r = report();
        r.degraded = true;
        let r = r.finish("Got a better or equal score! Stopping here.");
        let text = render_report(&r, false);
        assert!(text.contains(SIMULATED_TAG));
        assert!(text.contains("Stopping here."));
    }

    #[test]
    fn test_delta_color() {
        assert_eq!(delta_color(1.0, 2.0), Color::Green);
        assert_eq!(delta_color(2.0, 1.0), Color::Red);
        assert_eq!(delta_color(2.0, 2.0), Color::White);
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(12.0), "12");
        assert_eq!(format_value(1.5), "1.500");
    }
}
