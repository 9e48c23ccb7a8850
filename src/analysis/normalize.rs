//! OCR text normalization.
//!
//! Turns raw Tesseract output into lowercase, trimmed, non-blank lines and
//! repairs the character confusions that show up in the flame stat box.
//! Normalization never fails and is idempotent.

use regex::Regex;
use std::sync::OnceLock;

/// A known OCR confusion and its repair.
pub struct Correction {
    pub pattern: Regex,
    pub replacement: &'static str,
}

/// Ordered (pattern, replacement) pairs applied to every lowercased line.
///
/// Order matters: whitespace around `+` is folded after the stray-glyph fix so
/// that "dex: l +9" ends up as "dex:+9", and before the pipe fix so that
/// "str| +9" ends up as "str+9".
const CORRECTION_TABLE: &[(&str, &str, &str)] = &[
    // "l+", "I+", "|+" and spaced variants in front of a value
    ("stray glyph before plus", r"(^|[\s:])(?:[li|]\s*)+\+", "${1}+"),
    ("space around plus", r"\s*\+\s*", "+"),
    // A pipe is never part of a word, so it goes wherever it touches a plus
    ("pipe before plus", r"\|+\+", "+"),
    ("STF -> STR", r"\bstf\b", "str"),
    ("DEV -> DEX", r"\bdev\b", "dex"),
    ("lNT -> INT", r"\blnt\b", "int"),
    ("CP Increase misreads", r"\bcp (?:lncrease|inorease|incnease)\b", "cp increase"),
    ("Max} / MaxI -> Max", r"\bmax(?:i\b|\})+", "max"),
];

/// Returns the compiled correction table.
pub fn corrections() -> &'static [Correction] {
    static TABLE: OnceLock<Vec<Correction>> = OnceLock::new();
    TABLE.get_or_init(|| {
        CORRECTION_TABLE
            .iter()
            .filter_map(|&(name, pattern, replacement)| match Regex::new(pattern) {
                Ok(pattern) => Some(Correction {
                    pattern,
                    replacement,
                }),
                Err(e) => {
                    tracing::error!("Skipping OCR correction '{}': {}", name, e);
                    None
                }
            })
            .collect()
    })
}

/// Normalizes a single line. Returns an empty string for blank input.
fn normalize_line(line: &str) -> String {
    let mut line = line
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    for correction in corrections() {
        if correction.pattern.is_match(&line) {
            line = correction
                .pattern
                .replace_all(&line, correction.replacement)
                .into_owned();
        }
    }

    line.trim().to_string()
}

/// Normalizes raw OCR output into canonical line-oriented text.
///
/// Lines are joined with `\n`; empty input produces an empty string.
pub fn normalize(raw: &str) -> String {
    raw.split('\n')
        .map(normalize_line)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \n\n \t \n"), "");
    }

    #[test]
    fn test_lowercases_and_trims_lines() {
        let raw = "  STR: +9  \r\n\n   DEX: +12\n";
        assert_eq!(normalize(raw), "str:+9\ndex:+12");
    }

    #[test]
    fn test_stray_glyph_before_plus() {
        assert_eq!(normalize("DEX: l+9"), "dex:+9");
        assert_eq!(normalize("LUK: |+30"), "luk:+30");
        assert_eq!(normalize("INT: I+12"), "int:+12");
        assert_eq!(normalize("STR: l +9"), "str:+9");
    }

    #[test]
    fn test_stray_glyph_inside_word_is_kept() {
        // "all" ends in l but is a real word, not a misread plus
        assert_eq!(normalize("All +5"), "all+5");
    }

    #[test]
    fn test_stat_abbreviation_fixes() {
        assert_eq!(normalize("STF: +9"), "str:+9");
        assert_eq!(normalize("DEV: +9"), "dex:+9");
        assert_eq!(normalize("lNT: +9"), "int:+9");
    }

    #[test]
    fn test_abbreviation_fix_needs_word_boundary() {
        assert_eq!(normalize("Devil: +1"), "devil:+1");
    }

    #[test]
    fn test_cp_increase_misreads() {
        assert_eq!(normalize("CP lncrease: +120"), "cp increase:+120");
        assert_eq!(normalize("CP Inorease: -5"), "cp increase: -5");
        assert_eq!(normalize("CP Incnease: +1"), "cp increase:+1");
    }

    #[test]
    fn test_every_correction_compiles() {
        assert_eq!(corrections().len(), CORRECTION_TABLE.len());
    }

    #[test]
    fn test_pipe_glued_to_label() {
        assert_eq!(normalize("STR|+9"), "str+9");
        assert_eq!(normalize("DEX:|+9"), "dex:+9");
        assert_eq!(normalize("LUK|| +4"), "luk+4");
    }

    #[test]
    fn test_max_misreads() {
        assert_eq!(normalize("Max} HP: +300"), "max hp:+300");
        assert_eq!(normalize("MaxI HP: +300"), "max hp:+300");
        assert_eq!(normalize("Maximum"), "maximum");
    }

    #[test]
    fn test_canonical_text_unchanged() {
        let canonical = "str:+9%\nall stats:+20%\nweapon attack:+15";
        assert_eq!(normalize(canonical), canonical);
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(raw in "[a-zA-Z0-9 :+%|\\-\t\r\n]{0,120}") {
            let once = normalize(&raw);
            prop_assert_eq!(normalize(&once), once.clone());
        }

        #[test]
        fn prop_no_blank_lines(raw in "[a-z0-9 :+\n]{0,80}") {
            let out = normalize(&raw);
            for line in out.split('\n') {
                prop_assert!(out.is_empty() || !line.trim().is_empty());
            }
        }
    }
}
