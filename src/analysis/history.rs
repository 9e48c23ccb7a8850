//! Stuck detection.
//!
//! Two independent detectors are kept side by side: one watches the raw text of
//! the last few observations, the other counts consecutive identical scores.
//! The decision engine ORs them; neither knows about the other.

/// Number of consecutive unchanged observations treated as "stuck".
pub const STUCK_THRESHOLD: usize = 3;

/// Ring buffer of the last [`STUCK_THRESHOLD`] normalized texts.
#[derive(Debug, Clone, Default)]
pub struct TextHistory {
    slots: [Option<String>; STUCK_THRESHOLD],
    next: usize,
}

impl TextHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `text` in the next slot, overwriting the oldest entry.
    pub fn record(&mut self, text: &str) {
        self.slots[self.next] = Some(text.trim().to_string());
        self.next = (self.next + 1) % STUCK_THRESHOLD;
    }

    /// True when every slot is filled with the same non-empty text.
    pub fn is_stuck(&self) -> bool {
        let Some(first) = self.slots[0].as_deref() else {
            return false;
        };
        !first.is_empty()
            && self
                .slots
                .iter()
                .all(|slot| slot.as_deref() == Some(first))
    }
}

/// Counts how many times in a row the same score was observed.
#[derive(Debug, Clone, Default)]
pub struct ScoreRepeat {
    last: Option<f64>,
    count: usize,
}

impl ScoreRepeat {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a score; the first observation of a value counts as one.
    pub fn record(&mut self, score: f64) {
        match self.last {
            Some(last) if last == score => self.count += 1,
            _ => {
                self.last = Some(score);
                self.count = 1;
            }
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_stuck(&self) -> bool {
        self.count >= STUCK_THRESHOLD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_history_fires_on_three_identical() {
        let mut h = TextHistory::new();
        h.record("str:+9");
        assert!(!h.is_stuck());
        h.record("str:+9");
        assert!(!h.is_stuck(), "two repeats must not fire");
        h.record("str:+9");
        assert!(h.is_stuck());
    }

    #[test]
    fn test_text_history_ignores_empty() {
        let mut h = TextHistory::new();
        for _ in 0..3 {
            h.record("   ");
        }
        assert!(!h.is_stuck());
    }

    #[test]
    fn test_text_history_needs_all_three_equal() {
        let mut h = TextHistory::new();
        h.record("a");
        h.record("b");
        h.record("a");
        assert!(!h.is_stuck());
        // Ring wraps: slots become [a, b, a] -> [c, b, a] ...
        h.record("a");
        assert!(!h.is_stuck());
        h.record("a");
        assert!(h.is_stuck());
    }

    #[test]
    fn test_text_history_recovers_after_change() {
        let mut h = TextHistory::new();
        for _ in 0..3 {
            h.record("same");
        }
        assert!(h.is_stuck());
        h.record("different");
        assert!(!h.is_stuck());
    }

    #[test]
    fn test_text_history_one_blank_reading_is_not_stuck() {
        for texts in [["a", "", "a"], ["", "a", "a"], ["a", "a", ""]] {
            let mut h = TextHistory::new();
            for text in texts {
                h.record(text);
            }
            assert!(!h.is_stuck(), "{:?} should not count as stuck", texts);
        }
    }

    #[test]
    fn test_score_repeat_counts_occurrences() {
        let mut r = ScoreRepeat::new();
        r.record(100.0);
        assert_eq!(r.count(), 1);
        r.record(100.0);
        assert!(!r.is_stuck());
        r.record(100.0);
        assert!(r.is_stuck(), "third identical score fires");
    }

    #[test]
    fn test_score_repeat_resets_on_change() {
        let mut r = ScoreRepeat::new();
        r.record(10.0);
        r.record(10.0);
        r.record(12.5);
        assert_eq!(r.count(), 1);
        assert!(!r.is_stuck());
    }
}
