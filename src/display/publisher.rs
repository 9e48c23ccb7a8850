//! Latest-value handoff between the reroll loop and the renderer.

use parking_lot::Mutex;
use std::sync::Arc;

use super::state::AttemptReport;

/// Holds the most recently published [`AttemptReport`].
///
/// Publishing swaps in a complete report under the lock; readers clone the
/// `Arc` and render outside it, so a half-built report is never visible and
/// neither side holds the lock during real work.
#[derive(Debug, Clone, Default)]
pub struct ResultPublisher {
    latest: Arc<Mutex<Option<Arc<AttemptReport>>>>,
}

impl ResultPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, report: AttemptReport) {
        let report = Arc::new(report);
        let previous = self.latest.lock().replace(report);
        // Dropped outside the lock
        drop(previous);
    }

    pub fn latest(&self) -> Option<Arc<AttemptReport>> {
        self.latest.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisConfig, AttackFamily, StatKind, StatSnapshot};
    use std::thread;

    fn config() -> AnalysisConfig {
        AnalysisConfig::new(StatKind::Luk, StatKind::Dex, AttackFamily::Physical, false)
    }

    #[test]
    fn test_empty_until_published() {
        let publisher = ResultPublisher::new();
        assert!(publisher.latest().is_none());
        publisher.publish(AttemptReport::starting(config(), 1));
        assert_eq!(publisher.latest().unwrap().attempt, 1);
    }

    #[test]
    fn test_reader_keeps_its_snapshot() {
        let publisher = ResultPublisher::new();
        publisher.publish(AttemptReport::starting(config(), 1));
        let held = publisher.latest().unwrap();
        publisher.publish(AttemptReport::starting(config(), 2));
        assert_eq!(held.attempt, 1);
        assert_eq!(publisher.latest().unwrap().attempt, 2);
    }

    #[test]
    fn test_concurrent_readers_see_whole_reports() {
        let publisher = ResultPublisher::new();
        let reader = {
            let publisher = publisher.clone();
            thread::spawn(move || {
                let mut seen = 0;
                while seen < 500 {
                    if let Some(report) = publisher.latest() {
                        // Every field was written from the same attempt number
                        let before = report.before.as_ref().unwrap();
                        let after = report.after.as_ref().unwrap();
                        assert_eq!(before.score, report.attempt as f64);
                        assert_eq!(after.main_stat, report.attempt as i64);
                        if report.finished {
                            break;
                        }
                    }
                    seen += 1;
                    thread::yield_now();
                }
            })
        };

        for attempt in 1..=200u32 {
            let before = StatSnapshot {
                score: attempt as f64,
                ..Default::default()
            };
            let after = StatSnapshot {
                main_stat: attempt as i64,
                ..Default::default()
            };
            let mut report = AttemptReport::starting(config(), attempt).with_snapshots(before, after);
            if attempt == 200 {
                report = report.finish("done");
            }
            publisher.publish(report);
        }

        reader.join().expect("reader thread panicked");
    }
}
