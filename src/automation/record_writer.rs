//! Attempt log writer thread.
//!
//! Runs in a separate thread, receiving attempt records from the queue and
//! appending them to the session CSV so disk I/O never stalls the loop.

use std::path::PathBuf;
use std::sync::mpsc::Receiver;

use crate::automation::csv_writer::append_to_csv;
use crate::automation::queue::AttemptRecord;

/// Runs the writer loop until the channel is closed (sender dropped).
///
/// Write failures are logged and skipped; the log is diagnostic only.
pub fn run_record_writer(receiver: Receiver<AttemptRecord>, csv_path: PathBuf) {
    tracing::debug!("Record writer started: {}", csv_path.display());

    let mut written = 0usize;
    for record in receiver {
        match append_to_csv(&csv_path, &record) {
            Ok(()) => written += 1,
            Err(e) => tracing::warn!(
                attempt = record.attempt,
                "Failed to write attempt record: {:#}",
                e
            ),
        }
    }

    tracing::debug!("Record writer finished ({} rows)", written);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Decision, StatSnapshot};
    use crate::automation::csv_writer::init_csv;
    use crate::automation::queue::create_record_queue;
    use std::thread;
    use tempfile::tempdir;

    #[test]
    fn test_writer_drains_queue_and_exits() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("attempts.csv");
        init_csv(&csv_path).unwrap();

        let (sender, receiver) = create_record_queue();
        let path = csv_path.clone();
        let handle = thread::spawn(move || run_record_writer(receiver, path));

        for attempt in 1..=3 {
            let snap = StatSnapshot::default();
            sender
                .send(AttemptRecord::new(attempt, Decision::Continue, &snap, &snap))
                .unwrap();
        }
        drop(sender);

        handle.join().expect("Writer thread panicked");
        let content = std::fs::read_to_string(&csv_path).unwrap();
        assert_eq!(content.lines().count(), 4);
    }
}
