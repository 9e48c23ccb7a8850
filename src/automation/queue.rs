//! Record queue between the reroll loop and the attempt log writer.
//!
//! Uses std::sync::mpsc channel for single-producer, single-consumer communication.
//! The reroll loop sends one record per decided attempt; the writer thread
//! appends them to the session CSV.

use chrono::{DateTime, Local};
use std::sync::mpsc::{channel, Receiver, Sender};

use crate::analysis::{Decision, StatSnapshot};

/// One decided attempt, as written to the attempt log.
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    /// Attempt number (1-based)
    pub attempt: u32,
    /// When the decision was made
    pub recorded_at: DateTime<Local>,
    pub decision: Decision,
    pub before_score: f64,
    pub after: StatSnapshot,
}

impl AttemptRecord {
    pub fn new(attempt: u32, decision: Decision, before: &StatSnapshot, after: &StatSnapshot) -> Self {
        Self {
            attempt,
            recorded_at: Local::now(),
            decision,
            before_score: before.score,
            after: after.clone(),
        }
    }
}

/// Creates a new record queue.
///
/// The channel is unbounded; records queue up if disk writes are slower
/// than the reroll loop.
pub fn create_record_queue() -> (Sender<AttemptRecord>, Receiver<AttemptRecord>) {
    channel()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(attempt: u32) -> AttemptRecord {
        AttemptRecord::new(
            attempt,
            Decision::Continue,
            &StatSnapshot::default(),
            &StatSnapshot::default(),
        )
    }

    #[test]
    fn test_queue_preserves_order() {
        let (sender, receiver) = create_record_queue();
        for i in 1..=5 {
            sender.send(record(i)).expect("Failed to send");
        }
        for i in 1..=5 {
            let received = receiver.recv().expect("Failed to receive");
            assert_eq!(received.attempt, i);
        }
    }

    #[test]
    fn test_channel_closes_when_sender_dropped() {
        let (sender, receiver) = create_record_queue();
        sender.send(record(1)).unwrap();
        drop(sender);

        assert!(receiver.recv().is_ok());
        assert!(receiver.recv().is_err());
    }
}
