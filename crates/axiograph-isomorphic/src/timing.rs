//! Optional timing hook.
//!
//! A comparison reports wall-clock timestamps at fixed checkpoints. Timers are
//! observational only: they cannot fail the comparison.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Checkpoint {
    FullComparisonComplete,
}

pub trait ComparisonTimer: Send + Sync {
    fn record(&self, checkpoint: Checkpoint, at: DateTime<Utc>);
}

impl<F> ComparisonTimer for F
where
    F: Fn(Checkpoint, DateTime<Utc>) + Send + Sync,
{
    fn record(&self, checkpoint: Checkpoint, at: DateTime<Utc>) {
        self(checkpoint, at)
    }
}

/// Timer that keeps every checkpoint it sees.
#[derive(Debug, Default)]
pub struct RecordingTimer {
    entries: Mutex<Vec<(Checkpoint, DateTime<Utc>)>>,
}

impl RecordingTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(Checkpoint, DateTime<Utc>)> {
        self.entries.lock().clone()
    }

    pub fn last(&self, checkpoint: Checkpoint) -> Option<DateTime<Utc>> {
        self.entries
            .lock()
            .iter()
            .rev()
            .find(|(c, _)| *c == checkpoint)
            .map(|(_, at)| *at)
    }
}

impl ComparisonTimer for RecordingTimer {
    fn record(&self, checkpoint: Checkpoint, at: DateTime<Utc>) {
        self.entries.lock().push((checkpoint, at));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn recording_timer_keeps_order() {
        let timer = RecordingTimer::new();
        let first = Utc::now();
        timer.record(Checkpoint::FullComparisonComplete, first);
        let second = Utc::now();
        timer.record(Checkpoint::FullComparisonComplete, second);

        assert_eq!(timer.entries().len(), 2);
        assert_eq!(timer.last(Checkpoint::FullComparisonComplete), Some(second));
    }

    #[test]
    fn closures_are_timers() {
        let calls = AtomicUsize::new(0);
        let timer = |_: Checkpoint, _: DateTime<Utc>| {
            calls.fetch_add(1, Ordering::SeqCst);
        };
        timer.record(Checkpoint::FullComparisonComplete, Utc::now());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
