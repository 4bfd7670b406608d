use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Instant,
};

use parking_lot::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError};

/// The maximum amount of undrained loss reports, newer ones are dropped past it.
pub const REPORT_CAPACITY: usize = 256;

/// The outcome of a single optimization step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LossReport {
    pub loss: f32,
    pub timestamp: Instant,
}

impl LossReport {
    pub fn new(loss: f32) -> Self {
        Self {
            loss,
            timestamp: Instant::now(),
        }
    }
}

/// The result of draining a `ReportQueue`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drained {
    /// The most recent report, if any was pending.
    pub latest: Option<LossReport>,
    /// The amount of reports drained.
    pub count: u64,
    /// The running step counter, this drain included.
    pub steps: u64,
}

/// A bounded queue of loss reports, written by the training worker and drained by the
/// broadcaster keeping only the latest entry.
#[derive(Debug)]
pub struct ReportQueue {
    tx: mpsc::Sender<LossReport>,
    rx: Mutex<mpsc::Receiver<LossReport>>,
    steps: AtomicU64,
}

impl Default for ReportQueue {
    fn default() -> Self {
        Self::new(REPORT_CAPACITY)
    }
}

impl ReportQueue {
    /// Creates a new `ReportQueue`.
    ///
    /// # Arguments
    /// * `capacity` - The maximum amount of pending reports.
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);

        Self {
            tx,
            rx: Mutex::new(rx),
            steps: AtomicU64::new(0),
        }
    }

    /// Enqueues a report without blocking.
    ///
    /// # Returns
    /// `false` if the queue was full and the report got dropped.
    pub fn push(&self, report: LossReport) -> bool {
        match self.tx.try_send(report) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Takes every pending report, keeping only the most recent one and adding the amount taken
    /// to the step counter.
    pub fn drain(&self) -> Drained {
        let mut rx = self.rx.lock();
        let mut latest = None;
        let mut count = 0;

        while let Ok(report) = rx.try_recv() {
            latest = Some(report);
            count += 1;
        }

        let steps = self.steps.fetch_add(count, Ordering::AcqRel) + count;
        Drained {
            latest,
            count,
            steps,
        }
    }

    /// Discards every pending report and zeroes the step counter.
    pub fn reset(&self) {
        let mut rx = self.rx.lock();
        while rx.try_recv().is_ok() {}

        self.steps.store(0, Ordering::Release);
    }

    /// Returns the running step counter.
    pub fn steps(&self) -> u64 {
        self.steps.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supersede_on_drain() {
        let queue = ReportQueue::default();

        for i in 0..5 {
            assert!(queue.push(LossReport::new(i as f32)));
        }

        let drained = queue.drain();
        assert_eq!(drained.latest.map(|r| r.loss), Some(4.));
        assert_eq!(drained.count, 5);
        assert_eq!(drained.steps, 5);

        let drained = queue.drain();
        assert!(drained.latest.is_none());
        assert_eq!(drained.steps, 5);
    }

    #[test]
    fn full_queue_drops() {
        let queue = ReportQueue::new(2);

        assert!(queue.push(LossReport::new(1.)));
        assert!(queue.push(LossReport::new(2.)));
        assert!(!queue.push(LossReport::new(3.)));

        assert_eq!(queue.drain().latest.map(|r| r.loss), Some(2.));
    }

    #[test]
    fn reset_clears_everything() {
        let queue = ReportQueue::default();
        queue.push(LossReport::new(1.));
        queue.drain();
        queue.push(LossReport::new(2.));

        queue.reset();

        assert_eq!(queue.steps(), 0);
        assert_eq!(queue.drain().count, 0);
    }
}
