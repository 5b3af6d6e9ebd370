//! Publication cell for generated reference lines.
//!
//! Single producer, many consumers. The producer hands over a fully built list;
//! consumers get an `Arc` to whichever complete list is current and never see
//! a partially updated one. Waiting consumers sleep on a condition variable
//! until the first publication or until the cell is closed.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::core::ReferenceLine;
use crate::map::RouteSegment;

/// A reference line paired with the route segment it was built from.
#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceLineEntry {
    /// Smoothed reference line
    pub line: ReferenceLine,
    /// Source segment
    pub segment: RouteSegment,
}

/// Immutable published list of reference lines.
pub type ReferenceLines = Arc<Vec<ReferenceLineEntry>>;

#[derive(Default)]
struct Slot {
    lines: Option<ReferenceLines>,
    sequence: u64,
    closed: bool,
}

/// Latest-value cell with blocking reads.
#[derive(Default)]
pub struct SnapshotCell {
    slot: Mutex<Slot>,
    published: Condvar,
}

impl SnapshotCell {
    /// Create an empty cell.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current snapshot and wake all waiters.
    pub fn publish(&self, entries: Vec<ReferenceLineEntry>) -> ReferenceLines {
        let lines = Arc::new(entries);
        {
            let mut slot = self.slot.lock();
            slot.lines = Some(Arc::clone(&lines));
            slot.sequence += 1;
        }
        self.published.notify_all();
        lines
    }

    /// Current snapshot, if any has been published.
    pub fn latest(&self) -> Option<ReferenceLines> {
        self.slot.lock().lines.clone()
    }

    /// Block until a snapshot exists, then return it.
    ///
    /// Returns `None` if the cell is closed while still empty.
    pub fn wait(&self) -> Option<ReferenceLines> {
        let mut slot = self.slot.lock();
        loop {
            if let Some(lines) = &slot.lines {
                return Some(Arc::clone(lines));
            }
            if slot.closed {
                return None;
            }
            self.published.wait(&mut slot);
        }
    }

    /// Like [`wait`](Self::wait) but gives up after `timeout`.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<ReferenceLines> {
        let deadline = Instant::now() + timeout;
        let mut slot = self.slot.lock();
        loop {
            if let Some(lines) = &slot.lines {
                return Some(Arc::clone(lines));
            }
            if slot.closed {
                return None;
            }
            if self.published.wait_until(&mut slot, deadline).timed_out() {
                return slot.lines.clone();
            }
        }
    }

    /// Release all waiters; an empty cell stays empty.
    pub fn close(&self) {
        self.slot.lock().closed = true;
        self.published.notify_all();
    }

    /// Drop the current snapshot and accept waiters again.
    ///
    /// The sequence counter keeps counting.
    pub fn reset(&self) {
        let mut slot = self.slot.lock();
        slot.lines = None;
        slot.closed = false;
    }

    /// Whether [`close`](Self::close) was called since the last reset.
    pub fn is_closed(&self) -> bool {
        self.slot.lock().closed
    }

    /// Number of publications so far.
    pub fn sequence(&self) -> u64 {
        self.slot.lock().sequence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Point2D;
    use crate::map::SegmentId;
    use std::sync::mpsc;
    use std::thread;

    fn entry(id: &str) -> ReferenceLineEntry {
        let points = vec![Point2D::new(0.0, 0.0), Point2D::new(10.0, 0.0)];
        ReferenceLineEntry {
            line: ReferenceLine::from_points(points.clone()),
            segment: RouteSegment::new(SegmentId::new(id), id, 0.0, points, true),
        }
    }

    #[test]
    fn test_empty_cell() {
        let cell = SnapshotCell::new();
        assert!(cell.latest().is_none());
        assert_eq!(cell.sequence(), 0);
        assert!(cell.wait_timeout(Duration::from_millis(10)).is_none());
    }

    #[test]
    fn test_publish_replaces_whole_snapshot() {
        let cell = SnapshotCell::new();
        cell.publish(vec![entry("a"), entry("b")]);
        let first = cell.latest().unwrap();

        cell.publish(vec![entry("c")]);
        let second = cell.latest().unwrap();

        assert_eq!(first.len(), 2); // old readers keep their snapshot
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].segment.id().as_str(), "c");
        assert_eq!(cell.sequence(), 2);
    }

    #[test]
    fn test_wait_blocks_until_publish() {
        let cell = Arc::new(SnapshotCell::new());
        let (tx, rx) = mpsc::channel();

        let reader = {
            let cell = Arc::clone(&cell);
            thread::spawn(move || {
                let lines = cell.wait().unwrap();
                tx.send(lines.len()).unwrap();
            })
        };

        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

        cell.publish(vec![entry("a")]);
        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), 1);
        reader.join().unwrap();
    }

    #[test]
    fn test_close_releases_waiters_on_empty_cell() {
        let cell = Arc::new(SnapshotCell::new());
        let reader = {
            let cell = Arc::clone(&cell);
            thread::spawn(move || cell.wait())
        };

        thread::sleep(Duration::from_millis(50));
        cell.close();
        assert!(reader.join().unwrap().is_none());
        assert!(cell.is_closed());
    }

    #[test]
    fn test_closed_cell_still_serves_last_snapshot() {
        let cell = SnapshotCell::new();
        cell.publish(vec![entry("a")]);
        cell.close();
        assert_eq!(cell.wait().unwrap().len(), 1);

        cell.reset();
        assert!(!cell.is_closed());
        assert!(cell.latest().is_none());
        assert_eq!(cell.sequence(), 1);
    }
}
