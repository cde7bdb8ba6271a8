//! Per-subscriber delivery statistics

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::Instant;

#[derive(Debug)]
pub struct SubscriberStatistics {
    events_sent: AtomicUsize,
    events_dropped: AtomicUsize,
    last_event_time: RwLock<Option<Instant>>,
}

impl Default for SubscriberStatistics {
    fn default() -> Self {
        Self::new()
    }
}

impl SubscriberStatistics {
    pub fn new() -> Self {
        Self {
            events_sent: AtomicUsize::new(0),
            events_dropped: AtomicUsize::new(0),
            last_event_time: RwLock::new(None),
        }
    }

    pub fn events_sent(&self) -> usize {
        self.events_sent.load(Ordering::Relaxed)
    }

    pub fn record_event_sent(&self) {
        self.events_sent.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut time) = self.last_event_time.write() {
            *time = Some(Instant::now());
        }
    }

    /// Events the filter rejected
    pub fn events_dropped(&self) -> usize {
        self.events_dropped.load(Ordering::Relaxed)
    }

    pub fn record_event_dropped(&self) {
        self.events_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn last_event_time(&self) -> Option<Instant> {
        *self.last_event_time.read().ok()?
    }
}
