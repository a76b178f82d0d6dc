use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::util::Timestamp;

fn now_micros() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros() as u64
}

/// Wall clock that never hands out the same reading twice.
///
/// Readings follow system time in microseconds, but each one is at least one
/// microsecond past the previous, so a stalled or stepped-back system clock
/// cannot produce equal or inverted timestamps.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    last: AtomicU64,
}

impl MonotonicClock {
    pub fn new() -> Self {
        MonotonicClock {
            last: AtomicU64::new(0),
        }
    }

    pub fn tick(&self) -> Timestamp {
        let now = now_micros();
        loop {
            let current = self.last.load(Ordering::SeqCst);
            let next = now.max(current + 1);
            if self
                .last
                .compare_exchange_weak(current, next, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return Timestamp::from_micros(next);
            }
        }
    }

    /// Last timestamp handed out, or zero before the first tick.
    pub fn last(&self) -> Timestamp {
        Timestamp::from_micros(self.last.load(Ordering::SeqCst))
    }
}
