//! Insert timestamps that never run backwards.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

/// Issues seconds-since-epoch timestamps for insert batches.
///
/// Each call returns `max(wall clock, last issued)`, so batches stamped in
/// sequence by one process are non-decreasing even if the system clock steps
/// back.
#[derive(Debug, Default)]
pub struct BatchClock {
    last: AtomicI64,
}

impl BatchClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stamp(&self) -> i64 {
        self.stamp_at(Utc::now().timestamp())
    }

    fn stamp_at(&self, now: i64) -> i64 {
        let previous = self.last.fetch_max(now, Ordering::SeqCst);
        previous.max(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stamp_tracks_wall_clock() {
        let clock = BatchClock::new();
        let before = Utc::now().timestamp();
        let ts = clock.stamp();
        assert!(ts >= before);
        assert!(ts <= Utc::now().timestamp());
    }

    #[test]
    fn test_stamp_never_goes_backwards() {
        let clock = BatchClock::new();
        assert_eq!(clock.stamp_at(1_000), 1_000);
        assert_eq!(clock.stamp_at(990), 1_000);
        assert_eq!(clock.stamp_at(1_005), 1_005);
    }
}
