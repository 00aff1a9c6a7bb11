use std::sync::atomic::{AtomicI64, Ordering};

/// Creation-time based ids that never repeat within a process, even when two
/// donations arrive in the same millisecond or the clock steps back.
#[derive(Debug, Default)]
pub struct DonationIdGenerator {
    last: AtomicI64,
}

impl DonationIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later id larger than `id`.
    pub fn observe(&self, id: i64) {
        self.last.fetch_max(id, Ordering::Relaxed);
    }

    pub fn next(&self, now_ms: i64) -> i64 {
        let mut current = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now_ms.max(current + 1);
            match self.last.compare_exchange_weak(
                current,
                candidate,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return candidate,
                Err(actual) => current = actual,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uses_clock_when_ahead() {
        let ids = DonationIdGenerator::new();
        assert_eq!(ids.next(1_000), 1_000);
        assert_eq!(ids.next(2_000), 2_000);
    }

    #[test]
    fn test_same_millisecond_and_clock_skew() {
        let ids = DonationIdGenerator::new();
        assert_eq!(ids.next(1_000), 1_000);
        assert_eq!(ids.next(1_000), 1_001);
        assert_eq!(ids.next(900), 1_002);
    }

    #[test]
    fn test_observed_id_wins_over_clock() {
        let ids = DonationIdGenerator::new();
        ids.observe(5_000);
        assert_eq!(ids.next(1_000), 5_001);
        ids.observe(10);
        assert_eq!(ids.next(1_000), 5_002);
    }
}
