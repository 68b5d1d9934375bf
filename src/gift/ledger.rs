use std::collections::HashMap;

/// Tracks, per combo series, the highest repeat count already credited.
///
/// Combo gifts arrive as a cumulative counter with repeated "still
/// accumulating" notifications; only the increase since the last
/// notification is genuinely new, so crediting is strictly incremental,
/// never absolute. Retired series keep a tombstone with their final count
/// for a suppression window, so a late duplicate of the terminal
/// notification does not re-credit the whole series.
#[derive(Debug, Default)]
pub struct ComboLedger {
    live: HashMap<String, u64>,
    tombstones: HashMap<String, u64>,
}

impl ComboLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many gift units of this notification are new, and
    /// records the counter when the delta is positive.
    ///
    /// An unseen `combo_id` counts from zero unless a tombstone for it
    /// still exists, in which case it counts from the tombstone.
    pub fn credit_delta(&mut self, combo_id: &str, repeat_count: u64) -> u64 {
        let last = self
            .live
            .get(combo_id)
            .or_else(|| self.tombstones.get(combo_id))
            .copied()
            .unwrap_or(0);

        let delta = repeat_count.saturating_sub(last);
        if delta > 0 {
            self.live.insert(combo_id.to_string(), repeat_count);
        }

        delta
    }

    /// Moves a finished series to its tombstone. Invoked when the grace
    /// period elapses; idempotent, and safe when a later notification has
    /// re-created the live entry in the interim. Returns whether an entry
    /// was actually retired, so the caller schedules at most one
    /// suppression timer per retirement.
    pub fn retire(&mut self, combo_id: &str) -> bool {
        match self.live.remove(combo_id) {
            Some(count) => {
                let slot = self.tombstones.entry(combo_id.to_string()).or_insert(0);
                *slot = (*slot).max(count);
                true
            }
            None => false,
        }
    }

    /// Drops a retired series entirely once its suppression window ends.
    /// A duplicate arriving after this point counts from zero again.
    pub fn forget(&mut self, combo_id: &str) {
        self.tombstones.remove(combo_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_notification_credits_full_count() {
        let mut ledger = ComboLedger::new();
        assert_eq!(ledger.credit_delta("c1", 3), 3);
    }

    #[test]
    fn deltas_are_incremental_across_a_series() {
        let mut ledger = ComboLedger::new();
        let total: u64 = [1, 3, 3, 5, 9]
            .into_iter()
            .map(|n| ledger.credit_delta("c1", n))
            .sum();

        // Intermediate duplicates contribute nothing; the sum is just the
        // final counter.
        assert_eq!(total, 9);
    }

    #[test]
    fn non_increasing_counter_credits_zero() {
        let mut ledger = ComboLedger::new();
        ledger.credit_delta("c1", 5);
        assert_eq!(ledger.credit_delta("c1", 5), 0);
        assert_eq!(ledger.credit_delta("c1", 2), 0);
        // A stale counter must not lower the recorded high-water mark.
        assert_eq!(ledger.credit_delta("c1", 6), 1);
    }

    #[test]
    fn independent_series_do_not_interfere() {
        let mut ledger = ComboLedger::new();
        ledger.credit_delta("c1", 4);
        assert_eq!(ledger.credit_delta("c2", 4), 4);
    }

    #[test]
    fn tombstone_suppresses_late_duplicate_terminal() {
        let mut ledger = ComboLedger::new();
        ledger.credit_delta("c1", 7);
        ledger.retire("c1");

        assert_eq!(ledger.credit_delta("c1", 7), 0);
        // The tombstone still anchors the counter; only growth credits.
        assert_eq!(ledger.credit_delta("c1", 9), 2);
    }

    #[test]
    fn forgotten_series_re_credits_in_full() {
        // Documented residual over-credit: once the tombstone is gone, a
        // late duplicate looks like a brand-new series.
        let mut ledger = ComboLedger::new();
        ledger.credit_delta("c1", 7);
        ledger.retire("c1");
        ledger.forget("c1");

        assert_eq!(ledger.credit_delta("c1", 7), 7);
    }

    #[test]
    fn retire_is_idempotent_and_keeps_highest_count() {
        let mut ledger = ComboLedger::new();
        ledger.credit_delta("c1", 3);
        assert!(ledger.retire("c1"));
        assert!(!ledger.retire("c1"));

        // Series resumes above its tombstone, then retires again.
        assert_eq!(ledger.credit_delta("c1", 5), 2);
        assert!(ledger.retire("c1"));
        assert_eq!(ledger.credit_delta("c1", 5), 0);
    }
}
