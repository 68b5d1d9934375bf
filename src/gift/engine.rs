use tracing::debug;

use crate::gift::accumulator::TimeAccumulator;
use crate::gift::event::{GiftEvent, RawGiftEvent, ValidationError};
use crate::gift::ledger::ComboLedger;

/// Result of feeding one raw notification through the aggregation pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// Seconds actually added to the balance; zero for duplicate or
    /// non-increasing combo counters.
    pub credited: u64,
    pub sender_name: String,
    /// Set when this was a combo's terminal notification; the caller must
    /// schedule the series' retirement after the grace period.
    pub finished_combo: Option<String>,
}

/// Orchestrates Normalizer -> Combo Ledger -> Time Accumulator for one
/// session. Owns both pieces of mutable state; callers are expected to
/// invoke it from a single task so same-series notifications apply in
/// arrival order.
#[derive(Debug)]
pub struct AggregationEngine {
    ledger: ComboLedger,
    accumulator: TimeAccumulator,
}

impl AggregationEngine {
    pub fn new(initial_seconds: u64) -> Self {
        Self {
            ledger: ComboLedger::new(),
            accumulator: TimeAccumulator::new(initial_seconds),
        }
    }

    /// Applies one raw gift notification.
    ///
    /// A validation failure propagates without touching any state. A
    /// zero contribution changes nothing and must not surface a display
    /// effect; `credited` in the returned outcome tells the caller which
    /// case occurred.
    pub fn process(&mut self, raw: &RawGiftEvent) -> Result<Outcome, ValidationError> {
        let gift = GiftEvent::normalize(raw)?;

        // Both factors come straight off the wire, so the contribution
        // saturates instead of overflowing on absurd values.
        let credited = if gift.is_combo {
            self.ledger
                .credit_delta(&gift.combo_id, gift.repeat_count)
                .saturating_mul(gift.coin_value)
        } else {
            // Non-combo gifts are single-shot: every notification is an
            // independent gift, so the whole value counts every time.
            gift.coin_value.saturating_mul(gift.repeat_count)
        };

        // The terminal flag matters even when the counter itself was a
        // duplicate and credited nothing.
        let finished_combo = (gift.is_combo && gift.is_finished).then(|| gift.combo_id.clone());

        if credited > 0 {
            self.accumulator.credit(credited);
            debug!(
                sender = %gift.sender_name,
                credited,
                balance = self.accumulator.read(),
                "credited gift"
            );
        }

        Ok(Outcome {
            credited,
            sender_name: gift.sender_name,
            finished_combo,
        })
    }

    /// One countdown step; returns the new balance.
    pub fn tick(&mut self) -> u64 {
        self.accumulator.tick();
        self.accumulator.read()
    }

    pub fn balance(&self) -> u64 {
        self.accumulator.read()
    }

    pub fn format_clock(&self) -> String {
        self.accumulator.format_clock()
    }

    /// Grace period elapsed for a finished series. Returns whether a live
    /// entry was actually retired.
    pub fn retire_combo(&mut self, combo_id: &str) -> bool {
        self.ledger.retire(combo_id)
    }

    /// Suppression window elapsed for a retired series.
    pub fn forget_combo(&mut self, combo_id: &str) {
        self.ledger.forget(combo_id);
    }
}
