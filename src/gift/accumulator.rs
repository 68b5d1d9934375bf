/// Remaining stream time, in whole seconds.
///
/// Mutated only by crediting gift contributions and by the once-per-second
/// countdown tick; owned by a single session task, so both always commute.
#[derive(Debug, Clone)]
pub struct TimeAccumulator {
    balance: u64,
}

impl TimeAccumulator {
    pub fn new(initial_seconds: u64) -> Self {
        Self {
            balance: initial_seconds,
        }
    }

    /// Adds credited seconds. Zero is a valid no-op; the balance caps at
    /// `u64::MAX` rather than wrapping.
    pub fn credit(&mut self, seconds: u64) {
        self.balance = self.balance.saturating_add(seconds);
    }

    /// One countdown step; the balance never goes below zero.
    pub fn tick(&mut self) {
        self.balance = self.balance.saturating_sub(1);
    }

    pub fn read(&self) -> u64 {
        self.balance
    }

    /// Formats the balance as `HH:MM:SS`, or `MM:SS` under an hour.
    pub fn format_clock(&self) -> String {
        let h = self.balance / 3600;
        let m = (self.balance % 3600) / 60;
        let s = self.balance % 60;

        if h > 0 {
            format!("{h:02}:{m:02}:{s:02}")
        } else {
            format!("{m:02}:{s:02}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_floor_at_zero() {
        let mut acc = TimeAccumulator::new(2);
        for _ in 0..5 {
            acc.tick();
        }
        assert_eq!(acc.read(), 0);
    }

    #[test]
    fn credit_and_tick_interleave_without_going_negative() {
        let mut acc = TimeAccumulator::new(0);
        acc.tick();
        acc.credit(3);
        acc.tick();
        acc.tick();
        acc.tick();
        acc.tick();
        acc.credit(10);
        assert_eq!(acc.read(), 10);
    }

    #[test]
    fn zero_credit_is_a_noop() {
        let mut acc = TimeAccumulator::new(60);
        acc.credit(0);
        assert_eq!(acc.read(), 60);
    }

    #[test]
    fn credit_saturates_at_the_ceiling() {
        let mut acc = TimeAccumulator::new(u64::MAX - 1);
        acc.credit(10);
        assert_eq!(acc.read(), u64::MAX);
        acc.tick();
        assert_eq!(acc.read(), u64::MAX - 1);
    }

    #[test]
    fn clock_formatting() {
        assert_eq!(TimeAccumulator::new(3661).format_clock(), "01:01:01");
        assert_eq!(TimeAccumulator::new(3600).format_clock(), "01:00:00");
        assert_eq!(TimeAccumulator::new(59).format_clock(), "00:59");
        assert_eq!(TimeAccumulator::new(0).format_clock(), "00:00");
        assert_eq!(TimeAccumulator::new(366100).format_clock(), "101:41:40");
    }
}
