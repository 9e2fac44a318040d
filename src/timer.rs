/// Countdown for a single round, kept in tenths of a time unit so ticks never drift
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoundTimer {
    initial_tenths: u32,
    remaining_tenths: u32,
}

impl RoundTimer {
    /// A timer starting at `initial` whole time units
    pub fn new(initial: u32) -> Self {
        Self::from_tenths(initial.saturating_mul(10))
    }

    pub fn from_tenths(initial_tenths: u32) -> Self {
        Self {
            initial_tenths,
            remaining_tenths: initial_tenths,
        }
    }

    /// Count down by `delta_tenths`, clamping at zero.
    ///
    /// Returns true only for the tick that takes the timer to zero, so the
    /// caller acts on expiry once no matter how many ticks follow.
    pub fn tick(&mut self, delta_tenths: u32) -> bool {
        if self.is_expired() {
            return false;
        }
        self.remaining_tenths = self.remaining_tenths.saturating_sub(delta_tenths);
        self.is_expired()
    }

    pub fn is_expired(&self) -> bool {
        self.remaining_tenths == 0
    }

    pub fn reset(&mut self) {
        self.remaining_tenths = self.initial_tenths;
    }

    /// Remaining time in whole units, for display
    pub fn remaining(&self) -> f64 {
        f64::from(self.remaining_tenths) / 10.0
    }

    pub fn remaining_tenths(&self) -> u32 {
        self.remaining_tenths
    }

    /// Fraction of the countdown left, 1.0 when fresh
    pub fn ratio(&self) -> f64 {
        if self.initial_tenths == 0 {
            return 0.0;
        }
        f64::from(self.remaining_tenths) / f64::from(self.initial_tenths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_timer() {
        let timer = RoundTimer::new(40);
        assert_eq!(timer.remaining(), 40.0);
        assert_eq!(timer.remaining_tenths(), 400);
        assert!(!timer.is_expired());
        assert_eq!(timer.ratio(), 1.0);
    }

    #[test]
    fn test_tick_decrements_exactly() {
        let mut timer = RoundTimer::new(40);
        for _ in 0..5 {
            timer.tick(1);
        }
        assert_eq!(timer.remaining(), 39.5);
    }

    #[test]
    fn test_expiry_edge_fires_once() {
        let mut timer = RoundTimer::new(40);
        let edges = (0..1000).filter(|_| timer.tick(1)).count();
        assert_eq!(edges, 1);
        assert!(timer.is_expired());
        assert_eq!(timer.remaining(), 0.0);
    }

    #[test]
    fn test_expiry_on_exactly_400_ticks() {
        let mut timer = RoundTimer::new(40);
        for _ in 0..399 {
            assert!(!timer.tick(1));
        }
        assert!(timer.tick(1));
        assert!(timer.is_expired());
    }

    #[test]
    fn test_tick_clamps_at_zero() {
        let mut timer = RoundTimer::from_tenths(3);
        assert!(timer.tick(10));
        assert_eq!(timer.remaining_tenths(), 0);
        assert!(!timer.tick(10));
        assert_eq!(timer.remaining_tenths(), 0);
    }

    #[test]
    fn test_reset_rearms_expiry() {
        let mut timer = RoundTimer::from_tenths(1);
        assert!(timer.tick(1));
        timer.reset();
        assert!(!timer.is_expired());
        assert_eq!(timer.remaining_tenths(), 1);
        assert!(timer.tick(1));
    }

    #[test]
    fn test_zero_length_timer_is_expired_without_edge() {
        let mut timer = RoundTimer::new(0);
        assert!(timer.is_expired());
        assert!(!timer.tick(1));
        assert_eq!(timer.ratio(), 0.0);
    }
}
