//! Signal progress tracker
//!
//! Integer meter raised by hidden-station discoveries. Never decreases within
//! a run and saturates silently at [`MAX_SIGNAL`].

use serde::{Deserialize, Serialize};

pub use crate::consts::MAX_SIGNAL;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalMeter {
    level: u8,
}

impl SignalMeter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn is_saturated(&self) -> bool {
        self.level >= MAX_SIGNAL
    }

    /// Raise by one. Returns the new level, or `None` when already saturated.
    pub fn gain(&mut self) -> Option<u8> {
        if self.is_saturated() {
            return None;
        }
        self.level += 1;
        Some(self.level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_saturates_at_six() {
        let mut meter = SignalMeter::new();
        for expected in 1..=MAX_SIGNAL {
            assert_eq!(meter.gain(), Some(expected));
        }
        assert!(meter.is_saturated());
        assert_eq!(meter.gain(), None);
        assert_eq!(meter.level(), 6);
    }

    proptest! {
        #[test]
        fn prop_monotonic_and_bounded(gains in 0usize..40) {
            let mut meter = SignalMeter::new();
            let mut last = meter.level();
            for _ in 0..gains {
                meter.gain();
                prop_assert!(meter.level() >= last);
                prop_assert!(meter.level() <= MAX_SIGNAL);
                last = meter.level();
            }
            prop_assert_eq!(meter.level() as usize, gains.min(MAX_SIGNAL as usize));
        }
    }
}
