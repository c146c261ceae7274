//! Helpers for configuration values.

use std::cmp;

//------------ DefMinMax -----------------------------------------------------

/// The default, minimum, and maximum values for a config variable.
///
/// Configuration types keep their fields private and run every value handed
/// to a setter through [`limit`][Self::limit], so a config can never hold a
/// value outside of the supported range.
#[derive(Clone, Copy, Debug)]
pub struct DefMinMax<T> {
    /// The default value,
    def: T,

    /// The minimum value,
    min: T,

    /// The maximum value,
    max: T,
}

impl<T> DefMinMax<T> {
    /// Creates a new value.
    pub const fn new(def: T, min: T, max: T) -> Self {
        Self { def, min, max }
    }

    /// Returns the default value.
    pub fn default(self) -> T {
        self.def
    }

    /// Trims the given value to fit into the minimum/maximum range.
    pub fn limit(self, value: T) -> T
    where
        T: Ord,
    {
        cmp::max(self.min, cmp::min(self.max, value))
    }
}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::DefMinMax;
    use std::time::Duration;

    #[test]
    fn limit() {
        const ATTEMPTS: DefMinMax<u8> = DefMinMax::new(2, 1, 10);
        assert_eq!(ATTEMPTS.default(), 2);
        assert_eq!(ATTEMPTS.limit(0), 1);
        assert_eq!(ATTEMPTS.limit(7), 7);
        assert_eq!(ATTEMPTS.limit(200), 10);

        const TIMEOUT: DefMinMax<Duration> = DefMinMax::new(
            Duration::from_secs(5),
            Duration::from_millis(1),
            Duration::from_secs(60),
        );
        assert_eq!(TIMEOUT.limit(Duration::ZERO), Duration::from_millis(1));
        assert_eq!(
            TIMEOUT.limit(Duration::from_secs(61)),
            Duration::from_secs(60)
        );
    }
}
