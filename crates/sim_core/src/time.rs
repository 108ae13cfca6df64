/// Durations in Q32.32 fixed-point microseconds.
///
/// Game timers are configured in milliseconds and counted in ticks; this
/// converts between the two without float drift.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Micros(u64);

impl Micros {
    const FRAC_BITS: u32 = 32;
    const PER_SEC: u64 = 1_000_000;

    pub const ZERO: Self = Self(0);

    /// Saturates past roughly 4294 seconds.
    pub const fn from_millis(millis: u32) -> Self {
        let micros = millis as u64 * 1_000;
        if micros > u64::MAX >> Self::FRAC_BITS {
            return Self(u64::MAX);
        }
        Self(micros << Self::FRAC_BITS)
    }

    /// Negative counts become zero.
    pub fn from_millis_clamped(millis: i64) -> Self {
        Self::from_millis(millis.clamp(0, i64::from(u32::MAX)) as u32)
    }

    /// Whole ticks that fit in this duration at `tick_hz`. Rounds down.
    pub const fn to_ticks(self, tick_hz: u32) -> u64 {
        let scaled = self.0 as u128 * tick_hz as u128;
        (scaled / ((Self::PER_SEC as u128) << Self::FRAC_BITS)) as u64
    }

    /// Length of one tick at `tick_hz`; zero for a rate of zero.
    pub const fn tick_period(tick_hz: u32) -> Self {
        if tick_hz == 0 {
            return Self::ZERO;
        }
        Self((Self::PER_SEC << Self::FRAC_BITS) / tick_hz as u64)
    }

    pub fn as_secs_f32(self) -> f32 {
        (self.0 as f64 / (Self::PER_SEC << Self::FRAC_BITS) as f64) as f32
    }
}

impl core::ops::Add for Micros {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millis_to_ticks_at_sixty_hz() {
        // first spawn delay
        assert_eq!(Micros::from_millis(2_000).to_ticks(60), 120);
        // message lifetime
        assert_eq!(Micros::from_millis(3_000).to_ticks(60), 180);
        // base fire period
        assert_eq!(Micros::from_millis(500).to_ticks(60), 30);
        // spawn interval floor
        assert_eq!(Micros::from_millis(500).to_ticks(30), 15);
    }

    #[test]
    fn partial_ticks_round_down() {
        assert_eq!(Micros::from_millis(20).to_ticks(60), 1);
        assert_eq!(Micros::from_millis(10).to_ticks(60), 0);
    }

    #[test]
    fn clamped_millis() {
        assert_eq!(Micros::from_millis_clamped(-40), Micros::ZERO);
        assert_eq!(Micros::from_millis_clamped(250), Micros::from_millis(250));
        assert_eq!(Micros::from_millis_clamped(i64::MAX), Micros::from_millis(u32::MAX));
        assert!(Micros::from_millis(u32::MAX) > Micros::from_millis(4_000_000));
    }

    #[test]
    fn tick_period_and_sum() {
        let period = Micros::tick_period(60);
        assert!((period.as_secs_f32() - 1.0 / 60.0).abs() < 1e-6);
        assert_eq!(Micros::tick_period(0), Micros::ZERO);

        let second = Micros::from_millis(1_000);
        assert_eq!((second + second).to_ticks(60), 120);
    }
}
