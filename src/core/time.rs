/*!
 * Simulated Time
 * Fixed-point simulated time shared by the clock, scheduler and reports
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub};

/// Milli-units per simulated time unit
pub const MILLIS_PER_UNIT: u64 = 1_000;

/// A point in (or span of) simulated time, stored as milli-units.
///
/// One unit is the scheduler's notion of "one second of burst". Integer
/// storage keeps preemption comparisons exact, so an arriving burst equal to
/// the running process's remaining time is reliably a tie.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimTime(u64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);

    /// Whole simulated units, saturating at the largest representable time
    #[inline]
    pub const fn from_units(units: u64) -> Self {
        SimTime(units.saturating_mul(MILLIS_PER_UNIT))
    }

    #[inline]
    pub const fn from_millis(millis: u64) -> Self {
        SimTime(millis)
    }

    /// Fractional units, rounded to the nearest milli-unit
    pub fn from_units_f64(units: f64) -> Option<Self> {
        if !units.is_finite() || units < 0.0 {
            return None;
        }
        let millis = (units * MILLIS_PER_UNIT as f64).round();
        if millis > u64::MAX as f64 {
            return None;
        }
        Some(SimTime(millis as u64))
    }

    #[inline]
    pub const fn as_millis(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn as_units_f64(self) -> f64 {
        self.0 as f64 / MILLIS_PER_UNIT as f64
    }

    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn saturating_sub(self, other: SimTime) -> SimTime {
        SimTime(self.0.saturating_sub(other.0))
    }

    #[inline]
    pub fn checked_sub(self, other: SimTime) -> Option<SimTime> {
        self.0.checked_sub(other.0).map(SimTime)
    }
}

impl Add for SimTime {
    type Output = SimTime;

    #[inline]
    fn add(self, rhs: SimTime) -> SimTime {
        SimTime(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for SimTime {
    #[inline]
    fn add_assign(&mut self, rhs: SimTime) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

/// Saturates at zero; simulated time never goes negative
impl Sub for SimTime {
    type Output = SimTime;

    #[inline]
    fn sub(self, rhs: SimTime) -> SimTime {
        self.saturating_sub(rhs)
    }
}

impl std::iter::Sum for SimTime {
    fn sum<I: Iterator<Item = SimTime>>(iter: I) -> SimTime {
        iter.fold(SimTime::ZERO, Add::add)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / MILLIS_PER_UNIT;
        let frac = self.0 % MILLIS_PER_UNIT;
        if frac == 0 {
            write!(f, "{}", whole)
        } else {
            let digits = format!("{:03}", frac);
            write!(f, "{}.{}", whole, digits.trim_end_matches('0'))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_units_saturates() {
        assert_eq!(SimTime::from_units(u64::MAX), SimTime::from_millis(u64::MAX));
        assert_eq!(SimTime::from_units(3), SimTime::from_millis(3_000));
    }

    #[test]
    fn test_display() {
        assert_eq!(SimTime::from_units(4).to_string(), "4");
        assert_eq!(SimTime::from_millis(4_500).to_string(), "4.5");
        assert_eq!(SimTime::from_millis(250).to_string(), "0.25");
        assert_eq!(SimTime::ZERO.to_string(), "0");
    }

    #[test]
    fn test_from_units_f64() {
        assert_eq!(SimTime::from_units_f64(2.5), Some(SimTime::from_millis(2_500)));
        assert_eq!(SimTime::from_units_f64(0.0), Some(SimTime::ZERO));
        assert_eq!(SimTime::from_units_f64(-1.0), None);
        assert_eq!(SimTime::from_units_f64(f64::NAN), None);
        assert_eq!(SimTime::from_units_f64(f64::INFINITY), None);
    }

    #[test]
    fn test_subtraction_saturates() {
        let small = SimTime::from_units(1);
        let large = SimTime::from_units(3);
        assert_eq!(small - large, SimTime::ZERO);
        assert_eq!(large - small, SimTime::from_units(2));
        assert_eq!(small.checked_sub(large), None);
    }

    #[test]
    fn test_sum() {
        let total: SimTime = [1, 2, 3].into_iter().map(SimTime::from_units).sum();
        assert_eq!(total, SimTime::from_units(6));
    }
}
