use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::time::Duration;

pub const NANOS_PER_SECOND: u64 = 1_000_000_000;
pub const NANOS_PER_MILLI: u64 = 1_000_000;
pub const NANOS_PER_MICRO: u64 = 1_000;

pub type UnitType = u64;
pub const UNITS_PER_SECOND: UnitType = NANOS_PER_SECOND as UnitType;
pub const UNITS_PER_MILLI: UnitType = NANOS_PER_MILLI as UnitType;

///! Elapsed time with nanosecond resolution
#[derive(Debug, PartialOrd, Ord, PartialEq, Eq, Clone, Copy, Default)]
pub struct ClockTime(UnitType);

impl ClockTime {
  pub fn zero() -> ClockTime {
    ClockTime(0)
  }

  pub fn new(units: UnitType) -> ClockTime {
    ClockTime(units)
  }

  pub fn from_millis(millis: u64) -> ClockTime {
    ClockTime(millis.saturating_mul(UNITS_PER_MILLI))
  }

  pub fn from_millis_f64(millis: f64) -> ClockTime {
    if millis <= 0.0 {
      ClockTime::zero()
    } else {
      ClockTime((millis * UNITS_PER_MILLI as f64).round() as UnitType)
    }
  }

  pub fn from_seconds(seconds: f64) -> ClockTime {
    ClockTime::from_millis_f64(seconds * 1000.0)
  }

  pub fn units(&self) -> UnitType {
    self.0
  }

  pub fn to_millis(&self) -> u64 {
    self.0 / UNITS_PER_MILLI
  }

  pub fn to_millis_f64(&self) -> f64 {
    self.0 as f64 / UNITS_PER_MILLI as f64
  }

  pub fn to_seconds(&self) -> f64 {
    self.0 as f64 / UNITS_PER_SECOND as f64
  }

  /// Time it takes to play this span at `factor` times the nominal speed.
  pub fn scaled(&self, factor: f64) -> ClockTime {
    if (factor - 1.0).abs() < std::f64::EPSILON {
      *self
    } else {
      ClockTime((self.0 as f64 / factor).round() as UnitType)
    }
  }
}

impl Add for ClockTime {
  type Output = ClockTime;

  fn add(self, rhs: ClockTime) -> ClockTime {
    ClockTime(self.0.saturating_add(rhs.0))
  }
}

impl AddAssign for ClockTime {
  fn add_assign(&mut self, rhs: ClockTime) {
    *self = *self + rhs;
  }
}

impl Sub for ClockTime {
  type Output = ClockTime;

  fn sub(self, rhs: ClockTime) -> ClockTime {
    ClockTime(self.0.saturating_sub(rhs.0))
  }
}

impl SubAssign for ClockTime {
  fn sub_assign(&mut self, rhs: ClockTime) {
    *self = *self - rhs;
  }
}

impl From<ClockTime> for Duration {
  fn from(item: ClockTime) -> Self {
    Duration::from_nanos(item.0)
  }
}

#[cfg(test)]
mod test {
  use super::ClockTime;
  use std::time::Duration;

  #[test]
  pub fn clock_time_new() {
    let time = ClockTime::new(15);
    assert_eq!(time.units(), 15);
  }

  #[test]
  pub fn clock_time_zero() {
    let time = ClockTime::zero();
    assert_eq!(time.units(), 0);
  }

  #[test]
  pub fn clock_time_millis() {
    assert_eq!(ClockTime::from_millis(1500).to_millis(), 1500);
    assert_eq!(ClockTime::from_millis_f64(2.5).units(), 2_500_000);
    assert_eq!(ClockTime::from_millis_f64(-3.0), ClockTime::zero());
    assert_eq!(ClockTime::from_seconds(0.25).to_millis(), 250);
  }

  #[test]
  pub fn clock_time_add() {
    let mut time = ClockTime::new(15) + ClockTime::new(5);
    assert_eq!(time, ClockTime::new(20));
    time += ClockTime::new(5);
    assert_eq!(time, ClockTime::new(25));
  }

  #[test]
  pub fn clock_time_sub_saturates() {
    assert_eq!(ClockTime::new(15) - ClockTime::new(5), ClockTime::new(10));
    assert_eq!(ClockTime::new(5) - ClockTime::new(15), ClockTime::zero());
  }

  #[test]
  pub fn clock_time_scaled() {
    let time = ClockTime::from_millis(1500);
    assert_eq!(time.scaled(1.0), time);
    assert_eq!(time.scaled(2.0).to_millis(), 750);
    assert_eq!(time.scaled(0.5).to_millis(), 3000);
  }

  #[test]
  pub fn clock_time_into_duration() {
    let duration: Duration = ClockTime::from_millis(42).into();
    assert_eq!(duration, Duration::from_millis(42));
  }
}
