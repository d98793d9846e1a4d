use std::{
  cmp::{min, Ordering},
  fmt,
  ops::{Add, AddAssign, Sub, SubAssign},
};

use crate::time::{clock, ClockTime, Division, Tempo};

/// Position in ticks from the start of the sequence.
#[derive(Debug, Eq, Copy, Clone, Hash, Default)]
pub struct TicksTime(u64);

impl TicksTime {
  pub fn new(ticks: u64) -> TicksTime {
    TicksTime(ticks)
  }

  pub fn zero() -> TicksTime {
    TicksTime(0)
  }

  pub fn units(&self) -> u64 {
    self.0
  }

  /// Duration of this amount of ticks when the whole span runs at one tempo.
  pub fn to_clock(&self, division: Division, tempo: Tempo) -> ClockTime {
    let nanos = u128::from(self.0)
      * u128::from(tempo.micros_per_quarter())
      * u128::from(clock::NANOS_PER_MICRO)
      / u128::from(division.ticks_per_quarter());
    ClockTime::new(nanos as u64)
  }
}

impl Ord for TicksTime {
  fn cmp(&self, other: &TicksTime) -> Ordering {
    self.0.cmp(&other.0)
  }
}

impl PartialOrd for TicksTime {
  fn partial_cmp(&self, other: &TicksTime) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl PartialEq for TicksTime {
  fn eq(&self, other: &TicksTime) -> bool {
    self.0 == other.0
  }
}

impl Add for TicksTime {
  type Output = TicksTime;
  fn add(self, rhs: TicksTime) -> Self {
    TicksTime::new(self.0.saturating_add(rhs.0))
  }
}

impl AddAssign for TicksTime {
  fn add_assign(&mut self, rhs: TicksTime) {
    *self = *self + rhs;
  }
}

impl Sub for TicksTime {
  type Output = TicksTime;
  fn sub(self, rhs: TicksTime) -> Self {
    TicksTime::new(self.0 - min(self.0, rhs.0))
  }
}

impl SubAssign for TicksTime {
  fn sub_assign(&mut self, rhs: TicksTime) {
    *self = *self - rhs;
  }
}

impl From<u64> for TicksTime {
  fn from(ticks: u64) -> Self {
    TicksTime(ticks)
  }
}

impl From<TicksTime> for f64 {
  fn from(item: TicksTime) -> Self {
    item.0 as f64
  }
}

impl From<TicksTime> for u64 {
  fn from(item: TicksTime) -> Self {
    item.0
  }
}

impl fmt::Display for TicksTime {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}t", self.0)
  }
}
