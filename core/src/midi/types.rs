use std::convert::TryFrom;
use std::fmt;

use crate::error::{Result, SequenceError};

pub type U4 = u8;
pub type U7 = u8;
pub type U14 = u16;

/// Number of channels tracked per sequence. Widen here if a target supports
/// more than the standard sixteen.
pub const MIDI_STD_CHANNELS: usize = 16;

pub const PITCH_BEND_MIN: i16 = -8192;
pub const PITCH_BEND_MAX: i16 = 8191;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Channel(U4);

impl Channel {
  pub fn new(channel: i32) -> Result<Channel> {
    if channel >= 0 && (channel as usize) < MIDI_STD_CHANNELS {
      Ok(Channel(channel as U4))
    } else {
      Err(SequenceError::value(format!(
        "channel {} out of range 0..{}",
        channel, MIDI_STD_CHANNELS
      )))
    }
  }

  pub fn index(&self) -> usize {
    self.0 as usize
  }

  pub fn number(&self) -> U4 {
    self.0
  }
}

impl TryFrom<i32> for Channel {
  type Error = SequenceError;

  fn try_from(value: i32) -> Result<Self> {
    Channel::new(value)
  }
}

impl fmt::Display for Channel {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "ch{}", self.0)
  }
}

/// Validates a 7 bit data value coming from a reader callback.
pub fn data7(value: i32, what: &str) -> Result<U7> {
  if (0..=127).contains(&value) {
    Ok(value as U7)
  } else {
    Err(SequenceError::value(format!(
      "{} {} out of range 0..=127",
      what, value
    )))
  }
}

/// Clamps a value into the 7 bit data range.
pub fn clamp7(value: i32) -> U7 {
  value.max(0).min(127) as U7
}

pub fn pitch_bend(value: i32) -> Result<i16> {
  if value >= i32::from(PITCH_BEND_MIN) && value <= i32::from(PITCH_BEND_MAX) {
    Ok(value as i16)
  } else {
    Err(SequenceError::value(format!(
      "pitch bend {} out of range {}..={}",
      value, PITCH_BEND_MIN, PITCH_BEND_MAX
    )))
  }
}

#[cfg(test)]
mod test {

  use super::*;

  #[test]
  pub fn channel_bounds() {
    assert_eq!(Channel::new(0).unwrap().index(), 0);
    assert_eq!(Channel::new(15).unwrap().number(), 15);
    assert!(Channel::new(16).unwrap_err().is_value());
    assert!(Channel::new(-1).unwrap_err().is_value());
  }

  #[test]
  pub fn data7_bounds() {
    assert_eq!(data7(127, "pitch").unwrap(), 127);
    assert!(data7(128, "pitch").is_err());
    assert!(data7(-1, "velocity").is_err());
  }

  #[test]
  pub fn clamp7_bounds() {
    assert_eq!(clamp7(-12), 0);
    assert_eq!(clamp7(64), 64);
    assert_eq!(clamp7(140), 127);
  }

  #[test]
  pub fn pitch_bend_bounds() {
    assert_eq!(pitch_bend(-8192).unwrap(), -8192);
    assert_eq!(pitch_bend(8191).unwrap(), 8191);
    assert!(pitch_bend(8192).is_err());
  }
}
