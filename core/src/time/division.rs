use std::convert::TryFrom;

use crate::error::{Result, SequenceError};

pub const DEFAULT_DIVISION: u16 = 120;

/// Ticks per quarter note, fixed for the lifetime of a loaded sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Division(u16);

impl Division {
  pub fn new(ticks_per_quarter: u16) -> Result<Division> {
    if ticks_per_quarter == 0 {
      Err(SequenceError::value("division must be strictly positive"))
    } else {
      Ok(Division(ticks_per_quarter))
    }
  }

  /// Division as reported by a file header. Negative values are SMPTE
  /// divisions, which are not supported.
  pub fn from_header(value: i32) -> Result<Division> {
    if value <= 0 {
      return Err(SequenceError::format(format!(
        "unsupported division {}",
        value
      )));
    }
    u16::try_from(value)
      .map(Division)
      .map_err(|_| SequenceError::format(format!("division {} out of range", value)))
  }

  pub fn ticks_per_quarter(&self) -> u16 {
    self.0
  }
}

impl Default for Division {
  fn default() -> Self {
    Division(DEFAULT_DIVISION)
  }
}

impl From<Division> for f64 {
  fn from(item: Division) -> Self {
    f64::from(item.0)
  }
}

#[cfg(test)]
mod test {

  use super::Division;

  #[test]
  pub fn division_new() {
    assert_eq!(Division::new(480).unwrap().ticks_per_quarter(), 480);
    assert!(Division::new(0).unwrap_err().is_value());
  }

  #[test]
  pub fn division_from_header() {
    assert_eq!(Division::from_header(96).unwrap().ticks_per_quarter(), 96);
    assert!(Division::from_header(0).unwrap_err().is_format());
    assert!(Division::from_header(-7720).unwrap_err().is_format());
    assert!(Division::from_header(70_000).unwrap_err().is_format());
  }
}
