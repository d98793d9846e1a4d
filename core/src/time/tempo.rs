use std::fmt;

use crate::error::{Result, SequenceError};

const MICROS_PER_MINUTE: f64 = 60_000_000.0;

/// 120 BPM, the tempo of any sequence that never states one.
pub const DEFAULT_TEMPO: u32 = 500_000;

/// Tempo expressed in microseconds per quarter note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tempo(u32);

impl Tempo {
  pub fn new(micros_per_quarter: u32) -> Result<Tempo> {
    if micros_per_quarter == 0 {
      Err(SequenceError::value("tempo must be strictly positive"))
    } else {
      Ok(Tempo(micros_per_quarter))
    }
  }

  pub fn from_bpm(bpm: f64) -> Result<Tempo> {
    if !(bpm > 0.0) || !bpm.is_finite() {
      return Err(SequenceError::value(format!("invalid bpm {}", bpm)));
    }
    Tempo::new((MICROS_PER_MINUTE / bpm).round() as u32)
  }

  pub fn micros_per_quarter(&self) -> u32 {
    self.0
  }

  pub fn bpm(&self) -> f64 {
    MICROS_PER_MINUTE / f64::from(self.0)
  }
}

impl Default for Tempo {
  fn default() -> Self {
    Tempo(DEFAULT_TEMPO)
  }
}

impl From<Tempo> for f64 {
  fn from(item: Tempo) -> Self {
    f64::from(item.0)
  }
}

impl From<Tempo> for u32 {
  fn from(item: Tempo) -> Self {
    item.0
  }
}

impl fmt::Display for Tempo {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{:.2} BPM", self.bpm())
  }
}

#[cfg(test)]
mod test {

  use super::Tempo;

  #[test]
  pub fn tempo_new() {
    let tempo = Tempo::new(500_000).unwrap();
    assert_eq!(tempo.micros_per_quarter(), 500_000);
    assert_eq!(tempo.bpm(), 120.0);
  }

  #[test]
  pub fn tempo_zero_is_rejected() {
    assert!(Tempo::new(0).unwrap_err().is_value());
  }

  #[test]
  pub fn tempo_from_bpm() {
    assert_eq!(Tempo::from_bpm(60.0).unwrap().micros_per_quarter(), 1_000_000);
    assert!(Tempo::from_bpm(0.0).is_err());
    assert!(Tempo::from_bpm(std::f64::NAN).is_err());
  }

  #[test]
  pub fn tempo_default() {
    assert_eq!(Tempo::default().micros_per_quarter(), 500_000);
    assert_eq!(Tempo::default().to_string(), "120.00 BPM");
  }
}
