use failure::Fail;

pub type Result<T> = std::result::Result<T, SequenceError>;

#[derive(Debug, Fail)]
pub enum SequenceError {
  /// Malformed or unsupported input coming from one of the file readers.
  #[fail(display = "Malformed input: {}", cause)]
  Format { cause: String },

  /// A parameter was rejected before it changed any state.
  #[fail(display = "Invalid value: {}", cause)]
  Value { cause: String },

  /// An operation was called in the wrong lifecycle phase.
  #[fail(display = "Invalid state: {}", cause)]
  State { cause: String },
}

impl SequenceError {
  pub fn format<T>(cause: T) -> SequenceError
  where
    T: Into<String>,
  {
    SequenceError::Format {
      cause: cause.into(),
    }
  }

  pub fn value<T>(cause: T) -> SequenceError
  where
    T: Into<String>,
  {
    SequenceError::Value {
      cause: cause.into(),
    }
  }

  pub fn state<T>(cause: T) -> SequenceError
  where
    T: Into<String>,
  {
    SequenceError::State {
      cause: cause.into(),
    }
  }

  pub fn is_format(&self) -> bool {
    match self {
      SequenceError::Format { .. } => true,
      _ => false,
    }
  }

  pub fn is_value(&self) -> bool {
    match self {
      SequenceError::Value { .. } => true,
      _ => false,
    }
  }

  pub fn is_state(&self) -> bool {
    match self {
      SequenceError::State { .. } => true,
      _ => false,
    }
  }
}

#[cfg(test)]
mod test {

  use super::SequenceError;

  #[test]
  pub fn display_keeps_cause_verbatim() {
    let err = SequenceError::format("unexpected end of track at offset 0x1f");
    assert_eq!(
      err.to_string(),
      "Malformed input: unexpected end of track at offset 0x1f"
    );
  }

  #[test]
  pub fn kinds() {
    assert!(SequenceError::format("x").is_format());
    assert!(SequenceError::value("x").is_value());
    assert!(SequenceError::state("x").is_state());
    assert!(!SequenceError::state("x").is_value());
  }
}
