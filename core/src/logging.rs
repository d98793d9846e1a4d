use failure::{Error, Fail};

const MIDI_TIMELINE_LOG_CONFIG: &str = "MIDI_TIMELINE_LOG_CONFIG";
const DEFAULT_MIDI_TIMELINE_LOG_CONFIG: &str = "log4rs.yaml";

#[derive(Debug, Fail)]
pub enum LoggingError {
  #[fail(display = "Failed to init logging: {}", cause)]
  Init { cause: String },
}

/// Installs a log4rs backend configured from `path`.
pub fn init_file(path: &str) -> Result<(), Error> {
  log4rs::init_file(path, Default::default()).map_err(|err| LoggingError::Init {
    cause: err.to_string(),
  })?;

  Ok(())
}

/// Installs a log4rs backend from the file named by `MIDI_TIMELINE_LOG_CONFIG`,
/// `log4rs.yaml` when the variable is not set.
pub fn init_from_env() -> Result<(), Error> {
  let log_config_path = std::env::var(MIDI_TIMELINE_LOG_CONFIG)
    .unwrap_or_else(|_| DEFAULT_MIDI_TIMELINE_LOG_CONFIG.to_string());

  init_file(log_config_path.as_str())
}
