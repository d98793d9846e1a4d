use failure::Error;

use log::{debug, info};

use serde_derive::Deserialize;

use std::fs::File;
use std::io::Read;

use crate::time::division::DEFAULT_DIVISION;
use crate::time::tempo::DEFAULT_TEMPO;

const MIDI_TIMELINE_CONFIG: &str = "MIDI_TIMELINE_CONFIG";
const DEFAULT_MIDI_TIMELINE_CONFIG: &str = "timeline.toml";

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Timing {
  /// Microseconds per quarter note until the first tempo event.
  pub default_tempo: u32,
  /// Ticks per quarter note for sequences built without a file header.
  pub default_division: u16,
}

impl Default for Timing {
  fn default() -> Timing {
    Timing {
      default_tempo: DEFAULT_TEMPO,
      default_division: DEFAULT_DIVISION,
    }
  }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Playback {
  pub tempo_factor: f64,
}

impl Default for Playback {
  fn default() -> Playback {
    Playback { tempo_factor: 1.0 }
  }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Loading {
  /// Drop WRK sysex references to undefined banks instead of failing.
  pub skip_unresolved_sysex: bool,
}

impl Default for Loading {
  fn default() -> Loading {
    Loading {
      skip_unresolved_sysex: true,
    }
  }
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
  pub timing: Timing,
  pub playback: Playback,
  pub loading: Loading,
}

impl Config {
  pub fn from_file<'a, T>(path: T) -> Result<Config, Error>
  where
    T: Into<&'a str>,
  {
    let mut content = String::new();
    let path_str = path.into();
    let mut file = File::open(path_str)?;
    file.read_to_string(&mut content)?;
    let config: Config = toml::from_str(&content)?;
    Ok(config)
  }

  pub fn from_str<'a, T>(content: T) -> Result<Config, Error>
  where
    T: Into<&'a str>,
  {
    let config: Config = toml::from_str(content.into())?;
    Ok(config)
  }

  /// Loads the file named by `MIDI_TIMELINE_CONFIG`, `timeline.toml` by default.
  pub fn from_env() -> Result<Config, Error> {
    let config_path = std::env::var(MIDI_TIMELINE_CONFIG)
      .unwrap_or_else(|_| DEFAULT_MIDI_TIMELINE_CONFIG.to_string());

    info!("Loading timeline configuration from {} ...", config_path);
    let config = Config::from_file(config_path.as_str())?;
    debug!("{:#?}", config);

    Ok(config)
  }
}
