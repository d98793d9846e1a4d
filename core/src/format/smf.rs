use log::{debug, trace};

use crate::error::{Result, SequenceError};
use crate::event::{EventKind, TextType};
use crate::midi::types::{data7, pitch_bend, Channel};
use crate::time::{Division, Tempo, TicksTime};

use super::Loader;

const META_TEMPO: u8 = 0x51;
const META_TIME_SIGNATURE: u8 = 0x58;

fn time_signature(data: &[u8]) -> Result<EventKind> {
  match data {
    [numerator, power, clocks, thirty_seconds] if *numerator > 0 && *power <= 7 => {
      Ok(EventKind::TimeSignature {
        numerator: *numerator,
        denominator: 1 << *power,
        clocks_per_click: *clocks,
        thirty_seconds_per_quarter: *thirty_seconds,
      })
    }
    _ => Err(SequenceError::format(format!(
      "invalid time signature meta event {:?}",
      data
    ))),
  }
}

/// Callbacks of a Standard MIDI File reader. Every event carries the delta
/// ticks since the previous event of the same track.
pub trait SmfSink {
  fn header(&mut self, format: i32, track_count: i32, division: i32) -> Result<()>;
  fn track_start(&mut self) -> Result<()>;
  fn track_end(&mut self) -> Result<()>;

  fn note_on(&mut self, delta: u64, channel: i32, key: i32, velocity: i32) -> Result<()>;
  fn note_off(&mut self, delta: u64, channel: i32, key: i32, velocity: i32) -> Result<()>;
  fn key_pressure(&mut self, delta: u64, channel: i32, key: i32, value: i32) -> Result<()>;
  fn control_change(&mut self, delta: u64, channel: i32, controller: i32, value: i32)
    -> Result<()>;
  fn program(&mut self, delta: u64, channel: i32, program: i32) -> Result<()>;
  fn channel_pressure(&mut self, delta: u64, channel: i32, value: i32) -> Result<()>;
  fn pitch_bend(&mut self, delta: u64, channel: i32, value: i32) -> Result<()>;
  fn sysex(&mut self, delta: u64, data: &[u8]) -> Result<()>;
  fn meta(&mut self, delta: u64, meta_type: u8, data: &[u8]) -> Result<()>;
  fn tempo(&mut self, delta: u64, tempo: i32) -> Result<()>;

  fn progress(&mut self, position: u64);

  /// Turns a reader failure into the error the reader should return.
  fn error(&mut self, message: &str) -> SequenceError;
}

pub trait SmfReader {
  /// Total size of the input, reported to the load observer.
  fn size(&self) -> u64;

  fn read(&mut self, sink: &mut dyn SmfSink) -> Result<()>;
}

/// What a finished SMF load hands back to the sequence.
#[derive(Debug)]
pub(crate) struct SmfOutcome {
  pub division: Division,
  pub name: Option<Vec<u8>>,
}

/// Builds timeline events out of delta timed SMF callbacks.
pub struct SmfAdapter<'a> {
  loader: Loader<'a>,
  tick: TicksTime,
  track: u16,
  tracks_started: u32,
  name: Option<Vec<u8>>,
}

impl<'a> SmfAdapter<'a> {
  pub(crate) fn new(loader: Loader<'a>) -> SmfAdapter<'a> {
    SmfAdapter {
      loader,
      tick: TicksTime::zero(),
      track: 0,
      tracks_started: 0,
      name: None,
    }
  }

  pub(crate) fn finish(self) -> Result<SmfOutcome> {
    Ok(SmfOutcome {
      division: self.loader.division()?,
      name: self.name,
    })
  }

  fn advance(&mut self, delta: u64) -> TicksTime {
    self.tick += TicksTime::new(delta);
    self.tick
  }

  fn append(&mut self, delta: u64, kind: EventKind) -> Result<()> {
    let tick = self.advance(delta);
    self.loader.append(tick, kind)
  }
}

impl<'a> SmfSink for SmfAdapter<'a> {
  fn header(&mut self, format: i32, track_count: i32, division: i32) -> Result<()> {
    debug!(
      "SMF header: format={} tracks={} division={}",
      format, track_count, division
    );
    self.loader.set_division(division)
  }

  fn track_start(&mut self) -> Result<()> {
    self.track = self.tracks_started.min(u32::from(u16::max_value())) as u16;
    self.tracks_started += 1;
    self.tick = TicksTime::zero();
    debug!("SMF track {} start", self.track);
    Ok(())
  }

  fn track_end(&mut self) -> Result<()> {
    debug!("SMF track {} end at {}", self.track, self.tick);
    self.tick = TicksTime::zero();
    self.loader.stats_mut().end_track();
    Ok(())
  }

  fn note_on(&mut self, delta: u64, channel: i32, key: i32, velocity: i32) -> Result<()> {
    let channel = Channel::new(channel)?;
    let key = data7(key, "key")?;
    let velocity = data7(velocity, "velocity")?;
    let kind = if velocity == 0 {
      EventKind::NoteOff {
        channel,
        key,
        velocity,
      }
    } else {
      EventKind::NoteOn {
        channel,
        key,
        velocity,
      }
    };
    self.append(delta, kind)
  }

  fn note_off(&mut self, delta: u64, channel: i32, key: i32, velocity: i32) -> Result<()> {
    let kind = EventKind::NoteOff {
      channel: Channel::new(channel)?,
      key: data7(key, "key")?,
      velocity: data7(velocity, "velocity")?,
    };
    self.append(delta, kind)
  }

  fn key_pressure(&mut self, delta: u64, channel: i32, key: i32, value: i32) -> Result<()> {
    let kind = EventKind::KeyPressure {
      channel: Channel::new(channel)?,
      key: data7(key, "key")?,
      value: data7(value, "key pressure")?,
    };
    self.append(delta, kind)
  }

  fn control_change(
    &mut self,
    delta: u64,
    channel: i32,
    controller: i32,
    value: i32,
  ) -> Result<()> {
    let kind = EventKind::ControlChange {
      channel: Channel::new(channel)?,
      controller: data7(controller, "controller")?,
      value: data7(value, "controller value")?,
    };
    self.append(delta, kind)
  }

  fn program(&mut self, delta: u64, channel: i32, program: i32) -> Result<()> {
    let kind = EventKind::ProgramChange {
      channel: Channel::new(channel)?,
      program: data7(program, "program")?,
    };
    self.append(delta, kind)
  }

  fn channel_pressure(&mut self, delta: u64, channel: i32, value: i32) -> Result<()> {
    let kind = EventKind::ChannelPressure {
      channel: Channel::new(channel)?,
      value: data7(value, "channel pressure")?,
    };
    self.append(delta, kind)
  }

  fn pitch_bend(&mut self, delta: u64, channel: i32, value: i32) -> Result<()> {
    let kind = EventKind::PitchBend {
      channel: Channel::new(channel)?,
      value: pitch_bend(value)?,
    };
    self.append(delta, kind)
  }

  fn sysex(&mut self, delta: u64, data: &[u8]) -> Result<()> {
    self.append(
      delta,
      EventKind::SysEx {
        data: data.to_vec(),
      },
    )
  }

  fn meta(&mut self, delta: u64, meta_type: u8, data: &[u8]) -> Result<()> {
    if meta_type == META_TEMPO {
      // Readers normally decode the tempo themselves, accept the raw form too
      if data.len() != 3 {
        return Err(SequenceError::format(format!(
          "tempo meta event with {} data bytes",
          data.len()
        )));
      }
      let micros = (i32::from(data[0]) << 16) | (i32::from(data[1]) << 8) | i32::from(data[2]);
      return self.tempo(delta, micros);
    }

    if meta_type == META_TIME_SIGNATURE {
      let kind = time_signature(data)?;
      return self.append(delta, kind);
    }

    let kind = match TextType::classify(meta_type, data) {
      Some(text_type) => {
        if text_type == TextType::TrackName {
          self.loader.stats_mut().record_track_name(data);
          if self.name.is_none() && self.track == 0 {
            self.name = Some(data.to_vec());
          }
        }
        EventKind::Text {
          text_type,
          track: self.track,
          data: data.to_vec(),
        }
      }
      None => EventKind::Meta {
        meta_type,
        data: data.to_vec(),
      },
    };
    self.append(delta, kind)
  }

  fn tempo(&mut self, delta: u64, tempo: i32) -> Result<()> {
    if tempo <= 0 {
      return Err(SequenceError::format(format!("tempo {} is not positive", tempo)));
    }
    let tempo = Tempo::new(tempo as u32)?;
    trace!("SMF tempo {} at {}", tempo, self.tick);
    self.append(delta, EventKind::Tempo { tempo })
  }

  fn progress(&mut self, position: u64) {
    self.loader.progress(position)
  }

  fn error(&mut self, message: &str) -> SequenceError {
    SequenceError::format(message)
  }
}
