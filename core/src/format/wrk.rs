use std::collections::{BTreeMap, HashMap};

use log::{debug, trace, warn};

use crate::error::{Result, SequenceError};
use crate::event::EventKind;
use crate::midi::types::{clamp7, data7, pitch_bend, Channel, U7};
use crate::time::{Division, Tempo, TicksTime};

use super::Loader;

const MAX_BANK: i32 = 0x3fff;

/// Per track settings found in a Cakewalk track header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackHeader {
  pub track: i32,
  pub name: Vec<u8>,
  /// Negative when the track plays on the channel of each event.
  pub channel: i32,
  pub pitch: i32,
  pub velocity: i32,
  pub port: i32,
  pub selected: bool,
  pub muted: bool,
  pub looping: bool,
}

/// Callbacks of a Cakewalk WRK reader. Times are absolute ticks.
pub trait WrkSink {
  fn file_header(&mut self, version_high: i32, version_low: i32) -> Result<()>;
  fn time_base(&mut self, ticks_per_quarter: i32) -> Result<()>;

  /// Old style header. Readers join its two name chunks into `name`.
  fn track_header(&mut self, header: &TrackHeader) -> Result<()>;

  fn new_track_header(&mut self, header: &TrackHeader) -> Result<()> {
    self.track_header(header)
  }

  fn note(
    &mut self,
    track: i32,
    time: u64,
    channel: i32,
    key: i32,
    velocity: i32,
    duration: u64,
  ) -> Result<()>;
  fn key_pressure(&mut self, track: i32, time: u64, channel: i32, key: i32, value: i32)
    -> Result<()>;
  fn control_change(
    &mut self,
    track: i32,
    time: u64,
    channel: i32,
    controller: i32,
    value: i32,
  ) -> Result<()>;
  fn pitch_bend(&mut self, track: i32, time: u64, channel: i32, value: i32) -> Result<()>;
  fn program(&mut self, track: i32, time: u64, channel: i32, program: i32) -> Result<()>;
  fn channel_pressure(&mut self, track: i32, time: u64, channel: i32, value: i32)
    -> Result<()>;

  /// A reference to a sysex bank that may only be defined later in the file.
  fn sysex(&mut self, track: i32, time: u64, bank: i32) -> Result<()>;
  fn sysex_bank(
    &mut self,
    bank: i32,
    name: &[u8],
    autosend: bool,
    port: i32,
    data: &[u8],
  ) -> Result<()>;

  /// `tempo` is in hundredths of BPM.
  fn tempo(&mut self, time: u64, tempo: i32) -> Result<()>;

  fn track_patch(&mut self, track: i32, program: i32) -> Result<()>;
  fn track_volume(&mut self, track: i32, volume: i32) -> Result<()>;
  fn track_bank(&mut self, track: i32, bank: i32) -> Result<()>;

  fn stream_end(&mut self, time: u64) -> Result<()>;
  fn end_of_file(&mut self) -> Result<()>;

  fn progress(&mut self, position: u64);

  /// Turns a reader failure into the error the reader should return.
  fn error(&mut self, message: &str) -> SequenceError;
}

pub trait WrkReader {
  /// Total size of the input, reported to the load observer.
  fn size(&self) -> u64;

  fn read(&mut self, sink: &mut dyn WrkSink) -> Result<()>;
}

#[derive(Debug, Clone, Copy)]
struct TrackMapping {
  channel: Option<Channel>,
  pitch: i32,
  velocity: i32,
}

#[derive(Debug)]
struct SysexBank {
  data: Vec<u8>,
  autosend: bool,
}

#[derive(Debug)]
struct PendingSysex {
  track: i32,
  tick: TicksTime,
  bank: i32,
}

/// Converts hundredths of BPM into a tempo.
fn tempo_from_centi_bpm(tempo: i32) -> Result<Tempo> {
  if tempo <= 0 {
    return Err(SequenceError::format(format!("tempo {} is not positive", tempo)));
  }
  let micros = (6e9 / f64::from(tempo)).round();
  if micros > f64::from(u32::max_value()) {
    return Err(SequenceError::format(format!("tempo {} is too slow", tempo)));
  }
  Tempo::new(micros as u32)
}

/// Builds timeline events out of absolute timed WRK callbacks, resolving
/// sysex bank references once the whole file has been seen.
pub struct WrkAdapter<'a> {
  loader: Loader<'a>,
  skip_unresolved_sysex: bool,
  tracks: HashMap<i32, TrackMapping>,
  banks: BTreeMap<i32, SysexBank>,
  pending: Vec<PendingSysex>,
  finished: bool,
}

impl<'a> WrkAdapter<'a> {
  pub(crate) fn new(loader: Loader<'a>, skip_unresolved_sysex: bool) -> WrkAdapter<'a> {
    WrkAdapter {
      loader,
      skip_unresolved_sysex,
      tracks: HashMap::new(),
      banks: BTreeMap::new(),
      pending: Vec::new(),
      finished: false,
    }
  }

  /// Resolves what is still pending when the reader stopped without
  /// reporting the end of the file.
  pub(crate) fn finish(mut self) -> Result<Division> {
    if !self.finished {
      self.resolve_sysex()?;
    }
    self.loader.division()
  }

  fn mapping(&self, track: i32) -> Option<TrackMapping> {
    self.tracks.get(&track).cloned()
  }

  fn channel(&self, track: i32, channel: i32) -> Result<Channel> {
    match self.mapping(track).and_then(|mapping| mapping.channel) {
      Some(channel) => Ok(channel),
      None => Channel::new(channel),
    }
  }

  fn key(&self, track: i32, key: i32) -> Result<U7> {
    let key = data7(key, "key")?;
    let offset = self.mapping(track).map_or(0, |mapping| mapping.pitch);
    Ok(clamp7(i32::from(key) + offset))
  }

  fn velocity(&self, track: i32, velocity: i32) -> Result<U7> {
    let velocity = data7(velocity, "velocity")?;
    let offset = self.mapping(track).map_or(0, |mapping| mapping.velocity);
    Ok(clamp7(i32::from(velocity) + offset))
  }

  fn track_channel(&self, track: i32) -> Option<Channel> {
    let channel = self.mapping(track).and_then(|mapping| mapping.channel);
    if channel.is_none() {
      debug!("WRK track {} has no channel assigned", track);
    }
    channel
  }

  fn resolve_sysex(&mut self) -> Result<()> {
    self.finished = true;

    let autosend: Vec<Vec<u8>> = self
      .banks
      .iter()
      .filter(|(_, bank)| bank.autosend)
      .map(|(_, bank)| bank.data.clone())
      .collect();
    for data in autosend {
      self.loader.append(TicksTime::zero(), EventKind::SysEx { data })?;
    }

    let pending = std::mem::replace(&mut self.pending, Vec::new());
    for reference in pending {
      let data = match self.banks.get(&reference.bank) {
        Some(bank) => bank.data.clone(),
        None if self.skip_unresolved_sysex => {
          warn!(
            "Skipping sysex of track {} at {}, bank {} is not defined",
            reference.track, reference.tick, reference.bank
          );
          continue;
        }
        None => {
          return Err(SequenceError::format(format!(
            "sysex of track {} at {} refers to undefined bank {}",
            reference.track, reference.tick, reference.bank
          )))
        }
      };
      self.loader.append(reference.tick, EventKind::SysEx { data })?;
    }
    Ok(())
  }
}

impl<'a> WrkSink for WrkAdapter<'a> {
  fn file_header(&mut self, version_high: i32, version_low: i32) -> Result<()> {
    debug!("WRK file version {}.{}", version_high, version_low);
    Ok(())
  }

  fn time_base(&mut self, ticks_per_quarter: i32) -> Result<()> {
    self.loader.set_division(ticks_per_quarter)
  }

  fn track_header(&mut self, header: &TrackHeader) -> Result<()> {
    let channel = if header.channel < 0 {
      None
    } else {
      Some(Channel::new(header.channel)?)
    };
    debug!(
      "WRK track {} channel={} pitch={} velocity={} port={} muted={}",
      header.track, header.channel, header.pitch, header.velocity, header.port, header.muted
    );
    self.tracks.insert(
      header.track,
      TrackMapping {
        channel,
        pitch: header.pitch,
        velocity: header.velocity,
      },
    );
    if let Some(channel) = channel {
      if !header.name.is_empty() {
        self
          .loader
          .stats_mut()
          .record_track_label(channel, &header.name);
      }
    }
    Ok(())
  }

  fn note(
    &mut self,
    track: i32,
    time: u64,
    channel: i32,
    key: i32,
    velocity: i32,
    duration: u64,
  ) -> Result<()> {
    let channel = self.channel(track, channel)?;
    let key = self.key(track, key)?;
    let velocity = self.velocity(track, velocity)?;
    let start = TicksTime::new(time);
    self.loader.append(
      start,
      EventKind::NoteOn {
        channel,
        key,
        velocity,
      },
    )?;
    self.loader.append(
      start + TicksTime::new(duration),
      EventKind::NoteOff {
        channel,
        key,
        velocity: 0,
      },
    )
  }

  fn key_pressure(
    &mut self,
    track: i32,
    time: u64,
    channel: i32,
    key: i32,
    value: i32,
  ) -> Result<()> {
    let kind = EventKind::KeyPressure {
      channel: self.channel(track, channel)?,
      key: self.key(track, key)?,
      value: data7(value, "key pressure")?,
    };
    self.loader.append(TicksTime::new(time), kind)
  }

  fn control_change(
    &mut self,
    track: i32,
    time: u64,
    channel: i32,
    controller: i32,
    value: i32,
  ) -> Result<()> {
    let kind = EventKind::ControlChange {
      channel: self.channel(track, channel)?,
      controller: data7(controller, "controller")?,
      value: data7(value, "controller value")?,
    };
    self.loader.append(TicksTime::new(time), kind)
  }

  fn pitch_bend(&mut self, track: i32, time: u64, channel: i32, value: i32) -> Result<()> {
    let kind = EventKind::PitchBend {
      channel: self.channel(track, channel)?,
      value: pitch_bend(value)?,
    };
    self.loader.append(TicksTime::new(time), kind)
  }

  fn program(&mut self, track: i32, time: u64, channel: i32, program: i32) -> Result<()> {
    let kind = EventKind::ProgramChange {
      channel: self.channel(track, channel)?,
      program: data7(program, "program")?,
    };
    self.loader.append(TicksTime::new(time), kind)
  }

  fn channel_pressure(
    &mut self,
    track: i32,
    time: u64,
    channel: i32,
    value: i32,
  ) -> Result<()> {
    let kind = EventKind::ChannelPressure {
      channel: self.channel(track, channel)?,
      value: data7(value, "channel pressure")?,
    };
    self.loader.append(TicksTime::new(time), kind)
  }

  fn sysex(&mut self, track: i32, time: u64, bank: i32) -> Result<()> {
    trace!("WRK sysex reference to bank {} at {}", bank, time);
    self.pending.push(PendingSysex {
      track,
      tick: TicksTime::new(time),
      bank,
    });
    Ok(())
  }

  fn sysex_bank(
    &mut self,
    bank: i32,
    name: &[u8],
    autosend: bool,
    port: i32,
    data: &[u8],
  ) -> Result<()> {
    debug!(
      "WRK sysex bank {} '{}' port={} autosend={} ({} bytes)",
      bank,
      String::from_utf8_lossy(name),
      port,
      autosend,
      data.len()
    );
    self.banks.insert(
      bank,
      SysexBank {
        data: data.to_vec(),
        autosend,
      },
    );
    Ok(())
  }

  fn tempo(&mut self, time: u64, tempo: i32) -> Result<()> {
    let tempo = tempo_from_centi_bpm(tempo)?;
    trace!("WRK tempo {} at {}", tempo, time);
    self
      .loader
      .append(TicksTime::new(time), EventKind::Tempo { tempo })
  }

  fn track_patch(&mut self, track: i32, program: i32) -> Result<()> {
    let program = data7(program, "program")?;
    if let Some(channel) = self.track_channel(track) {
      self.loader.stats_mut().record_program(channel, program);
    }
    Ok(())
  }

  fn track_volume(&mut self, track: i32, volume: i32) -> Result<()> {
    let volume = data7(volume, "volume")?;
    if let Some(channel) = self.track_channel(track) {
      self.loader.stats_mut().record_volume(channel, volume);
    }
    Ok(())
  }

  fn track_bank(&mut self, track: i32, bank: i32) -> Result<()> {
    if bank < 0 || bank > MAX_BANK {
      return Err(SequenceError::value(format!(
        "bank {} out of range 0..={}",
        bank, MAX_BANK
      )));
    }
    if let Some(channel) = self.track_channel(track) {
      self.loader.stats_mut().record_bank(channel, bank as u16);
    }
    Ok(())
  }

  fn stream_end(&mut self, time: u64) -> Result<()> {
    debug!("WRK stream end at {}", TicksTime::new(time));
    Ok(())
  }

  fn end_of_file(&mut self) -> Result<()> {
    if self.finished {
      return Ok(());
    }
    self.resolve_sysex()
  }

  fn progress(&mut self, position: u64) {
    self.loader.progress(position)
  }

  fn error(&mut self, message: &str) -> SequenceError {
    SequenceError::format(message)
  }
}

#[cfg(test)]
mod test {

  use super::{tempo_from_centi_bpm, TrackHeader, WrkAdapter, WrkSink};
  use crate::event::EventKind;
  use crate::format::Loader;
  use crate::midi::types::Channel;
  use crate::stats::Statistics;
  use crate::time::TicksTime;
  use crate::timeline::Timeline;

  fn ch(channel: i32) -> Channel {
    Channel::new(channel).unwrap()
  }

  fn header(track: i32, channel: i32, pitch: i32, velocity: i32) -> TrackHeader {
    TrackHeader {
      track,
      name: b"Lead".to_vec(),
      channel,
      pitch,
      velocity,
      ..TrackHeader::default()
    }
  }

  #[test]
  pub fn centi_bpm_tempo() {
    assert_eq!(tempo_from_centi_bpm(12000).unwrap().micros_per_quarter(), 500_000);
    assert_eq!(tempo_from_centi_bpm(6000).unwrap().micros_per_quarter(), 1_000_000);
    assert!(tempo_from_centi_bpm(0).unwrap_err().is_format());
    assert!(tempo_from_centi_bpm(-1).unwrap_err().is_format());
  }

  #[test]
  pub fn note_with_duration_makes_a_pair() {
    let mut timeline = Timeline::new();
    let mut stats = Statistics::new();
    let mut observer = ();
    {
      let mut adapter =
        WrkAdapter::new(Loader::new(&mut timeline, &mut stats, &mut observer), true);
      adapter.time_base(120).unwrap();
      adapter.note(0, 240, 3, 60, 100, 120).unwrap();
      adapter.end_of_file().unwrap();
      assert_eq!(adapter.finish().unwrap().ticks_per_quarter(), 120);
    }
    let on = timeline.event_at(0).unwrap();
    let off = timeline.event_at(1).unwrap();
    assert_eq!(on.position(), TicksTime::new(240));
    assert_eq!(off.position(), TicksTime::new(360));
    assert_eq!(
      on.kind(),
      &EventKind::NoteOn {
        channel: ch(3),
        key: 60,
        velocity: 100,
      }
    );
    assert_eq!(
      off.kind(),
      &EventKind::NoteOff {
        channel: ch(3),
        key: 60,
        velocity: 0,
      }
    );
  }

  #[test]
  pub fn track_map_overrides_channel_and_offsets() {
    let mut timeline = Timeline::new();
    let mut stats = Statistics::new();
    let mut observer = ();
    {
      let mut adapter =
        WrkAdapter::new(Loader::new(&mut timeline, &mut stats, &mut observer), true);
      adapter.time_base(120).unwrap();
      adapter.track_header(&header(1, 5, 12, 30)).unwrap();
      adapter.new_track_header(&header(2, -1, -70, 0)).unwrap();
      adapter.note(1, 0, 0, 120, 110, 10).unwrap();
      adapter.note(2, 0, 7, 40, 64, 10).unwrap();
    }
    assert_eq!(
      timeline.event_at(0).unwrap().kind(),
      &EventKind::NoteOn {
        channel: ch(5),
        key: 127,
        velocity: 127,
      }
    );
    assert_eq!(
      timeline.event_at(2).unwrap().kind(),
      &EventKind::NoteOn {
        channel: ch(7),
        key: 0,
        velocity: 64,
      }
    );
    assert_eq!(stats.channel_label(ch(5)), Some(&b"Lead"[..]));
    assert_eq!(stats.channel_label(ch(7)), None);
  }

  #[test]
  pub fn track_settings_only_feed_statistics() {
    let mut timeline = Timeline::new();
    let mut stats = Statistics::new();
    let mut observer = ();
    {
      let mut adapter =
        WrkAdapter::new(Loader::new(&mut timeline, &mut stats, &mut observer), true);
      adapter.track_header(&header(0, 2, 0, 0)).unwrap();
      adapter.track_patch(0, 33).unwrap();
      adapter.track_volume(0, 90).unwrap();
      adapter.track_bank(0, 2).unwrap();
      adapter.track_patch(9, 12).unwrap();
      assert!(adapter.track_bank(0, 0x4000).unwrap_err().is_value());
      adapter.stream_end(1920).unwrap();
    }
    assert!(timeline.is_empty());
    assert_eq!(stats.channel_program(ch(2)), Some(33));
    assert_eq!(stats.channel_volume(ch(2)), Some(90));
    assert_eq!(stats.channel_bank(ch(2)), Some(2));
  }

  #[test]
  pub fn sysex_references_resolve_at_end_of_file() {
    let mut timeline = Timeline::new();
    let mut stats = Statistics::new();
    let mut observer = ();
    {
      let mut adapter =
        WrkAdapter::new(Loader::new(&mut timeline, &mut stats, &mut observer), true);
      adapter.time_base(96).unwrap();
      adapter.sysex(0, 100, 1).unwrap();
      adapter.sysex(0, 200, 3).unwrap();
      adapter
        .sysex_bank(1, b"GM On", false, 0, &[0xf0, 0x7e, 0x7f, 0x09, 0x01, 0xf7])
        .unwrap();
      adapter
        .sysex_bank(2, b"Reset", true, 0, &[0xf0, 0x41, 0xf7])
        .unwrap();
      adapter.end_of_file().unwrap();
      adapter.end_of_file().unwrap();
    }
    timeline.finalize();
    let found: Vec<(u64, Vec<u8>)> = timeline
      .iter()
      .map(|event| match event.kind() {
        EventKind::SysEx { data } => (event.position().units(), data.clone()),
        other => panic!("unexpected event {:?}", other),
      })
      .collect();
    assert_eq!(
      found,
      vec![
        (0, vec![0xf0, 0x41, 0xf7]),
        (100, vec![0xf0, 0x7e, 0x7f, 0x09, 0x01, 0xf7]),
      ]
    );
  }

  #[test]
  pub fn unresolved_sysex_can_be_fatal() {
    let mut timeline = Timeline::new();
    let mut stats = Statistics::new();
    let mut observer = ();
    let mut adapter =
      WrkAdapter::new(Loader::new(&mut timeline, &mut stats, &mut observer), false);
    adapter.time_base(96).unwrap();
    adapter.sysex(0, 200, 3).unwrap();
    assert!(adapter.end_of_file().unwrap_err().is_format());
  }

  #[test]
  pub fn finish_resolves_without_end_of_file() {
    let mut timeline = Timeline::new();
    let mut stats = Statistics::new();
    let mut observer = ();
    {
      let mut adapter =
        WrkAdapter::new(Loader::new(&mut timeline, &mut stats, &mut observer), true);
      adapter.time_base(96).unwrap();
      adapter.sysex_bank(4, b"", false, 0, &[0x43]).unwrap();
      adapter.sysex(0, 10, 4).unwrap();
      adapter.finish().unwrap();
    }
    assert_eq!(timeline.len(), 1);
  }

  #[test]
  pub fn tempo_event() {
    let mut timeline = Timeline::new();
    let mut stats = Statistics::new();
    let mut observer = ();
    {
      let mut adapter =
        WrkAdapter::new(Loader::new(&mut timeline, &mut stats, &mut observer), true);
      adapter.time_base(120).unwrap();
      adapter.tempo(480, 12000).unwrap();
      assert!(adapter.tempo(0, 0).unwrap_err().is_format());
    }
    match timeline.event_at(0).unwrap().kind() {
      EventKind::Tempo { tempo } => assert_eq!(tempo.micros_per_quarter(), 500_000),
      other => panic!("unexpected event {:?}", other),
    }
  }
}
