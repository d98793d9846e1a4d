use std::cell::Cell;

use log::{debug, info, warn};

use crate::config::Config;
use crate::cursor::{Cursor, CursorState};
use crate::error::{Result, SequenceError};
use crate::event::{Event, EventKind};
use crate::format::smf::{SmfAdapter, SmfReader};
use crate::format::wrk::{WrkAdapter, WrkReader};
use crate::format::{LoadObserver, Loader};
use crate::midi::types::{Channel, U7};
use crate::stats::Statistics;
use crate::time::{ClockTime, Division, Tempo, TempoMap, TicksTime};
use crate::timeline::Timeline;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  Empty,
  Loading,
  Ready,
}

/// A time ordered MIDI sequence, loaded once and then played through its
/// cursor.
///
/// Conversions to time follow the tempo map and the tempo factor, which acts
/// as a playback speed: a factor of 2 plays everything in half the time.
///
/// The conversion cache makes this type `!Sync`. Embedders sharing it
/// between threads must put it behind a lock.
#[derive(Debug)]
pub struct Sequence {
  name: String,
  division: Division,
  default_tempo: Tempo,
  skip_unresolved_sysex: bool,
  timeline: Timeline,
  stats: Statistics,
  tempo_map: TempoMap,
  cursor: Cursor,
  tempo_factor: f64,
  // milliseconds per tick, only used while the tempo map is constant
  ticks2millis: Cell<Option<f64>>,
  phase: Phase,
}

fn check_tempo_factor(factor: f64) -> Result<f64> {
  if factor.is_finite() && factor > 0.0 {
    Ok(factor)
  } else {
    Err(SequenceError::value(format!(
      "tempo factor {} must be a positive number",
      factor
    )))
  }
}

impl Sequence {
  pub fn new() -> Sequence {
    Sequence {
      name: String::new(),
      division: Division::default(),
      default_tempo: Tempo::default(),
      skip_unresolved_sysex: true,
      timeline: Timeline::new(),
      stats: Statistics::new(),
      tempo_map: TempoMap::default(),
      cursor: Cursor::new(),
      tempo_factor: 1.0,
      ticks2millis: Cell::new(None),
      phase: Phase::Empty,
    }
  }

  pub fn with_config(config: &Config) -> Result<Sequence> {
    let default_tempo = Tempo::new(config.timing.default_tempo)?;
    let division = Division::new(config.timing.default_division)?;
    let tempo_factor = check_tempo_factor(config.playback.tempo_factor)?;
    Ok(Sequence {
      division,
      default_tempo,
      skip_unresolved_sysex: config.loading.skip_unresolved_sysex,
      tempo_map: TempoMap::new(default_tempo),
      tempo_factor,
      ..Sequence::new()
    })
  }

  /// Drops every event, the statistics and the name.
  pub fn clear(&mut self) {
    self.reset_contents(Phase::Empty);
    self.name.clear();
  }

  fn reset_contents(&mut self, phase: Phase) {
    self.timeline.clear();
    self.stats.clear();
    self.cursor.reset();
    self.tempo_map = TempoMap::new(self.default_tempo);
    self.ticks2millis.set(None);
    self.phase = phase;
  }

  pub fn phase(&self) -> Phase {
    self.phase
  }

  fn require_ready(&self) -> Result<()> {
    match self.phase {
      Phase::Ready => Ok(()),
      phase => Err(SequenceError::state(format!(
        "the sequence is not ready for playback ({:?})",
        phase
      ))),
    }
  }

  // Loading

  /// Replaces the contents with the events of a Standard MIDI File.
  pub fn load_smf(
    &mut self,
    reader: &mut dyn SmfReader,
    observer: &mut dyn LoadObserver,
  ) -> Result<()> {
    self.reset_contents(Phase::Loading);
    observer.loading_start(reader.size());

    let outcome = {
      let loader = Loader::new(&mut self.timeline, &mut self.stats, observer);
      let mut adapter = SmfAdapter::new(loader);
      reader.read(&mut adapter).and_then(|_| adapter.finish())
    };

    let result = outcome.map(|outcome| {
      if self.name.is_empty() {
        if let Some(name) = outcome.name {
          self.name = String::from_utf8_lossy(&name).into_owned();
        }
      }
      self.complete_load(outcome.division)
    });

    observer.loading_finished();
    self.conclude_load("SMF", result)
  }

  /// Replaces the contents with the events of a Cakewalk WRK file.
  pub fn load_wrk(
    &mut self,
    reader: &mut dyn WrkReader,
    observer: &mut dyn LoadObserver,
  ) -> Result<()> {
    self.reset_contents(Phase::Loading);
    observer.loading_start(reader.size());

    let skip_unresolved_sysex = self.skip_unresolved_sysex;
    let outcome = {
      let loader = Loader::new(&mut self.timeline, &mut self.stats, observer);
      let mut adapter = WrkAdapter::new(loader, skip_unresolved_sysex);
      reader.read(&mut adapter).and_then(|_| adapter.finish())
    };

    let result = outcome.map(|division| self.complete_load(division));

    observer.loading_finished();
    self.conclude_load("WRK", result)
  }

  /// Replaces the contents with an already decoded list of events.
  pub fn load_pattern<I>(&mut self, division: Division, events: I) -> Result<()>
  where
    I: IntoIterator<Item = (TicksTime, EventKind)>,
  {
    self.reset_contents(Phase::Loading);
    let mut result = Ok(());
    for (tick, kind) in events {
      if let Err(err) = self.append_event(tick, kind) {
        result = Err(err);
        break;
      }
    }
    let result = result.map(|_| self.complete_load(division));
    self.conclude_load("pattern", result)
  }

  fn complete_load(&mut self, division: Division) {
    self.division = division;
    self.build();
  }

  fn conclude_load(&mut self, source: &str, result: Result<()>) -> Result<()> {
    match result {
      Ok(()) => {
        info!(
          "Loaded {} with {} events, {} ticks per quarter and {} tempo segments",
          source,
          self.timeline.len(),
          self.division.ticks_per_quarter(),
          self.tempo_map.entries().len()
        );
        Ok(())
      }
      Err(err) => {
        warn!("Failed to load {}: {}", source, err);
        self.reset_contents(Phase::Empty);
        Err(err)
      }
    }
  }

  /// Appends an event while building a sequence by hand.
  pub fn append_event(&mut self, tick: TicksTime, kind: EventKind) -> Result<()> {
    if self.phase == Phase::Ready {
      return Err(SequenceError::state(
        "append on a finalized sequence, clear it before reloading",
      ));
    }
    self.phase = Phase::Loading;
    self.stats.record(&kind);
    self.timeline.append(tick, kind)?;
    Ok(())
  }

  pub fn set_division(&mut self, division: Division) -> Result<()> {
    if self.phase == Phase::Ready {
      return Err(SequenceError::state(
        "the division is fixed once the sequence is finalized",
      ));
    }
    self.division = division;
    Ok(())
  }

  /// Sorts the events appended by hand and makes the sequence playable.
  pub fn finalize(&mut self) {
    if self.phase != Phase::Ready {
      self.build();
    }
  }

  fn build(&mut self) {
    self.timeline.finalize();
    let default_tempo = self.default_tempo;
    self.tempo_map = TempoMap::from_changes(
      default_tempo,
      self.timeline.iter().filter_map(|event| match event.kind() {
        EventKind::Tempo { tempo } => Some((event.position(), *tempo)),
        _ => None,
      }),
    );
    debug!("Tempo map: {:?}", self.tempo_map.entries());
    self.ticks2millis.set(None);
    self.cursor.reset();
    self.phase = Phase::Ready;
  }

  // Contents

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn set_name<T: Into<String>>(&mut self, name: T) {
    self.name = name.into();
  }

  pub fn division(&self) -> Division {
    self.division
  }

  pub fn is_empty(&self) -> bool {
    self.timeline.is_empty()
  }

  pub fn len(&self) -> usize {
    self.timeline.len()
  }

  pub fn event_at(&self, index: usize) -> Option<&Event> {
    self.timeline.event_at(index)
  }

  pub fn events(&self) -> impl Iterator<Item = &Event> {
    self.timeline.iter()
  }

  pub fn tempo_map(&self) -> &TempoMap {
    &self.tempo_map
  }

  /// Time signature in effect at `tick` as `(numerator, denominator)`,
  /// 4/4 until the first time signature event.
  pub fn time_signature_at(&self, tick: TicksTime) -> (u8, u8) {
    self
      .timeline
      .iter()
      .take_while(|event| event.position() <= tick)
      .filter_map(|event| match event.kind() {
        EventKind::TimeSignature {
          numerator,
          denominator,
          ..
        } => Some((*numerator, *denominator)),
        _ => None,
      })
      .last()
      .unwrap_or((4, 4))
  }

  /// Position of the last event, zero when there are none.
  pub fn song_length_ticks(&self) -> TicksTime {
    self.timeline.last_position()
  }

  // Playback

  pub fn cursor_state(&self) -> CursorState {
    self.cursor.state()
  }

  pub fn reset_position(&mut self) {
    self.cursor.reset();
  }

  pub fn has_more_events(&self) -> bool {
    self.phase == Phase::Ready && self.cursor.has_more(&self.timeline)
  }

  pub fn next_event(&mut self) -> Result<&Event> {
    self.require_ready()?;
    self.cursor.next(&self.timeline)
  }

  pub fn set_tick_position(&mut self, tick: TicksTime) -> Result<()> {
    self.require_ready()?;
    self.cursor.seek(&self.timeline, tick);
    Ok(())
  }

  pub fn set_time_position(&mut self, time: ClockTime) -> Result<()> {
    self.require_ready()?;
    let nominal = time.scaled(1.0 / self.tempo_factor);
    let tick = self.tempo_map.ticks_at(self.division, nominal);
    self.cursor.seek(&self.timeline, tick);
    Ok(())
  }

  /// Tick of the last event returned, or of the last seek.
  pub fn current_tick(&self) -> TicksTime {
    self.cursor.tick()
  }

  pub fn current_tempo(&self) -> Tempo {
    self.tempo_map.tempo_at(self.cursor.tick())
  }

  // Time conversion

  pub fn tempo_factor(&self) -> f64 {
    self.tempo_factor
  }

  pub fn set_tempo_factor(&mut self, factor: f64) -> Result<()> {
    self.tempo_factor = check_tempo_factor(factor)?;
    self.ticks2millis.set(None);
    Ok(())
  }

  /// Replaces the tempo from the current cursor tick up to the next tempo
  /// change. Earlier ticks keep their times.
  pub fn update_tempo(&mut self, tempo: Tempo) -> Result<()> {
    self.require_ready()?;
    let tick = self.cursor.tick();
    debug!("Tempo override {} from {}", tempo, tick);
    self.tempo_map.override_from(tick, tempo);
    self.ticks2millis.set(None);
    Ok(())
  }

  /// Milliseconds per tick at the current tempo and tempo factor.
  pub fn ticks2millis(&self) -> f64 {
    match self.constant_ticks2millis() {
      Some(value) => value,
      None => self.millis_per_tick(self.current_tempo()),
    }
  }

  fn millis_per_tick(&self, tempo: Tempo) -> f64 {
    f64::from(tempo.micros_per_quarter())
      / (1000.0 * f64::from(self.division.ticks_per_quarter()) * self.tempo_factor)
  }

  fn constant_ticks2millis(&self) -> Option<f64> {
    if !self.tempo_map.is_constant() {
      return None;
    }
    match self.ticks2millis.get() {
      Some(value) => Some(value),
      None => {
        let value = self.millis_per_tick(self.tempo_map.tempo_at(TicksTime::zero()));
        self.ticks2millis.set(Some(value));
        Some(value)
      }
    }
  }

  fn elapsed(&self, from: TicksTime, to: TicksTime) -> ClockTime {
    if to <= from {
      return ClockTime::zero();
    }
    match self.constant_ticks2millis() {
      Some(millis_per_tick) => {
        ClockTime::from_millis_f64((to - from).units() as f64 * millis_per_tick)
      }
      None => self
        .tempo_map
        .elapsed(self.division, from, to)
        .scaled(self.tempo_factor),
    }
  }

  /// Time from the start of the song until `ticks`.
  pub fn time_of_ticks(&self, ticks: TicksTime) -> Result<ClockTime> {
    self.require_ready()?;
    Ok(self.elapsed(TicksTime::zero(), ticks))
  }

  pub fn duration(&self) -> Result<ClockTime> {
    self.time_of_ticks(self.song_length_ticks())
  }

  pub fn event_time(&self, event: &Event) -> Result<ClockTime> {
    self.time_of_ticks(event.position())
  }

  /// Time between the event played right before `event` and `event`
  /// itself, the wait a player needs after the previous one.
  pub fn delta_time_of_event(&self, event: &Event) -> Result<ClockTime> {
    self.require_ready()?;
    let previous = self.timeline.previous_position(event);
    Ok(self.elapsed(previous, event.position()))
  }

  // Statistics

  pub fn statistics(&self) -> &Statistics {
    &self.stats
  }

  pub fn channel_used(&self, channel: Channel) -> bool {
    self.stats.channel_used(channel)
  }

  pub fn channel_label(&self, channel: Channel) -> Option<&[u8]> {
    self.stats.channel_label(channel)
  }

  pub fn channel_program(&self, channel: Channel) -> Option<U7> {
    self.stats.channel_program(channel)
  }

  pub fn lowest_midi_note(&self) -> Option<U7> {
    self.stats.lowest_midi_note()
  }

  pub fn highest_midi_note(&self) -> Option<U7> {
    self.stats.highest_midi_note()
  }
}

impl Default for Sequence {
  fn default() -> Self {
    Sequence::new()
  }
}
