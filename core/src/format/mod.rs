//! Contracts between the external file readers and the sequence.
//!
//! A reader owns whatever it needs to decode its file and pushes what it
//! finds into a sink, synchronously and in file order. The sequence hands
//! the reader one of the adapters in this module as that sink for the
//! duration of a single load.

pub mod smf;
pub mod wrk;

use log::{debug, info, warn};

use crate::error::{Result, SequenceError};
use crate::event::EventKind;
use crate::stats::Statistics;
use crate::time::{Division, TicksTime};
use crate::timeline::Timeline;

pub use self::smf::{SmfAdapter, SmfReader, SmfSink};
pub use self::wrk::{TrackHeader, WrkAdapter, WrkReader, WrkSink};

/// Advisory notifications about the progress of a load.
pub trait LoadObserver {
  fn loading_start(&mut self, _total_size: u64) {}
  fn loading_progress(&mut self, _position: u64) {}
  fn loading_finished(&mut self) {}
}

impl LoadObserver for () {}

/// Reports load progress through the `log` facade.
#[derive(Debug, Default)]
pub struct LogObserver {
  total_size: u64,
}

impl LogObserver {
  pub fn new() -> LogObserver {
    LogObserver::default()
  }
}

impl LoadObserver for LogObserver {
  fn loading_start(&mut self, total_size: u64) {
    self.total_size = total_size;
    info!("Loading {} bytes ...", total_size);
  }

  fn loading_progress(&mut self, position: u64) {
    debug!("Loaded {}/{} bytes", position, self.total_size);
  }

  fn loading_finished(&mut self) {
    info!("Loading finished");
  }
}

/// State shared by both adapters while a load is in progress.
pub(crate) struct Loader<'a> {
  timeline: &'a mut Timeline,
  stats: &'a mut Statistics,
  observer: &'a mut dyn LoadObserver,
  position: u64,
  division: Option<Division>,
}

impl<'a> Loader<'a> {
  pub(crate) fn new(
    timeline: &'a mut Timeline,
    stats: &'a mut Statistics,
    observer: &'a mut dyn LoadObserver,
  ) -> Loader<'a> {
    Loader {
      timeline,
      stats,
      observer,
      position: 0,
      division: None,
    }
  }

  pub(crate) fn append(&mut self, tick: TicksTime, kind: EventKind) -> Result<()> {
    self.stats.record(&kind);
    self.timeline.append(tick, kind)?;
    Ok(())
  }

  pub(crate) fn stats_mut(&mut self) -> &mut Statistics {
    &mut *self.stats
  }

  pub(crate) fn set_division(&mut self, value: i32) -> Result<()> {
    let division = Division::from_header(value)?;
    debug!("Division: {} ticks per quarter", division.ticks_per_quarter());
    self.division = Some(division);
    Ok(())
  }

  pub(crate) fn division(&self) -> Result<Division> {
    self
      .division
      .ok_or_else(|| SequenceError::format("the file does not declare a division"))
  }

  /// Forwards reader progress to the observer, dropping regressions.
  pub(crate) fn progress(&mut self, position: u64) {
    if position < self.position {
      warn!(
        "Ignoring load progress going back from {} to {}",
        self.position, position
      );
    } else if position > self.position {
      self.position = position;
      self.observer.loading_progress(position);
    }
  }
}

#[cfg(test)]
mod test {

  use super::{LoadObserver, LogObserver, Loader};
  use crate::event::EventKind;
  use crate::midi::types::Channel;
  use crate::stats::Statistics;
  use crate::time::TicksTime;
  use crate::timeline::Timeline;

  #[derive(Default)]
  pub struct RecordingObserver {
    pub positions: Vec<u64>,
  }

  impl LoadObserver for RecordingObserver {
    fn loading_progress(&mut self, position: u64) {
      self.positions.push(position);
    }
  }

  #[test]
  pub fn progress_is_monotonic() {
    let mut timeline = Timeline::new();
    let mut stats = Statistics::new();
    let mut observer = RecordingObserver::default();
    {
      let mut loader = Loader::new(&mut timeline, &mut stats, &mut observer);
      for position in vec![10, 20, 15, 20, 40] {
        loader.progress(position);
      }
    }
    assert_eq!(observer.positions, vec![10, 20, 40]);
  }

  #[test]
  pub fn append_feeds_statistics() {
    let mut timeline = Timeline::new();
    let mut stats = Statistics::new();
    let mut observer = ();
    {
      let mut loader = Loader::new(&mut timeline, &mut stats, &mut observer);
      let kind = EventKind::NoteOn {
        channel: Channel::new(3).unwrap(),
        key: 48,
        velocity: 64,
      };
      loader.append(TicksTime::new(12), kind).unwrap();
    }
    assert_eq!(timeline.len(), 1);
    assert_eq!(stats.lowest_midi_note(), Some(48));
  }

  #[test]
  pub fn log_observer_remembers_total_size() {
    let mut observer = LogObserver::new();
    observer.loading_start(2048);
    observer.loading_progress(1024);
    observer.loading_finished();
    assert_eq!(observer.total_size, 2048);
  }

  #[test]
  pub fn missing_division_is_a_format_error() {
    let mut timeline = Timeline::new();
    let mut stats = Statistics::new();
    let mut observer = ();
    let loader = Loader::new(&mut timeline, &mut stats, &mut observer);
    assert!(loader.division().unwrap_err().is_format());
  }
}
