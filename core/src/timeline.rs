use log::trace;

use crate::error::{Result, SequenceError};
use crate::event::{Event, EventKind};
use crate::time::TicksTime;

/// Append-only event store that becomes read-only once finalized.
#[derive(Debug, Default)]
pub struct Timeline {
  events: Vec<Event>,
  next_sequence: u64,
  finalized: bool,
}

impl Timeline {
  pub fn new() -> Timeline {
    Timeline::default()
  }

  pub fn append(&mut self, position: TicksTime, kind: EventKind) -> Result<&Event> {
    if self.finalized {
      return Err(SequenceError::state(
        "append on a finalized timeline, clear it before reloading",
      ));
    }
    let event = Event::new(position, self.next_sequence, kind);
    trace!("Append {}", event);
    self.next_sequence += 1;
    self.events.push(event);
    Ok(&self.events[self.events.len() - 1])
  }

  /// Sorts by position keeping the append order of events on the same tick.
  /// Calling it again on a finalized timeline changes nothing.
  pub fn finalize(&mut self) {
    if !self.finalized {
      self.events.sort_by_key(|event| event.position());
      self.finalized = true;
    }
  }

  pub fn clear(&mut self) {
    self.events.clear();
    self.next_sequence = 0;
    self.finalized = false;
  }

  pub fn is_finalized(&self) -> bool {
    self.finalized
  }

  pub fn is_empty(&self) -> bool {
    self.events.is_empty()
  }

  pub fn len(&self) -> usize {
    self.events.len()
  }

  pub fn event_at(&self, index: usize) -> Option<&Event> {
    self.events.get(index)
  }

  pub fn iter(&self) -> impl Iterator<Item = &Event> {
    self.events.iter()
  }

  /// Index of the first event at or after `tick`, `len()` when there is none.
  /// Only meaningful once finalized.
  pub fn first_at_or_after(&self, tick: TicksTime) -> usize {
    self.events.partition_point(|event| event.position() < tick)
  }

  /// Position of the event that plays right before `event`, zero for the
  /// first one. Only meaningful once finalized.
  pub fn previous_position(&self, event: &Event) -> TicksTime {
    match self.events.partition_point(|other| other < event) {
      0 => TicksTime::zero(),
      index => self.events[index - 1].position(),
    }
  }

  pub fn last_position(&self) -> TicksTime {
    if self.finalized {
      return self
        .events
        .last()
        .map_or_else(TicksTime::zero, |event| event.position());
    }
    self
      .events
      .iter()
      .map(|event| event.position())
      .max()
      .unwrap_or_else(TicksTime::zero)
  }
}
