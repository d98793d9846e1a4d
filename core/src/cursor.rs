use log::trace;

use crate::error::{Result, SequenceError};
use crate::event::Event;
use crate::time::TicksTime;
use crate::timeline::Timeline;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
  Reset,
  Advancing,
  Seeking,
  Exhausted,
}

/// Read position over a finalized timeline.
///
/// `tick` is the position of the last event handed out, or the target of
/// the last seek.
#[derive(Debug, Clone)]
pub struct Cursor {
  index: usize,
  tick: TicksTime,
  state: CursorState,
}

impl Cursor {
  pub fn new() -> Cursor {
    Cursor {
      index: 0,
      tick: TicksTime::zero(),
      state: CursorState::Reset,
    }
  }

  pub fn reset(&mut self) {
    *self = Cursor::new();
  }

  pub fn state(&self) -> CursorState {
    self.state
  }

  pub fn index(&self) -> usize {
    self.index
  }

  pub fn tick(&self) -> TicksTime {
    self.tick
  }

  pub fn has_more(&self, timeline: &Timeline) -> bool {
    self.index < timeline.len()
  }

  /// The event the next call to `next` returns, without moving.
  pub fn peek<'a>(&self, timeline: &'a Timeline) -> Option<&'a Event> {
    timeline.event_at(self.index)
  }

  pub fn next<'a>(&mut self, timeline: &'a Timeline) -> Result<&'a Event> {
    match timeline.event_at(self.index) {
      Some(event) => {
        self.index += 1;
        self.tick = event.position();
        self.state = if self.index < timeline.len() {
          CursorState::Advancing
        } else {
          CursorState::Exhausted
        };
        Ok(event)
      }
      None => {
        self.state = CursorState::Exhausted;
        Err(SequenceError::state("no more events to play"))
      }
    }
  }

  /// Moves to the first event at or after `tick`.
  pub fn seek(&mut self, timeline: &Timeline, tick: TicksTime) {
    self.state = CursorState::Seeking;
    self.index = timeline.first_at_or_after(tick);
    self.tick = tick;
    self.state = if self.index < timeline.len() {
      CursorState::Advancing
    } else {
      CursorState::Exhausted
    };
    trace!("Seek to {}: index {} {:?}", tick, self.index, self.state);
  }
}

impl Default for Cursor {
  fn default() -> Self {
    Cursor::new()
  }
}
