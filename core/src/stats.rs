use crate::event::EventKind;
use crate::midi::types::{Channel, MIDI_STD_CHANNELS, U7};

/// Per channel usage and note range of a loaded sequence.
///
/// Note range accessors return `None` until the first note-on is recorded,
/// the same way per channel metadata is `None` until it is first seen.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
  channel_used: [bool; MIDI_STD_CHANNELS],
  channel_events: [u32; MIDI_STD_CHANNELS],
  channel_label: [Option<Vec<u8>>; MIDI_STD_CHANNELS],
  channel_program: [Option<U7>; MIDI_STD_CHANNELS],
  channel_volume: [Option<U7>; MIDI_STD_CHANNELS],
  channel_bank: [Option<u16>; MIDI_STD_CHANNELS],
  lowest_note: Option<U7>,
  highest_note: Option<U7>,
  pending_label: Option<Vec<u8>>,
}

impl Statistics {
  pub fn new() -> Statistics {
    Statistics::default()
  }

  pub fn clear(&mut self) {
    *self = Statistics::default();
  }

  /// Accounts for an event appended to the timeline.
  pub fn record(&mut self, kind: &EventKind) {
    match kind {
      EventKind::NoteOn { channel, key, .. } => self.record_note_on(*channel, *key),
      EventKind::ProgramChange { channel, program } => {
        self.record_channel_event(*channel);
        self.record_program(*channel, *program);
      }
      other => {
        if let Some(channel) = other.channel() {
          self.record_channel_event(channel);
        }
      }
    }
  }

  /// Counts an event on `channel`. A track name seen since the last channel
  /// event labels the channel unless it already has a label.
  pub fn record_channel_event(&mut self, channel: Channel) {
    let index = channel.index();
    self.channel_used[index] = true;
    self.channel_events[index] = self.channel_events[index].saturating_add(1);
    if self.channel_label[index].is_none() {
      if let Some(label) = self.pending_label.take() {
        self.channel_label[index] = Some(label);
      }
    }
  }

  /// Counts a note-on as a channel event and widens the note range.
  pub fn record_note_on(&mut self, channel: Channel, key: U7) {
    self.record_channel_event(channel);
    self.lowest_note = Some(self.lowest_note.map_or(key, |lowest| lowest.min(key)));
    self.highest_note = Some(self.highest_note.map_or(key, |highest| highest.max(key)));
  }

  pub fn record_program(&mut self, channel: Channel, program: U7) {
    self.channel_program[channel.index()] = Some(program);
  }

  pub fn record_volume(&mut self, channel: Channel, volume: U7) {
    self.channel_volume[channel.index()] = Some(volume);
  }

  pub fn record_bank(&mut self, channel: Channel, bank: u16) {
    self.channel_bank[channel.index()] = Some(bank);
  }

  pub fn record_track_label(&mut self, channel: Channel, label: &[u8]) {
    self.channel_label[channel.index()] = Some(label.to_vec());
  }

  /// Remembers a track name until the track's first channel event tells
  /// which channel it belongs to.
  pub fn record_track_name(&mut self, name: &[u8]) {
    self.pending_label = Some(name.to_vec());
  }

  pub fn end_track(&mut self) {
    self.pending_label = None;
  }

  pub fn channel_used(&self, channel: Channel) -> bool {
    self.channel_used[channel.index()]
  }

  pub fn channel_events(&self, channel: Channel) -> u32 {
    self.channel_events[channel.index()]
  }

  pub fn channel_label(&self, channel: Channel) -> Option<&[u8]> {
    self.channel_label[channel.index()].as_deref()
  }

  pub fn channel_program(&self, channel: Channel) -> Option<U7> {
    self.channel_program[channel.index()]
  }

  pub fn channel_volume(&self, channel: Channel) -> Option<U7> {
    self.channel_volume[channel.index()]
  }

  pub fn channel_bank(&self, channel: Channel) -> Option<u16> {
    self.channel_bank[channel.index()]
  }

  pub fn lowest_midi_note(&self) -> Option<U7> {
    self.lowest_note
  }

  pub fn highest_midi_note(&self) -> Option<U7> {
    self.highest_note
  }

  pub fn used_channels(&self) -> impl Iterator<Item = Channel> + '_ {
    (0..MIDI_STD_CHANNELS)
      .filter(move |index| self.channel_used[*index])
      .filter_map(|index| Channel::new(index as i32).ok())
  }
}
