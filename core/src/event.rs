use std::cmp::Ordering;
use std::fmt;

use crate::midi::types::{Channel, U7};
use crate::time::{Tempo, TicksTime};

/// Text meta event flavours, including the `@x` tags of karaoke files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextType {
  Text = 1,
  Copyright = 2,
  TrackName = 3,
  InstrumentName = 4,
  Lyric = 5,
  Marker = 6,
  Cue = 7,
  KarFileType = 8,
  KarVersion = 9,
  KarInformation = 10,
  KarLanguage = 11,
  KarTitles = 12,
  KarWarnings = 13,
}

impl TextType {
  pub fn from_meta(meta_type: u8) -> Option<TextType> {
    match meta_type {
      1 => Some(TextType::Text),
      2 => Some(TextType::Copyright),
      3 => Some(TextType::TrackName),
      4 => Some(TextType::InstrumentName),
      5 => Some(TextType::Lyric),
      6 => Some(TextType::Marker),
      7 => Some(TextType::Cue),
      _ => None,
    }
  }

  /// Classifies a text meta event, looking into plain text for karaoke tags.
  pub fn classify(meta_type: u8, data: &[u8]) -> Option<TextType> {
    let text_type = TextType::from_meta(meta_type)?;
    if text_type != TextType::Text || data.len() < 2 || data[0] != b'@' {
      return Some(text_type);
    }
    let kar_type = match data[1] {
      b'K' => TextType::KarFileType,
      b'V' => TextType::KarVersion,
      b'I' => TextType::KarInformation,
      b'L' => TextType::KarLanguage,
      b'T' => TextType::KarTitles,
      b'W' => TextType::KarWarnings,
      _ => TextType::Text,
    };
    Some(kar_type)
  }

  pub fn code(&self) -> u8 {
    *self as u8
  }

  pub fn is_karaoke(&self) -> bool {
    self.code() >= TextType::KarFileType.code()
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
  NoteOn {
    channel: Channel,
    key: U7,
    velocity: U7,
  },

  NoteOff {
    channel: Channel,
    key: U7,
    velocity: U7,
  },

  KeyPressure {
    channel: Channel,
    key: U7,
    value: U7,
  },

  ControlChange {
    channel: Channel,
    controller: U7,
    value: U7,
  },

  ProgramChange {
    channel: Channel,
    program: U7,
  },

  ChannelPressure {
    channel: Channel,
    value: U7,
  },

  /// Centered bend, -8192..=8191.
  PitchBend {
    channel: Channel,
    value: i16,
  },

  SysEx {
    data: Vec<u8>,
  },

  Tempo {
    tempo: Tempo,
  },

  /// `denominator` is the note value itself (4 for quarters), not the
  /// power of two stored in the file.
  TimeSignature {
    numerator: u8,
    denominator: u8,
    clocks_per_click: u8,
    thirty_seconds_per_quarter: u8,
  },

  Text {
    text_type: TextType,
    track: u16,
    data: Vec<u8>,
  },

  Meta {
    meta_type: u8,
    data: Vec<u8>,
  },
}

impl EventKind {
  pub fn channel(&self) -> Option<Channel> {
    match self {
      EventKind::NoteOn { channel, .. }
      | EventKind::NoteOff { channel, .. }
      | EventKind::KeyPressure { channel, .. }
      | EventKind::ControlChange { channel, .. }
      | EventKind::ProgramChange { channel, .. }
      | EventKind::ChannelPressure { channel, .. }
      | EventKind::PitchBend { channel, .. } => Some(*channel),
      _ => None,
    }
  }

  pub fn is_tempo(&self) -> bool {
    match self {
      EventKind::Tempo { .. } => true,
      _ => false,
    }
  }

  pub fn name(&self) -> &'static str {
    match self {
      EventKind::NoteOn { .. } => "note-on",
      EventKind::NoteOff { .. } => "note-off",
      EventKind::KeyPressure { .. } => "key-pressure",
      EventKind::ControlChange { .. } => "control-change",
      EventKind::ProgramChange { .. } => "program-change",
      EventKind::ChannelPressure { .. } => "channel-pressure",
      EventKind::PitchBend { .. } => "pitch-bend",
      EventKind::SysEx { .. } => "sysex",
      EventKind::Tempo { .. } => "tempo",
      EventKind::TimeSignature { .. } => "time-signature",
      EventKind::Text { .. } => "text",
      EventKind::Meta { .. } => "meta",
    }
  }
}

/// An event placed on the timeline.
///
/// Equality and ordering only look at the position and at the order in
/// which the event was appended, never at the payload.
#[derive(Debug, Clone)]
pub struct Event {
  position: TicksTime,
  sequence: u64,
  kind: EventKind,
}

impl Event {
  pub(crate) fn new(position: TicksTime, sequence: u64, kind: EventKind) -> Event {
    Event {
      position,
      sequence,
      kind,
    }
  }

  pub fn position(&self) -> TicksTime {
    self.position
  }

  pub fn sequence_number(&self) -> u64 {
    self.sequence
  }

  pub fn kind(&self) -> &EventKind {
    &self.kind
  }

  pub fn channel(&self) -> Option<Channel> {
    self.kind.channel()
  }
}

impl PartialEq for Event {
  fn eq(&self, other: &Event) -> bool {
    self.position == other.position && self.sequence == other.sequence
  }
}

impl Eq for Event {}

impl Ord for Event {
  fn cmp(&self, other: &Event) -> Ordering {
    self
      .position
      .cmp(&other.position)
      .then(self.sequence.cmp(&other.sequence))
  }
}

impl PartialOrd for Event {
  fn partial_cmp(&self, other: &Event) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl fmt::Display for Event {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self.kind.channel() {
      Some(channel) => write!(f, "[{}] {} {}", self.position, channel, self.kind.name()),
      None => write!(f, "[{}] {}", self.position, self.kind.name()),
    }
  }
}

#[cfg(test)]
mod test {

  use super::{Event, EventKind, TextType};
  use crate::midi::types::Channel;
  use crate::time::{Tempo, TicksTime};
  use std::cmp::Ordering;

  fn note_on(channel: i32, key: u8) -> EventKind {
    EventKind::NoteOn {
      channel: Channel::new(channel).unwrap(),
      key,
      velocity: 100,
    }
  }

  #[test]
  pub fn ordering_uses_position_then_sequence() {
    let first = Event::new(TicksTime::new(10), 5, note_on(0, 60));
    let second = Event::new(TicksTime::new(10), 6, note_on(0, 60));
    let third = Event::new(TicksTime::new(5), 7, note_on(0, 60));
    assert_eq!(first.cmp(&second), Ordering::Less);
    assert_eq!(third.cmp(&first), Ordering::Less);
  }

  #[test]
  pub fn equality_ignores_payload() {
    let a = Event::new(TicksTime::new(10), 1, note_on(0, 60));
    let b = Event::new(TicksTime::new(10), 1, note_on(3, 72));
    let c = Event::new(TicksTime::new(10), 2, note_on(0, 60));
    assert_eq!(a, b);
    assert_ne!(a, c);
  }

  #[test]
  pub fn channel_accessor() {
    let event = Event::new(TicksTime::zero(), 0, note_on(9, 36));
    assert_eq!(event.channel(), Some(Channel::new(9).unwrap()));
    let tempo = EventKind::Tempo {
      tempo: Tempo::default(),
    };
    assert_eq!(tempo.channel(), None);
    assert!(tempo.is_tempo());
  }

  #[test]
  pub fn display() {
    let event = Event::new(TicksTime::new(96), 0, note_on(2, 60));
    assert_eq!(event.to_string(), "[96t] ch2 note-on");
  }

  #[test]
  pub fn text_type_from_meta() {
    assert_eq!(TextType::from_meta(3), Some(TextType::TrackName));
    assert_eq!(TextType::from_meta(6), Some(TextType::Marker));
    assert_eq!(TextType::from_meta(0x51), None);
  }

  #[test]
  pub fn text_type_karaoke_tags() {
    assert_eq!(TextType::classify(1, b"@TSong title"), Some(TextType::KarTitles));
    assert_eq!(TextType::classify(1, b"@KMIDI KARAOKE FILE"), Some(TextType::KarFileType));
    assert_eq!(TextType::classify(1, b"@V0100"), Some(TextType::KarVersion));
    assert_eq!(TextType::classify(1, b"@Zzz"), Some(TextType::Text));
    assert_eq!(TextType::classify(1, b"plain"), Some(TextType::Text));
    assert_eq!(TextType::classify(5, b"@Tnot a tag"), Some(TextType::Lyric));
    assert!(TextType::KarWarnings.is_karaoke());
    assert!(!TextType::Cue.is_karaoke());
  }
}
