use crate::event::EventKind;
use crate::midi::types::{Channel, U14, U4, U7};

const SYSEX_START: u8 = 0b1111_0000;
const SYSEX_END: u8 = 0b1111_0111;

#[inline]
fn u7(d: U7) -> u8 {
  d & 0x7f
}

#[inline]
fn u14_msb(d: U14) -> u8 {
  ((d >> 7) & 0x7fu16) as u8
}

#[inline]
fn u14_lsb(d: U14) -> u8 {
  (d & 0x7f) as u8
}

#[inline]
fn status_and_channel(status: U4, channel: Channel) -> u8 {
  (status << 4) | (channel.number() & 0x0f)
}

#[inline]
fn bend_to_u14(value: i16) -> U14 {
  (i32::from(value) + 8192).max(0).min(0x3fff) as U14
}

/// Renders timeline events as MIDI wire bytes for an output transport.
/// Tempo, time signature, text and meta events only exist on the timeline
/// and have no wire form.
pub struct Encoder;

impl Encoder {
  pub fn data_size(kind: &EventKind) -> usize {
    match kind {
      EventKind::NoteOff { .. } => 3,
      EventKind::NoteOn { .. } => 3,
      EventKind::KeyPressure { .. } => 3,
      EventKind::ControlChange { .. } => 3,
      EventKind::ProgramChange { .. } => 2,
      EventKind::ChannelPressure { .. } => 2,
      EventKind::PitchBend { .. } => 3,
      EventKind::SysEx { data } => Encoder::sysex_data_size(data),
      EventKind::Tempo { .. }
      | EventKind::TimeSignature { .. }
      | EventKind::Text { .. }
      | EventKind::Meta { .. } => 0,
    }
  }

  /// Writes the event into `out`, which must hold at least `data_size` bytes.
  pub fn encode(kind: &EventKind, out: &mut [u8]) {
    match kind {
      EventKind::NoteOff {
        channel,
        key,
        velocity,
      } => out[..3].copy_from_slice(&[status_and_channel(0b1000, *channel), u7(*key), u7(*velocity)]),
      EventKind::NoteOn {
        channel,
        key,
        velocity,
      } => out[..3].copy_from_slice(&[status_and_channel(0b1001, *channel), u7(*key), u7(*velocity)]),
      EventKind::KeyPressure {
        channel,
        key,
        value,
      } => out[..3].copy_from_slice(&[status_and_channel(0b1010, *channel), u7(*key), u7(*value)]),
      EventKind::ControlChange {
        channel,
        controller,
        value,
      } => out[..3].copy_from_slice(&[
        status_and_channel(0b1011, *channel),
        u7(*controller),
        u7(*value),
      ]),
      EventKind::ProgramChange { channel, program } => {
        out[..2].copy_from_slice(&[status_and_channel(0b1100, *channel), u7(*program)])
      }
      EventKind::ChannelPressure { channel, value } => {
        out[..2].copy_from_slice(&[status_and_channel(0b1101, *channel), u7(*value)])
      }
      EventKind::PitchBend { channel, value } => {
        let value = bend_to_u14(*value);
        out[..3].copy_from_slice(&[
          status_and_channel(0b1110, *channel),
          u14_lsb(value),
          u14_msb(value),
        ])
      }
      EventKind::SysEx { data } => Encoder::sysex_encode(data, out),
      EventKind::Tempo { .. }
      | EventKind::TimeSignature { .. }
      | EventKind::Text { .. }
      | EventKind::Meta { .. } => {}
    }
  }

  pub fn to_bytes(kind: &EventKind) -> Option<Vec<u8>> {
    match Encoder::data_size(kind) {
      0 => None,
      size => {
        let mut data = vec![0u8; size];
        Encoder::encode(kind, data.as_mut_slice());
        Some(data)
      }
    }
  }

  /// Readers may hand over sysex payloads with or without the framing bytes.
  fn sysex_payload(data: &[u8]) -> &[u8] {
    let data = match data.first() {
      Some(&SYSEX_START) => &data[1..],
      _ => data,
    };
    match data.last() {
      Some(&SYSEX_END) => &data[..data.len() - 1],
      _ => data,
    }
  }

  pub fn sysex_data_size(data: &[u8]) -> usize {
    Encoder::sysex_payload(data).len() + 2
  }

  pub fn sysex_encode(data: &[u8], out: &mut [u8]) {
    let payload = Encoder::sysex_payload(data);
    out[0] = SYSEX_START;
    out[1..=payload.len()].copy_from_slice(payload);
    out[payload.len() + 1] = SYSEX_END
  }
}
