pub mod encoder;
pub mod types;

pub use self::encoder::Encoder;
pub use self::types::{Channel, MIDI_STD_CHANNELS};
