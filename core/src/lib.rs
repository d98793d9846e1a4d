pub mod config;
pub mod cursor;
pub mod error;
pub mod event;
pub mod format;
pub mod logging;
pub mod midi;
pub mod sequence;
pub mod stats;
pub mod time;
pub mod timeline;

pub use crate::error::{Result, SequenceError};
pub use crate::event::{Event, EventKind, TextType};
pub use crate::sequence::{Phase, Sequence};
