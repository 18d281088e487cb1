//! Domain types for scripting test streams
//!
//! This module holds everything needed to author a script and freeze it:
//! event-time types, element values and coders, the closed event model, the
//! shared invariant checks and the builder itself.

pub mod builder;
pub mod coder;
pub mod events;
pub mod sequence;
pub mod time;
pub mod validation;
pub mod value;

pub use builder::{ElementOptions, TestStream, TestStreamBuilder};
pub use coder::{
    BooleanCoder, ByteArrayCoder, Coder, CoderError, JsonCoder, StringUtf8Coder, VarIntCoder,
};
pub use events::{Event, EventKind};
pub use sequence::EventSequence;
pub use time::{EventTime, ProcessingAdvance};
pub use validation::{ScriptError, WatermarkCursor};
pub use value::{ElementValue, TimestampedValue, ValueKind};
