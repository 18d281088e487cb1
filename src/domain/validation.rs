//! Event-time invariants shared by everything that assembles a script
//!
//! Every check reports the index the offending event would have occupied in
//! the sequence, so a failing assertion points at the exact scripting call.

use chrono::Duration;
use thiserror::Error;

use super::coder::Coder;
use super::events::Event;
use super::time::{EventTime, ProcessingAdvance};
use super::value::{TimestampedValue, ValueKind};

/// A script that violates an event-time invariant
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    #[error("event {index}: element {position} is a {kind} value, which {coder} cannot encode")]
    TypeMismatch {
        index: usize,
        position: usize,
        coder: &'static str,
        kind: ValueKind,
    },

    #[error(
        "event {index}: element {position} at {timestamp} is behind the watermark {watermark}"
    )]
    LateData {
        index: usize,
        position: usize,
        timestamp: EventTime,
        watermark: EventTime,
    },

    #[error("event {index}: watermark cannot move back from {current} to {requested}")]
    OutOfOrderWatermark {
        index: usize,
        requested: EventTime,
        current: EventTime,
    },

    #[error("event {index}: processing time must advance by a positive duration, got {requested}")]
    NonPositiveDuration { index: usize, requested: Duration },

    #[error("event {index}: an element event needs at least one element")]
    EmptyElementBatch { index: usize },

    #[error("a test stream needs at least one event")]
    EmptySequence,
}

impl ScriptError {
    /// Index of the offending event, if the failure is tied to one
    pub fn event_index(&self) -> Option<usize> {
        match self {
            ScriptError::TypeMismatch { index, .. }
            | ScriptError::LateData { index, .. }
            | ScriptError::OutOfOrderWatermark { index, .. }
            | ScriptError::NonPositiveDuration { index, .. }
            | ScriptError::EmptyElementBatch { index } => Some(*index),
            ScriptError::EmptySequence => None,
        }
    }
}

/// The watermark implied by the events accepted so far
///
/// Starts at the beginning of time and only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatermarkCursor {
    current: EventTime,
}

impl Default for WatermarkCursor {
    fn default() -> Self {
        Self {
            current: EventTime::min(),
        }
    }
}

impl WatermarkCursor {
    pub fn current(&self) -> EventTime {
        self.current
    }

    pub fn is_terminated(&self) -> bool {
        self.current.is_max()
    }

    /// Move to `requested`; the cursor is untouched on failure
    pub fn advance(&mut self, index: usize, requested: EventTime) -> Result<(), ScriptError> {
        if requested < self.current {
            return Err(ScriptError::OutOfOrderWatermark {
                index,
                requested,
                current: self.current,
            });
        }
        self.current = requested;
        Ok(())
    }

    pub fn advance_to_infinity(&mut self) {
        self.current = EventTime::max();
    }
}

pub(crate) fn check_non_empty_batch(
    index: usize,
    values: &[TimestampedValue],
) -> Result<(), ScriptError> {
    if values.is_empty() {
        return Err(ScriptError::EmptyElementBatch { index });
    }
    Ok(())
}

pub(crate) fn check_encodable(
    coder: &dyn Coder,
    index: usize,
    values: &[TimestampedValue],
) -> Result<(), ScriptError> {
    match values
        .iter()
        .position(|tv| !coder.can_encode(tv.value()))
    {
        Some(position) => Err(ScriptError::TypeMismatch {
            index,
            position,
            coder: coder.name(),
            kind: values[position].value().kind(),
        }),
        None => Ok(()),
    }
}

/// Rejects elements stamped before `watermark - allowed_lateness`, and every
/// element once the watermark is at `EventTime::max()`
pub(crate) fn check_on_time(
    index: usize,
    values: &[TimestampedValue],
    watermark: EventTime,
    allowed_lateness: Duration,
) -> Result<(), ScriptError> {
    // Nothing is on time once the watermark has reached the end of time
    let horizon = watermark.saturating_sub(allowed_lateness);
    let terminated = watermark.is_max();
    match values
        .iter()
        .position(|tv| terminated || tv.timestamp() < horizon)
    {
        Some(position) => Err(ScriptError::LateData {
            index,
            position,
            timestamp: values[position].timestamp(),
            watermark,
        }),
        None => Ok(()),
    }
}

pub(crate) fn check_positive_duration(
    index: usize,
    requested: Duration,
) -> Result<ProcessingAdvance, ScriptError> {
    ProcessingAdvance::try_new(requested)
        .map_err(|_| ScriptError::NonPositiveDuration { index, requested })
}

pub(crate) fn check_non_empty(events: &[Event]) -> Result<(), ScriptError> {
    if events.is_empty() {
        return Err(ScriptError::EmptySequence);
    }
    Ok(())
}
