//! The events a test stream script is made of

use std::fmt;

use super::time::{EventTime, ProcessingAdvance};
use super::value::TimestampedValue;

/// One scripted step
///
/// The variant set is closed; consumers match on it exhaustively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Elements arriving together, delivered in order
    Element { values: Vec<TimestampedValue> },
    /// The watermark moving to `new_watermark`
    Watermark { new_watermark: EventTime },
    /// The simulated processing-time clock moving forward
    ProcessingTime { advance_by: ProcessingAdvance },
}

/// Variant tag of an [`Event`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Element,
    Watermark,
    ProcessingTime,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Element => "element",
            EventKind::Watermark => "watermark",
            EventKind::ProcessingTime => "processing_time",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Event {
    pub fn elements(values: impl IntoIterator<Item = TimestampedValue>) -> Self {
        Event::Element {
            values: values.into_iter().collect(),
        }
    }

    pub fn watermark(new_watermark: EventTime) -> Self {
        Event::Watermark { new_watermark }
    }

    pub fn processing_time(advance_by: ProcessingAdvance) -> Self {
        Event::ProcessingTime { advance_by }
    }

    pub fn classify(&self) -> EventKind {
        match self {
            Event::Element { .. } => EventKind::Element,
            Event::Watermark { .. } => EventKind::Watermark,
            Event::ProcessingTime { .. } => EventKind::ProcessingTime,
        }
    }

    /// The values of an element event, empty for the other kinds
    pub fn values(&self) -> &[TimestampedValue] {
        match self {
            Event::Element { values } => values,
            Event::Watermark { .. } | Event::ProcessingTime { .. } => &[],
        }
    }
}
