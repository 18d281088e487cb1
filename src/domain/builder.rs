//! Scripting test streams
//!
//! A [`TestStreamBuilder`] stages events one call at a time and checks each one
//! against the state accumulated so far. A call that would break an
//! event-time invariant fails on the spot and leaves the builder exactly as it
//! was, so the script can be corrected and continued.
//!
//! ```
//! use test_stream::domain::{EventTime, TestStream, VarIntCoder};
//!
//! let mut builder = TestStream::create(VarIntCoder);
//! builder
//!     .add_elements_at(EventTime::from_millis(0), 1, [2, 3])?
//!     .advance_watermark_to(EventTime::from_millis(10))?
//!     .advance_watermark_to_infinity();
//! let sequence = builder.build()?;
//! assert_eq!(sequence.len(), 3);
//! # Ok::<(), test_stream::domain::ScriptError>(())
//! ```

use chrono::Duration;
use std::sync::Arc;
use tracing::debug;

use super::coder::Coder;
use super::events::Event;
use super::sequence::EventSequence;
use super::time::EventTime;
use super::validation::{self, ScriptError, WatermarkCursor};
use super::value::{ElementValue, TimestampedValue};
use crate::config::ScriptSettings;

/// Entry point for scripting a test stream
pub struct TestStream;

impl TestStream {
    /// Start an empty script whose elements must be encodable by `coder`
    pub fn create(coder: impl Coder + 'static) -> TestStreamBuilder {
        TestStreamBuilder::new(Arc::new(coder))
    }

    /// Start an empty script with a coder that is already shared
    pub fn create_shared(coder: Arc<dyn Coder>) -> TestStreamBuilder {
        TestStreamBuilder::new(coder)
    }

    /// Start an empty script using the configured lateness allowance
    pub fn from_settings(
        coder: impl Coder + 'static,
        settings: &ScriptSettings,
    ) -> TestStreamBuilder {
        Self::create(coder).with_allowed_lateness(settings.allowed_lateness())
    }
}

/// How the elements of one `add_elements_with` call are stamped and checked
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ElementOptions {
    /// Timestamp for every element; the current watermark when `None`
    pub timestamp: Option<EventTime>,
    /// Admit elements behind the watermark for this call only
    pub allow_late: bool,
}

impl ElementOptions {
    pub fn at(timestamp: EventTime) -> Self {
        Self {
            timestamp: Some(timestamp),
            allow_late: false,
        }
    }

    pub fn allow_late(mut self) -> Self {
        self.allow_late = true;
        self
    }
}

/// Mutable staging state for a script
///
/// Owned by the single test that writes the script. [`TestStreamBuilder::build`]
/// consumes it.
#[derive(Debug)]
pub struct TestStreamBuilder {
    coder: Arc<dyn Coder>,
    events: Vec<Event>,
    watermark: WatermarkCursor,
    allowed_lateness: Duration,
}

impl TestStreamBuilder {
    fn new(coder: Arc<dyn Coder>) -> Self {
        Self {
            coder,
            events: Vec::new(),
            watermark: WatermarkCursor::default(),
            allowed_lateness: Duration::zero(),
        }
    }

    /// Admit elements up to `lateness` behind the watermark on every call
    ///
    /// Negative values are treated as zero.
    pub fn with_allowed_lateness(mut self, lateness: Duration) -> Self {
        self.allowed_lateness = lateness.max(Duration::zero());
        self
    }

    pub fn current_watermark(&self) -> EventTime {
        self.watermark.current()
    }

    pub fn allowed_lateness(&self) -> Duration {
        self.allowed_lateness
    }

    /// Number of staged events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Append `first` and every value of `rest`, stamped with the current watermark
    pub fn add_elements<V, I>(&mut self, first: V, rest: I) -> Result<&mut Self, ScriptError>
    where
        V: Into<ElementValue>,
        I: IntoIterator<Item = V>,
    {
        self.add_elements_with(first, rest, ElementOptions::default())
    }

    /// Append `first` and every value of `rest`, stamped with `timestamp`
    pub fn add_elements_at<V, I>(
        &mut self,
        timestamp: EventTime,
        first: V,
        rest: I,
    ) -> Result<&mut Self, ScriptError>
    where
        V: Into<ElementValue>,
        I: IntoIterator<Item = V>,
    {
        self.add_elements_with(first, rest, ElementOptions::at(timestamp))
    }

    pub fn add_elements_with<V, I>(
        &mut self,
        first: V,
        rest: I,
        options: ElementOptions,
    ) -> Result<&mut Self, ScriptError>
    where
        V: Into<ElementValue>,
        I: IntoIterator<Item = V>,
    {
        let timestamp = options
            .timestamp
            .unwrap_or_else(|| self.watermark.current());
        let values = std::iter::once(first)
            .chain(rest)
            .map(|value| TimestampedValue::of(value, timestamp))
            .collect();
        self.stage_elements(values, options.allow_late)
    }

    /// Append values that each carry their own timestamp
    pub fn add_timestamped_elements(
        &mut self,
        values: impl IntoIterator<Item = TimestampedValue>,
    ) -> Result<&mut Self, ScriptError> {
        self.stage_elements(values.into_iter().collect(), false)
    }

    fn stage_elements(
        &mut self,
        values: Vec<TimestampedValue>,
        allow_late: bool,
    ) -> Result<&mut Self, ScriptError> {
        let index = self.events.len();
        validation::check_non_empty_batch(index, &values)
            .and_then(|()| validation::check_encodable(self.coder.as_ref(), index, &values))
            .and_then(|()| {
                if allow_late {
                    return Ok(());
                }
                validation::check_on_time(
                    index,
                    &values,
                    self.watermark.current(),
                    self.allowed_lateness,
                )
            })
            .inspect_err(|e| debug!(error = %e, "rejected element event"))?;
        self.events.push(Event::Element { values });
        Ok(self)
    }

    pub fn advance_watermark_to(
        &mut self,
        new_watermark: EventTime,
    ) -> Result<&mut Self, ScriptError> {
        let index = self.events.len();
        self.watermark
            .advance(index, new_watermark)
            .inspect_err(|e| debug!(error = %e, "rejected watermark advance"))?;
        self.events.push(Event::Watermark { new_watermark });
        Ok(self)
    }

    /// Advance the watermark to the end of time; afterwards only calls that
    /// allow late data can add elements
    pub fn advance_watermark_to_infinity(&mut self) -> &mut Self {
        self.watermark.advance_to_infinity();
        self.events.push(Event::Watermark {
            new_watermark: EventTime::max(),
        });
        self
    }

    pub fn advance_processing_time(&mut self, by: Duration) -> Result<&mut Self, ScriptError> {
        let index = self.events.len();
        let advance_by = validation::check_positive_duration(index, by)
            .inspect_err(|e| debug!(error = %e, "rejected processing time advance"))?;
        self.events.push(Event::ProcessingTime { advance_by });
        Ok(self)
    }

    /// Freeze the staged events into an [`EventSequence`]
    pub fn build(self) -> Result<EventSequence, ScriptError> {
        validation::check_non_empty(&self.events)?;
        debug!(
            events = self.events.len(),
            coder = self.coder.name(),
            terminated = self.watermark.is_terminated(),
            "built test stream"
        );
        Ok(EventSequence::from_validated(self.coder, self.events))
    }
}
