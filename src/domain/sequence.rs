//! Finalized, immutable test stream scripts

use std::sync::Arc;

use super::coder::Coder;
use super::events::{Event, EventKind};
use super::time::EventTime;
use super::validation::{self, ScriptError, WatermarkCursor};

/// An ordered, validated and immutable list of events plus the coder that
/// vouched for every element in it
///
/// Cloning is cheap and clones share storage, so one sequence can back any
/// number of replays, on any thread.
#[derive(Debug, Clone)]
pub struct EventSequence {
    events: Arc<[Event]>,
    coder: Arc<dyn Coder>,
}

impl EventSequence {
    pub(crate) fn from_validated(coder: Arc<dyn Coder>, events: Vec<Event>) -> Self {
        Self {
            events: events.into(),
            coder,
        }
    }

    /// Validate an externally assembled event list
    ///
    /// Applies the same checks as the builder, except that element timestamps
    /// are taken as given: each value carries an explicit stamp, so elements
    /// behind the watermark are admitted as deliberate late data.
    pub fn from_events(
        coder: Arc<dyn Coder>,
        events: impl IntoIterator<Item = Event>,
    ) -> Result<Self, ScriptError> {
        let events: Vec<Event> = events.into_iter().collect();
        validation::check_non_empty(&events)?;
        let mut watermark = WatermarkCursor::default();
        for (index, event) in events.iter().enumerate() {
            match event {
                Event::Element { values } => {
                    validation::check_non_empty_batch(index, values)?;
                    validation::check_encodable(coder.as_ref(), index, values)?;
                }
                Event::Watermark { new_watermark } => watermark.advance(index, *new_watermark)?,
                Event::ProcessingTime { .. } => {}
            }
        }
        Ok(Self::from_validated(coder, events))
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    pub fn coder(&self) -> &dyn Coder {
        self.coder.as_ref()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Always false; a sequence cannot be built without events
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Total number of elements across all element events
    pub fn element_count(&self) -> usize {
        self.events.iter().map(|event| event.values().len()).sum()
    }

    /// Number of events of the given kind
    pub fn count_of(&self, kind: EventKind) -> usize {
        self.events
            .iter()
            .filter(|event| event.classify() == kind)
            .count()
    }

    /// The watermark once every event has been replayed
    pub fn final_watermark(&self) -> EventTime {
        self.events
            .iter()
            .rev()
            .find_map(|event| match event {
                Event::Watermark { new_watermark } => Some(*new_watermark),
                _ => None,
            })
            .unwrap_or_else(EventTime::min)
    }

    /// Whether the script ends with the watermark at infinity
    pub fn is_terminated(&self) -> bool {
        self.final_watermark().is_max()
    }
}

impl PartialEq for EventSequence {
    fn eq(&self, other: &Self) -> bool {
        self.coder.name() == other.coder.name() && self.events == other.events
    }
}

impl<'a> IntoIterator for &'a EventSequence {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::coder::VarIntCoder;
    use crate::domain::time::ProcessingAdvance;
    use crate::domain::value::{TimestampedValue, ValueKind};

    fn at(millis: i64) -> EventTime {
        EventTime::from_millis(millis)
    }

    fn int_coder() -> Arc<dyn Coder> {
        Arc::new(VarIntCoder)
    }

    #[test]
    fn test_from_events_accepts_explicitly_late_elements() {
        let sequence = EventSequence::from_events(
            int_coder(),
            [
                Event::watermark(at(10)),
                Event::elements([TimestampedValue::of(1, at(2))]),
                Event::processing_time(ProcessingAdvance::from_millis(5).unwrap()),
            ],
        )
        .unwrap();
        assert_eq!(sequence.len(), 3);
        assert_eq!(sequence.element_count(), 1);
        assert_eq!(sequence.count_of(EventKind::Watermark), 1);
        assert_eq!(sequence.final_watermark(), at(10));
        assert!(!sequence.is_terminated());
    }

    #[test]
    fn test_from_events_rejects_regressing_watermark() {
        let err = EventSequence::from_events(
            int_coder(),
            [Event::watermark(at(10)), Event::watermark(at(4))],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ScriptError::OutOfOrderWatermark { index: 1, .. }
        ));
    }

    #[test]
    fn test_from_events_rejects_incompatible_and_empty_batches() {
        let err = EventSequence::from_events(
            int_coder(),
            [Event::elements([TimestampedValue::of("x", at(0))])],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ScriptError::TypeMismatch {
                index: 0,
                kind: ValueKind::Text,
                ..
            }
        ));

        let err = EventSequence::from_events(
            int_coder(),
            [Event::watermark(at(1)), Event::elements([])],
        )
        .unwrap_err();
        assert_eq!(err, ScriptError::EmptyElementBatch { index: 1 });

        let err = EventSequence::from_events(int_coder(), []).unwrap_err();
        assert_eq!(err, ScriptError::EmptySequence);
    }

    #[test]
    fn test_clones_share_storage() {
        let sequence =
            EventSequence::from_events(int_coder(), [Event::watermark(EventTime::max())]).unwrap();
        let clone = sequence.clone();
        assert!(std::ptr::eq(sequence.events(), clone.events()));
        assert_eq!(sequence, clone);
        assert!(clone.is_terminated());
    }
}
