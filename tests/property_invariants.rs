//! Property-based tests for script invariants
//!
//! Generates random scripting calls and checks that whatever the builder
//! accepts is a valid sequence, and that replay reproduces it exactly.

use chrono::Duration;
use proptest::prelude::*;
use test_stream::domain::{Event, EventTime, ScriptError, TestStream, VarIntCoder};
use test_stream::replay::{attach, Observation, RecordingIntake};

/// One scripting call, with timestamps relative to the current watermark
#[derive(Debug, Clone)]
pub enum Step {
    Elements { offset_ms: i64, values: Vec<i64> },
    Watermark { offset_ms: i64 },
    ProcessingTime { millis: i64 },
}

pub mod generators {
    use super::*;
    use proptest::collection::vec;

    pub fn step() -> impl Strategy<Value = Step> {
        prop_oneof![
            (-50i64..50, vec(any::<i64>(), 1..5))
                .prop_map(|(offset_ms, values)| Step::Elements { offset_ms, values }),
            (-50i64..50).prop_map(|offset_ms| Step::Watermark { offset_ms }),
            (-10i64..1_000).prop_map(|millis| Step::ProcessingTime { millis }),
        ]
    }

    pub fn script() -> impl Strategy<Value = Vec<Step>> {
        vec(step(), 1..30)
    }
}

/// Apply every step, ignoring rejected ones; returns how many were rejected
fn apply(steps: &[Step]) -> (test_stream::domain::TestStreamBuilder, usize) {
    let mut builder = TestStream::create(VarIntCoder);
    let mut rejected = 0;
    for step in steps {
        let watermark = builder.current_watermark().as_millis();
        let result = match step {
            Step::Elements { offset_ms, values } => builder
                .add_elements_at(
                    EventTime::from_millis(watermark.saturating_add(*offset_ms)),
                    values[0],
                    values[1..].iter().copied(),
                )
                .map(|_| ()),
            Step::Watermark { offset_ms } => builder
                .advance_watermark_to(EventTime::from_millis(watermark.saturating_add(*offset_ms)))
                .map(|_| ()),
            Step::ProcessingTime { millis } => builder
                .advance_processing_time(Duration::milliseconds(*millis))
                .map(|_| ()),
        };
        if result.is_err() {
            rejected += 1;
        }
    }
    (builder, rejected)
}

proptest! {
    #[test]
    fn prop_watermarks_never_decrease(steps in generators::script()) {
        let (builder, _) = apply(&steps);
        if let Ok(sequence) = builder.build() {
            let watermarks: Vec<EventTime> = sequence
                .iter()
                .filter_map(|event| match event {
                    Event::Watermark { new_watermark } => Some(*new_watermark),
                    _ => None,
                })
                .collect();
            prop_assert!(watermarks.windows(2).all(|pair| pair[0] <= pair[1]));
        }
    }

    #[test]
    fn prop_elements_are_never_behind_the_watermark(steps in generators::script()) {
        let (builder, _) = apply(&steps);
        if let Ok(sequence) = builder.build() {
            let mut watermark = EventTime::min();
            for event in &sequence {
                match event {
                    Event::Element { values } => {
                        prop_assert!(values.iter().all(|tv| tv.timestamp() >= watermark));
                    }
                    Event::Watermark { new_watermark } => watermark = *new_watermark,
                    Event::ProcessingTime { advance_by } => {
                        prop_assert!(advance_by.as_duration() > Duration::zero());
                    }
                }
            }
        }
    }

    #[test]
    fn prop_rejected_steps_leave_no_trace(steps in generators::script()) {
        let (builder, rejected) = apply(&steps);
        prop_assert_eq!(builder.len() + rejected, steps.len());
    }

    #[test]
    fn prop_rebuilding_from_events_accepts_built_sequences(steps in generators::script()) {
        let (builder, _) = apply(&steps);
        if let Ok(sequence) = builder.build() {
            let rebuilt = test_stream::domain::EventSequence::from_events(
                std::sync::Arc::new(VarIntCoder),
                sequence.iter().cloned(),
            );
            prop_assert_eq!(rebuilt, Ok(sequence));
        }
    }

    #[test]
    fn prop_replay_reproduces_the_script(steps in generators::script()) {
        let (builder, _) = apply(&steps);
        let sequence = match builder.build() {
            Ok(sequence) => sequence,
            Err(err) => {
                prop_assert_eq!(err, ScriptError::EmptySequence);
                return Ok(());
            }
        };

        let recorder = RecordingIntake::new();
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let report = runtime
            .block_on(attach(sequence.clone(), recorder.clone()).run())
            .unwrap();

        let expected: Vec<Observation> = sequence
            .iter()
            .flat_map(|event| match event {
                Event::Element { values } => {
                    values.iter().cloned().map(Observation::Element).collect::<Vec<_>>()
                }
                Event::Watermark { new_watermark } => vec![Observation::Watermark(*new_watermark)],
                Event::ProcessingTime { advance_by } => {
                    vec![Observation::ProcessingTime(*advance_by)]
                }
            })
            .chain(std::iter::once(Observation::Complete))
            .collect();
        prop_assert_eq!(recorder.observations(), expected);
        prop_assert_eq!(report.events_delivered, sequence.len());
        prop_assert_eq!(report.final_watermark, sequence.final_watermark());
    }
}
