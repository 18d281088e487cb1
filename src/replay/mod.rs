//! Replaying a finalized test stream into a pipeline
//!
//! [`attach`] binds an [`EventSequence`] to a [`PipelineIntake`]. Running the
//! resulting [`AttachedSource`] walks the script once, front to back, and waits
//! for the intake to accept each delivery before making the next one, so the
//! pipeline observes every event fully before any part of the following one.

pub mod intake;

pub use intake::{ChannelIntake, IntakeError, Observation, PipelineIntake, RecordingIntake};

use chrono::Duration;
use nutype::nutype;
use serde::{Deserialize, Serialize};
use std::future::Future;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{info, instrument, trace, warn};

use crate::domain::{Event, EventKind, EventSequence, EventTime};

/// Identifies one attachment of a sequence to an intake
#[nutype(derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display
))]
pub struct ReplayId(uuid::Uuid);

impl ReplayId {
    pub fn generate() -> Self {
        Self::new(uuid::Uuid::now_v7())
    }
}

/// Replay aborted because the intake refused a delivery
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("intake rejected {kind} event {index}{}: {source}", element_suffix(.position))]
    IntakeRejected {
        index: usize,
        position: Option<usize>,
        kind: EventKind,
        #[source]
        source: IntakeError,
    },

    #[error("intake rejected the completion signal: {source}")]
    CompletionRejected {
        #[source]
        source: IntakeError,
    },
}

fn element_suffix(position: &Option<usize>) -> String {
    position
        .map(|p| format!(" (element {p})"))
        .unwrap_or_default()
}

/// How a replay ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayOutcome {
    /// Every event was delivered and completion was signalled
    Completed,
    /// Cancelled before event `at_event` was fully delivered
    Cancelled { at_event: usize },
}

/// Summary of a finished replay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayReport {
    pub replay_id: ReplayId,
    pub outcome: ReplayOutcome,
    pub events_delivered: usize,
    pub elements_delivered: usize,
    pub watermark_advances: usize,
    pub processing_time_advances: usize,
    /// Sum of processing-time advances, saturating at `Duration::MAX`
    pub processing_time_advanced: Duration,
    pub final_watermark: EventTime,
}

impl ReplayReport {
    fn new(replay_id: ReplayId) -> Self {
        Self {
            replay_id,
            outcome: ReplayOutcome::Completed,
            events_delivered: 0,
            elements_delivered: 0,
            watermark_advances: 0,
            processing_time_advances: 0,
            processing_time_advanced: Duration::zero(),
            final_watermark: EventTime::min(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.outcome == ReplayOutcome::Completed
    }

    /// Whether the watermark reached infinity; otherwise the stream was left open
    pub fn watermark_terminated(&self) -> bool {
        self.final_watermark.is_max()
    }
}

/// Stops an attached replay at the next delivery boundary
///
/// Deliveries already accepted stay accepted.
#[derive(Debug, Clone)]
pub struct ReplayCanceller {
    tx: broadcast::Sender<()>,
}

impl ReplayCanceller {
    pub fn cancel(&self) {
        // No receiver means the replay already finished
        let _ = self.tx.send(());
    }
}

struct CancelSignal {
    rx: broadcast::Receiver<()>,
    cancelled: bool,
}

impl CancelSignal {
    fn is_cancelled(&mut self) -> bool {
        if !self.cancelled {
            self.cancelled = match self.rx.try_recv() {
                Ok(()) | Err(broadcast::error::TryRecvError::Lagged(_)) => true,
                Err(_) => false,
            };
        }
        self.cancelled
    }

    async fn wait(&mut self) {
        if self.cancelled {
            return;
        }
        match self.rx.recv().await {
            Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => self.cancelled = true,
            Err(broadcast::error::RecvError::Closed) => std::future::pending::<()>().await,
        }
    }

    /// Await `delivery` unless cancellation wins the race
    async fn deliver<F>(&mut self, delivery: F) -> Option<Result<(), IntakeError>>
    where
        F: Future<Output = Result<(), IntakeError>>,
    {
        if self.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            () = self.wait() => None,
            result = delivery => Some(result),
        }
    }
}

/// Bind `sequence` to `intake`; nothing is delivered until the source is run
pub fn attach<I: PipelineIntake>(sequence: EventSequence, intake: I) -> AttachedSource<I> {
    let (cancel_tx, cancel_rx) = broadcast::channel(1);
    AttachedSource {
        id: ReplayId::generate(),
        sequence,
        intake,
        cancel_tx,
        cancel: CancelSignal {
            rx: cancel_rx,
            cancelled: false,
        },
    }
}

/// A sequence bound to an intake, ready to be driven exactly once
pub struct AttachedSource<I> {
    id: ReplayId,
    sequence: EventSequence,
    intake: I,
    cancel_tx: broadcast::Sender<()>,
    cancel: CancelSignal,
}

impl<I: PipelineIntake> AttachedSource<I> {
    pub fn id(&self) -> ReplayId {
        self.id
    }

    pub fn sequence(&self) -> &EventSequence {
        &self.sequence
    }

    pub fn canceller(&self) -> ReplayCanceller {
        ReplayCanceller {
            tx: self.cancel_tx.clone(),
        }
    }

    /// Deliver every event in order, then signal completion
    ///
    /// Returns early with [`ReplayOutcome::Cancelled`] if cancelled, or with an
    /// error as soon as the intake rejects anything.
    #[instrument(skip(self), fields(replay_id = %self.id, events = self.sequence.len()))]
    pub async fn run(self) -> Result<ReplayReport, ReplayError> {
        let AttachedSource {
            id,
            sequence,
            mut intake,
            cancel_tx: _cancel_tx,
            mut cancel,
        } = self;
        let mut report = ReplayReport::new(id);

        for (index, event) in sequence.iter().enumerate() {
            let kind = event.classify();
            trace!(index, %kind, "delivering event");
            match event {
                Event::Element { values } => {
                    for (position, element) in values.iter().enumerate() {
                        match cancel.deliver(intake.accept_element(element.clone())).await {
                            None => return Ok(cancelled(report, index)),
                            Some(result) => result.map_err(|source| {
                                rejected(index, Some(position), kind, source)
                            })?,
                        }
                        report.elements_delivered += 1;
                    }
                }
                Event::Watermark { new_watermark } => {
                    match cancel.deliver(intake.advance_watermark(*new_watermark)).await {
                        None => return Ok(cancelled(report, index)),
                        Some(result) => {
                            result.map_err(|source| rejected(index, None, kind, source))?
                        }
                    }
                    report.watermark_advances += 1;
                    report.final_watermark = *new_watermark;
                }
                Event::ProcessingTime { advance_by } => {
                    match cancel
                        .deliver(intake.advance_processing_clock(*advance_by))
                        .await
                    {
                        None => return Ok(cancelled(report, index)),
                        Some(result) => {
                            result.map_err(|source| rejected(index, None, kind, source))?
                        }
                    }
                    report.processing_time_advances += 1;
                    report.processing_time_advanced = report
                        .processing_time_advanced
                        .checked_add(&advance_by.as_duration())
                        .unwrap_or(Duration::MAX);
                }
            }
            report.events_delivered += 1;
        }

        intake.signal_complete().await.map_err(|source| {
            warn!(error = %source, "intake rejected completion");
            ReplayError::CompletionRejected { source }
        })?;
        info!(
            elements = report.elements_delivered,
            final_watermark = %report.final_watermark,
            terminated = report.watermark_terminated(),
            "replay completed"
        );
        Ok(report)
    }
}

fn cancelled(mut report: ReplayReport, at_event: usize) -> ReplayReport {
    warn!(at_event, "replay cancelled");
    report.outcome = ReplayOutcome::Cancelled { at_event };
    report
}

fn rejected(
    index: usize,
    position: Option<usize>,
    kind: EventKind,
    source: IntakeError,
) -> ReplayError {
    warn!(index, ?position, %kind, error = %source, "intake rejected event");
    ReplayError::IntakeRejected {
        index,
        position,
        kind,
        source,
    }
}
