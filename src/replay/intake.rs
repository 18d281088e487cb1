//! The pipeline-side endpoint a replay drives, and two ready-made intakes

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::config::ReplaySettings;
use crate::domain::{EventTime, ProcessingAdvance, TimestampedValue};

/// Failure reported by an intake while accepting an event
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntakeError {
    #[error("intake rejected the event: {reason}")]
    Rejected { reason: String },

    #[error("intake is no longer receiving events")]
    Disconnected,
}

impl IntakeError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }
}

/// Capability the pipeline under test exposes to a replay
///
/// Each call resolves once the pipeline has accepted the event; a replay never
/// issues the next call before the previous one has resolved.
#[async_trait]
pub trait PipelineIntake: Send {
    async fn accept_element(&mut self, element: TimestampedValue) -> Result<(), IntakeError>;

    async fn advance_watermark(&mut self, watermark: EventTime) -> Result<(), IntakeError>;

    async fn advance_processing_clock(
        &mut self,
        advance_by: ProcessingAdvance,
    ) -> Result<(), IntakeError>;

    /// Called once after the final event has been delivered
    async fn signal_complete(&mut self) -> Result<(), IntakeError>;
}

/// What an intake was asked to do, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    Element(TimestampedValue),
    Watermark(EventTime),
    ProcessingTime(ProcessingAdvance),
    Complete,
}

/// Records every observation into a log shared by all clones
#[derive(Debug, Clone, Default)]
pub struct RecordingIntake {
    log: Arc<Mutex<Vec<Observation>>>,
    reject_at: Option<usize>,
}

impl RecordingIntake {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the observation with zero-based position `position` instead of
    /// recording it
    pub fn rejecting_at(position: usize) -> Self {
        Self {
            log: Arc::default(),
            reject_at: Some(position),
        }
    }

    pub fn observations(&self) -> Vec<Observation> {
        self.log.lock().clone()
    }

    fn record(&self, observation: Observation) -> Result<(), IntakeError> {
        let mut log = self.log.lock();
        if self.reject_at == Some(log.len()) {
            return Err(IntakeError::rejected(format!(
                "configured to reject observation {}",
                log.len()
            )));
        }
        log.push(observation);
        Ok(())
    }
}

#[async_trait]
impl PipelineIntake for RecordingIntake {
    async fn accept_element(&mut self, element: TimestampedValue) -> Result<(), IntakeError> {
        self.record(Observation::Element(element))
    }

    async fn advance_watermark(&mut self, watermark: EventTime) -> Result<(), IntakeError> {
        self.record(Observation::Watermark(watermark))
    }

    async fn advance_processing_clock(
        &mut self,
        advance_by: ProcessingAdvance,
    ) -> Result<(), IntakeError> {
        self.record(Observation::ProcessingTime(advance_by))
    }

    async fn signal_complete(&mut self) -> Result<(), IntakeError> {
        self.record(Observation::Complete)
    }
}

/// Forwards observations into a bounded channel
///
/// A full channel holds the replay at the current event until the consumer
/// catches up.
#[derive(Debug, Clone)]
pub struct ChannelIntake {
    tx: mpsc::Sender<Observation>,
}

impl ChannelIntake {
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<Observation>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    pub fn from_settings(settings: &ReplaySettings) -> (Self, mpsc::Receiver<Observation>) {
        Self::bounded(settings.channel_capacity)
    }

    async fn forward(&self, observation: Observation) -> Result<(), IntakeError> {
        self.tx
            .send(observation)
            .await
            .map_err(|_| IntakeError::Disconnected)
    }
}

#[async_trait]
impl PipelineIntake for ChannelIntake {
    async fn accept_element(&mut self, element: TimestampedValue) -> Result<(), IntakeError> {
        self.forward(Observation::Element(element)).await
    }

    async fn advance_watermark(&mut self, watermark: EventTime) -> Result<(), IntakeError> {
        self.forward(Observation::Watermark(watermark)).await
    }

    async fn advance_processing_clock(
        &mut self,
        advance_by: ProcessingAdvance,
    ) -> Result<(), IntakeError> {
        self.forward(Observation::ProcessingTime(advance_by)).await
    }

    async fn signal_complete(&mut self) -> Result<(), IntakeError> {
        self.forward(Observation::Complete).await
    }
}
