//! Test Stream - deterministic, scripted input for streaming pipeline tests
//!
//! A test stream is authored with [`TestStream`], frozen into an immutable
//! [`EventSequence`] and replayed into the pipeline under test through a
//! [`PipelineIntake`]. Ordering and watermark invariants are checked while the
//! script is being written, so a sequence that exists is always valid.

pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod replay;

pub use domain::{
    ElementOptions, ElementValue, Event, EventSequence, EventTime, ScriptError, TestStream,
    TestStreamBuilder, TimestampedValue,
};
pub use error::{Error, Result};
pub use replay::{attach, AttachedSource, PipelineIntake, ReplayError, ReplayReport};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::VarIntCoder;
    use crate::replay::RecordingIntake;

    #[tokio::test]
    async fn test_errors_convert_into_crate_error() -> Result<()> {
        let mut builder = TestStream::create(VarIntCoder);
        builder.add_elements(1, [2])?.advance_watermark_to_infinity();
        let report = attach(builder.build()?, RecordingIntake::new())
            .run()
            .await?;
        assert_eq!(report.elements_delivered, 2);
        Ok(())
    }
}
