//! Process-level plumbing shared by tests and harnesses

pub mod telemetry;

pub use telemetry::init_tracing;
