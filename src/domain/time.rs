//! Event-time and processing-time domain types
//!
//! Instants are backed by `chrono` so that scripted timestamps read the same
//! way as any other timestamp in a test, while the bounds of the representable
//! range double as the logical start and end of time.

use chrono::{DateTime, Duration, Utc};
use nutype::nutype;
use serde::{Deserialize, Serialize};

/// An instant in event time
///
/// `EventTime::min()` is the logical start of time (the initial watermark) and
/// `EventTime::max()` is "infinity": a watermark at `max()` promises that no
/// further elements will arrive.
#[nutype(derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display
))]
pub struct EventTime(DateTime<Utc>);

impl EventTime {
    /// The minimum representable instant
    pub fn min() -> Self {
        Self::new(DateTime::<Utc>::MIN_UTC)
    }

    /// The maximum representable instant
    pub fn max() -> Self {
        Self::new(DateTime::<Utc>::MAX_UTC)
    }

    /// Wrap an existing `DateTime`
    pub fn from_datetime(datetime: DateTime<Utc>) -> Self {
        Self::new(datetime)
    }

    /// Milliseconds since the Unix epoch, saturating at the representable bounds
    pub fn from_millis(millis: i64) -> Self {
        match DateTime::from_timestamp_millis(millis) {
            Some(datetime) => Self::new(datetime),
            None if millis < 0 => Self::min(),
            None => Self::max(),
        }
    }

    /// Milliseconds since the Unix epoch
    pub fn as_millis(&self) -> i64 {
        self.into_inner().timestamp_millis()
    }

    /// Get the underlying DateTime
    pub fn into_datetime(self) -> DateTime<Utc> {
        self.into_inner()
    }

    /// Whether this instant is the end of time
    pub fn is_max(&self) -> bool {
        *self == Self::max()
    }

    /// Step back by `duration`, clamping at `EventTime::min()`
    pub fn saturating_sub(self, duration: Duration) -> Self {
        if duration <= Duration::zero() {
            return self;
        }
        self.into_inner()
            .checked_sub_signed(duration)
            .map(Self::new)
            .unwrap_or_else(Self::min)
    }
}

/// A strictly positive advance of the simulated processing-time clock
#[nutype(
    validate(predicate = |duration| *duration > Duration::zero()),
    derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)
)]
pub struct ProcessingAdvance(Duration);

impl ProcessingAdvance {
    /// Build an advance from milliseconds, `None` unless strictly positive
    pub fn from_millis(millis: i64) -> Option<Self> {
        Duration::try_milliseconds(millis).and_then(|duration| Self::try_new(duration).ok())
    }

    /// Convert to chrono Duration
    pub fn as_duration(&self) -> Duration {
        self.into_inner()
    }
}
