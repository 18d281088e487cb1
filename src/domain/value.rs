//! Element payloads and their event-time stamps

use bytes::Bytes;
use derive_more::From;
use std::fmt;

use super::time::EventTime;

/// A payload carried by a scripted element
///
/// The variant set is closed so a coder can decide compatibility by looking at
/// the value alone, at script-authoring time.
#[derive(Debug, Clone, PartialEq, Eq, From)]
pub enum ElementValue {
    Int(i64),
    Text(String),
    Bytes(Bytes),
    Bool(bool),
    Json(serde_json::Value),
}

/// Variant tag of an [`ElementValue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Int,
    Text,
    Bytes,
    Bool,
    Json,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Int => "int",
            ValueKind::Text => "text",
            ValueKind::Bytes => "bytes",
            ValueKind::Bool => "bool",
            ValueKind::Json => "json",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ElementValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            ElementValue::Int(_) => ValueKind::Int,
            ElementValue::Text(_) => ValueKind::Text,
            ElementValue::Bytes(_) => ValueKind::Bytes,
            ElementValue::Bool(_) => ValueKind::Bool,
            ElementValue::Json(_) => ValueKind::Json,
        }
    }

    /// JSON rendering of the value; bytes become an array of octets
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ElementValue::Int(n) => serde_json::Value::from(*n),
            ElementValue::Text(s) => serde_json::Value::from(s.as_str()),
            ElementValue::Bytes(b) => serde_json::Value::from(b.to_vec()),
            ElementValue::Bool(b) => serde_json::Value::from(*b),
            ElementValue::Json(v) => v.clone(),
        }
    }
}

impl From<i32> for ElementValue {
    fn from(value: i32) -> Self {
        ElementValue::Int(i64::from(value))
    }
}

impl From<&str> for ElementValue {
    fn from(value: &str) -> Self {
        ElementValue::Text(value.to_string())
    }
}

impl From<Vec<u8>> for ElementValue {
    fn from(value: Vec<u8>) -> Self {
        ElementValue::Bytes(Bytes::from(value))
    }
}

impl fmt::Display for ElementValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementValue::Int(n) => write!(f, "{n}"),
            ElementValue::Text(s) => write!(f, "{s:?}"),
            ElementValue::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            ElementValue::Bool(b) => write!(f, "{b}"),
            ElementValue::Json(v) => write!(f, "{v}"),
        }
    }
}

/// A value paired with the event-time instant it is stamped with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampedValue {
    value: ElementValue,
    timestamp: EventTime,
}

impl TimestampedValue {
    pub fn of(value: impl Into<ElementValue>, timestamp: EventTime) -> Self {
        Self {
            value: value.into(),
            timestamp,
        }
    }

    pub fn value(&self) -> &ElementValue {
        &self.value
    }

    pub fn timestamp(&self) -> EventTime {
        self.timestamp
    }

    pub fn into_parts(self) -> (ElementValue, EventTime) {
        (self.value, self.timestamp)
    }
}

impl fmt::Display for TimestampedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.value, self.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ElementValue::from(7), ValueKind::Int)]
    #[case(ElementValue::from(7_i64), ValueKind::Int)]
    #[case(ElementValue::from("seven"), ValueKind::Text)]
    #[case(ElementValue::from(String::from("seven")), ValueKind::Text)]
    #[case(ElementValue::from(vec![7_u8]), ValueKind::Bytes)]
    #[case(ElementValue::from(true), ValueKind::Bool)]
    #[case(ElementValue::from(serde_json::json!({"n": 7})), ValueKind::Json)]
    fn test_conversions_pick_the_expected_kind(
        #[case] value: ElementValue,
        #[case] expected: ValueKind,
    ) {
        assert_eq!(value.kind(), expected);
    }

    #[test]
    fn test_to_json() {
        assert_eq!(ElementValue::from(3).to_json(), serde_json::json!(3));
        assert_eq!(ElementValue::from("a").to_json(), serde_json::json!("a"));
        assert_eq!(
            ElementValue::from(vec![1_u8, 2]).to_json(),
            serde_json::json!([1, 2])
        );
    }

    #[test]
    fn test_timestamped_value_accessors() {
        let ts = EventTime::from_millis(42);
        let tv = TimestampedValue::of(5, ts);
        assert_eq!(tv.value(), &ElementValue::Int(5));
        assert_eq!(tv.timestamp(), ts);
        assert_eq!(tv.into_parts(), (ElementValue::Int(5), ts));
    }
}
