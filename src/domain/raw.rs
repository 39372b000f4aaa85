// Raw telemetry as emitted by the simulation client
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::fmt;

/// Logical origin of a raw sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Reactor,
    Turbine,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Reactor => f.write_str("reactor"),
            Source::Turbine => f.write_str("turbine"),
        }
    }
}

/// Field set for one source, in game-internal units, stamped with the
/// server receive time.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSample {
    pub fields: Map<String, Value>,
    pub received_at: DateTime<Utc>,
}

impl RawSample {
    pub fn new(fields: Map<String, Value>, received_at: DateTime<Utc>) -> Self {
        Self {
            fields,
            received_at,
        }
    }

    /// Numeric field, or 0 when absent or not a number.
    pub fn number(&self, key: &str) -> f64 {
        self.fields.get(key).and_then(Value::as_f64).unwrap_or(0.0)
    }

    /// Fluid tank contents. The client sends either a bare number or an
    /// object carrying `amount`. Any number, zero included, is a reading;
    /// a missing or empty-object entry counts as "no tank reported".
    pub fn tank_amount(&self, key: &str) -> Option<f64> {
        match self.fields.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::Object(obj) if !obj.is_empty() => {
                Some(obj.get("amount").and_then(Value::as_f64).unwrap_or(0.0))
            }
            _ => None,
        }
    }
}
