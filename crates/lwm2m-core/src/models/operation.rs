//! Operation request and outcome models

use std::fmt;

use serde::Serialize;

use super::path::ResourcePath;

/// The value carried by a write operation.
///
/// A tagged scalar rather than a dynamically typed object, so the write path
/// can dispatch on value kind without runtime type inspection.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteValue {
    Text(String),
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
}

impl WriteValue {
    /// Build a write value from an arbitrary JSON value.
    ///
    /// Strings, integers, floats and booleans keep their tag. Any other type
    /// falls back to its string rendering instead of failing — devices that
    /// accept loosely typed payloads still get something usable.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => WriteValue::Text(s.clone()),
            serde_json::Value::Bool(b) => WriteValue::Boolean(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    WriteValue::Integer(i)
                } else {
                    WriteValue::Decimal(n.as_f64().unwrap_or_default())
                }
            }
            other => WriteValue::Text(other.to_string()),
        }
    }

    /// Text form used on the wire
    pub fn to_text(&self) -> String {
        match self {
            WriteValue::Text(s) => s.clone(),
            WriteValue::Integer(i) => i.to_string(),
            WriteValue::Decimal(d) => d.to_string(),
            WriteValue::Boolean(b) => b.to_string(),
        }
    }
}

/// The kind of resource operation being performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Read,
    Write,
    Execute,
}

impl OperationKind {
    /// Verb used in "Failed to <verb> resource" error messages
    pub fn verb(&self) -> &'static str {
        match self {
            OperationKind::Read => "read",
            OperationKind::Write => "write",
            OperationKind::Execute => "execute",
        }
    }

    /// Gerund used in "Exception <gerund> resource" error messages
    pub fn gerund(&self) -> &'static str {
        match self {
            OperationKind::Read => "reading",
            OperationKind::Write => "writing",
            OperationKind::Execute => "executing",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// One resource operation against a device
#[derive(Debug, Clone)]
pub enum OperationRequest {
    Read(ResourcePath),
    Write(ResourcePath, WriteValue),
    Execute(ResourcePath, String),
}

impl OperationRequest {
    pub fn path(&self) -> ResourcePath {
        match self {
            OperationRequest::Read(p)
            | OperationRequest::Write(p, _)
            | OperationRequest::Execute(p, _) => *p,
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            OperationRequest::Read(_) => OperationKind::Read,
            OperationRequest::Write(_, _) => OperationKind::Write,
            OperationRequest::Execute(_, _) => OperationKind::Execute,
        }
    }
}

/// Result of dispatching one operation to one device.
///
/// Exactly one tag per outcome; the external response is built from this
/// union plus the not-found short-circuit in [`crate::GatewayError`].
#[derive(Debug, Clone, PartialEq)]
pub enum OperationOutcome {
    /// Device answered with a protocol success; payload is the raw value
    /// representation, passed through uninterpreted
    Success { payload: String },
    /// Device answered with a protocol failure; message is verbatim
    ProtocolFailure { message: String },
    /// No reply within the configured bound
    Timeout,
    /// Transport-level fault: serialization, network or session error
    TransportFault { message: String },
}
