//! Values exchanged with drivers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::SystemTime;

/// A value a driver accepts as an argument or produces in a row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL NULL
    Null,
    /// Boolean
    Bool(bool),
    /// 64-bit signed integer
    Int64(i64),
    /// 64-bit float
    Float64(f64),
    /// Raw bytes
    Bytes(Vec<u8>),
    /// UTF-8 text
    Text(String),
    /// Point in time
    Timestamp(SystemTime),
}

impl Value {
    /// Check if the value is SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int64(i) => write!(f, "{}", i),
            Value::Float64(x) => write!(f, "{}", x),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::Text(s) => write!(f, "'{}'", s),
            Value::Timestamp(t) => write!(f, "{:?}", t),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int64(value as i64)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int64(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float64(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl From<SystemTime> for Value {
    fn from(value: SystemTime) -> Self {
        Value::Timestamp(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// An argument with its position and optional parameter name.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedValue {
    /// Parameter name, if the argument was bound by name
    pub name: Option<String>,
    /// 1-based position of the argument, always set
    pub ordinal: usize,
    /// Argument value
    pub value: Value,
}

impl NamedValue {
    /// Create a positional argument.
    pub fn positional(ordinal: usize, value: impl Into<Value>) -> Self {
        Self {
            name: None,
            ordinal,
            value: value.into(),
        }
    }

    /// Create a named argument.
    pub fn named(name: impl Into<String>, ordinal: usize, value: impl Into<Value>) -> Self {
        Self {
            name: Some(name.into()),
            ordinal,
            value: value.into(),
        }
    }

    /// Number positional arguments from 1.
    pub fn from_values(values: &[Value]) -> Vec<NamedValue> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| NamedValue::positional(i + 1, v.clone()))
            .collect()
    }

    /// Strip names and positions, keeping the values in order.
    pub fn into_values(args: Vec<NamedValue>) -> Vec<Value> {
        args.into_iter().map(|nv| nv.value).collect()
    }
}

/// Transaction isolation level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationLevel {
    /// Driver or server default
    #[default]
    Default,
    ReadUncommitted,
    ReadCommitted,
    WriteCommitted,
    RepeatableRead,
    Snapshot,
    Serializable,
    Linearizable,
}

/// Options for starting a transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TxOptions {
    /// Isolation level
    pub isolation: IsolationLevel,
    /// Start a read-only transaction
    pub read_only: bool,
}

impl TxOptions {
    /// Check whether these are the driver defaults.
    pub fn is_default(&self) -> bool {
        *self == TxOptions::default()
    }
}
