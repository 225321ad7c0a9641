//! Records and cell values.
//!
//! A [`Record`] is one data item shown as one table row. It has a stable
//! integer id and a mapping from column name to [`Value`]. Records arrive
//! from the host as JSON objects and are converted with
//! [`Record::from_json`].

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RecordError;

/// Stable identifier of a record.
pub type RecordId = i64;

/// Default name of the id column.
pub const DEFAULT_ID_COLUMN: &str = "id";

/// Field whose truthiness marks a record as masked.
pub const MASKED_FIELD: &str = "is_masked";

/// Metadata field; the value `"masked"` also marks a record as masked.
pub const META_FIELD: &str = "_meta";

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Missing or null value.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// Text value.
    Str(String),
}

impl Value {
    /// Short type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
        }
    }

    /// Truthiness: `null`, `false`, zero, NaN and the empty string are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0 && !f.is_nan(),
            Self::Str(s) => !s.is_empty(),
        }
    }

    /// Loose equality with `true`: `true`, the number 1, or text that
    /// reads as the number 1. `"false"`, `"0"` and `"yes"` are not true.
    pub fn is_loosely_true(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Int(i) => *i == 1,
            Self::Float(f) => *f == 1.0,
            Self::Str(s) => s.trim().parse::<f64>().is_ok_and(|n| n == 1.0),
            Self::Null => false,
        }
    }

    /// Numeric view of the value, if it is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Integer view of the value, if it is an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Text view of the value, if it is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Equality with integer/float coercion.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => self == other,
        }
    }

    /// Ordering between comparable values.
    ///
    /// Numbers compare numerically (ints and floats mix), strings
    /// lexicographically, booleans `false < true`. Anything else, including
    /// NaN, is not ordered.
    pub fn partial_compare(&self, other: &Value) -> Option<Ordering> {
        if let (Some(a), Some(b)) = (self.as_f64(), other.as_f64()) {
            return a.partial_cmp(&b);
        }
        match (self, other) {
            (Self::Str(a), Self::Str(b)) => Some(a.cmp(b)),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::Null, Self::Null) => Some(Ordering::Equal),
            _ => None,
        }
    }

    /// Total ordering used for sorting: nulls first, then booleans, numbers
    /// and strings; unordered pairs compare equal so sorting stays stable.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        fn class(value: &Value) -> u8 {
            match value {
                Value::Null => 0,
                Value::Bool(_) => 1,
                Value::Int(_) | Value::Float(_) => 2,
                Value::Str(_) => 3,
            }
        }
        class(self)
            .cmp(&class(other))
            .then_with(|| self.partial_compare(other).unwrap_or(Ordering::Equal))
    }

    /// Convert a JSON value. Arrays and objects are kept as their JSON text.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => n.as_f64().map_or(Self::Null, Self::Float),
            },
            serde_json::Value::String(s) => Self::Str(s.clone()),
            other => Self::Str(other.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

/// One data item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    id: RecordId,
    values: BTreeMap<String, Value>,
}

impl Record {
    /// Create a record with only its id set under the default id column.
    pub fn new(id: RecordId) -> Self {
        let mut values = BTreeMap::new();
        values.insert(DEFAULT_ID_COLUMN.to_owned(), Value::Int(id));
        Self { id, values }
    }

    /// Builder-style setter.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(column.into(), value.into());
        self
    }

    /// Convert a host JSON object, reading the id from `id_column`.
    pub fn from_json(value: &serde_json::Value, id_column: &str) -> Result<Self, RecordError> {
        let object = value
            .as_object()
            .ok_or_else(|| RecordError::NotAnObject(value.to_string()))?;
        let raw_id = object
            .get(id_column)
            .ok_or_else(|| RecordError::MissingId(id_column.to_owned()))?;
        let id = raw_id
            .as_i64()
            .ok_or_else(|| RecordError::InvalidId(raw_id.to_string()))?;

        let values = object
            .iter()
            .map(|(column, value)| (column.clone(), Value::from_json(value)))
            .collect();
        Ok(Self { id, values })
    }

    /// Convert a JSON array of objects, rejecting duplicate ids.
    pub fn many_from_json(
        value: &serde_json::Value,
        id_column: &str,
    ) -> Result<Vec<Self>, RecordError> {
        let items = value
            .as_array()
            .ok_or_else(|| RecordError::NotAnArray(value.to_string()))?;
        let mut seen = std::collections::HashSet::new();
        let mut records = Vec::with_capacity(items.len());
        for item in items {
            let record = Self::from_json(item, id_column)?;
            if !seen.insert(record.id) {
                return Err(RecordError::DuplicateId(record.id));
            }
            records.push(record);
        }
        Ok(records)
    }

    /// The record id.
    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Value of `column`, if present.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    /// Set the value of `column`.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(column.into(), value.into());
    }

    /// All values by column name.
    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    /// Overwrite this record's values with those present in `other`.
    ///
    /// Columns absent from `other` keep their current value. The id is
    /// never changed.
    pub fn merge(&mut self, other: &Record) {
        for (column, value) in &other.values {
            self.values.insert(column.clone(), value.clone());
        }
    }

    /// Whether the record is excluded from sibling navigation.
    pub fn is_masked(&self) -> bool {
        self.get(MASKED_FIELD).is_some_and(Value::is_loosely_true)
            || self
                .get(META_FIELD)
                .and_then(Value::as_str)
                .is_some_and(|meta| meta == "masked")
    }
}
