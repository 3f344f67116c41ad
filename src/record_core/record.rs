//! Record and combination key types

use serde_json::{Map, Number, Value};
use std::fmt;

use super::diagnostics::SkipReason;

/// Fields whose values together identify a listing
pub const COMBINATION_FIELDS: [&str; 3] = ["owner", "price", "category"];

/// Field carrying the record identifier
pub const ID_FIELD: &str = "id";

/// One JSON object from the input array
pub type Record = Map<String, Value>;

/// Hashable form of a scalar JSON value
///
/// Integers and integral floats share the `Integer` variant so that `10` and
/// `10.0` land on the same key. Non-integral floats are stored as raw bits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i128),
    Float(u64),
    String(String),
}

impl FieldValue {
    /// Convert a JSON value, returning `None` for arrays and objects
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(FieldValue::Null),
            Value::Bool(b) => Some(FieldValue::Bool(*b)),
            Value::Number(n) => Some(Self::from_number(n)),
            Value::String(s) => Some(FieldValue::String(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    fn from_number(n: &Number) -> Self {
        if let Some(i) = n.as_i64() {
            return FieldValue::Integer(i as i128);
        }
        if let Some(u) = n.as_u64() {
            return FieldValue::Integer(u as i128);
        }
        let f = n.as_f64().unwrap_or(0.0);
        if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= u64::MAX as f64 {
            FieldValue::Integer(f as i128)
        } else {
            FieldValue::Float(f.to_bits())
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Integer(i) => {
                if let Ok(small) = i64::try_from(*i) {
                    Value::from(small)
                } else if let Ok(big) = u64::try_from(*i) {
                    Value::from(big)
                } else {
                    Number::from_f64(*i as f64).map(Value::Number).unwrap_or(Value::Null)
                }
            }
            FieldValue::Float(bits) => Number::from_f64(f64::from_bits(*bits))
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FieldValue::String(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}

/// Ordered tuple of combination field values
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CombinationKey(Vec<FieldValue>);

impl CombinationKey {
    pub fn new(values: Vec<FieldValue>) -> Self {
        Self(values)
    }

    /// Build the key for `record`, or say why the record cannot be grouped.
    ///
    /// Fields are checked in order, so the first absent field is the one
    /// reported.
    pub fn extract(record: &Record, fields: &[String]) -> Result<Self, SkipReason> {
        let mut values = Vec::with_capacity(fields.len());
        for field in fields {
            let value = record
                .get(field)
                .ok_or_else(|| SkipReason::MissingField(field.clone()))?;
            let value = FieldValue::from_value(value)
                .ok_or_else(|| SkipReason::UnsupportedValue(field.clone()))?;
            values.push(value);
        }
        Ok(Self(values))
    }

    pub fn values(&self) -> &[FieldValue] {
        &self.0
    }

    /// Rebuild a field-keyed record from this key
    pub fn to_record(&self, fields: &[String]) -> Record {
        fields
            .iter()
            .zip(&self.0)
            .map(|(field, value)| (field.clone(), value.to_value()))
            .collect()
    }
}

impl fmt::Display for CombinationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", value)?;
        }
        write!(f, ")")
    }
}

pub fn default_fields() -> Vec<String> {
    COMBINATION_FIELDS.iter().map(|f| f.to_string()).collect()
}
