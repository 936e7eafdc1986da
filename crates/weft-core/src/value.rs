use std::fmt;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};

/// Numeric subtype of a number node. Fixed when the content is compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberKind {
    U64,
    I64,
    F64,
    U32,
    I32,
    F32,
}

impl NumberKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "u64" => Some(Self::U64),
            "i64" => Some(Self::I64),
            "f64" => Some(Self::F64),
            "u32" => Some(Self::U32),
            "i32" => Some(Self::I32),
            "f32" => Some(Self::F32),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::U64 => "u64",
            Self::I64 => "i64",
            Self::F64 => "f64",
            Self::U32 => "u32",
            Self::I32 => "i32",
            Self::F32 => "f32",
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, Self::F64 | Self::F32)
    }
}

impl fmt::Display for NumberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sampled number tagged with its subtype.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberValue {
    U64(u64),
    I64(i64),
    F64(f64),
    U32(u32),
    I32(i32),
    F32(f32),
}

impl NumberValue {
    pub fn kind(&self) -> NumberKind {
        match self {
            Self::U64(_) => NumberKind::U64,
            Self::I64(_) => NumberKind::I64,
            Self::F64(_) => NumberKind::F64,
            Self::U32(_) => NumberKind::U32,
            Self::I32(_) => NumberKind::I32,
            Self::F32(_) => NumberKind::F32,
        }
    }

    /// Narrow an integer into `kind`. Returns `None` when it does not fit.
    pub fn from_i128(kind: NumberKind, value: i128) -> Option<Self> {
        match kind {
            NumberKind::U64 => u64::try_from(value).ok().map(Self::U64),
            NumberKind::I64 => i64::try_from(value).ok().map(Self::I64),
            NumberKind::U32 => u32::try_from(value).ok().map(Self::U32),
            NumberKind::I32 => i32::try_from(value).ok().map(Self::I32),
            NumberKind::F64 => Some(Self::F64(value as f64)),
            NumberKind::F32 => Some(Self::F32(value as f32)),
        }
    }

    /// Narrow a float into `kind`. Integer kinds only accept integral values.
    pub fn from_f64(kind: NumberKind, value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        match kind {
            NumberKind::F64 => Some(Self::F64(value)),
            NumberKind::F32 => {
                let narrowed = value as f32;
                narrowed.is_finite().then_some(Self::F32(narrowed))
            }
            _ if value.fract() != 0.0 => None,
            _ if value < i128::MIN as f64 || value > i128::MAX as f64 => None,
            _ => Self::from_i128(kind, value as i128),
        }
    }

    pub fn as_i128(&self) -> Option<i128> {
        match *self {
            Self::U64(value) => Some(value as i128),
            Self::I64(value) => Some(value as i128),
            Self::U32(value) => Some(value as i128),
            Self::I32(value) => Some(value as i128),
            Self::F64(_) | Self::F32(_) => None,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            Self::U64(value) => value as f64,
            Self::I64(value) => value as f64,
            Self::F64(value) => value,
            Self::U32(value) => value as f64,
            Self::I32(value) => value as f64,
            Self::F32(value) => value as f64,
        }
    }

    fn to_json(self) -> serde_json::Value {
        match self {
            Self::U64(value) => value.into(),
            Self::I64(value) => value.into(),
            Self::U32(value) => value.into(),
            Self::I32(value) => value.into(),
            Self::F64(value) => serde_json::Number::from_f64(value)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Self::F32(value) => serde_json::Number::from_f64(value as f64)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
        }
    }
}

impl fmt::Display for NumberValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::U64(value) => write!(f, "{value}"),
            Self::I64(value) => write!(f, "{value}"),
            Self::F64(value) => write!(f, "{value}"),
            Self::U32(value) => write!(f, "{value}"),
            Self::I32(value) => write!(f, "{value}"),
            Self::F32(value) => write!(f, "{value}"),
        }
    }
}

impl Serialize for NumberValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            Self::U64(value) => serializer.serialize_u64(value),
            Self::I64(value) => serializer.serialize_i64(value),
            Self::F64(value) => serializer.serialize_f64(value),
            Self::U32(value) => serializer.serialize_u32(value),
            Self::I32(value) => serializer.serialize_i32(value),
            Self::F32(value) => serializer.serialize_f32(value),
        }
    }
}

/// A generated value. Objects keep their fields in declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(NumberValue),
    String(String),
    Array(Vec<Value>),
    Object(Vec<(String, Value)>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Field lookup on objects.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(fields) => fields
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<NumberValue> {
        match self {
            Value::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_i128(&self) -> Option<i128> {
        self.as_number().and_then(|number| number.as_i128())
    }

    /// Build a value from a JSON literal. Integers become `u64` when
    /// non-negative and `i64` otherwise; everything else numeric is `f64`.
    pub fn from_json(value: &serde_json::Value) -> Value {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(flag) => Value::Bool(*flag),
            serde_json::Value::Number(number) => Value::Number(number_from_json(number)),
            serde_json::Value::String(text) => Value::String(text.clone()),
            serde_json::Value::Array(items) => {
                Value::Array(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), Value::from_json(value)))
                    .collect(),
            ),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(flag) => serde_json::Value::Bool(*flag),
            Value::Number(number) => number.to_json(),
            Value::String(text) => serde_json::Value::String(text.clone()),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Object(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
        }
    }

    /// Stable textual key used for uniqueness checks.
    pub fn canonical_key(&self) -> String {
        match self {
            Value::Null => "<null>".to_string(),
            Value::String(text) => format!("s:{text}"),
            other => other.to_json().to_string(),
        }
    }
}

pub fn number_from_json(number: &serde_json::Number) -> NumberValue {
    if let Some(value) = number.as_u64() {
        NumberValue::U64(value)
    } else if let Some(value) = number.as_i64() {
        NumberValue::I64(value)
    } else {
        NumberValue::F64(number.as_f64().unwrap_or_default())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(flag) => write!(f, "{flag}"),
            Value::Number(number) => write!(f, "{number}"),
            Value::String(text) => f.write_str(text),
            Value::Array(_) | Value::Object(_) => write!(f, "{}", self.to_json()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(flag) => serializer.serialize_bool(*flag),
            Value::Number(number) => number.serialize(serializer),
            Value::String(text) => serializer.serialize_str(text),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Object(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (key, value) in fields {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

impl From<NumberValue> for Value {
    fn from(value: NumberValue) -> Self {
        Value::Number(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrowing_rejects_out_of_range_integers() {
        assert_eq!(
            NumberValue::from_i128(NumberKind::U32, 7),
            Some(NumberValue::U32(7))
        );
        assert_eq!(NumberValue::from_i128(NumberKind::U64, -1), None);
        assert_eq!(NumberValue::from_i128(NumberKind::I32, i64::MAX as i128), None);
        assert_eq!(NumberValue::from_f64(NumberKind::I64, 2.5), None);
        assert_eq!(
            NumberValue::from_f64(NumberKind::I64, -2.0),
            Some(NumberValue::I64(-2))
        );
    }

    #[test]
    fn objects_serialize_in_declaration_order() {
        let value = Value::Object(vec![
            ("zeta".to_string(), Value::Number(NumberValue::U64(1))),
            ("alpha".to_string(), Value::Number(NumberValue::F32(0.5))),
            ("name".to_string(), Value::String("x".to_string())),
        ]);
        let encoded = serde_json::to_string(&value).expect("serialize");
        assert_eq!(encoded, r#"{"zeta":1,"alpha":0.5,"name":"x"}"#);
    }

    #[test]
    fn json_literals_pick_number_subtypes() {
        let value = Value::from_json(&serde_json::json!([3, -3, 1.5]));
        let items = value.as_array().expect("array");
        assert_eq!(items[0].as_number().map(|n| n.kind()), Some(NumberKind::U64));
        assert_eq!(items[1].as_number().map(|n| n.kind()), Some(NumberKind::I64));
        assert_eq!(items[2].as_number().map(|n| n.kind()), Some(NumberKind::F64));
    }

    #[test]
    fn canonical_keys_distinguish_strings_from_numbers() {
        let text = Value::String("1".to_string());
        let number = Value::Number(NumberValue::U64(1));
        assert_ne!(text.canonical_key(), number.canonical_key());
    }
}
