use serde_json::{Map, Value};

use crate::error::SchemaError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamKind {
    Bool,
    Number,
    String,
    Object,
    Array,
    Any,
}

#[derive(Clone, Copy, Debug)]
pub struct ParamSpec {
    pub key: &'static str,
    pub kind: ParamKind,
    pub required: bool,
}

impl ParamSpec {
    pub const fn new(key: &'static str, kind: ParamKind, required: bool) -> Self {
        Self {
            key,
            kind,
            required,
        }
    }
}

/// A JSON object whose keys were checked against a list of [`ParamSpec`]s.
pub struct ParamMap<'a> {
    map: &'a Map<String, Value>,
    path: &'a str,
}

pub fn expect_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, SchemaError> {
    value
        .as_object()
        .ok_or_else(|| SchemaError::invalid(path, "expected a JSON object"))
}

/// Strict key check: unknown keys, wrongly typed values and missing
/// required keys are all schema errors.
pub fn validate_params<'a>(
    value: &'a Value,
    specs: &[ParamSpec],
    path: &'a str,
) -> Result<ParamMap<'a>, SchemaError> {
    let map = expect_object(value, path)?;
    for (key, value) in map {
        let Some(spec) = specs.iter().find(|spec| spec.key == key.as_str()) else {
            return Err(SchemaError::UnexpectedField {
                path: path.to_string(),
                field: key.clone(),
            });
        };
        validate_kind(path, key, spec.kind, value)?;
    }

    for spec in specs {
        if spec.required && !map.contains_key(spec.key) {
            return Err(SchemaError::missing(path, spec.key));
        }
    }

    Ok(ParamMap { map, path })
}

impl<'a> ParamMap<'a> {
    pub fn path(&self) -> &'a str {
        self.path
    }

    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.map.get(key).and_then(Value::as_f64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.map.get(key).and_then(Value::as_bool)
    }

    pub fn get_str(&self, key: &str) -> Option<&'a str> {
        self.map.get(key).and_then(Value::as_str)
    }

    pub fn require(&self, key: &str) -> Result<&'a Value, SchemaError> {
        self.map
            .get(key)
            .ok_or_else(|| SchemaError::missing(self.path, key))
    }

    pub fn require_str(&self, key: &str) -> Result<&'a str, SchemaError> {
        self.require(key)?
            .as_str()
            .ok_or_else(|| SchemaError::invalid(self.path, format!("'{key}' must be a string")))
    }

    /// Exactly one of `keys` must be present; returns it.
    pub fn one_of(&self, keys: &[&'static str]) -> Result<&'static str, SchemaError> {
        let present: Vec<&'static str> = keys
            .iter()
            .copied()
            .filter(|key| self.map.contains_key(*key))
            .collect();
        match present.as_slice() {
            [key] => Ok(*key),
            [] => Err(SchemaError::missing(self.path, &keys.join("|"))),
            _ => Err(SchemaError::invalid(
                self.path,
                format!("only one of {} may be set", present.join(", ")),
            )),
        }
    }
}

fn validate_kind(path: &str, key: &str, kind: ParamKind, value: &Value) -> Result<(), SchemaError> {
    let valid = match kind {
        ParamKind::Bool => value.is_boolean(),
        ParamKind::Number => value.is_number(),
        ParamKind::String => value.is_string(),
        ParamKind::Object => value.is_object(),
        ParamKind::Array => value.is_array(),
        ParamKind::Any => true,
    };

    if valid {
        Ok(())
    } else {
        Err(SchemaError::invalid(path, format!("invalid value for '{key}'")))
    }
}

/// Join a parent path and a child segment.
pub fn child_path(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{parent}.{segment}")
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const SPECS: &[ParamSpec] = &[
        ParamSpec::new("low", ParamKind::Number, true),
        ParamSpec::new("high", ParamKind::Number, true),
        ParamSpec::new("include_high", ParamKind::Bool, false),
    ];

    #[test]
    fn rejects_unknown_keys() {
        let value = json!({"low": 1, "high": 2, "hgh": 3});
        let result = validate_params(&value, SPECS, "users.age");
        assert!(matches!(result, Err(SchemaError::UnexpectedField { field, .. }) if field == "hgh"));
    }

    #[test]
    fn rejects_missing_required_keys() {
        let value = json!({"low": 1});
        let result = validate_params(&value, SPECS, "users.age");
        assert!(matches!(result, Err(SchemaError::MissingField { field, .. }) if field == "high"));
    }

    #[test]
    fn rejects_wrong_kinds() {
        let value = json!({"low": "1", "high": 2});
        assert!(validate_params(&value, SPECS, "users.age").is_err());
    }
}
