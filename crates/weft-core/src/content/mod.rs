//! Content trees: the declarative description of what to generate.
//!
//! Documents are parsed by hand from `serde_json::Value` so every error can
//! name the node path it was raised at.

pub mod date_time;
pub mod faker;
pub mod number;
pub mod params;
pub mod series;
pub mod string;

use serde_json::{Map, Value as Json};

use crate::error::SchemaError;
use crate::path::FieldRef;
use crate::value::Value;

pub use date_time::{DateTimeContent, DateTimeKind};
pub use faker::{FakerContent, FakerKind, FakerLocale};
pub use number::{NumberContent, NumberRule, RangeStep};
pub use params::child_path;
pub use series::{SeriesContent, SeriesVariant, parse_duration};
pub use string::{
    Categorical, FormatContent, Pattern, Segment, SerializedContent, SlicedContent, StringContent,
    TruncatedContent,
};

use params::{ParamKind, ParamSpec, validate_params};

const LABELS: &[&str] = &["type", "optional", "null_rate", "hidden", "unique"];

const ARRAY_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("length", ParamKind::Any, true),
    ParamSpec::new("content", ParamKind::Any, true),
];

const ONE_OF_PARAMS: &[ParamSpec] = &[ParamSpec::new("variants", ParamKind::Array, true)];

const SAME_AS_PARAMS: &[ParamSpec] = &[ParamSpec::new("ref", ParamKind::String, true)];

const BOOL_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("frequency", ParamKind::Number, false),
    ParamSpec::new("constant", ParamKind::Bool, false),
];

/// Modifiers that apply to any typed node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Labels {
    /// The node may short-circuit to `null`.
    pub optional: bool,
    /// Per-node null probability; falls back to the run default when unset.
    pub null_rate: Option<f64>,
    /// Sampled and referencable but left out of the output.
    pub hidden: bool,
    /// Re-sampled until the value was not produced before.
    pub unique: bool,
}

impl Labels {
    fn parse(map: &Map<String, Json>, path: &str) -> Result<Self, SchemaError> {
        let flag = |key: &str| -> Result<bool, SchemaError> {
            match map.get(key) {
                None => Ok(false),
                Some(Json::Bool(flag)) => Ok(*flag),
                Some(_) => Err(SchemaError::invalid(path, format!("'{key}' must be a boolean"))),
            }
        };
        let null_rate = match map.get("null_rate") {
            None => None,
            Some(rate) => Some(
                rate.as_f64()
                    .filter(|rate| (0.0..=1.0).contains(rate))
                    .ok_or_else(|| SchemaError::invalid(path, "null_rate must be within [0, 1]"))?,
            ),
        };
        Ok(Self {
            optional: flag("optional")? || null_rate.is_some(),
            null_rate,
            hidden: flag("hidden")?,
            unique: flag("unique")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Content {
    pub kind: ContentKind,
    pub labels: Labels,
}

#[derive(Debug, Clone)]
pub enum ContentKind {
    Null,
    Bool(BoolContent),
    Number(NumberContent),
    String(StringContent),
    Array(Box<ArrayContent>),
    Object(ObjectContent),
    OneOf(OneOfContent),
    SameAs(SameAsContent),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoolContent {
    Frequency(f64),
    Constant(bool),
}

#[derive(Debug, Clone)]
pub struct ArrayContent {
    pub length: Content,
    pub content: Content,
}

#[derive(Debug, Clone, Default)]
pub struct ObjectContent {
    pub fields: Vec<(String, Content)>,
}

#[derive(Debug, Clone)]
pub struct OneOfContent {
    pub variants: Vec<Variant>,
}

#[derive(Debug, Clone)]
pub struct Variant {
    pub weight: f64,
    pub content: Content,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SameAsContent {
    pub reference: FieldRef,
}

impl Content {
    pub fn new(kind: ContentKind) -> Self {
        Self {
            kind,
            labels: Labels::default(),
        }
    }

    /// Parses a content document. `path` names the node in errors.
    pub fn parse(document: &Json, path: &str) -> Result<Self, SchemaError> {
        match document {
            Json::Null => Ok(Self::new(ContentKind::Null)),
            Json::Bool(flag) => Ok(Self::new(ContentKind::Bool(BoolContent::Constant(*flag)))),
            Json::Number(_) => match Value::from_json(document) {
                Value::Number(number) => Ok(Self::new(ContentKind::Number(
                    NumberContent::constant(number),
                ))),
                _ => Err(SchemaError::invalid(path, "expected a number")),
            },
            Json::String(text) => match text.strip_prefix('@') {
                Some(reference) => Ok(Self::new(ContentKind::SameAs(SameAsContent {
                    reference: parse_reference(reference, path)?,
                }))),
                None => Ok(Self::new(ContentKind::String(StringContent::Constant(
                    text.clone(),
                )))),
            },
            Json::Array(_) => Err(SchemaError::invalid(
                path,
                "arrays must be declared with {\"type\": \"array\"}",
            )),
            Json::Object(map) => Self::parse_typed(map, path),
        }
    }

    fn parse_typed(map: &Map<String, Json>, path: &str) -> Result<Self, SchemaError> {
        let kind = map
            .get("type")
            .ok_or_else(|| SchemaError::missing(path, "type"))?
            .as_str()
            .ok_or_else(|| SchemaError::invalid(path, "'type' must be a string"))?;
        let labels = Labels::parse(map, path)?;
        let body: Map<String, Json> = map
            .iter()
            .filter(|(key, _)| !LABELS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        let body = Json::Object(body);

        let kind = match kind {
            "null" => {
                validate_params(&body, &[], path)?;
                ContentKind::Null
            }
            "bool" => ContentKind::Bool(parse_bool(&body, path)?),
            "number" => ContentKind::Number(NumberContent::parse(&body, path)?),
            "string" => ContentKind::String(StringContent::parse(&body, path)?),
            "date_time" => ContentKind::String(StringContent::DateTime(DateTimeContent::parse(
                &body, path,
            )?)),
            "series" => {
                ContentKind::String(StringContent::Series(SeriesContent::parse(&body, path)?))
            }
            "array" => {
                let params = validate_params(&body, ARRAY_PARAMS, path)?;
                let length = Content::parse(params.require("length")?, &child_path(path, "length"))?;
                check_length(&length, &child_path(path, "length"))?;
                let content =
                    Content::parse(params.require("content")?, &child_path(path, "content"))?;
                ContentKind::Array(Box::new(ArrayContent { length, content }))
            }
            "object" => ContentKind::Object(parse_object(&body, path)?),
            "one_of" => ContentKind::OneOf(parse_one_of(&body, path)?),
            "same_as" => {
                let params = validate_params(&body, SAME_AS_PARAMS, path)?;
                ContentKind::SameAs(SameAsContent {
                    reference: parse_reference(params.require_str("ref")?, path)?,
                })
            }
            other => {
                return Err(SchemaError::UnknownType {
                    path: path.to_string(),
                    kind: other.to_string(),
                });
            }
        };
        Ok(Self { kind, labels })
    }

    pub fn is_collection_root(&self) -> bool {
        matches!(self.kind, ContentKind::Array(_) | ContentKind::Object(_))
    }

    /// Short name of the node type, as written in documents.
    pub fn type_name(&self) -> &'static str {
        match &self.kind {
            ContentKind::Null => "null",
            ContentKind::Bool(_) => "bool",
            ContentKind::Number(_) => "number",
            ContentKind::String(_) => "string",
            ContentKind::Array(_) => "array",
            ContentKind::Object(_) => "object",
            ContentKind::OneOf(_) => "one_of",
            ContentKind::SameAs(_) => "same_as",
        }
    }
}

fn parse_bool(body: &Json, path: &str) -> Result<BoolContent, SchemaError> {
    let params = validate_params(body, BOOL_PARAMS, path)?;
    match params.one_of(&["frequency", "constant"])? {
        "frequency" => params
            .get_f64("frequency")
            .filter(|frequency| (0.0..=1.0).contains(frequency))
            .map(BoolContent::Frequency)
            .ok_or_else(|| SchemaError::invalid(path, "frequency must be within [0, 1]")),
        _ => Ok(BoolContent::Constant(
            params.get_bool("constant").unwrap_or_default(),
        )),
    }
}

fn parse_object(body: &Json, path: &str) -> Result<ObjectContent, SchemaError> {
    let map = body
        .as_object()
        .ok_or_else(|| SchemaError::invalid(path, "expected a JSON object"))?;
    let mut fields = Vec::with_capacity(map.len());
    for (name, value) in map {
        if name.is_empty() || name.contains('.') {
            return Err(SchemaError::invalid(
                path,
                format!("invalid field name '{name}'"),
            ));
        }
        fields.push((name.clone(), Content::parse(value, &child_path(path, name))?));
    }
    Ok(ObjectContent { fields })
}

fn parse_one_of(body: &Json, path: &str) -> Result<OneOfContent, SchemaError> {
    let params = validate_params(body, ONE_OF_PARAMS, path)?;
    let entries = params.require("variants")?.as_array().into_iter().flatten();
    let mut variants = Vec::new();
    for (idx, entry) in entries.enumerate() {
        let variant_path = child_path(path, &idx.to_string());
        let (weight, content) = match entry.as_object() {
            Some(map) if map.contains_key("weight") => {
                let weight = map
                    .get("weight")
                    .and_then(Json::as_f64)
                    .filter(|weight| *weight > 0.0 && weight.is_finite())
                    .ok_or_else(|| SchemaError::invalid(&variant_path, "weight must be positive"))?;
                let rest: Map<String, Json> = map
                    .iter()
                    .filter(|(key, _)| key.as_str() != "weight")
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect();
                (weight, Content::parse(&Json::Object(rest), &variant_path)?)
            }
            _ => (1.0, Content::parse(entry, &variant_path)?),
        };
        variants.push(Variant { weight, content });
    }
    if variants.is_empty() {
        return Err(SchemaError::invalid(path, "one_of needs at least one variant"));
    }
    Ok(OneOfContent { variants })
}

fn parse_reference(text: &str, path: &str) -> Result<FieldRef, SchemaError> {
    text.parse::<FieldRef>().map_err(|_| {
        SchemaError::invalid(path, format!("malformed reference '{text}'"))
    })
}

/// Lengths must be able to produce non-negative integers.
fn check_length(length: &Content, path: &str) -> Result<(), SchemaError> {
    let ContentKind::Number(number) = &length.kind else {
        return Ok(());
    };
    if number.kind.is_float() {
        return Err(SchemaError::invalid(path, "array length must be an integer"));
    }
    let negative = match &number.rule {
        NumberRule::Constant(value) => value.as_i128().is_some_and(|value| value < 0),
        NumberRule::Range(RangeStep::Int { low, .. }) => *low < 0,
        NumberRule::Range(RangeStep::Float { .. }) => true,
        NumberRule::Id { start_at } => *start_at < 0,
    };
    if negative {
        return Err(SchemaError::invalid(path, "array length must not be negative"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_nested_collections() {
        let document = json!({
            "type": "array",
            "length": {"type": "number", "range": {"low": 1, "high": 5}},
            "content": {
                "type": "object",
                "user_id": {"type": "number", "id": {"start_at": 0}},
                "email": {"type": "string", "faker": {"generator": "safe_email"}, "optional": true},
                "manager_id": "@users.user_id"
            }
        });
        let content = Content::parse(&document, "users").expect("parse");
        let ContentKind::Array(array) = &content.kind else {
            panic!("expected array");
        };
        let ContentKind::Object(object) = &array.content.kind else {
            panic!("expected object");
        };
        let names: Vec<&str> = object.fields.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, ["user_id", "email", "manager_id"]);
        assert!(object.fields[1].1.labels.optional);
        assert!(matches!(object.fields[2].1.kind, ContentKind::SameAs(_)));
    }

    #[test]
    fn unknown_types_are_rejected_with_their_path() {
        let document = json!({"type": "object", "age": {"type": "integer"}});
        let err = Content::parse(&document, "users").expect_err("unknown type");
        assert_eq!(
            err,
            SchemaError::UnknownType {
                path: "users.age".to_string(),
                kind: "integer".to_string()
            }
        );
    }

    #[test]
    fn one_of_weights_default_to_one() {
        let document = json!({
            "type": "one_of",
            "variants": [{"weight": 3, "type": "null"}, "fixed"]
        });
        let content = Content::parse(&document, "x").expect("parse");
        let ContentKind::OneOf(one_of) = content.kind else {
            panic!("expected one_of");
        };
        let weights: Vec<f64> = one_of.variants.iter().map(|v| v.weight).collect();
        assert_eq!(weights, [3.0, 1.0]);
    }

    #[test]
    fn null_rate_implies_optional() {
        let document = json!({"type": "null", "null_rate": 0.25});
        let content = Content::parse(&document, "x").expect("parse");
        assert!(content.labels.optional);
        assert_eq!(content.labels.null_rate, Some(0.25));
        let invalid = json!({"type": "null", "null_rate": 2});
        assert!(Content::parse(&invalid, "x").is_err());
    }

    #[test]
    fn rejects_float_or_negative_lengths() {
        let float = json!({"type": "array", "length": 1.5, "content": null});
        assert!(Content::parse(&float, "x").is_err());
        let negative = json!({"type": "array", "length": -1, "content": null});
        assert!(Content::parse(&negative, "x").is_err());
    }

    #[test]
    fn bool_frequency_must_be_a_probability() {
        assert!(Content::parse(&json!({"type": "bool", "frequency": 1.5}), "b").is_err());
        assert!(Content::parse(&json!({"type": "bool"}), "b").is_err());
    }
}
