use std::fmt;

use rand_regex::Regex as RandRegex;
use regex::Regex;
use serde_json::Value as Json;

use crate::content::date_time::DateTimeContent;
use crate::content::faker::FakerContent;
use crate::content::params::{ParamKind, ParamSpec, child_path, validate_params};
use crate::content::series::SeriesContent;
use crate::content::{Content, check_length};
use crate::error::SchemaError;

/// Upper bound for unbounded repetitions (`*`, `+`, `{n,}`) in patterns.
pub const DEFAULT_MAX_REPEAT: u32 = 32;

const STRING_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("pattern", ParamKind::String, false),
    ParamSpec::new("faker", ParamKind::Any, false),
    ParamSpec::new("categorical", ParamKind::Object, false),
    ParamSpec::new("date_time", ParamKind::Object, false),
    ParamSpec::new("series", ParamKind::Object, false),
    ParamSpec::new("uuid", ParamKind::Object, false),
    ParamSpec::new("format", ParamKind::Object, false),
    ParamSpec::new("truncated", ParamKind::Object, false),
    ParamSpec::new("sliced", ParamKind::Object, false),
    ParamSpec::new("serialized", ParamKind::Object, false),
    ParamSpec::new("constant", ParamKind::String, false),
];

const RULES: &[&str] = &[
    "pattern",
    "faker",
    "categorical",
    "date_time",
    "series",
    "uuid",
    "format",
    "truncated",
    "sliced",
    "serialized",
    "constant",
];

const FORMAT_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("format", ParamKind::String, true),
    ParamSpec::new("arguments", ParamKind::Object, false),
];

const TRUNCATED_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("content", ParamKind::Any, true),
    ParamSpec::new("length", ParamKind::Any, true),
];

const SLICED_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("content", ParamKind::Any, true),
    ParamSpec::new("slice", ParamKind::Any, true),
];

const SERIALIZED_PARAMS: &[ParamSpec] = &[ParamSpec::new("json", ParamKind::Object, true)];

const JSON_PARAMS: &[ParamSpec] = &[ParamSpec::new("content", ParamKind::Any, true)];

#[derive(Debug, Clone)]
pub enum StringContent {
    Constant(String),
    Pattern(Pattern),
    Faker(FakerContent),
    Categorical(Categorical),
    DateTime(DateTimeContent),
    Series(SeriesContent),
    Uuid,
    Format(FormatContent),
    Truncated(TruncatedContent),
    Sliced(SlicedContent),
    Serialized(SerializedContent),
}

impl StringContent {
    pub fn parse(body: &Json, path: &str) -> Result<Self, SchemaError> {
        let params = validate_params(body, STRING_PARAMS, path)?;
        let rule = params.one_of(RULES)?;
        let inner = params.require(rule)?;
        let inner_path = child_path(path, rule);
        match rule {
            "pattern" => Ok(Self::Pattern(Pattern::compile(params.require_str(rule)?, path)?)),
            "faker" => Ok(Self::Faker(FakerContent::parse(inner, &inner_path)?)),
            "categorical" => Ok(Self::Categorical(Categorical::parse(inner, &inner_path)?)),
            "date_time" => Ok(Self::DateTime(DateTimeContent::parse(inner, &inner_path)?)),
            "series" => Ok(Self::Series(SeriesContent::parse(inner, &inner_path)?)),
            "uuid" => {
                validate_params(inner, &[], &inner_path)?;
                Ok(Self::Uuid)
            }
            "format" => Ok(Self::Format(FormatContent::parse(inner, &inner_path)?)),
            "truncated" => Ok(Self::Truncated(TruncatedContent::parse(inner, &inner_path)?)),
            "sliced" => Ok(Self::Sliced(SlicedContent::parse(inner, &inner_path)?)),
            "serialized" => Ok(Self::Serialized(SerializedContent::parse(inner, &inner_path)?)),
            _ => Ok(Self::Constant(params.require_str(rule)?.to_string())),
        }
    }
}

/// A regular expression compiled for randomized expansion.
#[derive(Clone)]
pub struct Pattern {
    source: String,
    regex: RandRegex,
}

impl Pattern {
    pub fn compile(source: &str, path: &str) -> Result<Self, SchemaError> {
        let regex = RandRegex::compile(source, DEFAULT_MAX_REPEAT).map_err(|err| {
            SchemaError::Pattern {
                path: path.to_string(),
                message: err.to_string(),
            }
        })?;
        if !regex.is_utf8() {
            return Err(SchemaError::Pattern {
                path: path.to_string(),
                message: "pattern may produce invalid UTF-8".to_string(),
            });
        }
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn regex(&self) -> &RandRegex {
        &self.regex
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.source).finish()
    }
}

/// Weighted choice between fixed strings, kept in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Categorical {
    pub choices: Vec<(String, f64)>,
}

impl Categorical {
    pub fn parse(body: &Json, path: &str) -> Result<Self, SchemaError> {
        let map = body
            .as_object()
            .ok_or_else(|| SchemaError::invalid(path, "categorical must be a JSON object"))?;
        let mut choices = Vec::with_capacity(map.len());
        for (choice, weight) in map {
            let weight = weight
                .as_f64()
                .filter(|weight| *weight > 0.0 && weight.is_finite())
                .ok_or_else(|| {
                    SchemaError::invalid(path, format!("weight of '{choice}' must be a positive number"))
                })?;
            choices.push((choice.clone(), weight));
        }
        if choices.is_empty() {
            return Err(SchemaError::invalid(path, "categorical needs at least one choice"));
        }
        Ok(Self { choices })
    }
}

/// Piece of a format template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Argument(usize),
}

/// `{"format": "{first} {last}", "arguments": {"first": ..., "last": ...}}`.
#[derive(Debug, Clone)]
pub struct FormatContent {
    pub template: String,
    pub segments: Vec<Segment>,
    pub arguments: Vec<(String, Content)>,
}

impl FormatContent {
    pub fn parse(body: &Json, path: &str) -> Result<Self, SchemaError> {
        let params = validate_params(body, FORMAT_PARAMS, path)?;
        let template = params.require_str("format")?;
        let mut arguments = Vec::new();
        if let Some(map) = params.get("arguments").and_then(Json::as_object) {
            for (name, value) in map {
                let content = Content::parse(value, &child_path(path, name))?;
                arguments.push((name.clone(), content));
            }
        }
        let segments = split_template(template, &arguments, path)?;
        Ok(Self {
            template: template.to_string(),
            segments,
            arguments,
        })
    }
}

/// Cuts the string produced by `content` to at most `length` characters.
#[derive(Debug, Clone)]
pub struct TruncatedContent {
    pub content: Box<Content>,
    pub length: Box<Content>,
}

impl TruncatedContent {
    fn parse(body: &Json, path: &str) -> Result<Self, SchemaError> {
        let params = validate_params(body, TRUNCATED_PARAMS, path)?;
        let content = Content::parse(params.require("content")?, &child_path(path, "content"))?;
        let length_path = child_path(path, "length");
        let length = Content::parse(params.require("length")?, &length_path)?;
        check_length(&length, &length_path)?;
        Ok(Self {
            content: Box::new(content),
            length: Box::new(length),
        })
    }
}

/// Takes the `start:end` character range named by `slice` out of the
/// string produced by `content`. A slice without `:` keeps the string.
#[derive(Debug, Clone)]
pub struct SlicedContent {
    pub content: Box<Content>,
    pub slice: Box<Content>,
}

impl SlicedContent {
    fn parse(body: &Json, path: &str) -> Result<Self, SchemaError> {
        let params = validate_params(body, SLICED_PARAMS, path)?;
        let content = Content::parse(params.require("content")?, &child_path(path, "content"))?;
        let slice = Content::parse(params.require("slice")?, &child_path(path, "slice"))?;
        Ok(Self {
            content: Box::new(content),
            slice: Box::new(slice),
        })
    }
}

/// Renders the value produced by `content` as text.
#[derive(Debug, Clone)]
pub enum SerializedContent {
    Json { content: Box<Content> },
}

impl SerializedContent {
    fn parse(body: &Json, path: &str) -> Result<Self, SchemaError> {
        let params = validate_params(body, SERIALIZED_PARAMS, path)?;
        let json_path = child_path(path, "json");
        let json = validate_params(params.require("json")?, JSON_PARAMS, &json_path)?;
        let content = Content::parse(json.require("content")?, &child_path(&json_path, "content"))?;
        Ok(Self::Json {
            content: Box::new(content),
        })
    }
}

fn split_template(
    template: &str,
    arguments: &[(String, Content)],
    path: &str,
) -> Result<Vec<Segment>, SchemaError> {
    let placeholder = Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}")
        .map_err(|err| SchemaError::invalid(path, err.to_string()))?;
    let mut segments = Vec::new();
    let mut cursor = 0;
    for captures in placeholder.captures_iter(template) {
        let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        let index = arguments
            .iter()
            .position(|(argument, _)| argument == name.as_str())
            .ok_or_else(|| {
                SchemaError::invalid(path, format!("no argument named '{}'", name.as_str()))
            })?;
        if whole.start() > cursor {
            segments.push(Segment::Literal(template[cursor..whole.start()].to_string()));
        }
        segments.push(Segment::Argument(index));
        cursor = whole.end();
    }
    if cursor < template.len() {
        segments.push(Segment::Literal(template[cursor..].to_string()));
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn rejects_malformed_patterns() {
        let result = StringContent::parse(&json!({"pattern": "[a-z"}), "users.code");
        assert!(matches!(result, Err(SchemaError::Pattern { .. })));
    }

    #[test]
    fn rejects_non_positive_weights() {
        let result = StringContent::parse(&json!({"categorical": {"a": 1, "b": 0}}), "c");
        assert!(result.is_err());
        let result = StringContent::parse(&json!({"categorical": {}}), "c");
        assert!(result.is_err());
    }

    #[test]
    fn categorical_keeps_declaration_order() {
        let parsed = Categorical::parse(&json!({"zulu": 1, "alpha": 3}), "c").expect("parse");
        let names: Vec<&str> = parsed.choices.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, ["zulu", "alpha"]);
        assert_eq!(parsed.choices[1].1, 3.0);
    }

    #[test]
    fn format_templates_split_on_placeholders() {
        let body = json!({
            "format": "{first}-{last}!",
            "arguments": {"first": "a", "last": "b"}
        });
        let parsed = FormatContent::parse(&body, "f").expect("parse");
        assert_eq!(
            parsed.segments,
            vec![
                Segment::Argument(0),
                Segment::Literal("-".to_string()),
                Segment::Argument(1),
                Segment::Literal("!".to_string()),
            ]
        );
        let missing = json!({"format": "{nope}"});
        assert!(FormatContent::parse(&missing, "f").is_err());
    }

    #[test]
    fn wrapping_rules_parse_their_inner_content() {
        let truncated = json!({"truncated": {"content": {"type": "string", "faker": {"generator": "name"}}, "length": 3}});
        assert!(matches!(
            StringContent::parse(&truncated, "s"),
            Ok(StringContent::Truncated(_))
        ));
        let sliced = json!({"sliced": {"content": "abcdef", "slice": "1:3"}});
        assert!(matches!(
            StringContent::parse(&sliced, "s"),
            Ok(StringContent::Sliced(_))
        ));
        let serialized = json!({"serialized": {"json": {"content": {"type": "object", "a": 1}}}});
        assert!(matches!(
            StringContent::parse(&serialized, "s"),
            Ok(StringContent::Serialized(SerializedContent::Json { .. }))
        ));
    }

    #[test]
    fn wrapping_rules_validate_their_parameters() {
        let negative = json!({"truncated": {"content": "abc", "length": -1}});
        assert!(StringContent::parse(&negative, "s").is_err());
        let missing = json!({"sliced": {"content": "abc"}});
        assert!(matches!(
            StringContent::parse(&missing, "s"),
            Err(SchemaError::MissingField { .. })
        ));
        let unknown = json!({"serialized": {"yaml": {"content": 1}}});
        assert!(StringContent::parse(&unknown, "s").is_err());
    }

    #[test]
    fn exactly_one_rule_is_allowed() {
        assert!(StringContent::parse(&json!({}), "s").is_err());
        assert!(StringContent::parse(&json!({"pattern": "a", "uuid": {}}), "s").is_err());
        assert!(matches!(
            StringContent::parse(&json!({"uuid": {}}), "s"),
            Ok(StringContent::Uuid)
        ));
    }
}
