use serde_json::Value as Json;

use crate::content::params::{ParamKind, ParamSpec, validate_params};
use crate::error::SchemaError;
use crate::value::{NumberKind, NumberValue, number_from_json};

const NUMBER_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("subtype", ParamKind::String, false),
    ParamSpec::new("range", ParamKind::Object, false),
    ParamSpec::new("constant", ParamKind::Number, false),
    ParamSpec::new("id", ParamKind::Object, false),
];

const RANGE_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("low", ParamKind::Number, true),
    ParamSpec::new("high", ParamKind::Number, true),
    ParamSpec::new("step", ParamKind::Number, false),
    ParamSpec::new("include_high", ParamKind::Bool, false),
];

const ID_PARAMS: &[ParamSpec] = &[ParamSpec::new("start_at", ParamKind::Number, false)];

const DEFAULT_ID_START: i128 = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct NumberContent {
    pub kind: NumberKind,
    pub rule: NumberRule,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NumberRule {
    Constant(NumberValue),
    Range(RangeStep),
    Id { start_at: i128 },
}

/// Bounds of a range rule, kept in a representation wide enough for every
/// subtype so sampling can detect overflow before narrowing.
#[derive(Debug, Clone, PartialEq)]
pub enum RangeStep {
    Int {
        low: i128,
        high: i128,
        step: i128,
        include_high: bool,
    },
    Float {
        low: f64,
        high: f64,
        step: Option<f64>,
        include_high: bool,
    },
}

impl RangeStep {
    /// Number of distinct steps a discrete range can produce.
    pub fn bucket_count(&self) -> Option<u128> {
        match *self {
            RangeStep::Int {
                low,
                high,
                step,
                include_high,
            } => {
                let span = (high - low) as u128;
                let step = step as u128;
                Some(if include_high {
                    span / step + 1
                } else {
                    span.div_ceil(step)
                })
            }
            RangeStep::Float {
                low,
                high,
                step: Some(step),
                include_high,
            } => {
                let ratio = (high - low) / step;
                let count = if include_high {
                    ratio.floor() + 1.0
                } else {
                    ratio.ceil()
                };
                Some(count as u128)
            }
            RangeStep::Float { step: None, .. } => None,
        }
    }
}

impl NumberContent {
    pub fn constant(value: NumberValue) -> Self {
        Self {
            kind: value.kind(),
            rule: NumberRule::Constant(value),
        }
    }

    pub fn parse(body: &Json, path: &str) -> Result<Self, SchemaError> {
        let params = validate_params(body, NUMBER_PARAMS, path)?;
        let declared = params
            .get_str("subtype")
            .map(|name| {
                NumberKind::parse(name)
                    .ok_or_else(|| SchemaError::invalid(path, format!("unknown number subtype '{name}'")))
            })
            .transpose()?;

        match params.one_of(&["range", "constant", "id"])? {
            "constant" => {
                let literal = params.require("constant")?;
                let inferred = infer_kind(&[literal]);
                let kind = declared.unwrap_or(inferred);
                let value = narrow_literal(literal, kind)
                    .ok_or_else(|| SchemaError::invalid(path, format!("constant does not fit {kind}")))?;
                Ok(Self {
                    kind,
                    rule: NumberRule::Constant(value),
                })
            }
            "range" => {
                let range_path = format!("{path}.range");
                let range = validate_params(params.require("range")?, RANGE_PARAMS, &range_path)?;
                let low = range.require("low")?;
                let high = range.require("high")?;
                let step = range.get("step");
                let mut literals = vec![low, high];
                literals.extend(step);
                let kind = declared.unwrap_or_else(|| infer_kind(&literals));
                let include_high = range.get_bool("include_high").unwrap_or(false);
                let rule = parse_range(kind, low, high, step, include_high, &range_path)?;
                Ok(Self {
                    kind,
                    rule: NumberRule::Range(rule),
                })
            }
            _ => {
                let id_path = format!("{path}.id");
                let id = validate_params(params.require("id")?, ID_PARAMS, &id_path)?;
                let kind = declared.unwrap_or(NumberKind::U64);
                if kind.is_float() {
                    return Err(SchemaError::invalid(
                        &id_path,
                        format!("ids require an integer subtype, got {kind}"),
                    ));
                }
                let start_at = match id.get("start_at") {
                    Some(literal) => integer_literal(literal)
                        .ok_or_else(|| SchemaError::invalid(&id_path, "start_at must be an integer"))?,
                    None => DEFAULT_ID_START,
                };
                if NumberValue::from_i128(kind, start_at).is_none() {
                    return Err(SchemaError::invalid(
                        &id_path,
                        format!("start_at {start_at} does not fit {kind}"),
                    ));
                }
                Ok(Self {
                    kind,
                    rule: NumberRule::Id { start_at },
                })
            }
        }
    }
}

fn parse_range(
    kind: NumberKind,
    low: &Json,
    high: &Json,
    step: Option<&Json>,
    include_high: bool,
    path: &str,
) -> Result<RangeStep, SchemaError> {
    let ordered = |low_is_below: bool, equal: bool| {
        if low_is_below || (equal && include_high) {
            Ok(())
        } else {
            Err(SchemaError::invalid(path, "low must be lower than high"))
        }
    };

    if kind.is_float() {
        let low = low.as_f64().unwrap_or_default();
        let high = high.as_f64().unwrap_or_default();
        ordered(low < high, low == high)?;
        if !(high - low).is_finite() {
            return Err(SchemaError::invalid(path, "range is too wide to sample"));
        }
        let step = step.and_then(Json::as_f64);
        if let Some(step) = step
            && !(step > 0.0 && step.is_finite())
        {
            return Err(SchemaError::invalid(path, "step must be positive"));
        }
        return Ok(RangeStep::Float {
            low,
            high,
            step,
            include_high,
        });
    }

    let integer = |literal: &Json, name: &str| {
        integer_literal(literal).ok_or_else(|| {
            SchemaError::invalid(path, format!("{name} must be an integer for subtype {kind}"))
        })
    };
    let low = integer(low, "low")?;
    let high = integer(high, "high")?;
    ordered(low < high, low == high)?;
    let step = match step {
        Some(step) => integer(step, "step")?,
        None => 1,
    };
    if step <= 0 {
        return Err(SchemaError::invalid(path, "step must be positive"));
    }
    Ok(RangeStep::Int {
        low,
        high,
        step,
        include_high,
    })
}

/// Float literals pick `f64`, negative literals `i64`, the rest `u64`.
fn infer_kind(literals: &[&Json]) -> NumberKind {
    let numbers: Vec<NumberValue> = literals
        .iter()
        .filter_map(|literal| literal.as_number())
        .map(number_from_json)
        .collect();
    if numbers.iter().any(|n| n.kind() == NumberKind::F64) {
        NumberKind::F64
    } else if numbers.iter().any(|n| n.kind() == NumberKind::I64) {
        NumberKind::I64
    } else {
        NumberKind::U64
    }
}

fn integer_literal(literal: &Json) -> Option<i128> {
    literal
        .as_i64()
        .map(i128::from)
        .or_else(|| literal.as_u64().map(i128::from))
}

fn narrow_literal(literal: &Json, kind: NumberKind) -> Option<NumberValue> {
    match integer_literal(literal) {
        Some(value) => NumberValue::from_i128(kind, value),
        None => literal.as_f64().and_then(|value| NumberValue::from_f64(kind, value)),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn infers_subtypes_from_literals() {
        let parsed = NumberContent::parse(&json!({"range": {"low": 0, "high": 10}}), "n").expect("parse");
        assert_eq!(parsed.kind, NumberKind::U64);
        let parsed = NumberContent::parse(&json!({"range": {"low": -5, "high": 10}}), "n").expect("parse");
        assert_eq!(parsed.kind, NumberKind::I64);
        let parsed = NumberContent::parse(&json!({"range": {"low": 0, "high": 1.5}}), "n").expect("parse");
        assert_eq!(parsed.kind, NumberKind::F64);
    }

    #[test]
    fn rejects_inverted_or_empty_ranges() {
        let inverted = json!({"range": {"low": 10, "high": 1}});
        assert!(NumberContent::parse(&inverted, "n").is_err());
        let empty = json!({"range": {"low": 3, "high": 3}});
        assert!(NumberContent::parse(&empty, "n").is_err());
        let closed = json!({"range": {"low": 3, "high": 3, "include_high": true}});
        assert!(NumberContent::parse(&closed, "n").is_ok());
        let too_wide = json!({"range": {"low": -1.7e308, "high": 1.7e308}});
        assert!(matches!(
            NumberContent::parse(&too_wide, "n"),
            Err(SchemaError::Invalid { .. })
        ));
    }

    #[test]
    fn rejects_non_positive_steps() {
        let zero = json!({"range": {"low": 0, "high": 10, "step": 0}});
        assert!(NumberContent::parse(&zero, "n").is_err());
        let negative = json!({"subtype": "f64", "range": {"low": 0, "high": 1, "step": -0.5}});
        assert!(NumberContent::parse(&negative, "n").is_err());
    }

    #[test]
    fn ids_default_to_one_and_reject_floats() {
        let parsed = NumberContent::parse(&json!({"id": {}}), "n").expect("parse");
        assert_eq!(parsed.rule, NumberRule::Id { start_at: 1 });
        let float = json!({"subtype": "f32", "id": {}});
        assert!(NumberContent::parse(&float, "n").is_err());
        let unsigned = json!({"subtype": "u32", "id": {"start_at": -1}});
        assert!(NumberContent::parse(&unsigned, "n").is_err());
    }

    #[test]
    fn bucket_counts_follow_step() {
        let range = RangeStep::Int {
            low: 0,
            high: 10,
            step: 3,
            include_high: false,
        };
        assert_eq!(range.bucket_count(), Some(4));
        let closed = RangeStep::Int {
            low: 0,
            high: 9,
            step: 3,
            include_high: true,
        };
        assert_eq!(closed.bucket_count(), Some(4));
    }

    #[test]
    fn rejects_two_rules() {
        let both = json!({"constant": 1, "id": {}});
        assert!(NumberContent::parse(&both, "n").is_err());
    }
}
