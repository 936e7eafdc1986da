use rand::distr::Bernoulli;
use rand::distr::weighted::WeightedIndex;
use rand::{Rng, RngCore};
use rand_regex::Regex as RandRegex;

use weft_core::{
    BoolContent, Categorical, NumberContent, NumberKind, NumberRule, NumberValue, RangeStep,
    SchemaError, Value,
};

use crate::errors::SamplingError;

/// Bernoulli flag or a fixed boolean.
#[derive(Debug, Clone)]
pub(crate) enum BoolSampler {
    Constant(bool),
    Frequency(Bernoulli),
}

impl BoolSampler {
    pub(crate) fn new(content: &BoolContent, path: &str) -> Result<Self, SchemaError> {
        match *content {
            BoolContent::Constant(flag) => Ok(Self::Constant(flag)),
            BoolContent::Frequency(p) => Bernoulli::new(p)
                .map(Self::Frequency)
                .map_err(|err| SchemaError::invalid(path, err.to_string())),
        }
    }

    pub(crate) fn sample(&self, rng: &mut dyn RngCore) -> Value {
        match self {
            Self::Constant(flag) => Value::Bool(*flag),
            Self::Frequency(distribution) => Value::Bool(rng.sample(distribution)),
        }
    }
}

/// Monotonic counter behind `id` nodes. Never reset between passes.
#[derive(Debug, Clone)]
pub(crate) struct IdCounter {
    kind: NumberKind,
    next: i128,
}

#[derive(Debug, Clone)]
pub(crate) enum NumberSampler {
    Constant(NumberValue),
    Range { kind: NumberKind, range: RangeStep },
    Id(IdCounter),
}

impl NumberSampler {
    pub(crate) fn new(content: &NumberContent) -> Self {
        match &content.rule {
            NumberRule::Constant(value) => Self::Constant(*value),
            NumberRule::Range(range) => Self::Range {
                kind: content.kind,
                range: range.clone(),
            },
            NumberRule::Id { start_at } => Self::Id(IdCounter {
                kind: content.kind,
                next: *start_at,
            }),
        }
    }

    /// Counter position before sampling, for rollback.
    pub(crate) fn checkpoint(&self) -> Option<i128> {
        match self {
            Self::Id(counter) => Some(counter.next),
            _ => None,
        }
    }

    pub(crate) fn restore(&mut self, next: i128) {
        if let Self::Id(counter) = self {
            counter.next = next;
        }
    }

    pub(crate) fn sample(
        &mut self,
        rng: &mut dyn RngCore,
        path: &str,
    ) -> Result<Value, SamplingError> {
        match self {
            Self::Constant(value) => Ok(Value::Number(*value)),
            Self::Id(counter) => {
                let value = NumberValue::from_i128(counter.kind, counter.next)
                    .ok_or_else(|| overflow(path, counter.next, counter.kind))?;
                counter.next += 1;
                Ok(Value::Number(value))
            }
            Self::Range { kind, range } => sample_range(*kind, range, rng, path).map(Value::Number),
        }
    }
}

fn sample_range(
    kind: NumberKind,
    range: &RangeStep,
    rng: &mut dyn RngCore,
    path: &str,
) -> Result<NumberValue, SamplingError> {
    let buckets = range.bucket_count();
    match *range {
        RangeStep::Int { low, step, .. } => {
            let buckets = buckets.unwrap_or(1).max(1);
            let n = rng.random_range(0..buckets) as i128;
            let value = low + n * step;
            NumberValue::from_i128(kind, value).ok_or_else(|| overflow(path, value, kind))
        }
        RangeStep::Float {
            low,
            high,
            step,
            include_high,
        } => {
            let value = match step {
                Some(step) => {
                    let buckets = buckets.unwrap_or(1).max(1);
                    low + rng.random_range(0..buckets) as f64 * step
                }
                None if include_high => rng.random_range(low..=high),
                None => rng.random_range(low..high),
            };
            NumberValue::from_f64(kind, value).ok_or_else(|| overflow(path, value, kind))
        }
    }
}

fn overflow(path: &str, value: impl ToString, kind: NumberKind) -> SamplingError {
    SamplingError::Overflow {
        path: path.to_string(),
        value: value.to_string(),
        kind,
    }
}

/// Weighted pick over the declared categories.
#[derive(Debug, Clone)]
pub(crate) struct CategoricalSampler {
    choices: Vec<String>,
    index: WeightedIndex<f64>,
}

impl CategoricalSampler {
    pub(crate) fn new(content: &Categorical, path: &str) -> Result<Self, SchemaError> {
        let index = WeightedIndex::new(content.choices.iter().map(|(_, weight)| *weight))
            .map_err(|err| SchemaError::invalid(path, err.to_string()))?;
        Ok(Self {
            choices: content.choices.iter().map(|(name, _)| name.clone()).collect(),
            index,
        })
    }

    pub(crate) fn sample(&self, rng: &mut dyn RngCore) -> Value {
        let choice = rng.sample(&self.index);
        Value::String(self.choices[choice].clone())
    }
}

pub(crate) fn sample_pattern(regex: &RandRegex, rng: &mut dyn RngCore) -> Value {
    Value::String(rng.sample::<String, _>(regex))
}

pub(crate) fn sample_uuid(rng: &mut dyn RngCore) -> Value {
    let uuid = uuid::Builder::from_random_bytes(rng.random()).into_uuid();
    Value::String(uuid.to_string())
}

/// Applies a `start:end` character slice. Either bound may be empty; a
/// slice without `:` (or a null one) keeps the whole string.
pub(crate) fn slice_chars(text: &str, slice: &Value, path: &str) -> Result<String, SamplingError> {
    let spec = match slice {
        Value::Null => return Ok(text.to_string()),
        Value::String(spec) => spec.as_str(),
        other => {
            return Err(SamplingError::NotAString {
                path: path.to_string(),
                found: other.to_json().to_string(),
            });
        }
    };
    let Some((start, end)) = spec.split_once(':') else {
        return Ok(text.to_string());
    };
    let invalid = |message: String| SamplingError::InvalidSlice {
        path: path.to_string(),
        slice: spec.to_string(),
        message,
    };
    let count = text.chars().count();
    let bound = |raw: &str, default: usize| -> Result<usize, SamplingError> {
        if raw.is_empty() {
            return Ok(default);
        }
        raw.trim()
            .parse::<usize>()
            .map_err(|err| invalid(format!("bad bound '{raw}': {err}")))
    };
    let start = bound(start, 0)?;
    let end = bound(end, count)?;
    if start > end || end > count {
        return Err(invalid(format!("out of range for a string of {count} characters")));
    }
    Ok(text.chars().skip(start).take(end - start).collect())
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn number(body: serde_json::Value) -> NumberSampler {
        NumberSampler::new(&NumberContent::parse(&body, "n").expect("parse"))
    }

    #[test]
    fn stepped_ranges_stay_on_the_grid() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut sampler = number(serde_json::json!({"range": {"low": 10, "high": 20, "step": 5}}));
        for _ in 0..200 {
            let value = sampler.sample(&mut rng, "n").expect("sample");
            let n = value.as_i128().expect("int");
            assert!(n == 10 || n == 15, "unexpected {n}");
        }
    }

    #[test]
    fn include_high_reaches_the_upper_bound() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut sampler =
            number(serde_json::json!({"range": {"low": 0, "high": 2, "include_high": true}}));
        let seen: std::collections::BTreeSet<i128> = (0..200)
            .map(|_| sampler.sample(&mut rng, "n").expect("sample").as_i128().expect("int"))
            .collect();
        assert_eq!(seen.into_iter().collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn id_counter_overflow_does_not_advance() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut sampler = number(serde_json::json!({
            "subtype": "u32",
            "id": {"start_at": u32::MAX}
        }));
        let first = sampler.sample(&mut rng, "n").expect("last id");
        assert_eq!(first.as_i128(), Some(u32::MAX as i128));
        let checkpoint = sampler.checkpoint();
        assert!(matches!(
            sampler.sample(&mut rng, "n"),
            Err(SamplingError::Overflow { .. })
        ));
        assert_eq!(sampler.checkpoint(), checkpoint);
    }

    #[test]
    fn slices_count_characters() {
        let slice = |spec: &str| slice_chars("ação-42", &Value::from(spec.to_string()), "s");
        assert_eq!(slice("0:3").expect("slice"), "açã");
        assert_eq!(slice("5:").expect("slice"), "42");
        assert_eq!(slice(":4").expect("slice"), "ação");
        assert_eq!(slice("all").expect("slice"), "ação-42");
        assert_eq!(slice_chars("abc", &Value::Null, "s").expect("slice"), "abc");
        assert!(matches!(slice("3:1"), Err(SamplingError::InvalidSlice { .. })));
        assert!(matches!(slice("0:99"), Err(SamplingError::InvalidSlice { .. })));
        assert!(matches!(slice("x:2"), Err(SamplingError::InvalidSlice { .. })));
    }

    #[test]
    fn uuids_are_version_four() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let value = sample_uuid(&mut rng);
        let parsed = uuid::Uuid::parse_str(value.as_str().expect("string")).expect("uuid");
        assert_eq!(parsed.get_version_num(), 4);
    }
}
