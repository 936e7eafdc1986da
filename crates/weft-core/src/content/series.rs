use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde_json::Value as Json;

use crate::content::date_time::{
    DEFAULT_DATE_TIME_FORMAT, DateTimeKind, parse_timestamp, validate_format,
};
use crate::content::params::{ParamKind, ParamSpec, child_path, validate_params};
use crate::error::SchemaError;

const SERIES_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("format", ParamKind::String, false),
    ParamSpec::new("incrementing", ParamKind::Object, false),
    ParamSpec::new("poisson", ParamKind::Object, false),
    ParamSpec::new("cyclical", ParamKind::Object, false),
    ParamSpec::new("zip", ParamKind::Object, false),
];

const INCREMENTING_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("start", ParamKind::String, false),
    ParamSpec::new("increment", ParamKind::String, true),
];

const POISSON_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("start", ParamKind::String, false),
    ParamSpec::new("rate", ParamKind::String, true),
];

const CYCLICAL_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("start", ParamKind::String, false),
    ParamSpec::new("period", ParamKind::String, true),
    ParamSpec::new("min_rate", ParamKind::String, true),
    ParamSpec::new("max_rate", ParamKind::String, true),
];

const ZIP_PARAMS: &[ParamSpec] = &[ParamSpec::new("series", ParamKind::Array, true)];

const VARIANTS: &[&str] = &["incrementing", "poisson", "cyclical", "zip"];

/// A time series rendered as formatted strings.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesContent {
    pub format: String,
    pub variant: SeriesVariant,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SeriesVariant {
    Incrementing {
        start: NaiveDateTime,
        increment: TimeDelta,
    },
    Poisson {
        start: NaiveDateTime,
        rate: TimeDelta,
    },
    Cyclical {
        start: NaiveDateTime,
        period: TimeDelta,
        min_rate: TimeDelta,
        max_rate: TimeDelta,
    },
    Zip {
        series: Vec<SeriesVariant>,
    },
}

impl SeriesContent {
    pub fn parse(body: &Json, path: &str) -> Result<Self, SchemaError> {
        let params = validate_params(body, SERIES_PARAMS, path)?;
        let format = params.get_str("format").unwrap_or(DEFAULT_DATE_TIME_FORMAT);
        validate_format(format, path)?;
        let variant = SeriesVariant::parse(body, format, path)?;
        Ok(Self {
            format: format.to_string(),
            variant,
        })
    }
}

impl SeriesVariant {
    /// Parses the single variant key present in `body`, ignoring `format`.
    fn parse(body: &Json, format: &str, path: &str) -> Result<Self, SchemaError> {
        let map = body
            .as_object()
            .ok_or_else(|| SchemaError::invalid(path, "series must be a JSON object"))?;
        let present: Vec<&str> = VARIANTS
            .iter()
            .copied()
            .filter(|key| map.contains_key(*key))
            .collect();
        let name = match present.as_slice() {
            [name] => *name,
            [] => return Err(SchemaError::missing(path, &VARIANTS.join("|"))),
            _ => {
                return Err(SchemaError::invalid(
                    path,
                    format!("only one of {} may be set", present.join(", ")),
                ));
            }
        };
        if let Some(key) = map
            .keys()
            .find(|key| key.as_str() != "format" && !VARIANTS.contains(&key.as_str()))
        {
            return Err(SchemaError::UnexpectedField {
                path: path.to_string(),
                field: key.clone(),
            });
        }
        let inner_path = child_path(path, name);
        let inner = map
            .get(name)
            .ok_or_else(|| SchemaError::missing(path, name))?;

        match name {
            "incrementing" => {
                let params = validate_params(inner, INCREMENTING_PARAMS, &inner_path)?;
                let start = parse_start(params.get_str("start"), format, &inner_path)?;
                let increment = positive_duration(params.require_str("increment")?, &inner_path)?;
                Ok(Self::Incrementing { start, increment })
            }
            "poisson" => {
                let params = validate_params(inner, POISSON_PARAMS, &inner_path)?;
                let start = parse_start(params.get_str("start"), format, &inner_path)?;
                let rate = positive_duration(params.require_str("rate")?, &inner_path)?;
                Ok(Self::Poisson { start, rate })
            }
            "cyclical" => {
                let params = validate_params(inner, CYCLICAL_PARAMS, &inner_path)?;
                let start = parse_start(params.get_str("start"), format, &inner_path)?;
                let period = positive_duration(params.require_str("period")?, &inner_path)?;
                let min_rate = parse_duration(params.require_str("min_rate")?, &inner_path)?;
                let max_rate = positive_duration(params.require_str("max_rate")?, &inner_path)?;
                if min_rate > max_rate {
                    return Err(SchemaError::invalid(
                        &inner_path,
                        "min_rate must not exceed max_rate",
                    ));
                }
                Ok(Self::Cyclical {
                    start,
                    period,
                    min_rate,
                    max_rate,
                })
            }
            _ => {
                let params = validate_params(inner, ZIP_PARAMS, &inner_path)?;
                let children = params.require("series")?.as_array().into_iter().flatten();
                let series = children
                    .enumerate()
                    .map(|(idx, child)| {
                        Self::parse(child, format, &child_path(&inner_path, &idx.to_string()))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                if series.is_empty() {
                    return Err(SchemaError::invalid(&inner_path, "zip needs at least one series"));
                }
                Ok(Self::Zip { series })
            }
        }
    }
}

fn parse_start(text: Option<&str>, format: &str, path: &str) -> Result<NaiveDateTime, SchemaError> {
    match text {
        Some(text) => parse_timestamp(text, DateTimeKind::NaiveDateTime, format, path),
        None => Ok(NaiveDate::from_ymd_opt(2000, 1, 1)
            .unwrap_or_default()
            .and_time(NaiveTime::MIN)),
    }
}

fn positive_duration(text: &str, path: &str) -> Result<TimeDelta, SchemaError> {
    let duration = parse_duration(text, path)?;
    if duration <= TimeDelta::zero() {
        return Err(SchemaError::invalid(path, format!("duration '{text}' must be positive")));
    }
    Ok(duration)
}

/// Parses durations such as `"90s"`, `"1h 30m"` or `"1d12h"`.
///
/// Each part is an integer followed by one of `ms`, `s`, `m`, `h`, `d`, `w`.
pub fn parse_duration(text: &str, path: &str) -> Result<TimeDelta, SchemaError> {
    let invalid = || SchemaError::invalid(path, format!("invalid duration '{text}'"));
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(invalid());
    }

    let mut total = TimeDelta::zero();
    let mut rest = compact.as_str();
    while !rest.is_empty() {
        let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if digits == 0 {
            return Err(invalid());
        }
        let amount: i64 = rest[..digits].parse().map_err(|_| invalid())?;
        rest = &rest[digits..];
        let unit_len = rest.find(|c: char| c.is_ascii_digit()).unwrap_or(rest.len());
        let part = match &rest[..unit_len] {
            "ms" => TimeDelta::try_milliseconds(amount),
            "s" => TimeDelta::try_seconds(amount),
            "m" => TimeDelta::try_minutes(amount),
            "h" => TimeDelta::try_hours(amount),
            "d" => TimeDelta::try_days(amount),
            "w" => TimeDelta::try_weeks(amount),
            _ => None,
        }
        .ok_or_else(invalid)?;
        total = total.checked_add(&part).ok_or_else(invalid)?;
        rest = &rest[unit_len..];
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_compound_durations() {
        assert_eq!(parse_duration("90s", "d"), Ok(TimeDelta::seconds(90)));
        assert_eq!(parse_duration("1h 30m", "d"), Ok(TimeDelta::minutes(90)));
        assert_eq!(parse_duration("1d12h", "d"), Ok(TimeDelta::hours(36)));
        assert_eq!(parse_duration("250ms", "d"), Ok(TimeDelta::milliseconds(250)));
        assert!(parse_duration("h", "d").is_err());
        assert!(parse_duration("10 fortnights", "d").is_err());
        assert!(parse_duration("", "d").is_err());
    }

    #[test]
    fn parses_zip_of_incrementing_series() {
        let body = json!({
            "zip": {"series": [
                {"incrementing": {"start": "2021-01-01 00:00:00", "increment": "1m"}},
                {"poisson": {"start": "2021-01-01 00:00:00", "rate": "10s"}}
            ]}
        });
        let parsed = SeriesContent::parse(&body, "events.ts").expect("parse");
        assert_eq!(parsed.format, DEFAULT_DATE_TIME_FORMAT);
        let SeriesVariant::Zip { series } = parsed.variant else {
            panic!("expected zip");
        };
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn rejects_inverted_cyclical_rates() {
        let body = json!({"cyclical": {"period": "1d", "min_rate": "1h", "max_rate": "10m"}});
        assert!(SeriesContent::parse(&body, "e").is_err());
    }

    #[test]
    fn rejects_non_positive_increments() {
        let body = json!({"incrementing": {"increment": "0s"}});
        assert!(SeriesContent::parse(&body, "e").is_err());
    }
}
