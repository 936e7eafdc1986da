use std::fmt::Write as _;

use chrono::format::{Item, StrftimeItems};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value as Json;

use crate::content::params::{ParamKind, ParamSpec, validate_params};
use crate::error::SchemaError;

pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";
pub const DEFAULT_TIME_FORMAT: &str = "%H:%M:%S";
pub const DEFAULT_DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DATE_TIME_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("format", ParamKind::String, false),
    ParamSpec::new("subtype", ParamKind::String, false),
    ParamSpec::new("begin", ParamKind::String, false),
    ParamSpec::new("end", ParamKind::String, false),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DateTimeKind {
    NaiveDate,
    NaiveTime,
    NaiveDateTime,
}

impl DateTimeKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "naive_date" => Some(Self::NaiveDate),
            "naive_time" => Some(Self::NaiveTime),
            "naive_date_time" => Some(Self::NaiveDateTime),
            _ => None,
        }
    }

    pub fn default_format(self) -> &'static str {
        match self {
            Self::NaiveDate => DEFAULT_DATE_FORMAT,
            Self::NaiveTime => DEFAULT_TIME_FORMAT,
            Self::NaiveDateTime => DEFAULT_DATE_TIME_FORMAT,
        }
    }

    /// Bounds used when `begin`/`end` are omitted.
    fn default_bounds(self) -> (NaiveDateTime, NaiveDateTime) {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
        match self {
            Self::NaiveTime => (
                epoch.and_time(NaiveTime::MIN),
                epoch
                    .succ_opt()
                    .unwrap_or_default()
                    .and_time(NaiveTime::MIN),
            ),
            Self::NaiveDate | Self::NaiveDateTime => (
                NaiveDate::from_ymd_opt(2000, 1, 1)
                    .unwrap_or_default()
                    .and_time(NaiveTime::MIN),
                NaiveDate::from_ymd_opt(2030, 1, 1)
                    .unwrap_or_default()
                    .and_time(NaiveTime::MIN),
            ),
        }
    }
}

/// Uniform timestamps in `[begin, end)`. Dates and times are carried as
/// `NaiveDateTime`, times on 1970-01-01 and dates at midnight.
#[derive(Debug, Clone, PartialEq)]
pub struct DateTimeContent {
    pub format: String,
    pub kind: DateTimeKind,
    pub begin: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateTimeContent {
    pub fn parse(body: &Json, path: &str) -> Result<Self, SchemaError> {
        let params = validate_params(body, DATE_TIME_PARAMS, path)?;
        let kind = match params.get_str("subtype") {
            None => DateTimeKind::NaiveDateTime,
            Some("date_time") => {
                return Err(SchemaError::invalid(
                    path,
                    "timezone-aware date_time is not supported, use naive_date_time",
                ));
            }
            Some(name) => DateTimeKind::parse(name).ok_or_else(|| {
                SchemaError::invalid(path, format!("unknown date_time subtype '{name}'"))
            })?,
        };
        let format = params.get_str("format").unwrap_or(kind.default_format());
        validate_format(format, path)?;

        let (default_begin, default_end) = kind.default_bounds();
        let begin = match params.get_str("begin") {
            Some(text) => parse_timestamp(text, kind, format, path)?,
            None => default_begin,
        };
        let end = match params.get_str("end") {
            Some(text) => parse_timestamp(text, kind, format, path)?,
            None => default_end,
        };
        if begin >= end {
            return Err(SchemaError::invalid(path, "begin must be before end"));
        }

        Ok(Self {
            format: format.to_string(),
            kind,
            begin,
            end,
        })
    }
}

/// Rejects strftime strings chrono cannot parse and those that need
/// timezone information a naive timestamp does not have.
pub fn validate_format(format: &str, path: &str) -> Result<(), SchemaError> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(SchemaError::invalid(path, format!("invalid format string '{format}'")));
    }
    let probe = NaiveDate::from_ymd_opt(2000, 1, 1)
        .unwrap_or_default()
        .and_time(NaiveTime::MIN);
    let mut rendered = String::new();
    write!(rendered, "{}", probe.format(format)).map_err(|_| {
        SchemaError::invalid(path, format!("format '{format}' requires timezone information"))
    })?;
    Ok(())
}

/// Parses `text` with `format`, falling back to the subtype's default format.
pub fn parse_timestamp(
    text: &str,
    kind: DateTimeKind,
    format: &str,
    path: &str,
) -> Result<NaiveDateTime, SchemaError> {
    let attempt = |format: &str| -> Option<NaiveDateTime> {
        match kind {
            DateTimeKind::NaiveDateTime => NaiveDateTime::parse_from_str(text, format).ok(),
            DateTimeKind::NaiveDate => NaiveDate::parse_from_str(text, format)
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN)),
            DateTimeKind::NaiveTime => NaiveTime::parse_from_str(text, format).ok().map(|time| {
                NaiveDate::from_ymd_opt(1970, 1, 1)
                    .unwrap_or_default()
                    .and_time(time)
            }),
        }
    };
    attempt(format)
        .or_else(|| attempt(kind.default_format()))
        .ok_or_else(|| {
            SchemaError::invalid(path, format!("cannot parse '{text}' with format '{format}'"))
        })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_bounds_with_custom_format() {
        let body = json!({
            "format": "%d/%m/%Y",
            "subtype": "naive_date",
            "begin": "01/02/2020",
            "end": "2020-03-01"
        });
        let parsed = DateTimeContent::parse(&body, "events.day").expect("parse");
        assert_eq!(parsed.kind, DateTimeKind::NaiveDate);
        assert_eq!(parsed.begin.to_string(), "2020-02-01 00:00:00");
        assert_eq!(parsed.end.to_string(), "2020-03-01 00:00:00");
    }

    #[test]
    fn rejects_timezone_aware_content() {
        assert!(DateTimeContent::parse(&json!({"subtype": "date_time"}), "e").is_err());
        assert!(DateTimeContent::parse(&json!({"format": "%Y %z"}), "e").is_err());
    }

    #[test]
    fn rejects_inverted_bounds() {
        let body = json!({"begin": "2021-01-01 00:00:00", "end": "2020-01-01 00:00:00"});
        assert!(DateTimeContent::parse(&body, "e").is_err());
    }

    #[test]
    fn rejects_broken_formats() {
        assert!(validate_format("%Y-%", "e").is_err());
        assert!(validate_format("%Y-%m-%d", "e").is_ok());
    }
}
