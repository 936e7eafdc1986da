use std::fmt::Write as _;

use chrono::{NaiveDateTime, TimeDelta};
use rand::{Rng, RngCore};

use weft_core::{DateTimeContent, DateTimeKind, Value};

use crate::errors::SamplingError;

/// Uniform timestamp in `[begin, end)`, rendered with the node's format.
pub(crate) fn sample_date_time(
    content: &DateTimeContent,
    rng: &mut dyn RngCore,
    path: &str,
) -> Result<Value, SamplingError> {
    let span = content.end - content.begin;
    let offset = match content.kind {
        DateTimeKind::NaiveDate => {
            let days = span.num_days().max(1);
            TimeDelta::try_days(rng.random_range(0..days))
        }
        DateTimeKind::NaiveTime | DateTimeKind::NaiveDateTime => {
            let seconds = span.num_seconds().max(1);
            TimeDelta::try_seconds(rng.random_range(0..seconds))
        }
    };
    let timestamp = offset
        .and_then(|offset| content.begin.checked_add_signed(offset))
        .ok_or_else(|| SamplingError::TimestampOverflow {
            path: path.to_string(),
        })?;
    render(timestamp, &content.format, path).map(Value::String)
}

/// Formats without panicking on specifiers chrono cannot render.
pub(crate) fn render(
    timestamp: NaiveDateTime,
    format: &str,
    path: &str,
) -> Result<String, SamplingError> {
    let mut rendered = String::new();
    write!(rendered, "{}", timestamp.format(format)).map_err(|_| SamplingError::Format {
        path: path.to_string(),
        format: format.to_string(),
    })?;
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use serde_json::json;

    use super::*;

    #[test]
    fn dates_stay_within_bounds() {
        let content = DateTimeContent::parse(
            &json!({"subtype": "naive_date", "begin": "2024-01-01", "end": "2024-01-04"}),
            "d",
        )
        .expect("parse");
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..100 {
            let value = sample_date_time(&content, &mut rng, "d").expect("sample");
            let text = value.as_str().expect("string");
            assert!(
                ["2024-01-01", "2024-01-02", "2024-01-03"].contains(&text),
                "unexpected {text}"
            );
        }
    }

    #[test]
    fn times_use_the_time_format() {
        let content = DateTimeContent::parse(&json!({"subtype": "naive_time"}), "t").expect("parse");
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let value = sample_date_time(&content, &mut rng, "t").expect("sample");
        let text = value.as_str().expect("string");
        assert_eq!(text.len(), 8);
        assert!(chrono::NaiveTime::parse_from_str(text, "%H:%M:%S").is_ok());
    }
}
