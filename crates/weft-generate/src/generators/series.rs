use std::f64::consts::TAU;

use chrono::{NaiveDateTime, TimeDelta};
use rand::{Rng, RngCore};

use weft_core::{SeriesContent, SeriesVariant, Value};

use crate::errors::SamplingError;
use crate::generators::date_time::render;

/// Stateful time series. Each sample advances the process; the state is
/// snapshotted by the caller so a failed pass can restore it.
#[derive(Debug, Clone)]
pub(crate) struct SeriesSampler {
    format: String,
    process: Process,
}

#[derive(Debug, Clone)]
enum Process {
    Incrementing {
        start: NaiveDateTime,
        increment: TimeDelta,
        last: Option<NaiveDateTime>,
    },
    Poisson {
        rate: TimeDelta,
        last: NaiveDateTime,
    },
    Cyclical {
        start: NaiveDateTime,
        period: TimeDelta,
        min_rate: TimeDelta,
        max_rate: TimeDelta,
        last: NaiveDateTime,
    },
    Zip {
        children: Vec<Process>,
        pending: Vec<Option<NaiveDateTime>>,
    },
}

impl SeriesSampler {
    pub(crate) fn new(content: &SeriesContent) -> Self {
        Self {
            format: content.format.clone(),
            process: Process::new(&content.variant),
        }
    }

    /// Emits the next timestamp. On failure the sampler is left unchanged.
    pub(crate) fn sample(
        &mut self,
        rng: &mut dyn RngCore,
        path: &str,
    ) -> Result<Value, SamplingError> {
        let mut process = self.process.clone();
        let timestamp = process
            .advance(rng)
            .ok_or_else(|| SamplingError::TimestampOverflow {
                path: path.to_string(),
            })?;
        let rendered = render(timestamp, &self.format, path)?;
        self.process = process;
        Ok(Value::String(rendered))
    }
}

impl Process {
    fn new(variant: &SeriesVariant) -> Self {
        match variant {
            SeriesVariant::Incrementing { start, increment } => Self::Incrementing {
                start: *start,
                increment: *increment,
                last: None,
            },
            SeriesVariant::Poisson { start, rate } => Self::Poisson {
                rate: *rate,
                last: *start,
            },
            SeriesVariant::Cyclical {
                start,
                period,
                min_rate,
                max_rate,
            } => Self::Cyclical {
                start: *start,
                period: *period,
                min_rate: *min_rate,
                max_rate: *max_rate,
                last: *start,
            },
            SeriesVariant::Zip { series } => Self::Zip {
                children: series.iter().map(Self::new).collect(),
                pending: vec![None; series.len()],
            },
        }
    }

    fn advance(&mut self, rng: &mut dyn RngCore) -> Option<NaiveDateTime> {
        match self {
            Self::Incrementing {
                start,
                increment,
                last,
            } => {
                let next = match last {
                    None => *start,
                    Some(previous) => previous.checked_add_signed(*increment)?,
                };
                *last = Some(next);
                Some(next)
            }
            Self::Poisson { rate, last } => {
                let gap = exponential_gap(millis(*rate), rng)?;
                *last = last.checked_add_signed(gap)?;
                Some(*last)
            }
            Self::Cyclical {
                start,
                period,
                min_rate,
                max_rate,
                last,
            } => {
                let period_ms = millis(*period);
                let phase = ((*last - *start).num_milliseconds() as f64).rem_euclid(period_ms)
                    / period_ms;
                let (min_ms, max_ms) = (millis(*min_rate), millis(*max_rate));
                let mean = min_ms + (max_ms - min_ms) * (1.0 + (TAU * phase).sin()) / 2.0;
                let gap = exponential_gap(mean, rng)?;
                *last = last.checked_add_signed(gap)?;
                Some(*last)
            }
            Self::Zip { children, pending } => {
                for (child, slot) in children.iter_mut().zip(pending.iter_mut()) {
                    if slot.is_none() {
                        *slot = Some(child.advance(rng)?);
                    }
                }
                // Earliest pending timestamp; ties go to the lowest index.
                let (index, _) = pending
                    .iter()
                    .enumerate()
                    .filter_map(|(index, slot)| slot.map(|timestamp| (index, timestamp)))
                    .min_by_key(|(index, timestamp)| (*timestamp, *index))?;
                pending[index].take()
            }
        }
    }
}

fn millis(delta: TimeDelta) -> f64 {
    delta.num_milliseconds() as f64
}

/// Exponentially distributed gap with the given mean, in milliseconds.
fn exponential_gap(mean_ms: f64, rng: &mut dyn RngCore) -> Option<TimeDelta> {
    let u: f64 = rng.random();
    let gap = -(1.0 - u).ln() * mean_ms;
    if !gap.is_finite() || gap > i64::MAX as f64 {
        return None;
    }
    TimeDelta::try_milliseconds(gap.round() as i64)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use serde_json::json;

    use super::*;

    fn sampler(body: serde_json::Value) -> SeriesSampler {
        SeriesSampler::new(&SeriesContent::parse(&body, "s").expect("parse"))
    }

    fn draw(sampler: &mut SeriesSampler, rng: &mut ChaCha8Rng, count: usize) -> Vec<String> {
        (0..count)
            .map(|_| {
                sampler
                    .sample(rng, "s")
                    .expect("sample")
                    .as_str()
                    .expect("string")
                    .to_string()
            })
            .collect()
    }

    #[test]
    fn incrementing_starts_at_start() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut series = sampler(json!({
            "incrementing": {"start": "2020-01-01 00:00:00", "increment": "1h"}
        }));
        assert_eq!(
            draw(&mut series, &mut rng, 3),
            [
                "2020-01-01 00:00:00",
                "2020-01-01 01:00:00",
                "2020-01-01 02:00:00"
            ]
        );
    }

    #[test]
    fn poisson_is_non_decreasing() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut series = sampler(json!({"poisson": {"rate": "10m"}}));
        let values = draw(&mut series, &mut rng, 200);
        assert!(values.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn cyclical_is_non_decreasing() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut series = sampler(json!({
            "cyclical": {"period": "1d", "min_rate": "1m", "max_rate": "1h"}
        }));
        let values = draw(&mut series, &mut rng, 200);
        assert!(values.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn zip_merges_children_in_time_order() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut zipped = sampler(json!({
            "zip": {"series": [
                {"incrementing": {"start": "2020-01-01 00:00:00", "increment": "2m"}},
                {"incrementing": {"start": "2020-01-01 00:00:00", "increment": "3m"}}
            ]}
        }));
        let merged = draw(&mut zipped, &mut rng, 10);
        assert!(merged.windows(2).all(|pair| pair[0] <= pair[1]));

        let start = NaiveDate::from_ymd_opt(2020, 1, 1)
            .and_then(|day| day.and_hms_opt(0, 0, 0))
            .expect("start");
        let mut expected: Vec<(NaiveDateTime, usize)> = Vec::new();
        for (index, step) in [2, 3].into_iter().enumerate() {
            for n in 0..10 {
                expected.push((start + TimeDelta::minutes(step * n), index));
            }
        }
        expected.sort();
        let expected: Vec<String> = expected
            .into_iter()
            .take(10)
            .map(|(timestamp, _)| timestamp.format("%Y-%m-%d %H:%M:%S").to_string())
            .collect();
        assert_eq!(merged, expected);
    }
}
