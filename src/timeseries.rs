use std::sync::OnceLock;

use chrono::{NaiveTime, Timelike};
use regex::Regex;
use tracing::warn;

use crate::error::DriftError;
use crate::utils::round_to;

/// Optional `YYYY-MM-DD` + `T`/space prefix, then the time of day.
fn date_obs_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*(?:(\d{4}-\d{2}-\d{2})[T ])?(\d{1,2}:\d{2}:\d{2}(?:\.\d+)?)\s*$")
            .expect("DATE-OBS pattern is valid")
    })
}

/// Extract and parse the time-of-day portion of a `DATE-OBS` value.
pub fn parse_time_of_day(exposure: &str, value: &str) -> Result<NaiveTime, DriftError> {
    let parse_error = || DriftError::TimestampParse {
        exposure: exposure.to_string(),
        value: value.to_string(),
    };

    let captures = date_obs_pattern().captures(value).ok_or_else(parse_error)?;
    let time = captures.get(2).ok_or_else(parse_error)?.as_str();

    NaiveTime::parse_from_str(time, "%H:%M:%S%.f").map_err(|_| parse_error())
}

/// The `YYYY-MM-DD` portion of a `DATE-OBS` value, if it carries one.
pub fn session_date(value: &str) -> Option<String> {
    date_obs_pattern()
        .captures(value)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Seconds since midnight, rounded to a tenth of a second.
pub fn seconds_of_day(time: NaiveTime) -> f64 {
    let seconds =
        time.num_seconds_from_midnight() as f64 + time.nanosecond() as f64 / 1_000_000_000.0;
    round_to(seconds, 1)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTiming {
    pub elapsed_seconds: f64,
    pub delta_seconds: f64,
}

/// Elapsed and delta time across a session, in input order.
///
/// No midnight rollover correction: a session that crosses 00:00 produces
/// negative elapsed times. That case is logged, not rejected.
#[derive(Debug, Default)]
pub struct TimeSeriesTracker {
    start_seconds: Option<f64>,
    previous_elapsed: f64,
}

impl TimeSeriesTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the next frame's observation time and return its timing.
    pub fn observe(&mut self, time: NaiveTime) -> FrameTiming {
        let now = seconds_of_day(time);

        let Some(start) = self.start_seconds else {
            self.start_seconds = Some(now);
            self.previous_elapsed = 0.0;
            return FrameTiming {
                elapsed_seconds: 0.0,
                delta_seconds: 0.0,
            };
        };

        let elapsed = round_to(now - start, 1);
        let delta = round_to(elapsed - self.previous_elapsed, 1);
        self.previous_elapsed = elapsed;

        if elapsed < 0.0 {
            warn!(
                "Observation time {} is before the session start; session may cross midnight",
                time
            );
        }

        FrameTiming {
            elapsed_seconds: elapsed,
            delta_seconds: delta,
        }
    }
}
