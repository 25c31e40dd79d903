// ── Document Model: Time Normalization ─────────────────────────────────────
//
// On ingest, short clock values like "HH:MM" combined with a Day's `date`
// are rewritten to epoch millis; fully-qualified instants pass through
// unchanged. spec.md §9 explicitly resolves the source's ambiguity here:
// "HH:MM" without an available date is rejected rather than guessed.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::atoms::error::{EngineError, EngineResult};

/// Wire-level timing value for a `move` op's `startTime`/`endTime`: either
/// an already-normalized epoch-millis integer, or a short clock/instant
/// string to be resolved against the target day's date (spec.md §4.1).
/// Untagged so either JSON shape deserializes without a wrapper object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TimingInput {
    Millis(i64),
    Text(String),
}

impl TimingInput {
    pub fn resolve(&self, day_date: &str) -> EngineResult<i64> {
        match self {
            TimingInput::Millis(millis) => Ok(*millis),
            TimingInput::Text(raw) => parse_timing_value(raw, Some(day_date)),
        }
    }
}

/// Parse a clock/instant value against an optional day date, returning
/// epoch millis.
///
/// Accepted inputs:
///   - `"HH:MM"` — requires `day_date` (ISO `YYYY-MM-DD`); combined into a
///     UTC instant at that day, per-minute precision.
///   - `"YYYY-MM-DDTHH:MM:SSZ"` (or with offset) — parsed directly as RFC3339.
///   - a bare epoch-millis integer encoded as a string — passed through.
pub fn parse_timing_value(raw: &str, day_date: Option<&str>) -> EngineResult<i64> {
    if let Ok(millis) = raw.parse::<i64>() {
        return Ok(millis);
    }

    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.timestamp_millis());
    }

    if let Ok(clock) = NaiveTime::parse_from_str(raw, "%H:%M") {
        let date_str = day_date.ok_or_else(|| {
            EngineError::validation(format!(
                "timing value \"{raw}\" is a bare clock time but no Day.date is available to anchor it"
            ))
        })?;
        let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
            EngineError::validation(format!("invalid Day.date \"{date_str}\": {e}"))
        })?;
        let naive = NaiveDateTime::new(date, clock);
        let utc = Utc.from_utc_datetime(&naive);
        return Ok(utc.timestamp_millis());
    }

    Err(EngineError::validation(format!("unrecognized timing value: \"{raw}\"")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timing_input_resolves_a_bare_clock_string_against_day_date() {
        let resolved = TimingInput::Text("15:00".to_string()).resolve("2025-10-04").unwrap();
        let expected = Utc.with_ymd_and_hms(2025, 10, 4, 15, 0, 0).unwrap().timestamp_millis();
        assert_eq!(resolved, expected);
    }

    #[test]
    fn timing_input_passes_through_millis_unchanged() {
        assert_eq!(TimingInput::Millis(12345).resolve("2025-10-04").unwrap(), 12345);
    }

    #[test]
    fn combines_hh_mm_with_day_date() {
        let millis = parse_timing_value("09:30", Some("2025-10-04")).unwrap();
        let expected = Utc
            .with_ymd_and_hms(2025, 10, 4, 9, 30, 0)
            .unwrap()
            .timestamp_millis();
        assert_eq!(millis, expected);
    }

    #[test]
    fn rejects_hh_mm_without_day_date() {
        assert!(parse_timing_value("09:30", None).is_err());
    }

    #[test]
    fn passes_through_rfc3339_instant() {
        let millis = parse_timing_value("2025-10-04T09:30:00Z", None).unwrap();
        let expected = Utc
            .with_ymd_and_hms(2025, 10, 4, 9, 30, 0)
            .unwrap()
            .timestamp_millis();
        assert_eq!(millis, expected);
    }
}
