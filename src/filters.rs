//! Alarm listing filters.
//!
//! [`AlarmFilter`] is built from raw query parameters without touching the
//! database; `database::alarms` renders it into SQL.

use chrono::{DateTime, NaiveTime, Utc};
use serde::Deserialize;

use crate::models::alarm::AlarmCode;
use crate::models::Imei;
use crate::validation::ValidationError;

/// Window used by `last_alarms=true` when `seconds` is not given
pub const DEFAULT_LAST_SECONDS: i64 = 120;

/// Query string of `GET /alarms`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlarmListParams {
    pub imei: Option<String>,
    pub alarm_codes: Option<String>,
    pub last_alarms: Option<String>,
    pub seconds: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeWindow {
    /// Alarms at or after the given time
    Since(i64),
    /// Alarms within the closed range
    Between(i64, i64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlarmFilter {
    pub imei: Imei,
    /// Restrict to these codes, all codes when `None`
    pub alarm_codes: Option<Vec<AlarmCode>>,
    pub window: TimeWindow,
}

impl AlarmFilter {
    /// Build a filter from query parameters
    ///
    /// `last_alarms=true` selects the last `seconds` (default 120) and
    /// overrides any explicit `start_time`/`end_time`.
    pub fn from_params(
        params: &AlarmListParams,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let imei = params
            .imei
            .as_deref()
            .ok_or(ValidationError::MissingField("imei"))?;
        let imei = Imei::try_from(imei)?;

        let alarm_codes = params
            .alarm_codes
            .as_deref()
            .map(parse_alarm_codes)
            .transpose()?;

        let last_alarms = params
            .last_alarms
            .as_deref()
            .is_some_and(|v| v.eq_ignore_ascii_case("true"));

        let window = if last_alarms {
            let seconds = match params.seconds.as_deref() {
                Some(s) => parse_int("seconds", s)?,
                None => DEFAULT_LAST_SECONDS,
            };
            if seconds < 0 {
                return Err(ValidationError::field("seconds", "must not be negative"));
            }
            TimeWindow::Since(now.timestamp() - seconds)
        } else {
            let start = params
                .start_time
                .as_deref()
                .map(|s| parse_int("start_time", s))
                .transpose()?;
            let end = params
                .end_time
                .as_deref()
                .map(|s| parse_int("end_time", s))
                .transpose()?;
            let (start, end) = fix_range_times(start, end, now);
            TimeWindow::Between(start, end)
        };

        Ok(Self {
            imei,
            alarm_codes,
            window,
        })
    }
}

/// Fill in defaults and order the bounds of a time range
///
/// Start defaults to the beginning of the current UTC day, end to `now`.
/// Inverted bounds are swapped.
pub fn fix_range_times(start: Option<i64>, end: Option<i64>, now: DateTime<Utc>) -> (i64, i64) {
    let start = start.unwrap_or_else(|| start_of_day(now));
    let end = end.unwrap_or_else(|| now.timestamp());
    if end < start {
        (end, start)
    } else {
        (start, end)
    }
}

fn start_of_day(now: DateTime<Utc>) -> i64 {
    now.date_naive()
        .and_time(NaiveTime::MIN)
        .and_utc()
        .timestamp()
}

fn parse_alarm_codes(value: &str) -> Result<Vec<AlarmCode>, ValidationError> {
    let mut codes = Vec::new();
    for code in value.split(',').map(str::trim).filter(|c| !c.is_empty()) {
        let code: AlarmCode = code.parse()?;
        if !codes.contains(&code) {
            codes.push(code);
        }
    }
    Ok(codes)
}

fn parse_int(field: &'static str, value: &str) -> Result<i64, ValidationError> {
    value
        .trim()
        .parse()
        .map_err(|_| ValidationError::field(field, format!("{value:?} is not an integer")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 13, 30, 0).unwrap()
    }

    fn params(pairs: &[(&str, &str)]) -> AlarmListParams {
        let mut params = AlarmListParams::default();
        for (key, value) in pairs {
            let value = Some(value.to_string());
            match *key {
                "imei" => params.imei = value,
                "alarm_codes" => params.alarm_codes = value,
                "last_alarms" => params.last_alarms = value,
                "seconds" => params.seconds = value,
                "start_time" => params.start_time = value,
                "end_time" => params.end_time = value,
                _ => panic!("unknown parameter {key}"),
            }
        }
        params
    }

    #[test]
    fn test_fix_range_times_defaults() {
        let midnight = Utc
            .with_ymd_and_hms(2024, 6, 15, 0, 0, 0)
            .unwrap()
            .timestamp();
        assert_eq!(
            fix_range_times(None, None, now()),
            (midnight, now().timestamp())
        );
        assert_eq!(fix_range_times(Some(100), None, now()).0, 100);
        assert_eq!(fix_range_times(None, Some(midnight + 5), now()), (midnight, midnight + 5));
    }

    #[test]
    fn test_fix_range_times_swaps() {
        assert_eq!(fix_range_times(Some(200), Some(100), now()), (100, 200));
        // End defaults to now, before the given start
        let later = now().timestamp() + 60;
        assert_eq!(
            fix_range_times(Some(later), None, now()),
            (now().timestamp(), later)
        );
    }

    #[test]
    fn test_imei_required() {
        assert_eq!(
            AlarmFilter::from_params(&params(&[]), now()),
            Err(ValidationError::MissingField("imei"))
        );
        assert!(AlarmFilter::from_params(&params(&[("imei", "abc")]), now()).is_err());
    }

    #[test]
    fn test_last_alarms_overrides_range() {
        let filter = AlarmFilter::from_params(
            &params(&[
                ("imei", "869066062080357"),
                ("last_alarms", "True"),
                ("start_time", "1"),
                ("end_time", "2"),
            ]),
            now(),
        )
        .unwrap();
        assert_eq!(filter.window, TimeWindow::Since(now().timestamp() - 120));

        let filter = AlarmFilter::from_params(
            &params(&[
                ("imei", "869066062080357"),
                ("last_alarms", "true"),
                ("seconds", "600"),
            ]),
            now(),
        )
        .unwrap();
        assert_eq!(filter.window, TimeWindow::Since(now().timestamp() - 600));
    }

    #[test]
    fn test_explicit_range() {
        let filter = AlarmFilter::from_params(
            &params(&[
                ("imei", "869066062080357"),
                ("last_alarms", "false"),
                ("start_time", "2000"),
                ("end_time", "1000"),
            ]),
            now(),
        )
        .unwrap();
        assert_eq!(filter.window, TimeWindow::Between(1000, 2000));
        assert_eq!(filter.alarm_codes, None);
    }

    #[test]
    fn test_alarm_codes() {
        let filter = AlarmFilter::from_params(
            &params(&[
                ("imei", "869066062080357"),
                ("alarm_codes", "SOS, OVERSPEED,,SOS"),
            ]),
            now(),
        )
        .unwrap();
        assert_eq!(
            filter.alarm_codes,
            Some(vec![AlarmCode::Sos, AlarmCode::Overspeed])
        );

        assert!(AlarmFilter::from_params(
            &params(&[("imei", "869066062080357"), ("alarm_codes", "SOS,NOPE")]),
            now(),
        )
        .is_err());
    }

    #[test]
    fn test_bad_numbers() {
        assert!(AlarmFilter::from_params(
            &params(&[("imei", "1"), ("start_time", "yesterday")]),
            now(),
        )
        .is_err());
        assert!(AlarmFilter::from_params(
            &params(&[("imei", "1"), ("last_alarms", "true"), ("seconds", "-5")]),
            now(),
        )
        .is_err());
    }
}
