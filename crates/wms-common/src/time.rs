//! ISO 8601 instants and durations as they appear in capability documents.

use chrono::{DateTime, Duration, Months, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};

/// Parse an ISO 8601 instant, assuming UTC when no offset is given.
pub fn parse_instant(s: &str) -> Result<DateTime<Utc>, TimeParseError> {
    let s = s.trim();

    // Try full datetime with timezone
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    // Try without timezone (assume UTC)
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s.trim_end_matches('Z'), format) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    // Try date only
    if let Ok(date) = NaiveDate::parse_from_str(s.trim_end_matches('Z'), "%Y-%m-%d") {
        if let Some(ndt) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    Err(TimeParseError::InvalidFormat(s.to_string()))
}

/// Format an instant the way expanded TIME values are published:
/// `2020-01-01T00:00:00Z`, with fractional seconds only when present.
pub fn format_instant(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Calendar parts must be whole numbers that fit a month counter.
fn whole_units(value: f64) -> Option<u32> {
    (value.fract() == 0.0 && value <= u32::MAX as f64).then_some(value as u32)
}

/// `millis + value * unit`, `None` on overflow.
fn add_millis(millis: i64, value: f64, unit: i64) -> Option<i64> {
    let delta = value * unit as f64;
    if !delta.is_finite() || delta >= i64::MAX as f64 {
        return None;
    }
    millis.checked_add(delta as i64)
}

/// An ISO 8601 duration such as `P1D`, `PT6H` or `P1Y2M10DT2H30M`.
///
/// Calendar parts (years, months) are kept apart from the fixed-length part
/// so that `P1M` advances to the same day of the next month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IsoDuration {
    pub months: u32,
    pub fixed: Duration,
}

impl IsoDuration {
    pub fn parse(s: &str) -> Result<Self, TimeParseError> {
        let invalid = || TimeParseError::InvalidDuration(s.to_string());
        let body = s
            .trim()
            .strip_prefix(|c: char| c.eq_ignore_ascii_case(&'P'))
            .ok_or_else(invalid)?;
        if body.is_empty() {
            return Err(invalid());
        }

        let mut months: u32 = 0;
        let mut millis: i64 = 0;
        let mut in_time = false;
        let mut number = String::new();

        for c in body.chars() {
            match c.to_ascii_uppercase() {
                'T' => {
                    if in_time || !number.is_empty() {
                        return Err(invalid());
                    }
                    in_time = true;
                }
                d if d.is_ascii_digit() || d == '.' || d == ',' => {
                    number.push(if d == ',' { '.' } else { d });
                }
                unit => {
                    let value: f64 = number.parse().map_err(|_| invalid())?;
                    number.clear();
                    match (unit, in_time) {
                        ('Y', false) => {
                            let years = whole_units(value).ok_or_else(invalid)?;
                            months = years
                                .checked_mul(12)
                                .and_then(|m| months.checked_add(m))
                                .ok_or_else(invalid)?;
                        }
                        ('M', false) => {
                            let count = whole_units(value).ok_or_else(invalid)?;
                            months = months.checked_add(count).ok_or_else(invalid)?;
                        }
                        ('W', false) => millis = add_millis(millis, value, 7 * MILLIS_PER_DAY).ok_or_else(invalid)?,
                        ('D', false) => millis = add_millis(millis, value, MILLIS_PER_DAY).ok_or_else(invalid)?,
                        ('H', true) => millis = add_millis(millis, value, 3_600_000).ok_or_else(invalid)?,
                        ('M', true) => millis = add_millis(millis, value, 60_000).ok_or_else(invalid)?,
                        ('S', true) => millis = add_millis(millis, value, 1_000).ok_or_else(invalid)?,
                        _ => return Err(invalid()),
                    }
                }
            }
        }

        if !number.is_empty() {
            return Err(invalid());
        }

        let fixed = Duration::try_milliseconds(millis).ok_or_else(invalid)?;
        Ok(Self { months, fixed })
    }

    pub fn is_zero(&self) -> bool {
        self.months == 0 && self.fixed == Duration::zero()
    }

    /// Advance an instant by this duration, calendar part first.
    pub fn add_to(&self, dt: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let shifted = if self.months > 0 {
            dt.checked_add_months(Months::new(self.months))?
        } else {
            dt
        };
        shifted.checked_add_signed(self.fixed)
    }
}

/// Expand `start/end/period` into every instant from `start`, stepping by
/// `period`, up to and including `end`.
///
/// At least `start` is always produced. Expansion stops after `limit` values.
pub fn expand_period(
    start: &str,
    end: &str,
    period: &str,
    limit: usize,
) -> Result<Vec<String>, TimeParseError> {
    let start = parse_instant(start)?;
    let end = parse_instant(end)?;
    let period = IsoDuration::parse(period)?;
    if period.is_zero() {
        return Err(TimeParseError::InvalidDuration("zero-length period".to_string()));
    }

    let mut values = Vec::new();
    let mut current = start;
    loop {
        if values.len() >= limit {
            return Err(TimeParseError::TooManyValues(limit));
        }
        values.push(format_instant(&current));
        match period.add_to(current) {
            Some(next) if next <= end => current = next,
            _ => break,
        }
    }
    Ok(values)
}

#[derive(Debug, thiserror::Error)]
pub enum TimeParseError {
    #[error("Invalid time format: {0}")]
    InvalidFormat(String),

    #[error("Invalid ISO 8601 duration: {0}")]
    InvalidDuration(String),

    #[error("Period expands to more than {0} values")]
    TooManyValues(usize),
}
