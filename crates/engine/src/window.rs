//! Calendar time windows.
//!
//! A window is resolved from a [`Granularity`] and a signed offset relative to
//! the period containing `now`, in the time zone of `now`. Bounded windows are
//! half-open: `[start, end)` in milliseconds since the epoch.

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::EngineError;

pub const ALL_TIME_LABEL: &str = "All time";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    #[default]
    Month,
    Year,
    All,
}

impl TryFrom<&str> for Granularity {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            "all" => Ok(Self::All),
            other => Err(EngineError::Validation(format!(
                "invalid granularity: {other}"
            ))),
        }
    }
}

/// A resolved window.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub granularity: Granularity,
    /// Inclusive start, `None` when unbounded.
    pub start: Option<i64>,
    /// Exclusive end, `None` when unbounded.
    pub end: Option<i64>,
    pub label: String,
    /// Calendar year of a month or year window.
    pub year: Option<i32>,
    /// Calendar month (1-12) of a month window.
    pub month: Option<u32>,
}

impl TimeWindow {
    pub fn all_time() -> Self {
        Self {
            granularity: Granularity::All,
            start: None,
            end: None,
            label: ALL_TIME_LABEL.to_string(),
            year: None,
            month: None,
        }
    }

    pub fn is_bounded(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    /// Returns `true` if `timestamp` falls in `[start, end)`.
    pub fn contains(&self, timestamp: i64) -> bool {
        self.start.is_none_or(|start| timestamp >= start)
            && self.end.is_none_or(|end| timestamp < end)
    }
}

/// Resolve the window `offset` periods away from the one containing `now`.
///
/// Negative offsets go back in time. Month arithmetic rolls over year
/// boundaries (`December + 1` is January of the next year).
pub fn resolve<Tz: TimeZone>(
    granularity: Granularity,
    offset: i32,
    now: &DateTime<Tz>,
) -> TimeWindow {
    let tz = now.timezone();
    let today = now.date_naive();
    match granularity {
        Granularity::All => TimeWindow::all_time(),
        Granularity::Month => {
            let (year, month) = shift_month(today.year(), today.month(), offset);
            let first = first_of_month(year, month);
            let (next_year, next_month) = shift_month(year, month, 1);
            let next = first_of_month(next_year, next_month);
            TimeWindow {
                granularity,
                start: Some(day_start_millis(&tz, first)),
                end: Some(day_start_millis(&tz, next)),
                label: first.format("%B %Y").to_string(),
                year: Some(first.year()),
                month: Some(first.month()),
            }
        }
        Granularity::Year => {
            let year = clamp_year(i64::from(today.year()) + i64::from(offset));
            let first = first_of_month(year, 1);
            let next = first_of_month(clamp_year(i64::from(year) + 1), 1);
            TimeWindow {
                granularity,
                start: Some(day_start_millis(&tz, first)),
                end: Some(day_start_millis(&tz, next)),
                label: first.year().to_string(),
                year: Some(first.year()),
                month: None,
            }
        }
    }
}

/// Shift a `(year, month)` pair by `offset` months.
pub(crate) fn shift_month(year: i32, month: u32, offset: i32) -> (i32, u32) {
    let index = i64::from(year) * 12 + i64::from(month) - 1 + i64::from(offset);
    let year = clamp_year(index.div_euclid(12));
    let month = index.rem_euclid(12) as u32 + 1;
    (year, month)
}

fn clamp_year(year: i64) -> i32 {
    let min = i64::from(NaiveDate::MIN.year()) + 1;
    let max = i64::from(NaiveDate::MAX.year()) - 1;
    year.clamp(min, max) as i32
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

/// First instant of `date` in `tz`.
///
/// When local midnight is skipped by a DST jump, the first valid instant of
/// the day is used; when it is repeated, the earlier one.
pub(crate) fn day_start<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Tz> {
    let midnight = date.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&midnight) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => tz
            .from_local_datetime(&(midnight + Duration::hours(1)))
            .earliest()
            .unwrap_or_else(|| tz.from_utc_datetime(&midnight)),
    }
}

pub(crate) fn day_start_millis<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> i64 {
    day_start(tz, date).timestamp_millis()
}

/// Calendar day of `timestamp` in `tz`.
pub(crate) fn local_date<Tz: TimeZone>(tz: &Tz, timestamp: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp_millis(timestamp).map(|dt| dt.with_timezone(tz).date_naive())
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, Utc};

    use super::*;

    fn ms(y: i32, m: u32, d: u32) -> i64 {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap().timestamp_millis()
    }

    #[test]
    fn current_month_window() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 12, 30, 0).unwrap();
        let window = resolve(Granularity::Month, 0, &now);
        assert_eq!(window.start, Some(ms(2024, 3, 1)));
        assert_eq!(window.end, Some(ms(2024, 4, 1)));
        assert_eq!(window.label, "March 2024");
        assert_eq!((window.year, window.month), (Some(2024), Some(3)));
    }

    #[test]
    fn month_offsets_roll_over_year_boundaries() {
        let december = Utc.with_ymd_and_hms(2023, 12, 31, 23, 0, 0).unwrap();
        let next = resolve(Granularity::Month, 1, &december);
        assert_eq!(next.start, Some(ms(2024, 1, 1)));
        assert_eq!(next.end, Some(ms(2024, 2, 1)));
        assert_eq!(next.label, "January 2024");

        let february = Utc.with_ymd_and_hms(2024, 2, 10, 0, 0, 0).unwrap();
        let back = resolve(Granularity::Month, -3, &february);
        assert_eq!(back.start, Some(ms(2023, 11, 1)));
        assert_eq!(back.end, Some(ms(2023, 12, 1)));

        let far = resolve(Granularity::Month, -25, &february);
        assert_eq!(far.label, "January 2022");
    }

    #[test]
    fn month_from_the_31st_does_not_skip_short_months() {
        let now = Utc.with_ymd_and_hms(2024, 1, 31, 8, 0, 0).unwrap();
        let window = resolve(Granularity::Month, 1, &now);
        assert_eq!(window.start, Some(ms(2024, 2, 1)));
        assert_eq!(window.end, Some(ms(2024, 3, 1)));
    }

    #[test]
    fn year_window() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let window = resolve(Granularity::Year, -1, &now);
        assert_eq!(window.start, Some(ms(2023, 1, 1)));
        assert_eq!(window.end, Some(ms(2024, 1, 1)));
        assert_eq!(window.label, "2023");
        assert_eq!(window.month, None);
    }

    #[test]
    fn all_time_is_unbounded() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let window = resolve(Granularity::All, 7, &now);
        assert!(!window.is_bounded());
        assert_eq!(window.label, ALL_TIME_LABEL);
        assert!(window.contains(i64::MIN));
        assert!(window.contains(i64::MAX));
    }

    #[test]
    fn end_boundary_belongs_to_the_following_window() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap();
        let march = resolve(Granularity::Month, 0, &now);
        let april = resolve(Granularity::Month, 1, &now);
        let boundary = ms(2024, 4, 1);
        assert!(!march.contains(boundary));
        assert!(april.contains(boundary));
        assert!(march.contains(boundary - 1));
        assert_eq!(march.end, april.start);
    }

    #[test]
    fn windows_follow_the_zone_of_now() {
        let tz = FixedOffset::east_opt(8 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2024, 3, 1, 2, 0, 0).unwrap();
        let window = resolve(Granularity::Month, 0, &now);
        let local_start = tz.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(window.start, Some(local_start.timestamp_millis()));
        assert_eq!(window.label, "March 2024");
    }

    #[test]
    fn granularity_parses() {
        assert_eq!(Granularity::try_from("Year").unwrap(), Granularity::Year);
        assert!(Granularity::try_from("week").is_err());
    }
}
