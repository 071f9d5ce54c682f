//! Consultation statistics.
//!
//! Everything here is a pure function over a slice of consultations; the
//! repository decides which consultations are in scope.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::consultation::Consultation;
use crate::errors::{AppError, AppResult};

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn minutes(seconds: f64) -> f64 {
    seconds / 60.0
}

/// Aggregate over a doctor's completed consultations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ConsultationMetrics {
    pub total_consultations: u64,
    pub avg_minutes: f64,
    pub min_minutes: f64,
    pub max_minutes: f64,
}

impl ConsultationMetrics {
    /// Active consultations and records without a duration are ignored.
    pub fn from_completed(consultations: &[Consultation]) -> Self {
        let durations: Vec<f64> = consultations
            .iter()
            .filter(|c| c.is_completed())
            .filter_map(|c| c.duration_secs)
            .collect();

        if durations.is_empty() {
            return Self::default();
        }

        let total: f64 = durations.iter().sum();
        let min = durations.iter().copied().fold(f64::INFINITY, f64::min);
        let max = durations.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Self {
            total_consultations: durations.len() as u64,
            avg_minutes: round2(minutes(total / durations.len() as f64)),
            min_minutes: round2(minutes(min)),
            max_minutes: round2(minutes(max)),
        }
    }
}

/// Grouping granularity for performance stats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformancePeriod {
    Weekly,
    Monthly,
    Yearly,
}

impl FromStr for PerformancePeriod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weekly" => Ok(PerformancePeriod::Weekly),
            "monthly" => Ok(PerformancePeriod::Monthly),
            "yearly" => Ok(PerformancePeriod::Yearly),
            _ => Err(AppError::bad_request(
                "Invalid period type. Must be weekly, monthly, or yearly",
            )),
        }
    }
}

/// Optional calendar narrowing for performance stats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
pub struct CalendarFilter {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub week: Option<u32>,
}

/// Half-open time range `[start, end)`. An open end means "up to now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeWindow {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && self.end.map_or(true, |end| at < end)
    }
}

impl PerformancePeriod {
    fn trailing_days(&self) -> i64 {
        match self {
            PerformancePeriod::Weekly => 7,
            PerformancePeriod::Monthly => 30,
            PerformancePeriod::Yearly => 365,
        }
    }

    fn group_format(&self) -> &'static str {
        match self {
            PerformancePeriod::Weekly => "%Y-%U",
            PerformancePeriod::Monthly => "%Y-%m",
            PerformancePeriod::Yearly => "%Y",
        }
    }

    /// Group key of a timestamp, e.g. `2024-07` for monthly.
    pub fn key(&self, at: DateTime<Utc>) -> String {
        at.format(self.group_format()).to_string()
    }

    /// Time range covered by a stats request.
    ///
    /// Without a year the window trails `now` by 7, 30 or 365 days. With a
    /// year it is that calendar year, narrowed to `month` (weekly, monthly)
    /// and to the Sunday-based `week` (weekly only) when given.
    pub fn window(&self, now: DateTime<Utc>, filter: CalendarFilter) -> AppResult<TimeWindow> {
        if let Some(month) = filter.month {
            if !(1..=12).contains(&month) {
                return Err(AppError::bad_request("month must be between 1 and 12"));
            }
        }
        if let Some(week) = filter.week {
            if week > 53 {
                return Err(AppError::bad_request("week must be between 0 and 53"));
            }
        }

        let Some(year) = filter.year else {
            if filter.month.is_some() || filter.week.is_some() {
                return Err(AppError::bad_request(
                    "year is required when month or week is given",
                ));
            }
            return Ok(TimeWindow {
                start: now - Duration::days(self.trailing_days()),
                end: None,
            });
        };

        if !(1970..=9999).contains(&year) {
            return Err(AppError::bad_request("year is out of range"));
        }

        match (self, filter.week, filter.month) {
            (PerformancePeriod::Weekly, Some(week), _) => sunday_week(year, week),
            (PerformancePeriod::Weekly | PerformancePeriod::Monthly, None, Some(month))
            | (PerformancePeriod::Monthly, Some(_), Some(month)) => {
                let start = first_of_month(year, month)?;
                let end = if month == 12 {
                    first_of_month(year + 1, 1)?
                } else {
                    first_of_month(year, month + 1)?
                };
                Ok(window_between(start, end))
            }
            _ => Ok(window_between(
                first_of_month(year, 1)?,
                first_of_month(year + 1, 1)?,
            )),
        }
    }
}

fn first_of_month(year: i32, month: u32) -> AppResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AppError::bad_request("Invalid calendar date"))
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}

fn window_between(start: NaiveDate, end: NaiveDate) -> TimeWindow {
    TimeWindow {
        start: midnight(start),
        end: Some(midnight(end)),
    }
}

/// Week `week` of `year` as `%U` numbers it: week 0 holds the days before the
/// first Sunday, week 1 starts on the first Sunday.
fn sunday_week(year: i32, week: u32) -> AppResult<TimeWindow> {
    let jan1 = first_of_month(year, 1)?;
    let next_year = first_of_month(year + 1, 1)?;
    let first_sunday =
        jan1 + Duration::days(i64::from((7 - jan1.weekday().num_days_from_sunday()) % 7));

    let (start, end) = if week == 0 {
        (jan1, first_sunday)
    } else {
        let start = first_sunday + Duration::weeks(i64::from(week) - 1);
        (start, start + Duration::weeks(1))
    };

    if start >= next_year {
        return Err(AppError::bad_request("week is out of range for that year"));
    }
    Ok(window_between(start, end.min(next_year)))
}

/// Counters for one group of consultations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PeriodMetrics {
    #[schema(example = "2024-07")]
    pub period: String,
    pub total_records: u64,
    pub completed_cases: u64,
    pub avg_duration_minutes: f64,
}

#[derive(Default)]
struct Bucket {
    total: u64,
    completed: u64,
    completed_secs: f64,
}

impl Bucket {
    fn add(&mut self, consultation: &Consultation) {
        self.total += 1;
        if consultation.is_completed() {
            if let Some(secs) = consultation.duration_secs {
                self.completed += 1;
                self.completed_secs += secs;
            }
        }
    }

    fn into_metrics(self, period: String) -> PeriodMetrics {
        let avg = if self.completed == 0 {
            0.0
        } else {
            round2(minutes(self.completed_secs / self.completed as f64))
        };
        PeriodMetrics {
            period,
            total_records: self.total,
            completed_cases: self.completed,
            avg_duration_minutes: avg,
        }
    }
}

/// Group consultations by period key, sorted by key.
pub fn performance_breakdown(
    period: PerformancePeriod,
    consultations: &[Consultation],
) -> Vec<PeriodMetrics> {
    let mut buckets: BTreeMap<String, Bucket> = BTreeMap::new();
    for consultation in consultations {
        buckets
            .entry(period.key(consultation.start_time))
            .or_default()
            .add(consultation);
    }

    buckets
        .into_iter()
        .map(|(key, bucket)| bucket.into_metrics(key))
        .collect()
}

/// Counters for one hour of a day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HourlyMetrics {
    #[schema(example = "09")]
    pub hour: String,
    pub total_records: u64,
    pub completed_cases: u64,
    pub avg_duration_minutes: f64,
}

/// Bucket consultations by UTC start hour. Always returns 24 entries.
pub fn hourly_breakdown(consultations: &[Consultation]) -> Vec<HourlyMetrics> {
    let mut buckets: Vec<Bucket> = (0..24).map(|_| Bucket::default()).collect();
    for consultation in consultations {
        buckets[consultation.start_time.hour() as usize].add(consultation);
    }

    buckets
        .into_iter()
        .enumerate()
        .map(|(hour, bucket)| {
            let metrics = bucket.into_metrics(format!("{:02}", hour));
            HourlyMetrics {
                hour: metrics.period,
                total_records: metrics.total_records,
                completed_cases: metrics.completed_cases,
                avg_duration_minutes: metrics.avg_duration_minutes,
            }
        })
        .collect()
}

/// Parse the `date` query of the daily breakdown.
///
/// Accepts `YYYY-MM-DD` or an ISO-8601 date-time (with or without offset);
/// no input means today (UTC).
pub fn parse_day(input: Option<&str>, now: DateTime<Utc>) -> AppResult<NaiveDate> {
    let Some(raw) = input.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(now.date_naive());
    };

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    // The calendar date is taken in the offset the caller gave
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.date_naive());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(at) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(at.date());
        }
    }

    Err(AppError::bad_request("Invalid date format. Use YYYY-MM-DD"))
}

/// The 24 hours of `day` in UTC.
pub fn day_window(day: NaiveDate) -> TimeWindow {
    window_between(day, day + Duration::days(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn completed(start: &str, secs: f64) -> Consultation {
        let start = at(start);
        let mut c = Consultation::start("id".into(), "dr".into(), "f.pdf".into(), start);
        c.complete(start + Duration::milliseconds((secs * 1000.0) as i64));
        c
    }

    fn active(start: &str) -> Consultation {
        Consultation::start("id".into(), "dr".into(), "f.pdf".into(), at(start))
    }

    #[test]
    fn test_metrics_over_completed_only() {
        let items = vec![
            completed("2024-07-01T09:00:00Z", 60.0),
            completed("2024-07-01T10:00:00Z", 180.0),
            active("2024-07-01T11:00:00Z"),
        ];

        let metrics = ConsultationMetrics::from_completed(&items);

        assert_eq!(metrics.total_consultations, 2);
        assert_eq!(metrics.avg_minutes, 2.0);
        assert_eq!(metrics.min_minutes, 1.0);
        assert_eq!(metrics.max_minutes, 3.0);
    }

    #[test]
    fn test_metrics_wire_keys() {
        let value = serde_json::to_value(ConsultationMetrics::default()).unwrap();
        let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        keys.sort();

        assert_eq!(
            keys,
            ["avg_minutes", "max_minutes", "min_minutes", "total_consultations"]
        );
    }

    #[test]
    fn test_metrics_empty_are_zero() {
        assert_eq!(
            ConsultationMetrics::from_completed(&[active("2024-07-01T09:00:00Z")]),
            ConsultationMetrics::default()
        );
    }

    #[test]
    fn test_metrics_round_to_two_decimals() {
        let metrics = ConsultationMetrics::from_completed(&[completed("2024-07-01T09:00:00Z", 100.0)]);
        assert_eq!(metrics.avg_minutes, 1.67);
    }

    #[test]
    fn test_period_parsing() {
        assert_eq!("weekly".parse::<PerformancePeriod>().unwrap(), PerformancePeriod::Weekly);
        assert_eq!("yearly".parse::<PerformancePeriod>().unwrap(), PerformancePeriod::Yearly);
        assert!("daily".parse::<PerformancePeriod>().is_err());
        assert!("Monthly".parse::<PerformancePeriod>().is_err());
    }

    #[test]
    fn test_trailing_window() {
        let now = at("2024-07-15T12:00:00Z");
        let window = PerformancePeriod::Weekly
            .window(now, CalendarFilter::default())
            .unwrap();
        assert_eq!(window.start, at("2024-07-08T12:00:00Z"));
        assert!(window.contains(now));
        assert!(!window.contains(at("2024-07-08T11:59:59Z")));
    }

    #[test]
    fn test_calendar_month_window() {
        let now = at("2024-07-15T12:00:00Z");
        let filter = CalendarFilter { year: Some(2024), month: Some(12), week: None };
        let window = PerformancePeriod::Monthly.window(now, filter).unwrap();
        assert_eq!(window.start, at("2024-12-01T00:00:00Z"));
        assert_eq!(window.end, Some(at("2025-01-01T00:00:00Z")));
    }

    #[test]
    fn test_calendar_year_window() {
        let now = at("2024-07-15T12:00:00Z");
        let filter = CalendarFilter { year: Some(2023), month: Some(5), week: None };
        let window = PerformancePeriod::Yearly.window(now, filter).unwrap();
        assert_eq!(window.start, at("2023-01-01T00:00:00Z"));
        assert_eq!(window.end, Some(at("2024-01-01T00:00:00Z")));
    }

    #[test]
    fn test_calendar_week_matches_format_key() {
        // 2024-01-01 is a Monday, so the first Sunday is 2024-01-07.
        let now = at("2024-07-15T12:00:00Z");
        let filter = CalendarFilter { year: Some(2024), month: None, week: Some(1) };
        let window = PerformancePeriod::Weekly.window(now, filter).unwrap();
        assert_eq!(window.start, at("2024-01-07T00:00:00Z"));
        assert_eq!(window.end, Some(at("2024-01-14T00:00:00Z")));
        assert_eq!(PerformancePeriod::Weekly.key(window.start), "2024-01");

        let filter = CalendarFilter { year: Some(2024), month: None, week: Some(0) };
        let window = PerformancePeriod::Weekly.window(now, filter).unwrap();
        assert_eq!(window.start, at("2024-01-01T00:00:00Z"));
        assert_eq!(window.end, Some(at("2024-01-07T00:00:00Z")));
    }

    #[test]
    fn test_window_rejects_bad_filters() {
        let now = at("2024-07-15T12:00:00Z");
        let bad = [
            CalendarFilter { year: Some(2024), month: Some(13), week: None },
            CalendarFilter { year: Some(2024), month: None, week: Some(54) },
            CalendarFilter { year: None, month: Some(3), week: None },
            CalendarFilter { year: Some(1200), month: None, week: None },
        ];
        for filter in bad {
            assert!(PerformancePeriod::Monthly.window(now, filter).is_err());
        }
    }

    #[test]
    fn test_performance_breakdown_groups_and_sorts() {
        let items = vec![
            completed("2024-08-02T09:00:00Z", 120.0),
            completed("2024-07-01T09:00:00Z", 60.0),
            completed("2024-07-20T09:00:00Z", 180.0),
            active("2024-07-21T09:00:00Z"),
        ];

        let stats = performance_breakdown(PerformancePeriod::Monthly, &items);

        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].period, "2024-07");
        assert_eq!(stats[0].total_records, 3);
        assert_eq!(stats[0].completed_cases, 2);
        assert_eq!(stats[0].avg_duration_minutes, 2.0);
        assert_eq!(stats[1].period, "2024-08");
    }

    #[test]
    fn test_hourly_breakdown_has_every_hour() {
        let items = vec![
            completed("2024-07-01T09:15:00Z", 60.0),
            completed("2024-07-01T09:45:00Z", 120.0),
            active("2024-07-01T23:05:00Z"),
        ];

        let hours = hourly_breakdown(&items);

        assert_eq!(hours.len(), 24);
        assert_eq!(hours[0].hour, "00");
        assert_eq!(hours[23].hour, "23");
        assert_eq!(hours[9].completed_cases, 2);
        assert_eq!(hours[9].avg_duration_minutes, 1.5);
        assert_eq!(hours[23].total_records, 1);
        assert_eq!(hours[23].completed_cases, 0);
        assert_eq!(hours[23].avg_duration_minutes, 0.0);
    }

    #[test]
    fn test_parse_day_formats() {
        let now = at("2024-07-15T12:00:00Z");
        let expected = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();

        assert_eq!(parse_day(None, now).unwrap(), now.date_naive());
        assert_eq!(parse_day(Some(""), now).unwrap(), now.date_naive());
        assert_eq!(parse_day(Some("2024-03-09"), now).unwrap(), expected);
        assert_eq!(parse_day(Some("2024-03-09T08:30:00Z"), now).unwrap(), expected);
        assert_eq!(parse_day(Some("2024-03-09T08:30:00"), now).unwrap(), expected);
        assert_eq!(parse_day(Some("2024-03-09T23:30:00-05:00"), now).unwrap(), expected);
        assert_eq!(parse_day(Some("2024-03-09T00:30:00+09:00"), now).unwrap(), expected);
        assert!(parse_day(Some("09/03/2024"), now).is_err());
    }

    #[test]
    fn test_day_window() {
        let window = day_window(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
        assert!(window.contains(at("2024-03-09T00:00:00Z")));
        assert!(window.contains(at("2024-03-09T23:59:59Z")));
        assert!(!window.contains(at("2024-03-10T00:00:00Z")));
    }
}
