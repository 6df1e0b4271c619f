use crate::stats::error::QueryError;
use crate::stats::types::TimeWindow;
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, TimeDelta, Utc};
use std::fmt;
use std::str::FromStr;

/// Longest custom interval accepted, in days.
pub const MAX_CUSTOM_RANGE_DAYS: i64 = 366;

/// A named or explicit time range, resolved against "now" at query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeLabel {
    Today,
    Week,
    Last7Days,
    Month,
    Last30Days,
    /// `overall` and breakdowns honour the exact bounds. Timeseries report
    /// every local day the interval touches in full.
    Custom {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// The concrete window plus the local calendar days it touches, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRange {
    pub window: TimeWindow,
    pub days: Vec<NaiveDate>,
}

impl FromStr for RangeLabel {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(RangeLabel::Today),
            "week" => Ok(RangeLabel::Week),
            "last7days" => Ok(RangeLabel::Last7Days),
            "month" => Ok(RangeLabel::Month),
            "last30days" => Ok(RangeLabel::Last30Days),
            other => parse_interval(other),
        }
    }
}

fn parse_interval(s: &str) -> Result<RangeLabel, QueryError> {
    let invalid = || QueryError::InvalidRange(s.to_string());

    let (start, end) = s.split_once('/').ok_or_else(invalid)?;
    let start = DateTime::parse_from_rfc3339(start.trim())
        .map_err(|_| invalid())?
        .with_timezone(&Utc);
    let end = DateTime::parse_from_rfc3339(end.trim())
        .map_err(|_| invalid())?
        .with_timezone(&Utc);

    if end <= start || end - start > TimeDelta::days(MAX_CUSTOM_RANGE_DAYS) {
        return Err(invalid());
    }
    Ok(RangeLabel::Custom { start, end })
}

impl fmt::Display for RangeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeLabel::Today => f.write_str("today"),
            RangeLabel::Week => f.write_str("week"),
            RangeLabel::Last7Days => f.write_str("last7days"),
            RangeLabel::Month => f.write_str("month"),
            RangeLabel::Last30Days => f.write_str("last30days"),
            RangeLabel::Custom { start, end } => {
                write!(f, "{}/{}", start.to_rfc3339(), end.to_rfc3339())
            }
        }
    }
}

impl RangeLabel {
    /// `today` ends at `now`; the other named ranges end at the next local midnight.
    pub fn resolve(&self, now: DateTime<Utc>, offset: FixedOffset) -> ResolvedRange {
        let today = local_date(now, offset);
        let end_of_today = local_midnight(today, offset) + TimeDelta::days(1);

        let (window, first_day, last_day) = match *self {
            RangeLabel::Today => (
                TimeWindow::new(local_midnight(today, offset), now),
                today,
                today,
            ),
            RangeLabel::Custom { start, end } => (
                TimeWindow::new(start, end),
                local_date(start, offset),
                // `end` is exclusive.
                local_date(end - TimeDelta::nanoseconds(1), offset),
            ),
            named => {
                let first = match named {
                    RangeLabel::Week => {
                        today - TimeDelta::days(today.weekday().num_days_from_monday() as i64)
                    }
                    RangeLabel::Last7Days => today - TimeDelta::days(6),
                    RangeLabel::Month => today.with_day(1).unwrap_or(today),
                    _ => today - TimeDelta::days(29),
                };
                (
                    TimeWindow::new(local_midnight(first, offset), end_of_today),
                    first,
                    today,
                )
            }
        };

        ResolvedRange {
            window,
            days: first_day.iter_days().take_while(|d| *d <= last_day).collect(),
        }
    }
}

/// Calendar date of `instant` at a fixed offset.
pub fn local_date(instant: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    instant.with_timezone(&offset).date_naive()
}

/// The UTC instant at which `date` starts at a fixed offset.
pub fn local_midnight(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN)
        - TimeDelta::seconds(i64::from(offset.local_minus_utc()));
    DateTime::from_naive_utc_and_offset(naive, Utc)
}
