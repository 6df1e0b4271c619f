use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

pub const HOURS_PER_DAY: usize = 24;

/// Page views, unique visitors and bytes over some set of events.
///
/// `pv` and `uv` only count page views; `traffic` counts every event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatPoint {
    pub pv: u64,
    pub uv: u64,
    pub traffic: u64,
}

impl StatPoint {
    pub fn new(pv: u64, uv: u64, traffic: u64) -> Self {
        Self { pv, uv, traffic }
    }
}

impl Add for StatPoint {
    type Output = StatPoint;

    fn add(self, rhs: Self) -> Self::Output {
        StatPoint {
            pv: self.pv + rhs.pv,
            uv: self.uv + rhs.uv,
            traffic: self.traffic + rhs.traffic,
        }
    }
}

impl AddAssign for StatPoint {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for StatPoint {
    fn sum<I: Iterator<Item = StatPoint>>(iter: I) -> Self {
        iter.fold(StatPoint::default(), Add::add)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HourlyStat {
    pub hour: u8,
    pub stats: StatPoint,
}

/// One calendar day in 24 local hours. `total` is always the sum of `hourly`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyRollup {
    date: NaiveDate,
    hourly: Vec<HourlyStat>,
    total: StatPoint,
}

impl DailyRollup {
    /// Takes the first 24 points; missing hours are zero.
    pub fn new(date: NaiveDate, points: impl IntoIterator<Item = StatPoint>) -> Self {
        let mut points = points.into_iter();
        let hourly: Vec<HourlyStat> = (0..HOURS_PER_DAY as u8)
            .map(|hour| HourlyStat {
                hour,
                stats: points.next().unwrap_or_default(),
            })
            .collect();
        let total = hourly.iter().map(|h| h.stats).sum();

        Self {
            date,
            hourly,
            total,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn hourly(&self) -> &[HourlyStat] {
        &self.hourly
    }

    pub fn total(&self) -> StatPoint {
        self.total
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayTotal {
    pub date: NaiveDate,
    pub total: StatPoint,
}

impl From<&DailyRollup> for DayTotal {
    fn from(rollup: &DailyRollup) -> Self {
        Self {
            date: rollup.date(),
            total: rollup.total(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DimensionRow {
    pub value: String,
    #[serde(flatten)]
    pub stats: StatPoint,
}

/// Half-open `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", content = "days", rename_all = "lowercase")]
pub enum Timeseries {
    Hourly(Vec<DailyRollup>),
    Daily(Vec<DayTotal>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum QueryResult {
    Overall(StatPoint),
    Timeseries(Timeseries),
    Breakdown(Vec<DimensionRow>),
}
