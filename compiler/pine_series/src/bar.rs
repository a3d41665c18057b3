//! Bars and per-bar field extraction.

use serde::{Deserialize, Serialize};

/// One OHLCV bar. `time` is the bar's open time in milliseconds since the
/// Unix epoch (UTC).
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn new(time: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Bar {
            time,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// A value read straight off a bar.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BarField {
    Open,
    High,
    Low,
    Close,
    Volume,
    Time,
    Hl2,
    Hlc3,
    Ohlc4,
    Hlcc4,
    Year,
    Month,
    /// ISO-8601 week number.
    WeekOfYear,
    DayOfMonth,
    /// 1 = Sunday .. 7 = Saturday.
    DayOfWeek,
    Hour,
    Minute,
    Second,
}

impl BarField {
    pub const ALL: [BarField; 18] = [
        BarField::Open,
        BarField::High,
        BarField::Low,
        BarField::Close,
        BarField::Volume,
        BarField::Time,
        BarField::Hl2,
        BarField::Hlc3,
        BarField::Ohlc4,
        BarField::Hlcc4,
        BarField::Year,
        BarField::Month,
        BarField::WeekOfYear,
        BarField::DayOfMonth,
        BarField::DayOfWeek,
        BarField::Hour,
        BarField::Minute,
        BarField::Second,
    ];

    /// The source-language name of the field.
    pub const fn name(self) -> &'static str {
        match self {
            BarField::Open => "open",
            BarField::High => "high",
            BarField::Low => "low",
            BarField::Close => "close",
            BarField::Volume => "volume",
            BarField::Time => "time",
            BarField::Hl2 => "hl2",
            BarField::Hlc3 => "hlc3",
            BarField::Ohlc4 => "ohlc4",
            BarField::Hlcc4 => "hlcc4",
            BarField::Year => "year",
            BarField::Month => "month",
            BarField::WeekOfYear => "weekofyear",
            BarField::DayOfMonth => "dayofmonth",
            BarField::DayOfWeek => "dayofweek",
            BarField::Hour => "hour",
            BarField::Minute => "minute",
            BarField::Second => "second",
        }
    }

    pub fn from_name(name: &str) -> Option<BarField> {
        BarField::ALL.into_iter().find(|f| f.name() == name)
    }

    pub const fn is_calendar(self) -> bool {
        matches!(
            self,
            BarField::Year
                | BarField::Month
                | BarField::WeekOfYear
                | BarField::DayOfMonth
                | BarField::DayOfWeek
                | BarField::Hour
                | BarField::Minute
                | BarField::Second
        )
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn extract(self, bar: &Bar) -> f64 {
        match self {
            BarField::Open => bar.open,
            BarField::High => bar.high,
            BarField::Low => bar.low,
            BarField::Close => bar.close,
            BarField::Volume => bar.volume,
            BarField::Time => bar.time as f64,
            BarField::Hl2 => (bar.high + bar.low) / 2.0,
            BarField::Hlc3 => (bar.high + bar.low + bar.close) / 3.0,
            BarField::Ohlc4 => (bar.open + bar.high + bar.low + bar.close) / 4.0,
            BarField::Hlcc4 => (bar.high + bar.low + bar.close + bar.close) / 4.0,
            calendar => Calendar::of(bar.time).field(calendar) as f64,
        }
    }
}

const MS_PER_DAY: i64 = 86_400_000;

/// UTC calendar breakdown of an epoch-millisecond timestamp.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Calendar {
    year: i64,
    month: i64,
    day: i64,
    /// Days since 1970-01-01.
    days: i64,
    ms_of_day: i64,
}

impl Calendar {
    fn of(time: i64) -> Calendar {
        let days = time.div_euclid(MS_PER_DAY);
        let (year, month, day) = civil_from_days(days);
        Calendar {
            year,
            month,
            day,
            days,
            ms_of_day: time.rem_euclid(MS_PER_DAY),
        }
    }

    /// 0 = Sunday.
    fn weekday(&self) -> i64 {
        (self.days + 4).rem_euclid(7)
    }

    fn iso_week(&self) -> i64 {
        // Monday = 0.
        let iso_weekday = (self.days + 3).rem_euclid(7);
        let thursday = self.days - iso_weekday + 3;
        let (year, _, _) = civil_from_days(thursday);
        (thursday - days_from_civil(year, 1, 1)) / 7 + 1
    }

    fn field(&self, field: BarField) -> i64 {
        match field {
            BarField::Year => self.year,
            BarField::Month => self.month,
            BarField::DayOfMonth => self.day,
            BarField::WeekOfYear => self.iso_week(),
            BarField::DayOfWeek => self.weekday() + 1,
            BarField::Hour => self.ms_of_day / 3_600_000,
            BarField::Minute => self.ms_of_day / 60_000 % 60,
            BarField::Second => self.ms_of_day / 1000 % 60,
            _ => 0,
        }
    }
}

/// Proleptic Gregorian `(year, month, day)` of a day count since 1970-01-01.
fn civil_from_days(days: i64) -> (i64, i64, i64) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

fn days_from_civil(year: i64, month: i64, day: i64) -> i64 {
    let year = year - i64::from(month <= 2);
    let era = year.div_euclid(400);
    let yoe = year - era * 400;
    let mp = (month + 9) % 12;
    let doy = (153 * mp + 2) / 5 + day - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}
