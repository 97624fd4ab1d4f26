use std::str::FromStr;

use diesel::{deserialize::FromSqlRow, expression::AsExpression, sql_types::Text};
use regex::Regex;
use serde::{de::Visitor, Deserialize, Serialize};

use crate::Error;

/// Kline interval, spelled the way the exchange spells it (`1m`, `4h`, `1M`...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
pub enum Interval {
    OneMinute,
    FiveMinutes,
    FifteenMinutes,
    OneHour,
    FourHours,
    OneDay,
    OneWeek,
    OneMonth,
}

impl Interval {
    pub const ALL: [Interval; 8] = [
        Interval::OneMinute,
        Interval::FiveMinutes,
        Interval::FifteenMinutes,
        Interval::OneHour,
        Interval::FourHours,
        Interval::OneDay,
        Interval::OneWeek,
        Interval::OneMonth,
    ];

    pub fn as_str(&self) -> &'static str {
        return match self {
            Interval::OneMinute => "1m",
            Interval::FiveMinutes => "5m",
            Interval::FifteenMinutes => "15m",
            Interval::OneHour => "1h",
            Interval::FourHours => "4h",
            Interval::OneDay => "1d",
            Interval::OneWeek => "1w",
            Interval::OneMonth => "1M",
        };
    }

    /// Bar length in milliseconds. Months have no fixed length.
    pub fn millis(&self) -> Option<i64> {
        let duration = match self {
            Interval::OneMinute => chrono::Duration::minutes(1),
            Interval::FiveMinutes => chrono::Duration::minutes(5),
            Interval::FifteenMinutes => chrono::Duration::minutes(15),
            Interval::OneHour => chrono::Duration::hours(1),
            Interval::FourHours => chrono::Duration::hours(4),
            Interval::OneDay => chrono::Duration::days(1),
            Interval::OneWeek => chrono::Duration::weeks(1),
            Interval::OneMonth => return None,
        };
        return Some(duration.num_milliseconds());
    }

    /// Close time of the bar opening at `open_time` (epoch ms): one millisecond
    /// before the next bar opens.
    pub fn close_time(&self, open_time: i64) -> Result<i64, Error> {
        let next_open = match self.millis() {
            Some(size) => open_time + size,
            None => {
                let open = chrono::DateTime::from_timestamp_millis(open_time).ok_or_else(|| {
                    Error::IntervalError(format!("open_time {open_time} is out of range"))
                })?;
                open.checked_add_months(chrono::Months::new(1))
                    .ok_or_else(|| {
                        Error::IntervalError(format!("open_time {open_time} is out of range"))
                    })?
                    .timestamp_millis()
            }
        };
        return Ok(next_open - 1);
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "{}", self.as_str());
    }
}

impl FromStr for Interval {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let regex = Regex::new(r"^(\d+)([mhdwM])$")
            .map_err(|err| Error::IntervalError(err.to_string()))?;
        let captures = regex
            .captures(s)
            .ok_or_else(|| Error::IntervalError(format!("{s} is not in the format 'xm', 'xh', 'xd', 'xw' or 'xM'")))?;
        let value = captures[1]
            .parse::<u32>()
            .map_err(|err| Error::IntervalError(format!("{s}: {err}")))?;

        let interval = match (value, &captures[2]) {
            (1, "m") => Interval::OneMinute,
            (5, "m") => Interval::FiveMinutes,
            (15, "m") => Interval::FifteenMinutes,
            (1, "h") => Interval::OneHour,
            (4, "h") => Interval::FourHours,
            (1, "d") => Interval::OneDay,
            (1, "w") => Interval::OneWeek,
            (1, "M") => Interval::OneMonth,
            _ => return Err(Error::IntervalError(format!("{s} is not a supported interval"))),
        };
        return Ok(interval);
    }
}

impl Serialize for Interval {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        return serializer.serialize_str(self.as_str());
    }
}

struct IntervalVisitor;

impl<'de> Visitor<'de> for IntervalVisitor {
    type Value = Interval;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        return formatter.write_str("one of 1m, 5m, 15m, 1h, 4h, 1d, 1w or 1M");
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        return v.parse().map_err(E::custom);
    }
}

impl<'de> Deserialize<'de> for Interval {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        return deserializer.deserialize_str(IntervalVisitor);
    }
}

crate::sql::text_sql!(Interval);
