use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// Кол-во тиков (по 100 нс) в секунде.
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// Тики от 0001-01-01T00:00:00Z до Unix epoch.
pub const UNIX_EPOCH_TICKS: i64 = 621_355_968_000_000_000;

/// Момент времени в виде 64-битного счётчика тиков.
///
/// На проводе хранится ровно это число, поэтому значение переживает
/// encode/decode без потерь даже вне диапазона `chrono`.
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    pub const fn from_ticks(ticks: i64) -> Self {
        Self(ticks)
    }

    pub const fn ticks(self) -> i64 {
        self.0
    }

    /// Переводит дату в тики. `None`, если результат не влезает в i64.
    pub fn from_datetime(dt: DateTime<Utc>) -> Option<Self> {
        let seconds = dt.timestamp().checked_mul(TICKS_PER_SECOND)?;
        let sub = i64::from(dt.timestamp_subsec_nanos() / 100);
        seconds
            .checked_add(sub)?
            .checked_add(UNIX_EPOCH_TICKS)
            .map(Self)
    }

    /// Переводит тики в дату. Дробная часть меньше 100 нс не хранится.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        let relative = self.0.checked_sub(UNIX_EPOCH_TICKS)?;
        let seconds = relative.div_euclid(TICKS_PER_SECOND);
        let nanos = relative.rem_euclid(TICKS_PER_SECOND) * 100;
        DateTime::from_timestamp(seconds, nanos as u32)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    /// Значения за пределами диапазона тиков насыщаются.
    fn from(dt: DateTime<Utc>) -> Self {
        Self::from_datetime(dt).unwrap_or(if dt.timestamp() < 0 {
            Self(i64::MIN)
        } else {
            Self(i64::MAX)
        })
    }
}

impl fmt::Display for Timestamp {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.to_rfc3339()),
            None => write!(f, "{} ticks", self.0),
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match self.to_datetime() {
            Some(dt) => dt.serialize(serializer),
            None => serializer.serialize_i64(self.0),
        }
    }
}
