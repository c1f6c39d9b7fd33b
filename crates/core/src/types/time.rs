//! Wall-clock times and opening-hour blocks.
//!
//! Times are store-local minutes since midnight, serialized as `HH:MM`.
//! `24:00` is representable so a block can close at midnight.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Minutes in a day.
pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// Errors from parsing or building clock values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeError {
    /// Not in `HH:MM` form.
    #[error("time must be formatted as HH:MM: {0}")]
    Format(String),
    /// Hour or minute out of range.
    #[error("time out of range: {0}")]
    OutOfRange(String),
    /// Block does not end after it starts.
    #[error("time block must end after it starts ({start} - {end})")]
    EmptyBlock {
        /// Block start.
        start: ClockTime,
        /// Block end.
        end: ClockTime,
    },
}

/// A store-local time of day with minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(u16);

impl ClockTime {
    /// 00:00.
    pub const MIDNIGHT: Self = Self(0);
    /// 24:00, only meaningful as the end of a block.
    pub const END_OF_DAY: Self = Self(MINUTES_PER_DAY);

    /// Build from minutes since midnight (`0..=1440`).
    #[must_use]
    pub const fn from_minutes(minutes: u16) -> Option<Self> {
        if minutes <= MINUTES_PER_DAY {
            Some(Self(minutes))
        } else {
            None
        }
    }

    /// Build from hour and minute.
    #[must_use]
    pub const fn from_hm(hour: u16, minute: u16) -> Option<Self> {
        if minute >= 60 || hour > 24 || (hour == 24 && minute != 0) {
            return None;
        }
        Some(Self(hour * 60 + minute))
    }

    /// Minutes since midnight.
    #[must_use]
    pub const fn minutes(self) -> u16 {
        self.0
    }

    /// Add minutes, staying within the day (`24:00` inclusive).
    #[must_use]
    pub const fn checked_add(self, minutes: u16) -> Option<Self> {
        match self.0.checked_add(minutes) {
            Some(total) => Self::from_minutes(total),
            None => None,
        }
    }

    /// Parse strict `HH:MM`.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError`] when the text is malformed or out of range.
    pub fn parse(s: &str) -> Result<Self, TimeError> {
        let bytes = s.as_bytes();
        if bytes.len() != 5 || bytes.get(2) != Some(&b':') {
            return Err(TimeError::Format(s.to_string()));
        }
        let (Some(hh), Some(mm)) = (s.get(0..2), s.get(3..5)) else {
            return Err(TimeError::Format(s.to_string()));
        };
        if !hh.bytes().chain(mm.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(TimeError::Format(s.to_string()));
        }
        let hour: u16 = hh.parse().map_err(|_| TimeError::Format(s.to_string()))?;
        let minute: u16 = mm.parse().map_err(|_| TimeError::Format(s.to_string()))?;
        Self::from_hm(hour, minute).ok_or_else(|| TimeError::OutOfRange(s.to_string()))
    }

    /// Convert a `chrono` time (seconds are truncated).
    #[must_use]
    pub fn from_naive(time: chrono::NaiveTime) -> Self {
        use chrono::Timelike;
        // hour() < 24 and minute() < 60, so the product always fits.
        #[allow(clippy::cast_possible_truncation)]
        let minutes = (time.hour() * 60 + time.minute()) as u16;
        Self(minutes)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl FromStr for ClockTime {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ClockTime {
    type Error = TimeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ClockTime> for String {
    fn from(time: ClockTime) -> Self {
        time.to_string()
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for ClockTime {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for ClockTime {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::parse(&s)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for ClockTime {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.to_string(), buf)
    }
}

/// A contiguous opening period `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTimeBlock")]
pub struct TimeBlock {
    start: ClockTime,
    end: ClockTime,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTimeBlock {
    start: ClockTime,
    end: ClockTime,
}

impl TryFrom<RawTimeBlock> for TimeBlock {
    type Error = TimeError;

    fn try_from(raw: RawTimeBlock) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.end)
    }
}

impl TimeBlock {
    /// Create a block.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::EmptyBlock`] unless `start < end`.
    pub const fn new(start: ClockTime, end: ClockTime) -> Result<Self, TimeError> {
        if start.0 >= end.0 {
            return Err(TimeError::EmptyBlock { start, end });
        }
        Ok(Self { start, end })
    }

    /// Block start.
    #[must_use]
    pub const fn start(&self) -> ClockTime {
        self.start
    }

    /// Block end (exclusive).
    #[must_use]
    pub const fn end(&self) -> ClockTime {
        self.end
    }

    /// Length in minutes.
    #[must_use]
    pub const fn len_minutes(&self) -> u16 {
        self.end.0 - self.start.0
    }

    /// Whether two half-open intervals share any minute.
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.start.0 < other.end.0 && other.start.0 < self.end.0
    }
}

impl fmt::Display for TimeBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn t(s: &str) -> ClockTime {
        ClockTime::parse(s).unwrap()
    }

    #[test]
    fn test_parse_valid_times() {
        assert_eq!(t("00:00").minutes(), 0);
        assert_eq!(t("09:30").minutes(), 570);
        assert_eq!(t("23:59").minutes(), 1439);
        assert_eq!(t("24:00"), ClockTime::END_OF_DAY);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["9:30", "09:3", "0930", "09-30", "ab:cd", "+9:30", "09:30 ", ""] {
            assert!(
                matches!(ClockTime::parse(bad), Err(TimeError::Format(_))),
                "{bad:?} should be a format error"
            );
        }
    }

    #[test]
    fn test_parse_rejects_out_of_range() {
        for bad in ["24:01", "25:00", "12:60", "99:99"] {
            assert!(
                matches!(ClockTime::parse(bad), Err(TimeError::OutOfRange(_))),
                "{bad:?} should be out of range"
            );
        }
    }

    #[test]
    fn test_display_pads() {
        assert_eq!(t("07:05").to_string(), "07:05");
        assert_eq!(ClockTime::from_minutes(61).unwrap().to_string(), "01:01");
    }

    #[test]
    fn test_checked_add() {
        assert_eq!(t("23:30").checked_add(30), Some(ClockTime::END_OF_DAY));
        assert_eq!(t("23:30").checked_add(31), None);
    }

    #[test]
    fn test_from_naive_truncates_seconds() {
        let naive = chrono::NaiveTime::from_hms_opt(14, 7, 59).unwrap();
        assert_eq!(ClockTime::from_naive(naive).to_string(), "14:07");
    }

    #[test]
    fn test_time_block_validation() {
        assert!(TimeBlock::new(t("09:00"), t("17:00")).is_ok());
        assert!(TimeBlock::new(t("09:00"), t("09:00")).is_err());
        assert!(TimeBlock::new(t("17:00"), t("09:00")).is_err());
    }

    #[test]
    fn test_time_block_deserialize_validates() {
        let ok: TimeBlock =
            serde_json::from_str(r#"{"start":"09:00","end":"12:00"}"#).unwrap();
        assert_eq!(ok.len_minutes(), 180);

        assert!(serde_json::from_str::<TimeBlock>(r#"{"start":"12:00","end":"09:00"}"#).is_err());
        assert!(serde_json::from_str::<TimeBlock>(r#"{"start":"9","end":"12:00"}"#).is_err());
    }

    #[test]
    fn test_overlaps_is_half_open() {
        let morning = TimeBlock::new(t("09:00"), t("10:00")).unwrap();
        let next = TimeBlock::new(t("10:00"), t("11:00")).unwrap();
        let inside = TimeBlock::new(t("09:30"), t("09:45")).unwrap();
        assert!(!morning.overlaps(&next));
        assert!(morning.overlaps(&inside));
        assert!(inside.overlaps(&morning));
    }
}
