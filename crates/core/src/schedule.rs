//! Weekly opening hours and per-date overrides.

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::types::TimeBlock;

/// Upper bound on blocks per day, weekly or special.
pub const MAX_BLOCKS_PER_DAY: usize = 8;

/// Recurring opening hours keyed by weekday.
///
/// A weekday with no blocks is closed. Stored as JSONB on the store row:
///
/// ```json
/// {"monday": [{"start": "09:00", "end": "13:00"}, {"start": "15:00", "end": "19:00"}]}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WeeklySchedule {
    pub monday: Vec<TimeBlock>,
    pub tuesday: Vec<TimeBlock>,
    pub wednesday: Vec<TimeBlock>,
    pub thursday: Vec<TimeBlock>,
    pub friday: Vec<TimeBlock>,
    pub saturday: Vec<TimeBlock>,
    pub sunday: Vec<TimeBlock>,
}

impl WeeklySchedule {
    /// Opening blocks for a weekday.
    #[must_use]
    pub fn blocks_for(&self, weekday: Weekday) -> &[TimeBlock] {
        match weekday {
            Weekday::Mon => &self.monday,
            Weekday::Tue => &self.tuesday,
            Weekday::Wed => &self.wednesday,
            Weekday::Thu => &self.thursday,
            Weekday::Fri => &self.friday,
            Weekday::Sat => &self.saturday,
            Weekday::Sun => &self.sunday,
        }
    }

    /// Opening blocks for the weekday of `date`.
    #[must_use]
    pub fn blocks_on(&self, date: NaiveDate) -> &[TimeBlock] {
        use chrono::Datelike;
        self.blocks_for(date.weekday())
    }

    /// True when every weekday is closed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.days().all(|(_, blocks)| blocks.is_empty())
    }

    fn days(&self) -> impl Iterator<Item = (Weekday, &[TimeBlock])> {
        [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ]
        .into_iter()
        .map(move |day| (day, self.blocks_for(day)))
    }

    /// Messages for every weekday holding too many blocks.
    ///
    /// Block ordering is already enforced when a [`TimeBlock`] is built.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        self.days()
            .filter(|(_, blocks)| blocks.len() > MAX_BLOCKS_PER_DAY)
            .map(|(day, _)| {
                format!("schedule for {day} has more than {MAX_BLOCKS_PER_DAY} time blocks")
            })
            .collect()
    }
}

/// A per-date override of the weekly schedule.
///
/// `closed` wins over `blocks`. An open special day with no blocks falls back
/// to the weekly schedule, so a note can be attached to a normal day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialDay {
    pub date: NaiveDate,
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub blocks: Vec<TimeBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl SpecialDay {
    /// Longest note accepted.
    pub const MAX_NOTE_LENGTH: usize = 200;

    /// Field errors for this override.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.blocks.len() > MAX_BLOCKS_PER_DAY {
            errors.push(format!(
                "special day has more than {MAX_BLOCKS_PER_DAY} time blocks"
            ));
        }
        if let Some(note) = &self.note
            && note.chars().count() > Self::MAX_NOTE_LENGTH
        {
            errors.push(format!(
                "note must be at most {} characters",
                Self::MAX_NOTE_LENGTH
            ));
        }
        errors
    }
}
