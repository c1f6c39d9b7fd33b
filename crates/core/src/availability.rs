//! Bookable slot resolution.
//!
//! Given a store's opening hours for a date, a service duration and the
//! bookings already on the calendar, [`available_slots`] lists every start
//! time a customer may still book.
//!
//! ```
//! use chrono::NaiveDate;
//! use vitrinex_core::{AvailabilityQuery, ClockTime, Reservation, WeeklySchedule, available_slots};
//!
//! let weekly: WeeklySchedule =
//!     serde_json::from_str(r#"{"monday":[{"start":"09:00","end":"11:00"}]}"#).unwrap();
//! let monday = NaiveDate::from_ymd_opt(2026, 10, 26).unwrap();
//! let booked = [Reservation::new(ClockTime::parse("09:30").unwrap(), 30)];
//!
//! let slots = available_slots(&AvailabilityQuery {
//!     date: monday,
//!     duration_minutes: 30,
//!     slot_interval_minutes: 30,
//!     weekly: &weekly,
//!     special_day: None,
//!     reserved: &booked,
//!     now: monday.pred_opt().unwrap().and_hms_opt(12, 0, 0).unwrap(),
//! });
//!
//! let labels: Vec<String> = slots.iter().map(ToString::to_string).collect();
//! assert_eq!(labels, ["09:00", "10:00", "10:30"]);
//! ```

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime};

use crate::schedule::{SpecialDay, WeeklySchedule};
use crate::types::{ClockTime, TimeBlock};

/// An interval already taken on the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    pub start: ClockTime,
    pub duration_minutes: u16,
}

impl Reservation {
    #[must_use]
    pub const fn new(start: ClockTime, duration_minutes: u16) -> Self {
        Self {
            start,
            duration_minutes,
        }
    }

    /// Exclusive end in minutes since midnight. May pass 24:00.
    #[must_use]
    pub const fn end_minutes(&self) -> u32 {
        self.start.minutes() as u32 + self.duration_minutes as u32
    }

    /// Whether `[start, start + duration)` intersects this reservation.
    #[must_use]
    pub const fn overlaps(&self, start: ClockTime, duration_minutes: u16) -> bool {
        let start = start.minutes() as u32;
        let end = start + duration_minutes as u32;
        start < self.end_minutes() && (self.start.minutes() as u32) < end
    }
}

/// Inputs for one availability lookup.
#[derive(Debug, Clone, Copy)]
pub struct AvailabilityQuery<'a> {
    /// Store-local date being booked.
    pub date: NaiveDate,
    /// Length of the requested service.
    pub duration_minutes: u16,
    /// Step between candidate start times.
    pub slot_interval_minutes: u16,
    pub weekly: &'a WeeklySchedule,
    /// Override for `date`, if the store has one.
    pub special_day: Option<&'a SpecialDay>,
    /// Non-cancelled bookings on `date`.
    pub reserved: &'a [Reservation],
    /// Current store-local time.
    pub now: NaiveDateTime,
}

/// Opening hours that apply on `date`.
///
/// A closed special day yields nothing. A special day with blocks replaces the
/// weekly hours. Otherwise the weekly hours for the weekday apply.
#[must_use]
pub fn opening_blocks(
    weekly: &WeeklySchedule,
    special_day: Option<&SpecialDay>,
    date: NaiveDate,
) -> Vec<TimeBlock> {
    match special_day {
        Some(day) if day.closed => Vec::new(),
        Some(day) if !day.blocks.is_empty() => day.blocks.clone(),
        _ => weekly.blocks_on(date).to_vec(),
    }
}

/// Every start time within `blocks` that fits `duration_minutes`, sorted and
/// de-duplicated.
#[must_use]
pub fn candidate_starts(
    blocks: &[TimeBlock],
    duration_minutes: u16,
    slot_interval_minutes: u16,
) -> BTreeSet<ClockTime> {
    let mut candidates = BTreeSet::new();
    if duration_minutes == 0 || slot_interval_minutes == 0 {
        return candidates;
    }

    for block in blocks {
        let mut start = block.start();
        while let Some(finish) = start.checked_add(duration_minutes) {
            if finish > block.end() {
                break;
            }
            candidates.insert(start);
            match start.checked_add(slot_interval_minutes) {
                Some(next) => start = next,
                None => break,
            }
        }
    }

    candidates
}

/// Start times still bookable for the query, ascending.
#[must_use]
pub fn available_slots(query: &AvailabilityQuery<'_>) -> Vec<ClockTime> {
    let today = query.now.date();
    if query.date < today {
        return Vec::new();
    }
    let cutoff = (query.date == today).then(|| ClockTime::from_naive(query.now.time()));

    let blocks = opening_blocks(query.weekly, query.special_day, query.date);

    candidate_starts(&blocks, query.duration_minutes, query.slot_interval_minutes)
        .into_iter()
        .filter(|slot| cutoff.is_none_or(|now| *slot > now))
        .filter(|slot| {
            !query
                .reserved
                .iter()
                .any(|r| r.overlaps(*slot, query.duration_minutes))
        })
        .collect()
}

/// Whether `slot` is offered for the query.
#[must_use]
pub fn is_slot_available(query: &AvailabilityQuery<'_>, slot: ClockTime) -> bool {
    available_slots(query).contains(&slot)
}
