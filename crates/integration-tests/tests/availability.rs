//! Availability over schedules parsed from the JSON the API accepts.
//!
//! Runs without a database or server.

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::json;

use vitrinex_core::{
    AvailabilityQuery, ClockTime, Reservation, SpecialDay, WeeklySchedule, available_slots,
    is_slot_available,
};

fn weekly() -> WeeklySchedule {
    serde_json::from_value(json!({
        "monday": [
            {"start": "09:00", "end": "12:00"},
            {"start": "13:00", "end": "15:00"}
        ]
    }))
    .expect("valid schedule")
}

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 11, 2).expect("valid date")
}

fn sunday_before() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 11, 1)
        .and_then(|d| d.and_hms_opt(20, 0, 0))
        .expect("valid datetime")
}

fn t(s: &str) -> ClockTime {
    ClockTime::parse(s).expect("valid time")
}

fn labels(slots: &[ClockTime]) -> Vec<String> {
    slots.iter().map(ToString::to_string).collect()
}

#[test]
fn test_lunch_break_splits_slots() {
    let weekly = weekly();
    let query = AvailabilityQuery {
        date: monday(),
        duration_minutes: 60,
        slot_interval_minutes: 60,
        weekly: &weekly,
        special_day: None,
        reserved: &[],
        now: sunday_before(),
    };
    assert_eq!(
        labels(&available_slots(&query)),
        ["09:00", "10:00", "11:00", "13:00", "14:00"]
    );
}

#[test]
fn test_booked_slot_disappears_and_is_rejected() {
    let weekly = weekly();
    let reserved = [Reservation::new(t("10:00"), 45)];
    let query = AvailabilityQuery {
        date: monday(),
        duration_minutes: 30,
        slot_interval_minutes: 30,
        weekly: &weekly,
        special_day: None,
        reserved: &reserved,
        now: sunday_before(),
    };

    let slots = labels(&available_slots(&query));
    assert!(!slots.contains(&"10:00".to_string()));
    assert!(!slots.contains(&"10:30".to_string()));
    assert!(slots.contains(&"09:30".to_string()));
    assert!(slots.contains(&"11:00".to_string()));

    assert!(!is_slot_available(&query, t("10:30")));
    assert!(is_slot_available(&query, t("11:00")));
    // Off-grid start times are never bookable.
    assert!(!is_slot_available(&query, t("11:10")));
}

#[test]
fn test_special_day_from_json() {
    let weekly = weekly();
    let closed: SpecialDay = serde_json::from_value(json!({
        "date": "2026-11-02", "closed": true, "note": "Día de Muertos"
    }))
    .expect("valid special day");
    let short: SpecialDay = serde_json::from_value(json!({
        "date": "2026-11-02", "blocks": [{"start": "16:00", "end": "17:00"}]
    }))
    .expect("valid special day");

    let mut query = AvailabilityQuery {
        date: monday(),
        duration_minutes: 30,
        slot_interval_minutes: 30,
        weekly: &weekly,
        special_day: Some(&closed),
        reserved: &[],
        now: sunday_before(),
    };
    assert!(available_slots(&query).is_empty());

    query.special_day = Some(&short);
    assert_eq!(labels(&available_slots(&query)), ["16:00", "16:30"]);
}

#[test]
fn test_invalid_block_rejected_at_parse() {
    let result = serde_json::from_value::<WeeklySchedule>(json!({
        "tuesday": [{"start": "18:00", "end": "09:00"}]
    }));
    assert!(result.is_err());
}
