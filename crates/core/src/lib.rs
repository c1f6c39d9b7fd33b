//! Vitrinex Core - Shared domain types and scheduling logic.
//!
//! This crate provides the types used across all Vitrinex components:
//! - `server` - JSON API serving storefronts, owner dashboards and chat
//! - `cli` - Command-line tools for migrations, seeding and maintenance
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Slot availability lives here because it is plain
//! interval arithmetic over values the server loads.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails, statuses, clock times
//! - [`schedule`] - Weekly schedules and special-day overrides
//! - [`availability`] - Bookable slot computation
//! - [`appearance`] - Storefront appearance document

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod appearance;
pub mod availability;
pub mod schedule;
pub mod types;

pub use appearance::{Appearance, AppearanceError};
pub use availability::{
    AvailabilityQuery, Reservation, available_slots, is_slot_available, opening_blocks,
};
pub use schedule::{SpecialDay, WeeklySchedule};
pub use types::*;
