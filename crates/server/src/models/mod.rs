//! Domain models for the API.
//!
//! These are validated domain objects, separate from the database row types in
//! [`crate::db`]. Most serialize directly as API responses.

pub mod analytics;
pub mod booking;
pub mod catalog;
pub mod message;
pub mod order;
pub mod owner;
pub mod session;
pub mod store;

pub use analytics::{AnalyticsSnapshot, RankedItem};
pub use booking::Booking;
pub use catalog::{Product, Service};
pub use message::Message;
pub use order::{Order, OrderItem};
pub use owner::Owner;
pub use session::{CurrentOwner, keys as session_keys};
pub use store::{PublicStore, Store};
