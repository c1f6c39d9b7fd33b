//! Status and mode enums for stores, bookings, orders and chat.
//!
//! Each enum maps to a Postgres enum type in the `vitrinex` schema when the
//! `postgres` feature is enabled.

use serde::{Deserialize, Serialize};

use super::id::{BookingId, OrderId};

/// What a store sells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "vitrinex.store_mode", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum StoreMode {
    /// Product catalog with orders.
    #[default]
    Products,
    /// Service calendar with bookings.
    Bookings,
}

impl std::fmt::Display for StoreMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Products => write!(f, "products"),
            Self::Bookings => write!(f, "bookings"),
        }
    }
}

/// Subscription plan of a store owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "vitrinex.owner_plan", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    #[default]
    Free,
    /// Unlocks the analytics chatbot.
    Premium,
}

impl Plan {
    /// Whether the plan includes the chatbot.
    #[must_use]
    pub const fn has_chatbot(self) -> bool {
        matches!(self, Self::Premium)
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Free => write!(f, "free"),
            Self::Premium => write!(f, "premium"),
        }
    }
}

impl std::str::FromStr for Plan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Self::Free),
            "premium" => Ok(Self::Premium),
            _ => Err(format!("invalid plan: {s}")),
        }
    }
}

/// Booking lifecycle.
///
/// ```text
/// pending ──► confirmed ──► completed
///    │            │
///    └────────────┴──► cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "vitrinex.booking_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    /// Statuses that hold their slot on the calendar.
    pub const BLOCKING: [Self; 3] = [Self::Pending, Self::Confirmed, Self::Completed];

    /// No further transitions allowed.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether the booking occupies its slot.
    #[must_use]
    pub const fn blocks_slot(self) -> bool {
        !matches!(self, Self::Cancelled)
    }

    /// Whether moving to `next` is a legal transition.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Confirmed | Self::Cancelled)
                | (Self::Confirmed, Self::Completed | Self::Cancelled)
        )
    }

    /// Lowercase name as stored and serialized.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order lifecycle.
///
/// ```text
/// pending ──► confirmed ──► fulfilled
///    │            │
///    └────────────┴──► cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "vitrinex.order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Fulfilled,
    Cancelled,
}

impl OrderStatus {
    /// No further transitions allowed.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Fulfilled | Self::Cancelled)
    }

    /// Whether moving to `next` is a legal transition.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Confirmed | Self::Cancelled)
                | (Self::Confirmed, Self::Fulfilled | Self::Cancelled)
        )
    }

    /// Lowercase name as stored and serialized.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Fulfilled => "fulfilled",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who wrote a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "vitrinex.sender_type", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum SenderType {
    Owner,
    Customer,
}

impl SenderType {
    /// The other participant of the conversation.
    #[must_use]
    pub const fn counterpart(self) -> Self {
        match self {
            Self::Owner => Self::Customer,
            Self::Customer => Self::Owner,
        }
    }
}

/// Kind of record a chat thread hangs off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "vitrinex.parent_kind", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ParentKind {
    Booking,
    Order,
}

impl ParentKind {
    /// Table holding the parent rows and their unread counters.
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::Booking => "vitrinex.booking",
            Self::Order => "vitrinex.customer_order",
        }
    }
}

impl std::str::FromStr for ParentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "booking" | "bookings" => Ok(Self::Booking),
            "order" | "orders" => Ok(Self::Order),
            _ => Err(format!("invalid message parent: {s}")),
        }
    }
}

/// The booking or order a chat thread belongs to.
///
/// Messages store the parent as a kind plus a raw integer because one column
/// points into two tables; this is the typed form used everywhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThreadRef {
    Booking(BookingId),
    Order(OrderId),
}

impl ThreadRef {
    /// Pair a parsed kind with the ID from the URL.
    #[must_use]
    pub const fn new(kind: ParentKind, id: i32) -> Self {
        match kind {
            ParentKind::Booking => Self::Booking(BookingId::new(id)),
            ParentKind::Order => Self::Order(OrderId::new(id)),
        }
    }

    #[must_use]
    pub const fn kind(self) -> ParentKind {
        match self {
            Self::Booking(_) => ParentKind::Booking,
            Self::Order(_) => ParentKind::Order,
        }
    }

    /// Value of the polymorphic `parent_id` column.
    #[must_use]
    pub const fn parent_id(self) -> i32 {
        match self {
            Self::Booking(id) => id.as_i32(),
            Self::Order(id) => id.as_i32(),
        }
    }
}

impl std::fmt::Display for ThreadRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Booking(id) => write!(f, "booking {id}"),
            Self::Order(id) => write!(f, "order {id}"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_ref_from_kind() {
        let thread = ThreadRef::new(ParentKind::Order, 12);
        assert_eq!(thread, ThreadRef::Order(OrderId::new(12)));
        assert_eq!(thread.kind(), ParentKind::Order);
        assert_eq!(thread.parent_id(), 12);
        assert_eq!(thread.to_string(), "order 12");

        let thread = ThreadRef::new("bookings".parse().unwrap(), 3);
        assert_eq!(thread, ThreadRef::Booking(BookingId::new(3)));
    }

    #[test]
    fn test_booking_transitions() {
        use BookingStatus::{Cancelled, Completed, Confirmed, Pending};

        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Completed));
        assert!(Confirmed.can_transition_to(Cancelled));

        assert!(!Pending.can_transition_to(Completed));
        assert!(!Pending.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Confirmed));
    }

    #[test]
    fn test_order_transitions() {
        use OrderStatus::{Cancelled, Confirmed, Fulfilled, Pending};

        assert!(Pending.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(Fulfilled));
        assert!(!Pending.can_transition_to(Fulfilled));
        assert!(!Fulfilled.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Pending));
    }

    #[test]
    fn test_terminal_states() {
        assert!(BookingStatus::Completed.is_terminal());
        assert!(BookingStatus::Cancelled.is_terminal());
        assert!(!BookingStatus::Confirmed.is_terminal());
        assert!(OrderStatus::Fulfilled.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
    }

    #[test]
    fn test_blocking_statuses_exclude_cancelled() {
        assert!(BookingStatus::BLOCKING.iter().all(|s| s.blocks_slot()));
        assert!(!BookingStatus::Cancelled.blocks_slot());
    }

    #[test]
    fn test_status_rejects_unknown_value() {
        let result = serde_json::from_str::<OrderStatus>("\"shipped\"");
        assert!(result.is_err());
        let parsed: OrderStatus = serde_json::from_str("\"fulfilled\"").expect("deserialize");
        assert_eq!(parsed, OrderStatus::Fulfilled);
    }

    #[test]
    fn test_sender_counterpart() {
        assert_eq!(SenderType::Owner.counterpart(), SenderType::Customer);
        assert_eq!(SenderType::Customer.counterpart(), SenderType::Owner);
    }

    #[test]
    fn test_parent_kind_parse() {
        assert_eq!("bookings".parse::<ParentKind>(), Ok(ParentKind::Booking));
        assert_eq!("order".parse::<ParentKind>(), Ok(ParentKind::Order));
        assert!("product".parse::<ParentKind>().is_err());
    }

    #[test]
    fn test_store_mode_display_matches_serde() {
        for mode in [StoreMode::Products, StoreMode::Bookings] {
            let json = serde_json::to_string(&mode).unwrap();
            assert_eq!(json, format!("\"{mode}\""));
        }
    }

    #[test]
    fn test_plan_roundtrip() {
        assert_eq!("premium".parse::<Plan>(), Ok(Plan::Premium));
        assert_eq!(Plan::Free.to_string(), "free");
        assert!(Plan::Premium.has_chatbot());
        assert!(!Plan::Free.has_chatbot());
    }
}
