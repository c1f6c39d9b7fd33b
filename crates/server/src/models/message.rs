//! Chat messages.

use chrono::{DateTime, Utc};
use serde::Serialize;

use vitrinex_core::{MessageId, ParentKind, SenderType};

/// One chat message on a booking or order thread.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub id: MessageId,
    pub parent_kind: ParentKind,
    /// Booking or order ID, per `parent_kind`. See `ThreadRef` for the typed form.
    pub parent_id: i32,
    pub sender_type: SenderType,
    pub content: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}
