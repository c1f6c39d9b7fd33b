//! Store owner accounts.

use chrono::{DateTime, Utc};
use serde::Serialize;

use vitrinex_core::{Email, OwnerId, Plan};

/// A store owner (password hash never leaves the repository).
#[derive(Debug, Clone, Serialize)]
pub struct Owner {
    pub id: OwnerId,
    pub email: Email,
    pub name: String,
    pub plan: Plan,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
