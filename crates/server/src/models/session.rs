//! Session-related types.

use serde::{Deserialize, Serialize};

use vitrinex_core::{Email, OwnerId};

/// Session-stored owner identity.
///
/// Plan and store are looked up per request so upgrades apply immediately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentOwner {
    pub id: OwnerId,
    pub email: Email,
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in owner.
    pub const CURRENT_OWNER: &str = "current_owner";
}
