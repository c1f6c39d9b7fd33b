//! Chat caller resolution.
//!
//! A chat request comes either from the customer holding the parent's access
//! token or from the owner of the parent's store. The sender type is derived
//! here and never taken from the request body.

use serde::Deserialize;
use sqlx::PgPool;

use vitrinex_core::{AccessToken, SenderType, StoreId, ThreadRef};

use crate::db::messages::ParentAccess;
use crate::db::{MessageRepository, StoreRepository};
use crate::error::AppError;
use crate::models::CurrentOwner;

/// Longest chat message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 2000;

/// Body of `POST /api/messages/{kind}/{id}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostMessage {
    pub content: String,
}

impl PostMessage {
    /// Trimmed content.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if the content is blank or too long.
    pub fn validated(&self) -> Result<&str, AppError> {
        let content = self.content.trim();
        let len = content.chars().count();
        if len == 0 || len > MAX_MESSAGE_CHARS {
            return Err(AppError::Validation(vec![format!(
                "content must be between 1 and {MAX_MESSAGE_CHARS} characters"
            )]));
        }
        Ok(content)
    }
}

/// Decide who is speaking on a thread.
///
/// A token, when present, must match; it wins over any session. Otherwise the
/// caller's store must own the parent.
#[must_use]
pub fn sender_for(
    access: &ParentAccess,
    token: Option<AccessToken>,
    owner_store: Option<StoreId>,
) -> Option<SenderType> {
    match token {
        Some(token) => (token == access.access_token).then_some(SenderType::Customer),
        None => (owner_store == Some(access.store_id)).then_some(SenderType::Owner),
    }
}

/// Resolve the caller of a chat endpoint.
///
/// # Errors
///
/// Returns `AppError::Unauthorized` if there is neither a token nor a session.
/// Returns `AppError::NotFound` if the thread does not exist or belongs to
/// someone else.
pub async fn resolve_sender(
    pool: &PgPool,
    thread: ThreadRef,
    token: Option<AccessToken>,
    owner: Option<&CurrentOwner>,
) -> Result<SenderType, AppError> {
    if token.is_none() && owner.is_none() {
        return Err(AppError::Unauthorized("Authentication required".into()));
    }

    let access = MessageRepository::new(pool)
        .parent_access(thread)
        .await?
        .ok_or_else(|| AppError::NotFound("Conversation not found".into()))?;

    let owner_store = match (token, owner) {
        (None, Some(owner)) => StoreRepository::new(pool)
            .get_by_owner(owner.id)
            .await?
            .map(|store| store.id),
        _ => None,
    };

    sender_for(&access, token, owner_store)
        .ok_or_else(|| AppError::NotFound("Conversation not found".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn access() -> ParentAccess {
        ParentAccess {
            store_id: StoreId::new(4),
            access_token: AccessToken::generate(),
        }
    }

    #[test]
    fn test_matching_token_is_customer() {
        let access = access();
        assert_eq!(
            sender_for(&access, Some(access.access_token), None),
            Some(SenderType::Customer)
        );
    }

    #[test]
    fn test_wrong_token_is_rejected_even_with_session() {
        let access = access();
        assert_eq!(
            sender_for(&access, Some(AccessToken::generate()), Some(StoreId::new(4))),
            None
        );
    }

    #[test]
    fn test_owner_of_store_is_owner() {
        let access = access();
        assert_eq!(
            sender_for(&access, None, Some(StoreId::new(4))),
            Some(SenderType::Owner)
        );
        assert_eq!(sender_for(&access, None, Some(StoreId::new(5))), None);
        assert_eq!(sender_for(&access, None, None), None);
    }

    #[test]
    fn test_content_bounds() {
        let ok = PostMessage {
            content: "  ¿Llego 10 minutos tarde?  ".to_string(),
        };
        assert_eq!(ok.validated().ok(), Some("¿Llego 10 minutos tarde?"));

        let blank = PostMessage {
            content: " \n ".to_string(),
        };
        assert!(blank.validated().is_err());

        let long = PostMessage {
            content: "x".repeat(MAX_MESSAGE_CHARS + 1),
        };
        assert!(long.validated().is_err());
    }
}
