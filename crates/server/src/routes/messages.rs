//! Chat handlers for booking and order threads.
//!
//! The caller is the customer when a valid `?token=` is given, otherwise the
//! owner of the thread's store.

use axum::{extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use vitrinex_core::{AccessToken, MessageId, ParentKind, ThreadRef};

use crate::db::MessageRepository;
use crate::db::messages::UnreadThread;
use crate::error::{AppError, Result};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::middleware::{OptionalOwner, OwnerStore};
use crate::models::Message;
use crate::services::chat::{PostMessage, resolve_sender};
use crate::state::AppState;

/// Query of thread endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ThreadParams {
    /// Only messages with a larger ID, for polling.
    pub after: Option<MessageId>,
    pub token: Option<AccessToken>,
}

/// Response of `POST .../read`.
#[derive(Debug, Serialize)]
pub struct MarkedResponse {
    pub marked: u64,
}

/// Response of `GET /api/messages/unread`.
#[derive(Debug, Serialize)]
pub struct UnreadResponse {
    pub threads: Vec<UnreadThread>,
    pub total: i64,
}

fn parse_kind(kind: &str) -> Result<ParentKind> {
    kind.parse().map_err(AppError::BadRequest)
}

/// Typed thread from the `{kind}/{id}` path segments.
fn parse_thread(kind: &str, id: i32) -> Result<ThreadRef> {
    parse_kind(kind).map(|kind| ThreadRef::new(kind, id))
}

/// Messages of a thread, oldest first.
pub async fn list(
    State(state): State<AppState>,
    OptionalOwner(owner): OptionalOwner,
    AppPath((kind, id)): AppPath<(String, i32)>,
    AppQuery(params): AppQuery<ThreadParams>,
) -> Result<AppJson<Vec<Message>>> {
    let thread = parse_thread(&kind, id)?;
    resolve_sender(state.pool(), thread, params.token, owner.as_ref()).await?;

    let messages = MessageRepository::new(state.pool())
        .list(thread, params.after)
        .await?;
    Ok(AppJson(messages))
}

/// Post to a thread. The sender is whoever the caller resolves to.
#[instrument(skip(state, owner, params, body))]
pub async fn post(
    State(state): State<AppState>,
    OptionalOwner(owner): OptionalOwner,
    AppPath((kind, id)): AppPath<(String, i32)>,
    AppQuery(params): AppQuery<ThreadParams>,
    AppJson(body): AppJson<PostMessage>,
) -> Result<(StatusCode, AppJson<Message>)> {
    let thread = parse_thread(&kind, id)?;
    let content = body.validated()?;
    let sender = resolve_sender(state.pool(), thread, params.token, owner.as_ref()).await?;

    let message = MessageRepository::new(state.pool())
        .post(thread, sender, content)
        .await?;
    tracing::debug!(message_id = %message.id, %thread, ?sender, "Message posted");
    Ok((StatusCode::CREATED, AppJson(message)))
}

/// Mark the other side's messages read.
pub async fn mark_read(
    State(state): State<AppState>,
    OptionalOwner(owner): OptionalOwner,
    AppPath((kind, id)): AppPath<(String, i32)>,
    AppQuery(params): AppQuery<ThreadParams>,
) -> Result<AppJson<MarkedResponse>> {
    let thread = parse_thread(&kind, id)?;
    let reader = resolve_sender(state.pool(), thread, params.token, owner.as_ref()).await?;

    let marked = MessageRepository::new(state.pool())
        .mark_read(thread, reader)
        .await?;
    Ok(AppJson(MarkedResponse { marked }))
}

/// Threads of the owner's store with unread customer messages.
pub async fn unread(
    State(state): State<AppState>,
    OwnerStore { store, .. }: OwnerStore,
) -> Result<AppJson<UnreadResponse>> {
    let threads = MessageRepository::new(state.pool())
        .unread_for_owner(store.id)
        .await?;
    let total = threads.iter().map(|t| i64::from(t.unread)).sum();
    Ok(AppJson(UnreadResponse { threads, total }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kind() {
        assert!(matches!(parse_kind("bookings"), Ok(ParentKind::Booking)));
        assert!(matches!(parse_kind("order"), Ok(ParentKind::Order)));
        assert!(matches!(parse_kind("invoice"), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_parse_thread_is_typed() {
        assert!(matches!(
            parse_thread("orders", 9),
            Ok(ThreadRef::Order(id)) if id.as_i32() == 9
        ));
        assert!(matches!(
            parse_thread("booking", 4),
            Ok(ThreadRef::Booking(id)) if id.as_i32() == 4
        ));
        assert!(parse_thread("invoice", 4).is_err());
    }
}
