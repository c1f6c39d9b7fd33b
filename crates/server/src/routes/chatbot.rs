//! Premium business assistant.

use axum::extract::State;
use serde::Serialize;
use tracing::instrument;

use crate::db::{AnalyticsRepository, OwnerRepository, ProductRepository, ServiceRepository};
use crate::error::{AppError, Result};
use crate::extract::AppJson;
use crate::middleware::OwnerStore;
use crate::services::chatbot::{ChatbotError, ChatbotRequest, build_system_prompt};
use crate::state::AppState;

/// Response of `POST /api/chatbot`.
#[derive(Debug, Serialize)]
pub struct ChatbotReply {
    pub reply: String,
}

/// Answer an owner's question from their store's facts.
#[instrument(skip_all, fields(store_id = %store.id))]
pub async fn ask(
    State(state): State<AppState>,
    OwnerStore { owner, store }: OwnerStore,
    AppJson(body): AppJson<ChatbotRequest>,
) -> Result<AppJson<ChatbotReply>> {
    let errors = body.validate();
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let account = OwnerRepository::new(state.pool())
        .get_by_id(owner.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Authentication required".into()))?;
    if !account.plan.has_chatbot() {
        return Err(AppError::Forbidden(
            "The assistant is available on the premium plan".into(),
        ));
    }
    let client = state.chatbot().ok_or(ChatbotError::NotConfigured)?;

    let pool = state.pool();
    let products = ProductRepository::new(pool).list(store.id, false).await?;
    let services = ServiceRepository::new(pool).list(store.id, false).await?;
    let snapshot = AnalyticsRepository::new(pool)
        .snapshot(store.id, store.local_now().date())
        .await?;

    let prompt = build_system_prompt(&store, &products, &services, &snapshot);
    let reply = client.complete(&body.into_turns(prompt)).await?;

    Ok(AppJson(ChatbotReply { reply }))
}
