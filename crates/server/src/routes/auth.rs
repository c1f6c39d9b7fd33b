//! Owner authentication handlers.

use axum::{extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use vitrinex_core::Plan;

use crate::db::StoreRepository;
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::extract::AppJson;
use crate::middleware::{RequireOwner, clear_current_owner, set_current_owner};
use crate::models::{CurrentOwner, Owner, Store};
use crate::services::auth::AuthService;
use crate::state::AppState;
use crate::validation::{NAME_MAX, Validator};

/// Registration body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

/// Login body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// `GET /api/auth/me` response.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub owner: Owner,
    pub store: Option<Store>,
}

async fn start_session(session: &Session, owner: &Owner) -> Result<()> {
    let current = CurrentOwner {
        id: owner.id,
        email: owner.email.clone(),
    };
    set_current_owner(session, &current)
        .await
        .map_err(|e| AppError::Internal(format!("session: {e}")))?;
    set_sentry_user(&owner.id, Some(owner.email.as_str()));
    Ok(())
}

/// Create an owner account on the free plan and log it in.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    AppJson(body): AppJson<RegisterRequest>,
) -> Result<(StatusCode, AppJson<Owner>)> {
    let mut v = Validator::new();
    v.required_text("name", &body.name, NAME_MAX);
    v.finish()?;

    let owner = AuthService::new(state.pool())
        .register(&body.email, &body.name, &body.password, Plan::Free)
        .await?;
    start_session(&session, &owner).await?;

    Ok((StatusCode::CREATED, AppJson(owner)))
}

/// Log in with email and password.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    AppJson(body): AppJson<LoginRequest>,
) -> Result<AppJson<Owner>> {
    let owner = AuthService::new(state.pool())
        .login(&body.email, &body.password)
        .await
        .inspect_err(|e| tracing::warn!(error = %e, "Login failed"))?;
    start_session(&session, &owner).await?;

    Ok(AppJson(owner))
}

/// End the session.
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_owner(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session: {e}")))?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// The logged-in owner and their store, if opened.
pub async fn me(
    State(state): State<AppState>,
    RequireOwner(current): RequireOwner,
) -> Result<AppJson<MeResponse>> {
    let owner = AuthService::new(state.pool()).get_owner(current.id).await?;
    let store = StoreRepository::new(state.pool())
        .get_by_owner(owner.id)
        .await?;
    Ok(AppJson(MeResponse { owner, store }))
}
