//! Owner account commands.

use vitrinex_core::{Email, Plan};
use vitrinex_server::db::{OwnerRepository, RepositoryError};
use vitrinex_server::services::auth::AuthService;

use super::{CliError, connect};

/// Create an owner account.
///
/// # Errors
///
/// Returns an error if the input is invalid or the email is taken.
pub async fn create(email: &str, name: &str, password: &str, plan: Plan) -> Result<(), CliError> {
    if name.trim().is_empty() {
        return Err(CliError::Invalid("name is required".into()));
    }
    let pool = connect().await?;

    let owner = AuthService::new(&pool)
        .register(email, name, password, plan)
        .await?;

    tracing::info!(
        "Owner created! ID: {}, Email: {}, Plan: {}",
        owner.id,
        owner.email,
        owner.plan
    );
    Ok(())
}

/// Change the plan of an existing owner.
///
/// # Errors
///
/// Returns an error if no owner has this email.
pub async fn set_plan(email: &str, plan: Plan) -> Result<(), CliError> {
    let email = Email::parse(email).map_err(|e| CliError::Invalid(e.to_string()))?;
    let pool = connect().await?;

    let owner = OwnerRepository::new(&pool)
        .set_plan(&email, plan)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => {
                CliError::Invalid(format!("no owner with email {email}"))
            }
            other => CliError::Repository(other),
        })?;

    tracing::info!("Owner {} is now on the {} plan", owner.email, owner.plan);
    Ok(())
}
