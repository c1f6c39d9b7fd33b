//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::VitrinexConfig;
use crate::services::chatbot::{ChatbotClient, ChatbotError};
use crate::services::storefront::StorefrontCache;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: VitrinexConfig,
    pool: PgPool,
    storefronts: StorefrontCache,
    chatbot: Option<ChatbotClient>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The chatbot client is built only when an API key is configured.
    ///
    /// # Errors
    ///
    /// Returns `ChatbotError::Config` if the chatbot client cannot be built.
    pub fn new(config: VitrinexConfig, pool: PgPool) -> Result<Self, ChatbotError> {
        let chatbot = config.openai.as_ref().map(ChatbotClient::new).transpose()?;
        if chatbot.is_none() {
            tracing::warn!("OPENAI_API_KEY not set, chatbot disabled");
        }

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                storefronts: StorefrontCache::new(),
                chatbot,
            }),
        })
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &VitrinexConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get the storefront payload cache.
    #[must_use]
    pub fn storefronts(&self) -> &StorefrontCache {
        &self.inner.storefronts
    }

    /// Get the chatbot client, if configured.
    #[must_use]
    pub fn chatbot(&self) -> Option<&ChatbotClient> {
        self.inner.chatbot.as_ref()
    }
}
