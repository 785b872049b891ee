use std::sync::Arc;

use crate::auth::TokenService;
use crate::commands;
use crate::config::Config;
use crate::error::AppError;
use crate::store::{MemoryStore, PgStore, Store};

/// Everything a request handler needs, built once at startup and shared through
/// `web::Data`.
#[derive(Clone)]
pub struct AppContext {
    pub store: Arc<dyn Store>,
    pub tokens: TokenService,
    /// bcrypt cost used when hashing new passwords.
    pub bcrypt_cost: u32,
}

impl AppContext {
    pub fn new(store: Arc<dyn Store>, tokens: TokenService, bcrypt_cost: u32) -> Self {
        Self {
            store,
            tokens,
            bcrypt_cost,
        }
    }

    /// Connects the store named by `config.database_url` and sets up token signing.
    /// The in-memory store starts out with every table created.
    pub async fn from_config(config: &Config) -> Result<Self, AppError> {
        let ttl = config.token_ttl()?;
        let store: Arc<dyn Store> = if config.uses_memory_store() {
            log::info!("Using the in-memory store");
            let store = MemoryStore::new();
            commands::create_all(&store).await?;
            Arc::new(store)
        } else {
            Arc::new(PgStore::connect(&config.database_url).await?)
        };
        log::info!("Issuing tokens valid for {} hours", ttl.num_hours());
        let tokens = TokenService::new(&config.jwt_secret, ttl);
        Ok(Self::new(store, tokens, config.bcrypt_cost))
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }
}
