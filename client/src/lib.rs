pub mod api;
pub mod auth;
pub mod config;
pub mod coordinator;
pub mod draft;
pub mod error;
pub mod models;
pub mod resolve;

use std::sync::Arc;

use api::ApiClient;
use auth::Claims;
use config::Config;

/// Per-session context: identity claims decoded once at start-up plus the
/// HTTP client. Cheap to clone.
#[derive(Clone)]
pub struct Session {
    pub claims: Arc<Claims>,
    pub api: ApiClient,
}

impl Session {
    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let claims = Claims::decode(&cfg.token, cfg.jwt_secret.as_deref())?;
        let api = ApiClient::new(cfg)?;
        Ok(Self {
            claims: Arc::new(claims),
            api,
        })
    }
}
