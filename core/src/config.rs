//! Client configuration.

use serde::{Deserialize, Serialize};

use crate::session::TOKEN_KEY;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/api";

/// Environment variable overriding the API base URL.
pub const BASE_URL_ENV: &str = "GAMEHUB_API_URL";

/// Where the backend lives and which storage key holds the session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
    #[serde(default = "default_token_key")]
    pub token_key: String,
}

fn default_token_key() -> String {
    TOKEN_KEY.to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token_key: default_token_key(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    /// Defaults, with the base URL taken from `GAMEHUB_API_URL` when set and
    /// non-empty.
    pub fn from_env() -> Self {
        match std::env::var(BASE_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => Self::new(url.trim()),
            _ => Self::default(),
        }
    }
}
