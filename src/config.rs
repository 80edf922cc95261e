//! Runtime configuration for the PokeAPI client and the list controller

use std::time::Duration;

/// Collection endpoint every request is built from.
pub const DEFAULT_BASE_ADDRESS: &str = "https://pokeapi.co/api/v2/pokemon";

/// Transport timeout applied to every request.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Items requested per page when the API does not say otherwise.
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// Upper bound accepted for `--page-size`.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Connection settings handed to [`crate::api::PokeApiClient`] at construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_address: String,
    pub timeout_ms: u64,
}

impl ApiConfig {
    pub fn new(base_address: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            base_address: base_address.into(),
            timeout_ms,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Base address without a trailing slash, ready for path appends.
    pub fn trimmed_base(&self) -> &str {
        self.base_address.trim_end_matches('/')
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_ADDRESS, DEFAULT_TIMEOUT_MS)
    }
}
