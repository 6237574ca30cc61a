use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capabilities::{HttpError, SearchEndpoint, DEFAULT_GEOLOCATION_TIMEOUT_MS};

pub const DEFAULT_SEARCH_BASE_URL: &str = "https://geocoding.airwatch.app";
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 300;
pub const DEFAULT_SEARCH_LIMIT: u32 = 8;
pub const DEFAULT_DATA_RADIUS_KM: u32 = 25;
pub const DEFAULT_DATA_RESULT_COUNT: u32 = 50;

/// Queries shorter than this never reach the network, whatever the config says.
pub const MIN_SEARCH_CHARS: usize = 2;
pub const MAX_SEARCH_LIMIT: u32 = 50;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("search base URL is invalid: {0}")]
    SearchBaseUrl(#[from] HttpError),
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
    #[error("search_limit {0} exceeds maximum of {MAX_SEARCH_LIMIT}")]
    SearchLimitTooLarge(u32),
}

/// Shell-provided tuning for the core. Every field is optional in JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub search_base_url: String,
    pub search_debounce_ms: u64,
    pub search_min_chars: usize,
    pub search_limit: u32,
    pub geolocation_timeout_ms: u64,
    pub data_radius_km: u32,
    pub data_result_count: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            search_base_url: DEFAULT_SEARCH_BASE_URL.to_string(),
            search_debounce_ms: DEFAULT_SEARCH_DEBOUNCE_MS,
            search_min_chars: MIN_SEARCH_CHARS,
            search_limit: DEFAULT_SEARCH_LIMIT,
            geolocation_timeout_ms: DEFAULT_GEOLOCATION_TIMEOUT_MS,
            data_radius_km: DEFAULT_DATA_RADIUS_KM,
            data_result_count: DEFAULT_DATA_RESULT_COUNT,
        }
    }
}

impl CoreConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.search_endpoint()?;
        for (field, value) in [
            ("search_debounce_ms", self.search_debounce_ms),
            ("search_limit", u64::from(self.search_limit)),
            ("geolocation_timeout_ms", self.geolocation_timeout_ms),
            ("data_radius_km", u64::from(self.data_radius_km)),
            ("data_result_count", u64::from(self.data_result_count)),
        ] {
            if value == 0 {
                return Err(ConfigError::Zero { field });
            }
        }
        if self.search_limit > MAX_SEARCH_LIMIT {
            return Err(ConfigError::SearchLimitTooLarge(self.search_limit));
        }
        Ok(())
    }

    pub fn search_endpoint(&self) -> Result<SearchEndpoint, ConfigError> {
        Ok(SearchEndpoint::new(&self.search_base_url)?)
    }

    pub fn min_search_chars(&self) -> usize {
        self.search_min_chars.max(MIN_SEARCH_CHARS)
    }
}
