use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::location::SearchError;

pub const MAX_URL_LENGTH: usize = 2048;
pub const SEARCH_PATH: &str = "v1/search";

/// Response type the search request resolves with.
pub type SearchHttpResult = crux_http::Result<crux_http::Response<Vec<u8>>>;

#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpError {
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Base URL of the place-name service, validated once at configuration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchEndpoint {
    base: Url,
}

impl SearchEndpoint {
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let invalid = |reason: &str| HttpError::InvalidUrl {
            url: truncate_url(base),
            reason: reason.to_string(),
        };

        if base.trim().is_empty() {
            return Err(invalid("URL cannot be empty"));
        }
        if base.len() > MAX_URL_LENGTH {
            return Err(invalid("URL is too long"));
        }

        let mut parsed = Url::parse(base).map_err(|e| invalid(&e.to_string()))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(invalid("only 'http' and 'https' are allowed"));
        }
        if parsed.host_str().is_none() {
            return Err(invalid("URL must have a host"));
        }
        if parsed.cannot_be_a_base() {
            return Err(invalid("URL cannot be used as a base"));
        }

        // `Url::join` replaces the last segment unless the path ends in '/'.
        if !parsed.path().ends_with('/') {
            let path = format!("{}/", parsed.path());
            parsed.set_path(&path);
        }
        parsed.set_query(None);
        parsed.set_fragment(None);

        Ok(Self { base: parsed })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// `{base}/v1/search?name=<query>&count=<limit>`
    pub fn search_url(&self, query: &str, limit: u32) -> Url {
        let mut url = self
            .base
            .join(SEARCH_PATH)
            .unwrap_or_else(|_| self.base.clone());
        url.query_pairs_mut()
            .append_pair("name", query)
            .append_pair("count", &limit.to_string());
        url
    }
}

/// Body bytes of a successful search response. Non-2xx statuses and
/// transport failures become a [`SearchError`]; a success with no body
/// yields an empty body.
pub fn search_body(result: SearchHttpResult) -> Result<Vec<u8>, SearchError> {
    match result {
        Ok(mut response) => {
            let status = response.status();
            if status.is_success() {
                Ok(response.take_body().unwrap_or_default())
            } else {
                Err(SearchError::Status(u16::from(status)))
            }
        }
        Err(e) => Err(SearchError::Transport(e.to_string())),
    }
}

fn truncate_url(url: &str) -> String {
    if url.len() <= 100 {
        url.to_string()
    } else {
        let cut = (0..=100).rev().find(|&i| url.is_char_boundary(i)).unwrap_or(0);
        format!("{}...", &url[..cut])
    }
}
