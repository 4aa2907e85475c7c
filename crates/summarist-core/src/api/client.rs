//! HTTP client for the book catalog cloud functions.
//!
//! Every call is a single GET with a bounded timeout. Nothing is retried here;
//! callers decide whether to ask again.

use std::time::Duration;

use reqwest::{header, Client, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::models::{Book, BookStatus, BookSummary};

use super::{ApiError, BookApi};

// ============================================================================
// Constants
// ============================================================================

/// Base URL for the catalog endpoints
pub const DEFAULT_API_BASE_URL: &str = "https://us-central1-summaristt.cloudfunctions.net";

/// HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 8;

/// API client for the book catalog.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    timeout_secs: u64,
}

impl ApiClient {
    /// Create a client against the default catalog with the default timeout
    pub fn new() -> Result<Self, ApiError> {
        Self::with_base_url(DEFAULT_API_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS)
    }

    pub fn with_base_url(base_url: &str, timeout_secs: u64) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, name: &str, params: &[(&str, &str)]) -> Result<Url, ApiError> {
        let raw = format!("{}/{}", self.base_url, name);
        Url::parse_with_params(&raw, params)
            .map_err(|e| ApiError::InvalidResponse(format!("Bad endpoint URL {}: {}", raw, e)))
    }

    fn map_send_error(&self, e: reqwest::Error) -> ApiError {
        if e.is_timeout() {
            ApiError::Timeout(self.timeout_secs)
        } else {
            ApiError::NetworkError(e)
        }
    }

    /// Send a GET and return the body text of a successful response.
    async fn get_text(&self, url: Url) -> Result<String, ApiError> {
        debug!(url = %url, "GET");
        let response = self
            .client
            .get(url.clone())
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_send_error(e))?;
        if !status.is_success() {
            warn!(url = %url, status = %status, "Catalog request failed");
            return Err(ApiError::from_status(status, &body));
        }
        Ok(body)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let body = self.get_text(url.clone()).await?;
        serde_json::from_str(&body).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", url, e))
        })
    }

    /// The lookup endpoint answers unknown ids with 200 and an empty body.
    fn is_empty_body(body: &str) -> bool {
        matches!(body.trim(), "" | "null" | "{}")
    }
}

impl BookApi for ApiClient {
    async fn fetch_book(&self, id: &str) -> Result<Book, ApiError> {
        let url = self.endpoint("getBook", &[("id", id)])?;
        let body = self.get_text(url).await?;
        if Self::is_empty_body(&body) {
            return Err(ApiError::NotFound(id.to_string()));
        }
        serde_json::from_str(&body)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse book {}: {}", id, e)))
    }

    async fn search_books(&self, text: &str) -> Result<Vec<BookSummary>, ApiError> {
        let url = self.endpoint("getBooksByAuthorOrTitle", &[("search", text)])?;
        self.get(url).await
    }

    async fn fetch_books(&self, status: BookStatus) -> Result<Vec<Book>, ApiError> {
        let url = self.endpoint("getBooks", &[("status", status.as_str())])?;
        self.get(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_encodes_params() {
        let api = ApiClient::with_base_url("https://example.com/fn/", 8).unwrap();
        assert_eq!(api.base_url(), "https://example.com/fn");

        let url = api
            .endpoint("getBooksByAuthorOrTitle", &[("search", "rich dad & poor")])
            .unwrap();
        assert_eq!(url.path(), "/fn/getBooksByAuthorOrTitle");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs, vec![("search".to_string(), "rich dad & poor".to_string())]);
    }

    #[test]
    fn test_is_empty_body() {
        assert!(ApiClient::is_empty_body(""));
        assert!(ApiClient::is_empty_body("  null "));
        assert!(ApiClient::is_empty_body("{}"));
        assert!(!ApiClient::is_empty_body(r#"{"id":"x"}"#));
    }

    #[test]
    fn test_default_client() {
        let api = ApiClient::new().unwrap();
        assert_eq!(api.base_url(), DEFAULT_API_BASE_URL);
        assert_eq!(api.timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    }
}
