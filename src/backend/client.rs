//! HTTP backend implementation

use super::error::SearchError;
use super::types::{
    ClarifyReply, ClarifyRequest, DigestRequest, ErrorReply, GrantItem, SearchQuery, SearchReply,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Upper bound on any round-trip; the agent-backed search can be slow.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// The three round-trips the orchestrator performs. A trait seam so tests
/// can run against queued canned responses.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Primary search: `POST /process-input`.
    async fn search(&self, query: &SearchQuery) -> Result<SearchReply, SearchError>;

    /// Clarification refinement: `POST /clarify`.
    async fn clarify(
        &self,
        query: &SearchQuery,
        choice: &str,
    ) -> Result<Vec<GrantItem>, SearchError>;

    /// Digest dispatch: `POST /send-email`.
    async fn send_digest(
        &self,
        email: &str,
        grants: &[GrantItem],
        filters: &SearchQuery,
    ) -> Result<(), SearchError>;
}

#[async_trait]
impl<T: SearchBackend + ?Sized> SearchBackend for Arc<T> {
    async fn search(&self, query: &SearchQuery) -> Result<SearchReply, SearchError> {
        (**self).search(query).await
    }

    async fn clarify(
        &self,
        query: &SearchQuery,
        choice: &str,
    ) -> Result<Vec<GrantItem>, SearchError> {
        (**self).clarify(query, choice).await
    }

    async fn send_digest(
        &self,
        email: &str,
        grants: &[GrantItem],
        filters: &SearchQuery,
    ) -> Result<(), SearchError> {
        (**self).send_digest(email, grants, filters).await
    }
}

/// Production backend over the Flask API.
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn post<B: Serialize + Sync, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, SearchError> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SearchError::server(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(classify_status(status.as_u16(), &text));
        }

        serde_json::from_str(&text)
            .map_err(|e| SearchError::server(format!("malformed response body: {e}")))
    }
}

#[async_trait]
impl SearchBackend for HttpBackend {
    async fn search(&self, query: &SearchQuery) -> Result<SearchReply, SearchError> {
        tracing::debug!(mode = ?query.mode, "issuing primary search");
        self.post("/process-input", query).await
    }

    async fn clarify(
        &self,
        query: &SearchQuery,
        choice: &str,
    ) -> Result<Vec<GrantItem>, SearchError> {
        tracing::debug!(choice, "issuing clarification refinement");
        let body = ClarifyRequest {
            original_query: query,
            clarification_choice: choice,
            mode: query.mode,
        };
        let reply: ClarifyReply = self.post("/clarify", &body).await?;
        Ok(reply.grants)
    }

    async fn send_digest(
        &self,
        email: &str,
        grants: &[GrantItem],
        filters: &SearchQuery,
    ) -> Result<(), SearchError> {
        tracing::debug!(count = grants.len(), "dispatching digest email");
        let body = DigestRequest {
            email,
            grants,
            filters,
        };
        let _: serde_json::Value = self.post("/send-email", &body).await?;
        Ok(())
    }
}

/// Map a transport-level failure to its classification.
fn transport_error(e: reqwest::Error) -> SearchError {
    if e.is_timeout() {
        SearchError::timeout(format!("request timed out: {e}"))
    } else if e.is_connect() {
        SearchError::connectivity(format!("could not reach the search service: {e}"))
    } else {
        SearchError::server(format!("request failed: {e}"))
    }
}

/// Non-2xx responses. The server puts a human-readable message under
/// `{"error": ...}` when it has one.
fn classify_status(status: u16, body: &str) -> SearchError {
    let detail = serde_json::from_str::<ErrorReply>(body)
        .ok()
        .filter(|e| !e.error.is_empty())
        .map_or_else(|| format!("HTTP {status}"), |e| e.error);
    SearchError::server(detail)
}
