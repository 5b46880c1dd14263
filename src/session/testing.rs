//! Test doubles for the runtime and property tests
//!
//! Queued canned responses instead of a live server, an in-memory store
//! instead of a file. Compiled only for tests.

use crate::backend::types::{GrantItem, SearchQuery, SearchReply};
use crate::backend::{SearchBackend, SearchError};
use crate::store::{PrefStore, SearchRecord, StoreError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Backend answering from queues, in order. An empty queue yields a server
/// error so a misconfigured test fails loudly instead of hanging.
#[derive(Default)]
pub struct MockBackend {
    search_replies: Mutex<VecDeque<Result<SearchReply, SearchError>>>,
    clarify_replies: Mutex<VecDeque<Result<Vec<GrantItem>, SearchError>>>,
    digest_replies: Mutex<VecDeque<Result<(), SearchError>>>,
    digest_recipients: Mutex<Vec<String>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_search(&self, reply: Result<SearchReply, SearchError>) {
        self.search_replies.lock().unwrap().push_back(reply);
    }

    pub fn queue_clarify(&self, reply: Result<Vec<GrantItem>, SearchError>) {
        self.clarify_replies.lock().unwrap().push_back(reply);
    }

    pub fn queue_digest(&self, reply: Result<(), SearchError>) {
        self.digest_replies.lock().unwrap().push_back(reply);
    }

    pub fn digest_recipients(&self) -> Vec<String> {
        self.digest_recipients.lock().unwrap().clone()
    }
}

fn exhausted(what: &str) -> SearchError {
    SearchError::server(format!("mock backend: no queued {what} reply"))
}

#[async_trait]
impl SearchBackend for MockBackend {
    async fn search(&self, _query: &SearchQuery) -> Result<SearchReply, SearchError> {
        self.search_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(exhausted("search")))
    }

    async fn clarify(
        &self,
        _query: &SearchQuery,
        _choice: &str,
    ) -> Result<Vec<GrantItem>, SearchError> {
        self.clarify_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(exhausted("clarify")))
    }

    async fn send_digest(
        &self,
        email: &str,
        _grants: &[GrantItem],
        _filters: &SearchQuery,
    ) -> Result<(), SearchError> {
        self.digest_recipients
            .lock()
            .unwrap()
            .push(email.to_string());
        self.digest_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(exhausted("digest")))
    }
}

/// Mock whose search holds until the test releases the gate, for exercising
/// supersede-while-in-flight races.
#[derive(Default)]
pub struct GatedBackend {
    inner: MockBackend,
    gate: Arc<Notify>,
}

impl GatedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_search(&self, reply: Result<SearchReply, SearchError>) {
        self.inner.queue_search(reply);
    }

    pub fn gate(&self) -> Arc<Notify> {
        Arc::clone(&self.gate)
    }
}

#[async_trait]
impl SearchBackend for GatedBackend {
    async fn search(&self, query: &SearchQuery) -> Result<SearchReply, SearchError> {
        self.gate.notified().await;
        self.inner.search(query).await
    }

    async fn clarify(
        &self,
        query: &SearchQuery,
        choice: &str,
    ) -> Result<Vec<GrantItem>, SearchError> {
        self.inner.clarify(query, choice).await
    }

    async fn send_digest(
        &self,
        email: &str,
        grants: &[GrantItem],
        filters: &SearchQuery,
    ) -> Result<(), SearchError> {
        self.inner.send_digest(email, grants, filters).await
    }
}

#[derive(Default)]
struct MemoryData {
    history: Vec<SearchRecord>,
    saved_grants: Vec<GrantItem>,
    digest_email: Option<String>,
    last_filters: Option<SearchQuery>,
}

/// In-memory [`PrefStore`].
#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<MemoryData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PrefStore for MemoryStore {
    async fn record_search(&self, record: SearchRecord) -> Result<(), StoreError> {
        self.data.lock().unwrap().history.insert(0, record);
        Ok(())
    }

    async fn history(&self) -> Result<Vec<SearchRecord>, StoreError> {
        Ok(self.data.lock().unwrap().history.clone())
    }

    async fn save_grant(&self, grant: GrantItem) -> Result<(), StoreError> {
        let mut data = self.data.lock().unwrap();
        data.saved_grants.retain(|g| g.id != grant.id);
        data.saved_grants.insert(0, grant);
        Ok(())
    }

    async fn unsave_grant(&self, id: &str) -> Result<(), StoreError> {
        self.data.lock().unwrap().saved_grants.retain(|g| g.id != id);
        Ok(())
    }

    async fn saved_grants(&self) -> Result<Vec<GrantItem>, StoreError> {
        Ok(self.data.lock().unwrap().saved_grants.clone())
    }

    async fn digest_email(&self) -> Result<Option<String>, StoreError> {
        Ok(self.data.lock().unwrap().digest_email.clone())
    }

    async fn set_digest_email(&self, email: Option<String>) -> Result<(), StoreError> {
        self.data.lock().unwrap().digest_email = email;
        Ok(())
    }

    async fn last_filters(&self) -> Result<Option<SearchQuery>, StoreError> {
        Ok(self.data.lock().unwrap().last_filters.clone())
    }

    async fn set_last_filters(&self, query: &SearchQuery) -> Result<(), StoreError> {
        self.data.lock().unwrap().last_filters = Some(query.clone());
        Ok(())
    }
}
