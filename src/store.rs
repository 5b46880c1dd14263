//! Client-side preference store
//!
//! Bounded history, saved grants, the digest address, and last-used filters,
//! persisted as one JSON file. Single writer from the UI's perspective: only
//! the session runtime and result-view helpers touch it, never the
//! timer-driven components, so there is no transactional discipline here.

use crate::backend::types::{GrantItem, SearchQuery};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// Most recent search records kept.
pub const HISTORY_LIMIT: usize = 20;
/// Most saved grants kept.
pub const SAVED_LIMIT: usize = 50;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io: {0}")]
    Io(#[from] std::io::Error),
    #[error("store encoding: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// One past search, recorded when the session completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRecord {
    pub query: SearchQuery,
    pub submitted_at: DateTime<Utc>,
    pub result_count: usize,
}

/// Get/set interface over the persisted keys.
#[async_trait]
pub trait PrefStore: Send + Sync {
    async fn record_search(&self, record: SearchRecord) -> Result<(), StoreError>;
    async fn history(&self) -> Result<Vec<SearchRecord>, StoreError>;

    async fn save_grant(&self, grant: GrantItem) -> Result<(), StoreError>;
    async fn unsave_grant(&self, id: &str) -> Result<(), StoreError>;
    async fn saved_grants(&self) -> Result<Vec<GrantItem>, StoreError>;

    /// Digest address, present only when the user opted in.
    async fn digest_email(&self) -> Result<Option<String>, StoreError>;
    async fn set_digest_email(&self, email: Option<String>) -> Result<(), StoreError>;

    async fn last_filters(&self) -> Result<Option<SearchQuery>, StoreError>;
    async fn set_last_filters(&self, query: &SearchQuery) -> Result<(), StoreError>;
}

#[async_trait]
impl<T: PrefStore + ?Sized> PrefStore for std::sync::Arc<T> {
    async fn record_search(&self, record: SearchRecord) -> Result<(), StoreError> {
        (**self).record_search(record).await
    }

    async fn history(&self) -> Result<Vec<SearchRecord>, StoreError> {
        (**self).history().await
    }

    async fn save_grant(&self, grant: GrantItem) -> Result<(), StoreError> {
        (**self).save_grant(grant).await
    }

    async fn unsave_grant(&self, id: &str) -> Result<(), StoreError> {
        (**self).unsave_grant(id).await
    }

    async fn saved_grants(&self) -> Result<Vec<GrantItem>, StoreError> {
        (**self).saved_grants().await
    }

    async fn digest_email(&self) -> Result<Option<String>, StoreError> {
        (**self).digest_email().await
    }

    async fn set_digest_email(&self, email: Option<String>) -> Result<(), StoreError> {
        (**self).set_digest_email(email).await
    }

    async fn last_filters(&self) -> Result<Option<SearchQuery>, StoreError> {
        (**self).last_filters().await
    }

    async fn set_last_filters(&self, query: &SearchQuery) -> Result<(), StoreError> {
        (**self).set_last_filters(query).await
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreData {
    #[serde(default)]
    history: Vec<SearchRecord>,
    #[serde(default)]
    saved_grants: Vec<GrantItem>,
    #[serde(default)]
    digest_email: Option<String>,
    #[serde(default)]
    last_filters: Option<SearchQuery>,
}

/// JSON-file-backed store. The whole document is small (bounded lists), so
/// every mutation rewrites the file.
pub struct FileStore {
    path: PathBuf,
    data: Mutex<StoreData>,
}

impl FileStore {
    /// Open the store at `path`, creating parent directories as needed. A
    /// missing or unreadable file starts fresh rather than failing the app.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let data = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "discarding corrupt store file");
                StoreData::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreData::default(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut StoreData) -> R) -> Result<R, StoreError> {
        let mut data = self.data.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let result = f(&mut data);
        let raw = serde_json::to_string_pretty(&*data)?;
        std::fs::write(&self.path, raw)?;
        Ok(result)
    }

    fn read<R>(&self, f: impl FnOnce(&StoreData) -> R) -> R {
        let data = self.data.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&data)
    }
}

#[async_trait]
impl PrefStore for FileStore {
    async fn record_search(&self, record: SearchRecord) -> Result<(), StoreError> {
        self.mutate(|data| {
            data.history.insert(0, record);
            data.history.truncate(HISTORY_LIMIT);
        })
    }

    async fn history(&self) -> Result<Vec<SearchRecord>, StoreError> {
        Ok(self.read(|data| data.history.clone()))
    }

    async fn save_grant(&self, grant: GrantItem) -> Result<(), StoreError> {
        self.mutate(|data| {
            data.saved_grants.retain(|g| g.id != grant.id);
            data.saved_grants.insert(0, grant);
            data.saved_grants.truncate(SAVED_LIMIT);
        })
    }

    async fn unsave_grant(&self, id: &str) -> Result<(), StoreError> {
        self.mutate(|data| data.saved_grants.retain(|g| g.id != id))
    }

    async fn saved_grants(&self) -> Result<Vec<GrantItem>, StoreError> {
        Ok(self.read(|data| data.saved_grants.clone()))
    }

    async fn digest_email(&self) -> Result<Option<String>, StoreError> {
        Ok(self.read(|data| data.digest_email.clone()))
    }

    async fn set_digest_email(&self, email: Option<String>) -> Result<(), StoreError> {
        self.mutate(|data| data.digest_email = email)
    }

    async fn last_filters(&self) -> Result<Option<SearchQuery>, StoreError> {
        Ok(self.read(|data| data.last_filters.clone()))
    }

    async fn set_last_filters(&self, query: &SearchQuery) -> Result<(), StoreError> {
        self.mutate(|data| data.last_filters = Some(query.clone()))
    }
}
