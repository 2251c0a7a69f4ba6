//! History Store: the archive of past tailoring outcomes.
//!
//! Entries are inserted at the head (most recent first) and never reordered.
//! Only `is_favorite` and `is_downloaded` are mutable. Writes are serialized
//! through a single async lock so load-modify-store cycles never interleave.

pub mod handlers;
pub mod merge;
pub mod remote;
pub mod slot;

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::history::merge::merge_sources;
use crate::history::remote::RemoteHistory;
use crate::history::slot::HistorySlot;
use crate::models::history::{EntryMeta, HistoryEntry, TailorOutcome};

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("History entry {0} not found")]
    NotFound(Uuid),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryFlag {
    Favorite,
    Downloaded,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryScope {
    #[default]
    All,
    Favorites,
    Downloaded,
}

/// Search and filter options of the history view.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryFilter {
    /// Case-insensitive match against title or company.
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub filter: HistoryScope,
}

impl HistoryFilter {
    pub fn matches(&self, entry: &HistoryEntry) -> bool {
        let in_scope = match self.filter {
            HistoryScope::All => true,
            HistoryScope::Favorites => entry.is_favorite,
            HistoryScope::Downloaded => entry.is_downloaded,
        };
        let term = self
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .unwrap_or_default();
        in_scope
            && (term.is_empty()
                || entry.title.to_lowercase().contains(&term)
                || entry.company.to_lowercase().contains(&term))
    }
}

#[derive(Clone)]
pub struct HistoryStore {
    slot: Arc<dyn HistorySlot>,
    remote: Option<Arc<dyn RemoteHistory>>,
    write_lock: Arc<Mutex<()>>,
}

impl HistoryStore {
    pub fn new(slot: Arc<dyn HistorySlot>, remote: Option<Arc<dyn RemoteHistory>>) -> Self {
        Self {
            slot,
            remote,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Archives an outcome at the head of the list and returns the new entry.
    ///
    /// The entry is visible to `list` as soon as this returns. The remote copy
    /// is written best-effort afterwards.
    pub async fn append(
        &self,
        outcome: TailorOutcome,
        meta: EntryMeta,
    ) -> Result<HistoryEntry, HistoryError> {
        let entry = {
            let _guard = self.write_lock.lock().await;
            let mut entries = self.slot.load().await?;
            let mut entry = HistoryEntry::new(outcome, meta);
            while entries.iter().any(|e| e.id == entry.id) {
                entry.id = Uuid::now_v7();
            }
            entries.insert(0, entry.clone());
            self.slot.store(&entries).await?;
            entry
        };

        info!(
            id = %entry.id,
            match_score = entry.outcome.match_score,
            failed = entry.outcome.is_failure(),
            "Archived tailoring outcome"
        );

        if let Some(remote) = &self.remote {
            if let Err(e) = remote.insert(&entry).await {
                warn!(id = %entry.id, error = %e, "Failed to mirror history entry to remote source");
            }
        }

        Ok(entry)
    }

    /// All entries, most recent first. Falls back to the local slot alone when
    /// the remote source is unreachable.
    pub async fn list(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        let local = self.slot.load().await?;
        let Some(remote) = &self.remote else {
            return Ok(local);
        };
        match remote.fetch_all().await {
            Ok(remote_entries) => Ok(merge_sources(local, remote_entries)),
            Err(e) => {
                warn!(error = %e, "Remote history unavailable, listing local entries only");
                Ok(local)
            }
        }
    }

    pub async fn query(&self, filter: &HistoryFilter) -> Result<Vec<HistoryEntry>, HistoryError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|e| filter.matches(e))
            .collect())
    }

    pub async fn get(&self, id: Uuid) -> Result<HistoryEntry, HistoryError> {
        self.list()
            .await?
            .into_iter()
            .find(|e| e.id == id)
            .ok_or(HistoryError::NotFound(id))
    }

    pub async fn set_favorite(&self, id: Uuid, value: bool) -> Result<(), HistoryError> {
        self.set_flag(id, HistoryFlag::Favorite, value).await
    }

    pub async fn set_downloaded(&self, id: Uuid, value: bool) -> Result<(), HistoryError> {
        self.set_flag(id, HistoryFlag::Downloaded, value).await
    }

    /// Updates one flag on one entry. Local entries are updated in the slot;
    /// entries known only remotely are updated at the remote source.
    async fn set_flag(&self, id: Uuid, flag: HistoryFlag, value: bool) -> Result<(), HistoryError> {
        let found_locally = {
            let _guard = self.write_lock.lock().await;
            let mut entries = self.slot.load().await?;
            match entries.iter_mut().find(|e| e.id == id) {
                Some(entry) => {
                    match flag {
                        HistoryFlag::Favorite => entry.is_favorite = value,
                        HistoryFlag::Downloaded => entry.is_downloaded = value,
                    }
                    self.slot.store(&entries).await?;
                    true
                }
                None => false,
            }
        };

        match (&self.remote, found_locally) {
            (Some(remote), true) => {
                if let Err(e) = remote.set_flag(id, flag, value).await {
                    warn!(%id, ?flag, error = %e, "Failed to mirror flag update to remote source");
                }
                Ok(())
            }
            (Some(remote), false) => {
                if remote.set_flag(id, flag, value).await? {
                    Ok(())
                } else {
                    Err(HistoryError::NotFound(id))
                }
            }
            (None, true) => Ok(()),
            (None, false) => Err(HistoryError::NotFound(id)),
        }
    }
}
