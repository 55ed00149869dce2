//! JSON document store for simulator snapshots, keyed by user id.
//!
//! Layout: `{root}/user={USER_ID}/simulator.json` plus a `meta.json` sidecar.
//!
//! Semantics: whole-document replace-or-insert per user; partial updates are
//! not supported. Writes are atomic (write to .tmp, rename into place).
//! Independent users never share state.

use crate::engine::SimulatorSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid user id: {0:?}")]
    InvalidUserId(String),
}

/// Metadata sidecar written next to each document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreMeta {
    pub user_id: String,
    pub saved_at: DateTime<Utc>,
    /// BLAKE3 hex hash of the document bytes.
    pub data_hash: String,
    pub order_count: usize,
    pub trade_count: usize,
}

/// Filesystem-backed document store.
pub struct DocumentStore {
    root: PathBuf,
}

impl DocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn user_dir(&self, user_id: &str) -> PathBuf {
        self.root.join(format!("user={user_id}"))
    }

    fn document_path(&self, user_id: &str) -> PathBuf {
        self.user_dir(user_id).join("simulator.json")
    }

    fn meta_path(&self, user_id: &str) -> PathBuf {
        self.user_dir(user_id).join("meta.json")
    }

    /// User ids become path components; reject anything that could escape.
    fn validate_user_id(user_id: &str) -> Result<(), StoreError> {
        let ok = !user_id.is_empty()
            && user_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.');
        if !ok || user_id.starts_with('.') {
            return Err(StoreError::InvalidUserId(user_id.to_string()));
        }
        Ok(())
    }

    /// Save a snapshot for a user, replacing any existing document.
    pub fn save(&self, user_id: &str, snapshot: &SimulatorSnapshot) -> Result<(), StoreError> {
        Self::validate_user_id(user_id)?;
        let dir = self.user_dir(user_id);
        fs::create_dir_all(&dir)?;

        let json = serde_json::to_vec_pretty(snapshot)?;
        let path = self.document_path(user_id);
        let tmp_path = path.with_extension("json.tmp");

        fs::write(&tmp_path, &json)?;
        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            StoreError::Io(e)
        })?;

        let meta = StoreMeta {
            user_id: user_id.to_string(),
            saved_at: Utc::now(),
            data_hash: blake3::hash(&json).to_hex().to_string(),
            order_count: snapshot.orders.len(),
            trade_count: snapshot.trades.len(),
        };
        fs::write(self.meta_path(user_id), serde_json::to_vec_pretty(&meta)?)?;

        Ok(())
    }

    /// Load a user's snapshot. Returns None if the user has no document.
    pub fn load(&self, user_id: &str) -> Result<Option<SimulatorSnapshot>, StoreError> {
        Self::validate_user_id(user_id)?;
        let path = self.document_path(user_id);
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path)?;
        let snapshot = serde_json::from_str(&json)?;
        Ok(Some(snapshot))
    }

    /// Load a user's metadata sidecar, if present.
    pub fn load_meta(&self, user_id: &str) -> Result<Option<StoreMeta>, StoreError> {
        Self::validate_user_id(user_id)?;
        let path = self.meta_path(user_id);
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path)?;
        let meta = serde_json::from_str(&json)?;
        Ok(Some(meta))
    }

    /// Delete a user's document. Returns false if there was nothing to delete.
    pub fn delete(&self, user_id: &str) -> Result<bool, StoreError> {
        Self::validate_user_id(user_id)?;
        let dir = self.user_dir(user_id);
        if !dir.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&dir)?;
        Ok(true)
    }

    /// List every user id with a stored document.
    pub fn list_users(&self) -> Result<Vec<String>, StoreError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut users = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(user_id) = name.strip_prefix("user=") {
                if entry.path().join("simulator.json").exists() {
                    users.push(user_id.to_string());
                }
            }
        }
        users.sort();
        Ok(users)
    }
}
