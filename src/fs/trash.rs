use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, TreeError};
use crate::fs::node::NodeRef;
use crate::fs::operations;

/// Where a trashed entry came from and when it was trashed. Encoded into the
/// entry's file name inside the trash directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrashRecord {
    #[serde(rename = "p")]
    pub original_path: PathBuf,
    #[serde(rename = "t")]
    pub deleted_at: DateTime<Utc>,
}

impl TrashRecord {
    pub fn new(original_path: impl Into<PathBuf>) -> Self {
        Self {
            original_path: original_path.into(),
            deleted_at: Utc::now(),
        }
    }

    /// JSON, then URL-safe base64 without padding, so the token never
    /// contains a path separator.
    pub fn encode(&self) -> Result<String> {
        let json = serde_json::to_vec(self)
            .map_err(|e| TreeError::InvalidPath(format!("cannot encode trash record: {e}")))?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    pub fn decode(token: &str) -> Result<Self> {
        let json = URL_SAFE_NO_PAD.decode(token)?;
        Ok(serde_json::from_slice(&json)?)
    }
}

pub fn encode(original_path: &Path, deleted_at: DateTime<Utc>) -> Result<String> {
    TrashRecord {
        original_path: original_path.to_path_buf(),
        deleted_at,
    }
    .encode()
}

pub fn decode(token: &str) -> Result<TrashRecord> {
    TrashRecord::decode(token)
}

/// The trash directory and the soft-delete policy around it.
#[derive(Debug, Clone)]
pub struct Trash {
    dir: PathBuf,
}

impl Trash {
    /// Create the trash directory (with parents) and resolve it to an
    /// absolute path.
    pub fn ensure(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: fs::canonicalize(dir)?,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// True when the node lives directly inside the trash directory.
    pub fn contains(&self, node: NodeRef<'_>) -> bool {
        node.dirname() == self.dir
    }

    /// Display name: the recorded original path for trash entries, the
    /// plain name otherwise. Never fails.
    pub fn original_path_of(&self, node: NodeRef<'_>) -> String {
        if !self.contains(node) {
            return node.name().to_string();
        }
        match TrashRecord::decode(node.name()) {
            Ok(record) => record.original_path.to_string_lossy().to_string(),
            Err(err) => {
                warn!(name = node.name(), error = %err, "undecodable trash entry");
                node.name().to_string()
            }
        }
    }

    /// Move a node into the trash. Nodes already in the trash are left
    /// alone and `None` is returned.
    pub fn remove(&self, node: NodeRef<'_>) -> Result<Option<PathBuf>> {
        if self.contains(node) {
            info!(path = %node.path().display(), "already in trash, skipping");
            return Ok(None);
        }
        let original = node.path();
        let token = TrashRecord::new(&original).encode()?;
        let dest = self.dir.join(token);
        operations::move_to_path(&original, &dest)?;
        info!(from = %original.display(), to = %dest.display(), "moved to trash");
        Ok(Some(dest))
    }

    /// Move a trash entry back to its recorded path, creating missing parent
    /// directories. Nodes outside the trash are left alone and `None` is
    /// returned.
    pub fn restore(&self, node: NodeRef<'_>) -> Result<Option<PathBuf>> {
        if !self.contains(node) {
            info!(path = %node.path().display(), "not in trash, skipping restore");
            return Ok(None);
        }
        let record = TrashRecord::decode(node.name())?;
        let dest = record.original_path;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        operations::move_to_path(&node.path(), &dest)?;
        info!(to = %dest.display(), "restored from trash");
        Ok(Some(dest))
    }
}
