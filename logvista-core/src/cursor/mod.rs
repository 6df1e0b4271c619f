//! Durable per-site scan positions.
//!
//! The whole map is one JSON document rewritten atomically after each pass, so a
//! crash leaves either the previous or the new state on disk, never a mix.


use crate::site::SiteId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanCursor {
    /// Bytes of the current file already ingested.
    #[serde(rename = "last_offset")]
    pub offset: u64,
    /// File size observed at the last scan. A smaller size means rotation.
    #[serde(rename = "last_size")]
    pub size: u64,
    pub last_scan: DateTime<Utc>,
}

impl ScanCursor {
    pub fn fresh() -> Self {
        Self {
            offset: 0,
            size: 0,
            last_scan: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

#[derive(Debug, Error)]
pub enum CursorError {
    #[error("failed to read cursor file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cursor file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write cursor file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode cursors: {0}")]
    Encode(#[from] serde_json::Error),
}

pub struct CursorStore {
    path: PathBuf,
    cursors: RwLock<BTreeMap<SiteId, ScanCursor>>,
}

impl CursorStore {
    /// A missing file is an empty store. An unreadable or unparseable one is an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CursorError> {
        let path = path.into();

        let cursors = match std::fs::read(&path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| CursorError::Corrupt {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no cursor file, starting empty");
                BTreeMap::new()
            }
            Err(source) => return Err(CursorError::Read { path, source }),
        };

        Ok(Self {
            path,
            cursors: RwLock::new(cursors),
        })
    }

    /// Unknown sites get a fresh cursor. It only becomes durable once advanced and persisted.
    pub fn cursor_for(&self, site: &SiteId) -> ScanCursor {
        self.cursors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(site)
            .copied()
            .unwrap_or_else(ScanCursor::fresh)
    }

    pub fn advance(&self, site: &SiteId, offset: u64, size: u64, now: DateTime<Utc>) {
        let cursor = ScanCursor {
            offset: offset.min(size),
            size,
            last_scan: now,
        };
        self.cursors
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(site.clone(), cursor);
    }

    pub fn snapshot(&self) -> BTreeMap<SiteId, ScanCursor> {
        self.cursors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Writes a temp file next to the target, then renames it over the target.
    pub fn persist_all(&self) -> Result<(), CursorError> {
        // Snapshot first so the lock is released before any I/O.
        let encoded = serde_json::to_vec_pretty(&self.snapshot())?;

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let write_err = |source| CursorError::Write {
            path: self.path.clone(),
            source,
        };

        std::fs::create_dir_all(&dir).map_err(write_err)?;
        let mut tmp = NamedTempFile::new_in(&dir).map_err(write_err)?;
        tmp.write_all(&encoded).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;

        debug!(path = %self.path.display(), "cursors persisted");
        Ok(())
    }
}
