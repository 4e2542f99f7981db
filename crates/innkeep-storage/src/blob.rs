// SPDX-FileCopyrightText: 2026 Innkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filesystem-backed blob store for message attachments.
//!
//! Blobs are written under a flat directory keyed by a fresh UUID plus the
//! sanitized original extension; the returned URL is `file://` plus the
//! absolute path.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use innkeep_core::{BlobStore, InnkeepError};
use tracing::debug;
use uuid::Uuid;

/// Blob store that writes each upload to its own file under `root`.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Create a store rooted at `root`, creating the directory if needed.
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self, InnkeepError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(InnkeepError::storage)?;
        Ok(Self { root })
    }

    fn path_for_url<'a>(&self, url: &'a str) -> Result<&'a Path, InnkeepError> {
        let path = url
            .strip_prefix("file://")
            .ok_or_else(|| InnkeepError::Validation(format!("not a file URL: {url}")))?;
        let path = Path::new(path);
        if !path.starts_with(&self.root) {
            return Err(InnkeepError::Validation(format!(
                "URL outside blob root: {url}"
            )));
        }
        Ok(path)
    }
}

/// Extension of `name`, restricted to short alphanumeric suffixes.
fn safe_extension(name: &str) -> Option<&str> {
    let ext = Path::new(name).extension()?.to_str()?;
    (ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric())).then_some(ext)
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn upload(&self, name: &str, bytes: Vec<u8>) -> Result<String, InnkeepError> {
        let key = match safe_extension(name) {
            Some(ext) => format!("{}.{ext}", Uuid::new_v4()),
            None => Uuid::new_v4().to_string(),
        };
        let path = self.root.join(&key);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(InnkeepError::storage)?;
        debug!(name, key, "blob stored");
        Ok(format!("file://{}", path.display()))
    }

    async fn delete(&self, url: &str) -> Result<(), InnkeepError> {
        let path = self.path_for_url(url)?;
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(InnkeepError::NotFound {
                entity: "blob",
                id: url.to_string(),
            }),
            Err(e) => Err(InnkeepError::storage(e)),
        }
    }
}
