// SPDX-FileCopyrightText: 2026 Innkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Blob store trait for message attachments.

use async_trait::async_trait;

use crate::error::InnkeepError;

/// Content-addressable storage for attachment payloads.
///
/// Messages persist only the URL returned by `upload`; the bytes live in
/// the blob store.
#[async_trait]
pub trait BlobStore: Send + Sync + 'static {
    /// Store `bytes` under a store-chosen key derived from `name`.
    ///
    /// Returns a stable URL for the stored blob.
    async fn upload(&self, name: &str, bytes: Vec<u8>) -> Result<String, InnkeepError>;

    /// Remove a previously uploaded blob. Removing an unknown URL is an error.
    async fn delete(&self, url: &str) -> Result<(), InnkeepError>;
}
