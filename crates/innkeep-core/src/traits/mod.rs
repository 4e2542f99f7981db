// SPDX-FileCopyrightText: 2026 Innkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions at Innkeep's external seams.
//!
//! Implementations use `#[async_trait]` for dynamic dispatch compatibility;
//! the dispatch sweep and gateway hold `Arc<dyn ...>` handles.

pub mod blob;
pub mod channel;

pub use blob::BlobStore;
pub use channel::ChannelSender;
