// SPDX-FileCopyrightText: 2026 Innkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Innkeep messaging engine.
//!
//! Exposes provider webhooks, automation control endpoints, and unread
//! queries over axum. Everything under `/v1` sits behind bearer-token
//! auth (fail-closed); `/health` is public for process supervisors.
//!
//! Handlers are thin: they parse, call into `innkeep-storage` /
//! `innkeep-automation`, and map `InnkeepError` onto HTTP statuses. All
//! durable writes publish domain events on the bus so the unread
//! aggregator and other subscribers stay current.

pub mod auth;
pub mod handlers;
pub mod server;

pub use auth::AuthConfig;
pub use server::{build_router, start_server, GatewayState, ServerConfig};
