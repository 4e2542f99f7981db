// SPDX-FileCopyrightText: 2026 Innkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared test doubles and fixtures for Innkeep crates.
//!
//! Downstream crates use [`MockSender`] in place of real channel transports
//! and the `fixtures` module to seed temp databases with the usual
//! reservation graph.

pub mod fixtures;
pub mod mock_sender;

pub use fixtures::temp_db;
pub use mock_sender::MockSender;
