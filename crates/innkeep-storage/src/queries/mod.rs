// SPDX-FileCopyrightText: 2026 Innkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for CRUD operations on storage entities.

pub mod deliveries;
pub mod messages;
pub mod reservations;
pub mod rules;
pub mod scheduled;
pub mod seasons;
pub mod templates;
pub mod threads;
pub mod webhooks;
