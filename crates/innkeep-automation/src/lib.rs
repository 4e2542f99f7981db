// SPDX-FileCopyrightText: 2026 Innkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Automation engine for the Innkeep messaging workspace.
//!
//! Ties the pieces together: the [`clock`] resolves when a rule fires for a
//! reservation, the [`evaluator`] turns rules into scheduled-message rows,
//! the [`dispatch`] sweep claims due rows and pushes them through channel
//! senders, and the [`unread`] aggregator keeps per-thread unread counts
//! flowing over the event bus.

pub mod clock;
pub mod dispatch;
pub mod evaluator;
pub mod template;
pub mod unread;

pub use clock::{FireTime, PropertyClock};
pub use dispatch::{run_sweep, sweep_tick, SenderRegistry};
pub use evaluator::{cancel_for_reservation, evaluate_reservation, EvaluationSummary};
pub use unread::run_unread_aggregator;
