// SPDX-FileCopyrightText: 2026 Innkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-channel delivery lifecycle for outbound and inbound messages.
//!
//! Each (message, channel) pair owns one delivery row that moves strictly
//! forward through `queued -> sent -> delivered -> read`, with `failed`
//! reachable only from `queued` or `sent`. [`DeliveryStatus::can_transition`]
//! is the single authority on legal moves; storage re-checks it inside the
//! write transaction so replayed webhooks and late mark-read calls become
//! no-ops instead of regressions.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Delivery status of a message on one channel.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Queued,
    Sent,
    Delivered,
    Read,
    Failed,
}

impl DeliveryStatus {
    /// Position in the forward progression. `Failed` sits outside it.
    fn rank(self) -> Option<u8> {
        match self {
            DeliveryStatus::Queued => Some(0),
            DeliveryStatus::Sent => Some(1),
            DeliveryStatus::Delivered => Some(2),
            DeliveryStatus::Read => Some(3),
            DeliveryStatus::Failed => None,
        }
    }

    /// Whether no further transitions are possible from this status.
    pub fn is_terminal(self) -> bool {
        matches!(self, DeliveryStatus::Read | DeliveryStatus::Failed)
    }

    /// Whether moving from `self` to `to` is a legal transition.
    ///
    /// Forward moves may skip intermediate states (an in-app message goes
    /// `queued -> delivered` in one write; a provider may report `read`
    /// without ever reporting `delivered`). Failed deliveries are terminal
    /// and are never retried in place; a re-dispatch creates a new row.
    pub fn can_transition(self, to: DeliveryStatus) -> bool {
        match (self.rank(), to.rank()) {
            (Some(from), Some(to)) => to > from,
            // failed only from queued or sent
            (Some(from), None) => from <= 1,
            (None, _) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ALL: [DeliveryStatus; 5] = [
        DeliveryStatus::Queued,
        DeliveryStatus::Sent,
        DeliveryStatus::Delivered,
        DeliveryStatus::Read,
        DeliveryStatus::Failed,
    ];

    #[test]
    fn forward_progression_is_legal() {
        assert!(DeliveryStatus::Queued.can_transition(DeliveryStatus::Sent));
        assert!(DeliveryStatus::Sent.can_transition(DeliveryStatus::Delivered));
        assert!(DeliveryStatus::Delivered.can_transition(DeliveryStatus::Read));
    }

    #[test]
    fn forward_skips_are_legal() {
        assert!(DeliveryStatus::Queued.can_transition(DeliveryStatus::Delivered));
        assert!(DeliveryStatus::Queued.can_transition(DeliveryStatus::Read));
        assert!(DeliveryStatus::Sent.can_transition(DeliveryStatus::Read));
    }

    #[test]
    fn regressions_are_illegal() {
        assert!(!DeliveryStatus::Read.can_transition(DeliveryStatus::Delivered));
        assert!(!DeliveryStatus::Delivered.can_transition(DeliveryStatus::Sent));
        assert!(!DeliveryStatus::Sent.can_transition(DeliveryStatus::Queued));
    }

    #[test]
    fn self_transition_is_illegal() {
        for status in ALL {
            assert!(!status.can_transition(status));
        }
    }

    #[test]
    fn failed_only_from_queued_or_sent() {
        assert!(DeliveryStatus::Queued.can_transition(DeliveryStatus::Failed));
        assert!(DeliveryStatus::Sent.can_transition(DeliveryStatus::Failed));
        assert!(!DeliveryStatus::Delivered.can_transition(DeliveryStatus::Failed));
        assert!(!DeliveryStatus::Read.can_transition(DeliveryStatus::Failed));
    }

    #[test]
    fn terminal_states_allow_nothing() {
        for to in ALL {
            assert!(!DeliveryStatus::Read.can_transition(to) || to == DeliveryStatus::Read);
            assert!(!DeliveryStatus::Failed.can_transition(to));
        }
        // read is terminal outright: even "read -> read" is rejected
        assert!(!DeliveryStatus::Read.can_transition(DeliveryStatus::Read));
        assert!(DeliveryStatus::Read.is_terminal());
        assert!(DeliveryStatus::Failed.is_terminal());
        assert!(!DeliveryStatus::Delivered.is_terminal());
    }

    proptest! {
        /// Applying any sequence of attempted transitions (illegal ones
        /// rejected, as storage does) never moves a delivery backwards.
        #[test]
        fn status_never_regresses(attempts in proptest::collection::vec(0usize..5, 0..32)) {
            let mut current = DeliveryStatus::Queued;
            let mut high_water = 0u8;
            for idx in attempts {
                let to = ALL[idx];
                if current.can_transition(to) {
                    current = to;
                }
                if let Some(rank) = current.rank() {
                    prop_assert!(rank >= high_water);
                    high_water = rank;
                } else {
                    // failed: terminal, nothing may follow
                    for to in ALL {
                        prop_assert!(!current.can_transition(to));
                    }
                }
            }
        }
    }
}
