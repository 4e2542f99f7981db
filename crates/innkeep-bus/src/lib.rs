// SPDX-FileCopyrightText: 2026 Innkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Internal typed event bus for the Innkeep messaging engine.
//!
//! Storage writers publish domain events after the row is durable;
//! subscribers (unread aggregator, gateway push, future consumers) react
//! without coupling to the writer. Delivery is best-effort broadcast: a
//! slow subscriber that laps the ring buffer misses events, which is why
//! every consumer recomputes from durable state instead of trusting event
//! payloads to be complete.

use innkeep_core::{Channel, DeliveryStatus, MessageId, ReservationId, ThreadId};
use tokio::sync::broadcast;
use tracing::trace;

/// Buffered events per subscriber before the oldest are dropped.
const BUS_CAPACITY: usize = 256;

/// Something happened to durable state.
#[derive(Debug, Clone)]
pub enum DomainEvent {
    /// A reservation row was created or its dates/status changed.
    ReservationChanged { reservation_id: ReservationId },
    /// A message row was persisted (either direction).
    MessageStored {
        thread_id: ThreadId,
        message_id: MessageId,
    },
    /// A delivery row moved forward.
    DeliveryUpdated {
        message_id: MessageId,
        channel: Channel,
        status: DeliveryStatus,
    },
    /// Scheduled rows for a reservation were created, cancelled, or sent.
    ScheduleChanged { reservation_id: ReservationId },
    /// Unread counts were recomputed.
    UnreadChanged { thread_id: ThreadId, unread: u64 },
}

/// Cloneable handle to the process-wide event bus.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<DomainEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self { tx }
    }

    /// Publish an event. Publishing with no live subscribers is a no-op.
    pub fn publish(&self, event: DomainEvent) {
        trace!(?event, "bus publish");
        let _ = self.tx.send(event);
    }

    /// Subscribe to all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.tx.subscribe()
    }

    /// Number of live subscribers, used by doctor checks.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
