// SPDX-FileCopyrightText: 2026 Innkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Unread aggregator: recomputes per-thread unread counts on message and
//! delivery events.
//!
//! Counts always come from durable rows, never from event payload
//! arithmetic, so lagged or out-of-order events cannot drift the totals;
//! the worst case is an extra recompute.

use std::sync::Arc;

use innkeep_bus::{DomainEvent, EventBus};
use innkeep_core::{InnkeepError, ThreadId};
use innkeep_storage::database::Database;
use innkeep_storage::queries::messages;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// React to one domain event, publishing `UnreadChanged` when a thread's
/// count may have moved.
async fn handle_event(
    db: &Database,
    bus: &EventBus,
    event: DomainEvent,
) -> Result<(), InnkeepError> {
    let thread_id = match event {
        DomainEvent::MessageStored { thread_id, .. } => thread_id.0,
        DomainEvent::DeliveryUpdated { message_id, .. } => {
            match messages::get_message(db, &message_id.0).await? {
                Some(msg) => msg.thread_id,
                None => return Ok(()),
            }
        }
        _ => return Ok(()),
    };

    let unread = messages::unread_count_for_thread(db, &thread_id).await?;
    bus.publish(DomainEvent::UnreadChanged {
        thread_id: ThreadId(thread_id),
        unread,
    });
    Ok(())
}

/// Run the aggregator until `cancel` fires or the bus closes.
pub async fn run_unread_aggregator(db: Arc<Database>, bus: EventBus, cancel: CancellationToken) {
    let mut rx = bus.subscribe();
    debug!("unread aggregator started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            event = rx.recv() => match event {
                Ok(event) => {
                    if let Err(e) = handle_event(&db, &bus, event).await {
                        warn!(error = %e, "unread recompute failed");
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // recompute is durable-state-based, so missed events
                    // only delay the next update
                    warn!(skipped, "unread aggregator lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
    debug!("unread aggregator stopped");
}
