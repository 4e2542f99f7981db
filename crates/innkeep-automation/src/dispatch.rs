// SPDX-FileCopyrightText: 2026 Innkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dispatch sweep: claims due scheduled messages and sends them.
//!
//! Each tick claims due rows (claim-before-send, so concurrent sweeps
//! never double-dispatch) and settles every claimed row as sent or failed.
//! One slow or broken provider call affects only its own row.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use innkeep_bus::{DomainEvent, EventBus};
use innkeep_core::{
    Channel, ChannelSender, DeliveryStatus, InnkeepError, MessageDirection, MessageId,
    MessageOrigin, OutboundMessage, ThreadId,
};
use innkeep_storage::database::Database;
use innkeep_storage::models::{now_utc_string, Message, ScheduledMessage};
use innkeep_storage::queries::{deliveries, messages, reservations, rules, scheduled, templates, threads};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::template::{render, TemplateContext};

/// Channel senders keyed by the channel they serve.
#[derive(Default)]
pub struct SenderRegistry {
    senders: HashMap<Channel, Arc<dyn ChannelSender>>,
}

impl SenderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, sender: Arc<dyn ChannelSender>) {
        self.senders.insert(sender.channel(), sender);
    }

    pub fn get(&self, channel: Channel) -> Option<&Arc<dyn ChannelSender>> {
        self.senders.get(&channel)
    }

    pub fn channels(&self) -> Vec<Channel> {
        self.senders.keys().copied().collect()
    }
}

/// Claim and dispatch everything due right now. Returns the number of rows
/// settled (sent or failed) this tick.
pub async fn sweep_tick(
    db: &Database,
    bus: &EventBus,
    senders: &SenderRegistry,
    property_name: &str,
    limit: usize,
) -> Result<u32, InnkeepError> {
    let claimed = scheduled::claim_due(db, &now_utc_string(), limit).await?;
    if claimed.is_empty() {
        return Ok(0);
    }
    debug!(count = claimed.len(), "sweep: dispatching claimed rows");

    let mut settled = 0u32;
    for row in &claimed {
        match dispatch_one(db, bus, senders, property_name, row).await {
            Ok(()) => {
                scheduled::mark_sent(db, &row.id).await?;
                settled += 1;
            }
            Err(e) => {
                warn!(
                    scheduled_id = %row.id,
                    reservation_id = %row.reservation_id,
                    error = %e,
                    "sweep: dispatch failed"
                );
                scheduled::mark_failed(db, &row.id, &e.to_string()).await?;
                settled += 1;
            }
        }
    }

    // a batch can span reservations; signal each of them once
    let mut notified = HashSet::new();
    for row in &claimed {
        if notified.insert(row.reservation_id.as_str()) {
            bus.publish(DomainEvent::ScheduleChanged {
                reservation_id: innkeep_core::ReservationId(row.reservation_id.clone()),
            });
        }
    }
    Ok(settled)
}

/// Render, persist, and send one claimed row.
async fn dispatch_one(
    db: &Database,
    bus: &EventBus,
    senders: &SenderRegistry,
    property_name: &str,
    row: &ScheduledMessage,
) -> Result<(), InnkeepError> {
    let rule = rules::get_rule(db, &row.rule_id)
        .await?
        .ok_or(InnkeepError::NotFound {
            entity: "automation rule",
            id: row.rule_id.clone(),
        })?;
    let template = templates::get_template(db, &rule.template_id)
        .await?
        .ok_or(InnkeepError::NotFound {
            entity: "message template",
            id: rule.template_id.clone(),
        })?;
    let reservation = reservations::get_reservation(db, &row.reservation_id)
        .await?
        .ok_or(InnkeepError::NotFound {
            entity: "reservation",
            id: row.reservation_id.clone(),
        })?;

    let recipient = reservation.contact_for(rule.channel).ok_or_else(|| {
        InnkeepError::channel(format!(
            "reservation {} has no {} contact",
            reservation.id, rule.channel
        ))
    })?;
    let sender = rule
        .channel
        .has_transport()
        .then(|| senders.get(rule.channel))
        .map(|s| {
            s.ok_or_else(|| {
                InnkeepError::channel(format!("no sender configured for {}", rule.channel))
            })
        })
        .transpose()?;

    let body = render(
        &template.body,
        &TemplateContext {
            guest_name: &reservation.guest_name,
            check_in_date: reservation.check_in_date,
            check_out_date: reservation.check_out_date,
            property_name,
        },
    );

    let thread = threads::get_or_create_thread(db, &reservation.id).await?;
    let message_id = Uuid::new_v4().to_string();
    messages::insert_message(
        db,
        &Message {
            id: message_id.clone(),
            thread_id: thread.id.clone(),
            origin: MessageOrigin::System,
            direction: MessageDirection::Outgoing,
            channel: rule.channel,
            content: body.clone(),
            attachments: Vec::new(),
            reply_to_id: None,
            unsent: false,
            provider_event_id: None,
            created_at: now_utc_string(),
        },
    )
    .await?;
    deliveries::create_delivery(db, &Uuid::new_v4().to_string(), &message_id, rule.channel)
        .await?;
    bus.publish(DomainEvent::MessageStored {
        thread_id: ThreadId(thread.id.clone()),
        message_id: MessageId(message_id.clone()),
    });

    let Some(sender) = sender else {
        // in-app has no transport: the durable row is the delivery
        deliveries::advance(db, &message_id, rule.channel, DeliveryStatus::Delivered, None, None)
            .await?;
        bus.publish(DomainEvent::DeliveryUpdated {
            message_id: MessageId(message_id),
            channel: rule.channel,
            status: DeliveryStatus::Delivered,
        });
        return Ok(());
    };

    let outbound = OutboundMessage {
        message_id: MessageId(message_id.clone()),
        recipient,
        subject: Some(format!("Message from {property_name}")),
        body,
        attachments: Vec::new(),
    };
    match sender.send(&outbound).await {
        Ok(provider_message_id) => {
            deliveries::advance(
                db,
                &message_id,
                rule.channel,
                DeliveryStatus::Sent,
                None,
                provider_message_id,
            )
            .await?;
            bus.publish(DomainEvent::DeliveryUpdated {
                message_id: MessageId(message_id.clone()),
                channel: rule.channel,
                status: DeliveryStatus::Sent,
            });
            info!(
                message_id,
                channel = %rule.channel,
                reservation_id = %reservation.id,
                "message dispatched"
            );
            Ok(())
        }
        Err(e) => {
            deliveries::advance(
                db,
                &message_id,
                rule.channel,
                DeliveryStatus::Failed,
                Some(e.to_string()),
                None,
            )
            .await?;
            bus.publish(DomainEvent::DeliveryUpdated {
                message_id: MessageId(message_id),
                channel: rule.channel,
                status: DeliveryStatus::Failed,
            });
            Err(e)
        }
    }
}

/// Run the sweep until `cancel` fires.
#[allow(clippy::too_many_arguments)]
pub async fn run_sweep(
    db: Arc<Database>,
    bus: EventBus,
    senders: Arc<SenderRegistry>,
    property_name: String,
    interval: Duration,
    batch_size: usize,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    info!(interval_secs = interval.as_secs(), batch_size, "sweep loop started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                match sweep_tick(&db, &bus, &senders, &property_name, batch_size).await {
                    Ok(n) if n > 0 => info!(settled = n, "sweep tick"),
                    Ok(_) => {}
                    Err(e) => error!(error = %e, "sweep tick failed"),
                }
            }
        }
    }
    debug!("sweep loop stopped");
}
