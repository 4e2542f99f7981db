// SPDX-FileCopyrightText: 2026 Innkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use innkeep_automation::{cancel_for_reservation, evaluate_reservation};
use innkeep_bus::DomainEvent;
use innkeep_core::{
    BlobStore, Channel, DeliveryStatus, InnkeepError, MessageDirection, MessageId, MessageOrigin,
    ThreadId,
};
use innkeep_storage::models::{now_utc_string, Message};
use innkeep_storage::queries::{deliveries, messages, reservations, scheduled, threads, webhooks};

use crate::server::GatewayState;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error description.
    pub error: String,
}

/// `InnkeepError` carried out of a handler, mapped onto an HTTP status.
pub struct ApiError(pub InnkeepError);

impl From<InnkeepError> for ApiError {
    fn from(err: InnkeepError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            InnkeepError::NotFound { .. } => StatusCode::NOT_FOUND,
            InnkeepError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            InnkeepError::Channel { .. } => StatusCode::BAD_GATEWAY,
            InnkeepError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// GET /health
///
/// Unauthenticated liveness probe for process supervisors.
pub async fn get_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Inbound webhook payload, tagged by shape.
///
/// Providers differ in framing but every event Innkeep consumes is one of
/// these two; anything else is rejected at the boundary with 422.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WebhookPayload {
    /// A guest wrote to us on some channel.
    NewMessage {
        event_id: String,
        reservation_id: String,
        channel: Channel,
        body: String,
        #[serde(default)]
        attachments: Vec<String>,
    },
    /// The provider reports progress on a message we sent.
    DeliveryReceipt {
        event_id: String,
        provider_message_id: String,
        status: DeliveryStatus,
    },
}

/// POST /v1/webhooks/{provider}
///
/// Duplicate `event_id`s are a 200 no-op: providers replay webhooks on
/// slow acks, and a non-2xx would only provoke more replays.
pub async fn post_webhook(
    State(state): State<GatewayState>,
    Path(provider): Path<String>,
    Json(raw): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let payload: WebhookPayload = serde_json::from_value(raw)
        .map_err(|e| InnkeepError::Validation(format!("unrecognized webhook payload: {e}")))?;

    match payload {
        WebhookPayload::NewMessage {
            event_id,
            reservation_id,
            channel,
            body,
            attachments,
        } => {
            reservations::get_reservation(&state.db, &reservation_id)
                .await?
                .ok_or_else(|| InnkeepError::NotFound {
                    entity: "reservation",
                    id: reservation_id.clone(),
                })?;

            if !webhooks::record_event(&state.db, &provider, &event_id).await? {
                return Ok(Json(serde_json::json!({ "status": "duplicate" })));
            }

            let attachments = mirror_attachments(&state, attachments).await;
            let thread = threads::get_or_create_thread(&state.db, &reservation_id).await?;
            let message = Message {
                id: uuid::Uuid::new_v4().to_string(),
                thread_id: thread.id.clone(),
                origin: MessageOrigin::Guest,
                direction: MessageDirection::Incoming,
                channel,
                content: body,
                attachments,
                reply_to_id: None,
                unsent: false,
                provider_event_id: Some(event_id),
                created_at: now_utc_string(),
            };
            messages::insert_message(&state.db, &message).await?;
            state.bus.publish(DomainEvent::MessageStored {
                thread_id: ThreadId(thread.id.clone()),
                message_id: MessageId(message.id.clone()),
            });
            info!(provider, thread_id = %thread.id, message_id = %message.id, "webhook message stored");

            Ok(Json(serde_json::json!({
                "status": "stored",
                "message_id": message.id,
                "thread_id": thread.id,
            })))
        }
        WebhookPayload::DeliveryReceipt {
            event_id,
            provider_message_id,
            status,
        } => {
            if !webhooks::record_event(&state.db, &provider, &event_id).await? {
                return Ok(Json(serde_json::json!({ "status": "duplicate" })));
            }

            // Receipts can arrive for messages sent before the provider was
            // wired into Innkeep; unmatched ones are acknowledged and dropped.
            let Some(delivery) =
                deliveries::get_by_provider_message_id(&state.db, &provider_message_id).await?
            else {
                return Ok(Json(serde_json::json!({ "status": "unmatched" })));
            };

            let applied = deliveries::advance(
                &state.db,
                &delivery.message_id,
                delivery.channel,
                status,
                None,
                None,
            )
            .await?;
            if applied {
                state.bus.publish(DomainEvent::DeliveryUpdated {
                    message_id: MessageId(delivery.message_id.clone()),
                    channel: delivery.channel,
                    status,
                });
            }

            Ok(Json(serde_json::json!({
                "status": if applied { "applied" } else { "ignored" },
            })))
        }
    }
}

/// Re-host provider attachments in the local blob store.
///
/// Provider media URLs expire shortly after the webhook fires, so each one
/// is fetched and stored locally up front. A URL that cannot be fetched is
/// kept as-is rather than failing the whole webhook.
async fn mirror_attachments(state: &GatewayState, urls: Vec<String>) -> Vec<String> {
    let mut mirrored = Vec::with_capacity(urls.len());
    for url in urls {
        match fetch_and_store(state, &url).await {
            Ok(blob_url) => mirrored.push(blob_url),
            Err(e) => {
                warn!(url, error = %e, "attachment mirror failed, keeping provider URL");
                mirrored.push(url);
            }
        }
    }
    mirrored
}

async fn fetch_and_store(state: &GatewayState, url: &str) -> Result<String, InnkeepError> {
    let response = state
        .http
        .get(url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| InnkeepError::channel(format!("attachment fetch failed: {e}")))?;
    let bytes = response
        .bytes()
        .await
        .map_err(|e| InnkeepError::channel(format!("attachment body read failed: {e}")))?;
    let name = url.rsplit('/').next().unwrap_or("attachment");
    state.blobs.upload(name, bytes.to_vec()).await
}

/// Request body for POST /v1/reservations/{id}/automation/trigger.
#[derive(Debug, Default, Deserialize)]
pub struct TriggerRequest {
    /// Cancel and re-enqueue even settled rows.
    #[serde(default)]
    pub force: bool,
}

/// POST /v1/reservations/{id}/automation/trigger
pub async fn post_trigger(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    body: Option<Json<TriggerRequest>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Json(request) = body.unwrap_or_default();
    let summary = evaluate_reservation(
        &state.db,
        &state.bus,
        &state.clock,
        &id,
        request.force,
        Utc::now(),
    )
    .await?;

    Ok(Json(serde_json::json!({
        "scheduled": summary.scheduled,
        "replaced": summary.replaced,
        "skipped": summary.skipped,
    })))
}

/// Request body for POST /v1/reservations/{id}/automation/cancel.
#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

/// POST /v1/reservations/{id}/automation/cancel
pub async fn post_cancel(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    Json(request): Json<CancelRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    reservations::get_reservation(&state.db, &id)
        .await?
        .ok_or_else(|| InnkeepError::NotFound {
            entity: "reservation",
            id: id.clone(),
        })?;

    let reason = request
        .reason
        .unwrap_or_else(|| "cancelled via api".to_string());
    let cancelled = cancel_for_reservation(&state.db, &state.bus, &id, &reason).await?;

    Ok(Json(serde_json::json!({ "cancelled": cancelled })))
}

/// GET /v1/reservations/{id}/scheduled
pub async fn get_scheduled(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    reservations::get_reservation(&state.db, &id)
        .await?
        .ok_or_else(|| InnkeepError::NotFound {
            entity: "reservation",
            id: id.clone(),
        })?;

    let rows = scheduled::list_for_reservation(&state.db, &id).await?;
    Ok(Json(serde_json::json!({ "scheduled": rows })))
}

/// Unread count for one thread.
#[derive(Debug, Serialize)]
pub struct ThreadUnread {
    pub thread_id: String,
    pub unread: u64,
}

/// GET /v1/threads/{id}/unread
pub async fn get_thread_unread(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Result<Json<ThreadUnread>, ApiError> {
    threads::get_thread(&state.db, &id)
        .await?
        .ok_or_else(|| InnkeepError::NotFound {
            entity: "thread",
            id: id.clone(),
        })?;

    let unread = messages::unread_count_for_thread(&state.db, &id).await?;
    Ok(Json(ThreadUnread {
        thread_id: id,
        unread,
    }))
}

/// Response body for GET /v1/unread.
#[derive(Debug, Serialize)]
pub struct UnreadResponse {
    pub total: u64,
    pub threads: Vec<ThreadUnread>,
}

/// GET /v1/unread
pub async fn get_unread(
    State(state): State<GatewayState>,
) -> Result<Json<UnreadResponse>, ApiError> {
    let counts = messages::unread_counts(&state.db).await?;
    let total = counts.iter().map(|(_, n)| n).sum();
    let threads = counts
        .into_iter()
        .map(|(thread_id, unread)| ThreadUnread { thread_id, unread })
        .collect();
    Ok(Json(UnreadResponse { total, threads }))
}

/// Request body for POST /v1/messages/{id}/read.
#[derive(Debug, Deserialize)]
pub struct MarkReadRequest {
    pub channel: Channel,
}

/// POST /v1/messages/{id}/read
///
/// Server-side end of the client's debounced viewport mark-read. The
/// state machine re-checks status inside the write, so a late or
/// repeated call reports `applied: false` instead of regressing.
pub async fn post_mark_read(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    Json(request): Json<MarkReadRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let message = messages::get_message(&state.db, &id)
        .await?
        .ok_or_else(|| InnkeepError::NotFound {
            entity: "message",
            id: id.clone(),
        })?;

    // Incoming messages have no delivery row until the first read.
    let applied = match deliveries::advance(
        &state.db,
        &id,
        request.channel,
        DeliveryStatus::Read,
        None,
        None,
    )
    .await
    {
        Ok(applied) => applied,
        Err(InnkeepError::NotFound { .. }) if message.direction == MessageDirection::Incoming => {
            let delivery_id = uuid::Uuid::new_v4().to_string();
            deliveries::create_delivery(&state.db, &delivery_id, &id, request.channel).await?;
            deliveries::advance(
                &state.db,
                &id,
                request.channel,
                DeliveryStatus::Read,
                None,
                None,
            )
            .await?
        }
        Err(e) => return Err(e.into()),
    };

    if applied {
        state.bus.publish(DomainEvent::DeliveryUpdated {
            message_id: MessageId(id.clone()),
            channel: request.channel,
            status: DeliveryStatus::Read,
        });
    }

    Ok(Json(serde_json::json!({ "applied": applied })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webhook_payload_parses_new_message() {
        let json = serde_json::json!({
            "type": "new_message",
            "event_id": "evt-1",
            "reservation_id": "res-1",
            "channel": "whatsapp",
            "body": "Hi, what time is check-in?",
        });
        let payload: WebhookPayload = serde_json::from_value(json).unwrap();
        match payload {
            WebhookPayload::NewMessage {
                event_id, channel, ..
            } => {
                assert_eq!(event_id, "evt-1");
                assert_eq!(channel, Channel::Whatsapp);
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn webhook_payload_parses_delivery_receipt() {
        let json = serde_json::json!({
            "type": "delivery_receipt",
            "event_id": "evt-2",
            "provider_message_id": "wamid.XYZ",
            "status": "delivered",
        });
        let payload: WebhookPayload = serde_json::from_value(json).unwrap();
        assert!(matches!(
            payload,
            WebhookPayload::DeliveryReceipt {
                status: DeliveryStatus::Delivered,
                ..
            }
        ));
    }

    #[test]
    fn webhook_payload_rejects_unknown_shape() {
        let json = serde_json::json!({ "type": "typing_indicator" });
        assert!(serde_json::from_value::<WebhookPayload>(json).is_err());
    }

    #[test]
    fn not_found_maps_to_404() {
        let response = ApiError(InnkeepError::NotFound {
            entity: "reservation",
            id: "nope".into(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn validation_maps_to_422() {
        let response = ApiError(InnkeepError::Validation("bad".into())).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
