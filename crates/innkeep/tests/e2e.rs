// SPDX-FileCopyrightText: 2026 Innkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end integration tests for the complete Innkeep pipeline.
//!
//! Each test builds an isolated engine over a temp SQLite database with a
//! mock channel transport: rule evaluation, dispatch sweep, gateway
//! webhooks, and unread tracking all run against the same durable state.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use chrono::Utc;
use tower::ServiceExt;

use innkeep_automation::{evaluate_reservation, sweep_tick, PropertyClock, SenderRegistry};
use innkeep_bus::EventBus;
use innkeep_core::{Channel, DeliveryStatus, MessageDirection, RuleTrigger};
use innkeep_gateway::{build_router, AuthConfig, GatewayState};
use innkeep_storage::database::Database;
use innkeep_storage::queries::{deliveries, messages, rules, scheduled, templates, threads};
use innkeep_test_utils::{fixtures, MockSender};

const TOKEN: &str = "e2e-shared-bearer-token";
const PROPERTY: &str = "Casa do Mar";

struct Engine {
    db: Arc<Database>,
    bus: EventBus,
    clock: PropertyClock,
    registry: SenderRegistry,
    whatsapp: Arc<MockSender>,
    router: axum::Router,
    _dir: tempfile::TempDir,
}

async fn engine() -> Engine {
    let (db, dir) = fixtures::temp_db().await;
    let db = Arc::new(db);
    let bus = EventBus::new();
    let clock = PropertyClock::default();

    let whatsapp = Arc::new(MockSender::new(Channel::Whatsapp));
    let mut registry = SenderRegistry::new();
    registry.register(whatsapp.clone());

    let blobs = innkeep_storage::FsBlobStore::new(dir.path().join("blobs"))
        .await
        .expect("blob store");
    let state = GatewayState {
        db: Arc::clone(&db),
        bus: bus.clone(),
        clock: Arc::new(clock.clone()),
        blobs: Arc::new(blobs),
        http: reqwest::Client::new(),
    };
    let router = build_router(
        state,
        AuthConfig {
            bearer_token: Some(TOKEN.to_string()),
        },
    );

    Engine {
        db,
        bus,
        clock,
        registry,
        whatsapp,
        router,
        _dir: dir,
    }
}

/// Seed a reservation whose welcome rule fires immediately: a zero-minute
/// on-create delay resolves as already elapsed, so the evaluator enqueues
/// it at "now" and the next sweep picks it up.
async fn seed_immediate_whatsapp_rule(db: &Database, res_id: &str) {
    fixtures::seed_reservation_graph(db, res_id).await;
    rules::create_rule(
        db,
        &fixtures::rule(
            "rule-welcome",
            "tpl-1",
            RuleTrigger::OnCreateDelay { minutes: 0 },
            Channel::Whatsapp,
        ),
    )
    .await
    .expect("seed whatsapp rule");
}

fn request(
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
    token: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

// ---- Test 1: evaluate -> sweep -> provider send ----

#[tokio::test]
async fn outbound_pipeline_renders_and_sends_through_provider() {
    let engine = engine().await;
    seed_immediate_whatsapp_rule(&engine.db, "res-1").await;

    let summary = evaluate_reservation(
        &engine.db,
        &engine.bus,
        &engine.clock,
        "res-1",
        false,
        Utc::now(),
    )
    .await
    .unwrap();
    // rule-1 (in-app, T+5min) and rule-welcome (whatsapp, elapsed)
    assert_eq!(summary.scheduled, 2);

    let settled = sweep_tick(&engine.db, &engine.bus, &engine.registry, PROPERTY, 32)
        .await
        .unwrap();
    assert_eq!(settled, 1, "only the elapsed rule is due");

    let sent = engine.whatsapp.sent_messages().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient, "+351911111111");
    assert_eq!(sent[0].body, "Welcome Ana Martins! Check-in is on 2026-07-01.");

    // The durable trail: outgoing message row plus a sent delivery with
    // the provider's id.
    let thread = threads::get_or_create_thread(&engine.db, "res-1")
        .await
        .unwrap();
    let stored = messages::list_for_thread(&engine.db, &thread.id).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].direction, MessageDirection::Outgoing);

    let delivery = deliveries::get_delivery(&engine.db, &stored[0].id, Channel::Whatsapp)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(delivery.status, DeliveryStatus::Sent);
    assert!(delivery
        .provider_message_id
        .as_deref()
        .unwrap()
        .starts_with("mock-"));

    // Second sweep is a no-op: the row is settled, not re-claimed.
    let again = sweep_tick(&engine.db, &engine.bus, &engine.registry, PROPERTY, 32)
        .await
        .unwrap();
    assert_eq!(again, 0);
    assert_eq!(engine.whatsapp.sent_count().await, 1);
}

// ---- Test 2: provider receipt moves the delivery forward ----

#[tokio::test]
async fn delivery_receipt_webhook_completes_the_outbound_loop() {
    let engine = engine().await;
    seed_immediate_whatsapp_rule(&engine.db, "res-1").await;

    evaluate_reservation(
        &engine.db,
        &engine.bus,
        &engine.clock,
        "res-1",
        false,
        Utc::now(),
    )
    .await
    .unwrap();
    sweep_tick(&engine.db, &engine.bus, &engine.registry, PROPERTY, 32)
        .await
        .unwrap();

    let thread = threads::get_or_create_thread(&engine.db, "res-1")
        .await
        .unwrap();
    let stored = messages::list_for_thread(&engine.db, &thread.id).await.unwrap();
    let delivery = deliveries::get_delivery(&engine.db, &stored[0].id, Channel::Whatsapp)
        .await
        .unwrap()
        .unwrap();
    let provider_id = delivery.provider_message_id.clone().unwrap();

    let receipt = serde_json::json!({
        "type": "delivery_receipt",
        "event_id": "evt-receipt-1",
        "provider_message_id": provider_id,
        "status": "read",
    });
    let response = engine
        .router
        .clone()
        .oneshot(request(
            "POST",
            "/v1/webhooks/whatsapp",
            Some(receipt),
            Some(TOKEN),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "applied");

    let delivery = deliveries::get_delivery(&engine.db, &stored[0].id, Channel::Whatsapp)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(delivery.status, DeliveryStatus::Read);
    assert!(delivery.read_at.is_some());
}

// ---- Test 3: inbound webhook -> unread -> mark-read ----

#[tokio::test]
async fn inbound_message_flows_through_unread_and_mark_read() {
    let engine = engine().await;
    let thread = fixtures::seed_reservation_graph(&engine.db, "res-1").await;

    let inbound = serde_json::json!({
        "type": "new_message",
        "event_id": "evt-in-1",
        "reservation_id": "res-1",
        "channel": "whatsapp",
        "body": "Is early check-in possible?",
    });
    let response = engine
        .router
        .clone()
        .oneshot(request(
            "POST",
            "/v1/webhooks/whatsapp",
            Some(inbound),
            Some(TOKEN),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let stored = body_json(response).await;
    let message_id = stored["message_id"].as_str().unwrap().to_string();

    let unread = engine
        .router
        .clone()
        .oneshot(request("GET", "/v1/unread", None, Some(TOKEN)))
        .await
        .unwrap();
    let json = body_json(unread).await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["threads"][0]["thread_id"], thread.id.as_str());

    let read = engine
        .router
        .clone()
        .oneshot(request(
            "POST",
            &format!("/v1/messages/{message_id}/read"),
            Some(serde_json::json!({ "channel": "whatsapp" })),
            Some(TOKEN),
        ))
        .await
        .unwrap();
    assert_eq!(body_json(read).await["applied"], true);

    let unread = engine
        .router
        .clone()
        .oneshot(request("GET", "/v1/unread", None, Some(TOKEN)))
        .await
        .unwrap();
    assert_eq!(body_json(unread).await["total"], 0);
}

// ---- Test 4: amendment replaces the pending schedule ----

#[tokio::test]
async fn date_amendment_via_gateway_replaces_pending_rows() {
    let engine = engine().await;
    fixtures::seed_reservation_graph(&engine.db, "res-1").await;

    // Move the stay into the future: elapsed date-relative triggers are
    // skipped, and this test needs the checkout rule to actually plan.
    let check_in = (Utc::now() + chrono::Duration::days(30)).date_naive();
    innkeep_storage::queries::reservations::set_dates(
        &engine.db,
        "res-1",
        check_in,
        check_in + chrono::Duration::days(7),
    )
    .await
    .unwrap();

    // rule-1 is date-independent (on_create_delay); add one that tracks
    // the stay so an amendment moves its fire time.
    templates::create_template(&engine.db, &fixtures::template("tpl-checkout"))
        .await
        .unwrap();
    rules::create_rule(
        &engine.db,
        &fixtures::rule(
            "rule-checkout",
            "tpl-checkout",
            RuleTrigger::BeforeCheckout { hours: 4 },
            Channel::InApp,
        ),
    )
    .await
    .unwrap();

    let trigger = |force: bool| {
        request(
            "POST",
            "/v1/reservations/res-1/automation/trigger",
            Some(serde_json::json!({ "force": force })),
            Some(TOKEN),
        )
    };

    let first = engine.router.clone().oneshot(trigger(false)).await.unwrap();
    assert_eq!(body_json(first).await["scheduled"], 2);

    // Re-trigger without changes: idempotent.
    let repeat = engine.router.clone().oneshot(trigger(false)).await.unwrap();
    let json = body_json(repeat).await;
    assert_eq!(json["scheduled"], 0);
    assert_eq!(json["replaced"], 0);

    // Guest extends the stay; the checkout rule must be re-planned.
    let old_checkout = scheduled::get_for_rule(&engine.db, "res-1", "rule-checkout")
        .await
        .unwrap()
        .unwrap();
    innkeep_storage::queries::reservations::set_dates(
        &engine.db,
        "res-1",
        check_in,
        check_in + chrono::Duration::days(11),
    )
    .await
    .unwrap();

    let amended = engine.router.clone().oneshot(trigger(false)).await.unwrap();
    assert_eq!(body_json(amended).await["replaced"], 1);

    // the stale row was replaced outright, not left behind
    let rows = scheduled::list_for_reservation(&engine.db, "res-1")
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.id != old_checkout.id));
    let new_checkout = scheduled::get_for_rule(&engine.db, "res-1", "rule-checkout")
        .await
        .unwrap()
        .unwrap();
    assert_ne!(new_checkout.fire_at, old_checkout.fire_at);
}
