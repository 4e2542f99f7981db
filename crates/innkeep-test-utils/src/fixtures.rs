// SPDX-FileCopyrightText: 2026 Innkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canned rows and temp-database helpers.

use chrono::NaiveDate;
use innkeep_core::{Channel, MessageDirection, MessageOrigin, ReservationStatus, RuleTrigger};
use innkeep_storage::database::Database;
use innkeep_storage::models::{
    now_utc_string, AutomationRule, Message, MessageTemplate, Reservation, Thread,
};
use innkeep_storage::queries;

/// Open a fresh migrated database in its own temp directory. Keep the
/// returned `TempDir` alive for the duration of the test.
pub async fn temp_db() -> (Database, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("innkeep-test.db");
    let db = Database::open(path.to_str().expect("utf8 path"))
        .await
        .expect("open test db");
    (db, dir)
}

/// A confirmed July stay with both phone and email contacts.
pub fn reservation(id: &str) -> Reservation {
    Reservation {
        id: id.to_string(),
        guest_name: "Ana Martins".to_string(),
        status: ReservationStatus::Confirmed,
        check_in_date: NaiveDate::from_ymd_opt(2026, 7, 1).expect("valid date"),
        check_out_date: NaiveDate::from_ymd_opt(2026, 7, 8).expect("valid date"),
        master_reservation_id: None,
        automation_paused: false,
        contact_email: Some("ana@example.com".to_string()),
        contact_phone: Some("+351911111111".to_string()),
        ota_guest_id: None,
        created_at: now_utc_string(),
        updated_at: now_utc_string(),
    }
}

pub fn template(id: &str) -> MessageTemplate {
    MessageTemplate {
        id: id.to_string(),
        name: format!("template-{id}"),
        body: "Welcome {{guest_name}}! Check-in is on {{check_in_date}}.".to_string(),
    }
}

pub fn rule(id: &str, template_id: &str, trigger: RuleTrigger, channel: Channel) -> AutomationRule {
    AutomationRule {
        id: id.to_string(),
        name: format!("rule-{id}"),
        trigger,
        channel,
        template_id: template_id.to_string(),
        enabled: true,
    }
}

pub fn message(id: &str, thread_id: &str, direction: MessageDirection) -> Message {
    Message {
        id: id.to_string(),
        thread_id: thread_id.to_string(),
        origin: match direction {
            MessageDirection::Incoming => MessageOrigin::Guest,
            MessageDirection::Outgoing => MessageOrigin::Host,
        },
        direction,
        channel: Channel::InApp,
        content: format!("message {id}"),
        attachments: Vec::new(),
        reply_to_id: None,
        unsent: false,
        provider_event_id: None,
        created_at: now_utc_string(),
    }
}

/// Seed reservation `res_id` plus template `tpl-1`, rule `rule-1`
/// (on_create_delay 5 over in-app), and the reservation's thread.
pub async fn seed_reservation_graph(db: &Database, res_id: &str) -> Thread {
    queries::reservations::create_reservation(db, &reservation(res_id))
        .await
        .expect("seed reservation");
    queries::templates::create_template(db, &template("tpl-1"))
        .await
        .expect("seed template");
    queries::rules::create_rule(
        db,
        &rule(
            "rule-1",
            "tpl-1",
            RuleTrigger::OnCreateDelay { minutes: 5 },
            Channel::InApp,
        ),
    )
    .await
    .expect("seed rule");
    queries::threads::get_or_create_thread(db, res_id)
        .await
        .expect("seed thread")
}
