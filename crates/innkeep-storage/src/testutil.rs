// SPDX-FileCopyrightText: 2026 Innkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared fixtures for this crate's unit tests.

use chrono::NaiveDate;
use innkeep_core::{Channel, MessageDirection, MessageOrigin, ReservationStatus, RuleTrigger};

use crate::database::Database;
use crate::models::{
    now_utc_string, AutomationRule, Message, MessageTemplate, Reservation, ScheduledMessage,
};
use crate::queries;
use innkeep_core::ScheduleStatus;

pub async fn open_temp_db() -> (Database, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("test.db");
    let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
    (db, dir)
}

pub fn reservation(id: &str) -> Reservation {
    Reservation {
        id: id.to_string(),
        guest_name: "Ana Martins".to_string(),
        status: ReservationStatus::Confirmed,
        check_in_date: NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
        check_out_date: NaiveDate::from_ymd_opt(2026, 7, 8).unwrap(),
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

pub fn rule(id: &str, template_id: &str) -> AutomationRule {
    AutomationRule {
        id: id.to_string(),
        name: format!("rule-{id}"),
        trigger: RuleTrigger::OnCreateDelay { minutes: 5 },
        channel: Channel::InApp,
        template_id: template_id.to_string(),
        enabled: true,
    }
}

pub fn scheduled(id: &str, reservation_id: &str, rule_id: &str, fire_at: &str) -> ScheduledMessage {
    ScheduledMessage {
        id: id.to_string(),
        reservation_id: reservation_id.to_string(),
        rule_id: rule_id.to_string(),
        fire_at: fire_at.to_string(),
        status: ScheduleStatus::Pending,
        cancel_reason: None,
        last_error: None,
        created_at: now_utc_string(),
        updated_at: now_utc_string(),
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

/// Reservation + template + rule + thread, the usual graph under test.
pub async fn seed_reservation_graph(db: &Database, res_id: &str) -> crate::models::Thread {
    queries::reservations::create_reservation(db, &reservation(res_id))
        .await
        .unwrap();
    queries::templates::create_template(db, &template("tpl-1"))
        .await
        .unwrap();
    queries::rules::create_rule(db, &rule("rule-1", "tpl-1"))
        .await
        .unwrap();
    queries::threads::get_or_create_thread(db, res_id).await.unwrap()
}
