// SPDX-FileCopyrightText: 2026 Innkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Automation rule CRUD operations.
//!
//! Triggers are stored as their JSON tagged-variant form in a TEXT column.

use innkeep_core::InnkeepError;
use rusqlite::params;

use crate::database::Database;
use crate::models::{column_enum, column_json, AutomationRule};

fn map_row(row: &rusqlite::Row<'_>) -> Result<AutomationRule, rusqlite::Error> {
    Ok(AutomationRule {
        id: row.get(0)?,
        name: row.get(1)?,
        trigger: column_json(2, row.get(2)?)?,
        channel: column_enum(3, row.get(3)?)?,
        template_id: row.get(4)?,
        enabled: row.get(5)?,
    })
}

/// Insert a new rule. Validates the trigger before writing.
pub async fn create_rule(db: &Database, rule: &AutomationRule) -> Result<(), InnkeepError> {
    rule.trigger.validate()?;
    let rule = rule.clone();
    let trigger_json = serde_json::to_string(&rule.trigger)
        .map_err(|e| InnkeepError::Internal(format!("trigger serialization: {e}")))?;
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO automation_rules (id, name, trigger, channel, template_id, enabled)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    rule.id,
                    rule.name,
                    trigger_json,
                    rule.channel.to_string(),
                    rule.template_id,
                    rule.enabled,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch one rule by id.
pub async fn get_rule(db: &Database, id: &str) -> Result<Option<AutomationRule>, InnkeepError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT id, name, trigger, channel, template_id, enabled
                 FROM automation_rules WHERE id = ?1",
                params![id],
                map_row,
            );
            match result {
                Ok(rule) => Ok(Some(rule)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List rules the evaluator should consider.
pub async fn list_enabled_rules(db: &Database) -> Result<Vec<AutomationRule>, InnkeepError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, trigger, channel, template_id, enabled
                 FROM automation_rules WHERE enabled = 1 ORDER BY name ASC",
            )?;
            let rows = stmt.query_map([], map_row)?;
            let mut rules = Vec::new();
            for row in rows {
                rules.push(row?);
            }
            Ok(rules)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Enable or disable a rule. Returns false when the rule does not exist.
pub async fn set_enabled(db: &Database, id: &str, enabled: bool) -> Result<bool, InnkeepError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE automation_rules SET enabled = ?1 WHERE id = ?2",
                params![enabled, id],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
