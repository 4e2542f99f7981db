// SPDX-FileCopyrightText: 2026 Innkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message template CRUD operations.

use innkeep_core::InnkeepError;
use rusqlite::params;

use crate::database::Database;
use crate::models::MessageTemplate;

/// Insert a new template. Template names are unique.
pub async fn create_template(db: &Database, template: &MessageTemplate) -> Result<(), InnkeepError> {
    let template = template.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO message_templates (id, name, body) VALUES (?1, ?2, ?3)",
                params![template.id, template.name, template.body],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch one template by id.
pub async fn get_template(db: &Database, id: &str) -> Result<Option<MessageTemplate>, InnkeepError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT id, name, body FROM message_templates WHERE id = ?1",
                params![id],
                |row| {
                    Ok(MessageTemplate {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        body: row.get(2)?,
                    })
                },
            );
            match result {
                Ok(t) => Ok(Some(t)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List all templates ordered by name.
pub async fn list_templates(db: &Database) -> Result<Vec<MessageTemplate>, InnkeepError> {
    db.connection()
        .call(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, name, body FROM message_templates ORDER BY name ASC")?;
            let rows = stmt.query_map([], |row| {
                Ok(MessageTemplate {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    body: row.get(2)?,
                })
            })?;
            let mut templates = Vec::new();
            for row in rows {
                templates.push(row?);
            }
            Ok(templates)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
