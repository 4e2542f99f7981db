// SPDX-FileCopyrightText: 2026 Innkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook replay dedup.

use innkeep_core::InnkeepError;
use rusqlite::params;

use crate::database::Database;

/// Record an inbound provider event id. Returns `true` the first time an
/// id is seen and `false` on replay, so handlers can short-circuit
/// duplicates before any side effect.
pub async fn record_event(
    db: &Database,
    provider: &str,
    provider_event_id: &str,
) -> Result<bool, InnkeepError> {
    let provider = provider.to_string();
    let provider_event_id = provider_event_id.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "INSERT INTO webhook_events (provider_event_id, provider)
                 VALUES (?1, ?2)
                 ON CONFLICT (provider_event_id) DO NOTHING",
                params![provider_event_id, provider],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
