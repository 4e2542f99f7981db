// SPDX-FileCopyrightText: 2026 Innkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reservation CRUD operations.

use chrono::NaiveDate;
use innkeep_core::{InnkeepError, ReservationStatus};
use rusqlite::params;

use crate::database::Database;
use crate::models::{column_date, column_enum, Reservation};

const COLUMNS: &str = "id, guest_name, status, check_in_date, check_out_date,
    master_reservation_id, automation_paused, contact_email, contact_phone,
    ota_guest_id, created_at, updated_at";

fn map_row(row: &rusqlite::Row<'_>) -> Result<Reservation, rusqlite::Error> {
    Ok(Reservation {
        id: row.get(0)?,
        guest_name: row.get(1)?,
        status: column_enum(2, row.get(2)?)?,
        check_in_date: column_date(3, row.get(3)?)?,
        check_out_date: column_date(4, row.get(4)?)?,
        master_reservation_id: row.get(5)?,
        automation_paused: row.get(6)?,
        contact_email: row.get(7)?,
        contact_phone: row.get(8)?,
        ota_guest_id: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

/// Insert a new reservation.
pub async fn create_reservation(db: &Database, res: &Reservation) -> Result<(), InnkeepError> {
    let res = res.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO reservations (id, guest_name, status, check_in_date,
                     check_out_date, master_reservation_id, automation_paused,
                     contact_email, contact_phone, ota_guest_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    res.id,
                    res.guest_name,
                    res.status.to_string(),
                    res.check_in_date.to_string(),
                    res.check_out_date.to_string(),
                    res.master_reservation_id,
                    res.automation_paused,
                    res.contact_email,
                    res.contact_phone,
                    res.ota_guest_id,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch one reservation by id.
pub async fn get_reservation(db: &Database, id: &str) -> Result<Option<Reservation>, InnkeepError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                &format!("SELECT {COLUMNS} FROM reservations WHERE id = ?1"),
                params![id],
                map_row,
            );
            match result {
                Ok(res) => Ok(Some(res)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Update the lifecycle status. Returns false when the row does not exist.
pub async fn set_status(
    db: &Database,
    id: &str,
    status: ReservationStatus,
) -> Result<bool, InnkeepError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE reservations SET status = ?1,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?2",
                params![status.to_string(), id],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Amend stay dates. Returns false when the row does not exist.
pub async fn set_dates(
    db: &Database,
    id: &str,
    check_in: NaiveDate,
    check_out: NaiveDate,
) -> Result<bool, InnkeepError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE reservations SET check_in_date = ?1, check_out_date = ?2,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?3",
                params![check_in.to_string(), check_out.to_string(), id],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Pause or resume automation for one reservation.
pub async fn set_automation_paused(
    db: &Database,
    id: &str,
    paused: bool,
) -> Result<bool, InnkeepError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE reservations SET automation_paused = ?1,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?2",
                params![paused, id],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
