use chrono::{DateTime, Utc};
use rusqlite::Connection;

use herald_types::models::{
    ActionLogEntry, BroadcastRun, DashboardStats, NewBroadcastRun, Recipient, RecipientId,
};

use crate::models::{ActionRow, BroadcastRow, RecipientRow, format_timestamp};
use crate::{Database, Result};

impl Database {
    // -- Recipients --

    /// Inserts the recipient unless the id is already known. An existing row
    /// keeps its name and join time. Returns `true` when a row was created.
    pub fn insert_recipient_if_absent(
        &self,
        id: RecipientId,
        name: &str,
        joined_at: DateTime<Utc>,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO recipients (user_id, name, joined_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![id.0, name, format_timestamp(joined_at)],
            )?;
            Ok(inserted == 1)
        })
    }

    /// Ids of every unblocked recipient, in the order they were first seen.
    pub fn eligible_recipient_ids(&self) -> Result<Vec<RecipientId>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT user_id FROM recipients WHERE blocked = 0 ORDER BY rowid")?;
            let ids = stmt
                .query_map([], |row| row.get::<_, i64>(0).map(RecipientId))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(ids)
        })
    }

    pub fn get_recipient(&self, id: RecipientId) -> Result<Option<Recipient>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT user_id, name, joined_at, blocked FROM recipients WHERE user_id = ?1",
            )?;
            let mut rows = stmt.query_map([id.0], map_recipient_row)?;
            match rows.next() {
                Some(row) => Ok(Some(Recipient::try_from(row?)?)),
                None => Ok(None),
            }
        })
    }

    /// Every recipient, most recently joined first.
    pub fn list_recipients(&self) -> Result<Vec<Recipient>> {
        self.with_conn(query_recipients)
    }

    /// Idempotent: deleting an unknown id is not an error. Returns whether a
    /// row was removed.
    pub fn delete_recipient(&self, id: RecipientId) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let removed = conn.execute("DELETE FROM recipients WHERE user_id = ?1", [id.0])?;
            Ok(removed > 0)
        })
    }

    /// Returns `false` when the recipient does not exist.
    pub fn set_recipient_blocked(&self, id: RecipientId, blocked: bool) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let updated = conn.execute(
                "UPDATE recipients SET blocked = ?2 WHERE user_id = ?1",
                rusqlite::params![id.0, blocked],
            )?;
            Ok(updated > 0)
        })
    }

    pub fn count_recipients(&self) -> Result<u64> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM recipients", [], |r| r.get(0))?;
            Ok(n as u64)
        })
    }

    // -- Broadcasts --

    /// Appends a finished run and returns it with its assigned id.
    pub fn insert_broadcast(&self, run: &NewBroadcastRun) -> Result<BroadcastRun> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO broadcasts (message, sent_at, success, failed) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![
                    run.message,
                    format_timestamp(run.sent_at),
                    run.success_count,
                    run.failed_count
                ],
            )?;
            Ok(BroadcastRun {
                id: conn.last_insert_rowid(),
                message: run.message.clone(),
                sent_at: run.sent_at,
                success_count: run.success_count,
                failed_count: run.failed_count,
            })
        })
    }

    /// Most recent first.
    pub fn recent_broadcasts(&self, limit: u32) -> Result<Vec<BroadcastRun>> {
        self.with_conn(|conn| query_broadcasts(conn, limit))
    }

    pub fn dashboard_stats(&self) -> Result<DashboardStats> {
        self.with_conn(|conn| {
            let recipients: i64 =
                conn.query_row("SELECT COUNT(*) FROM recipients", [], |r| r.get(0))?;
            let (broadcasts, success, failed): (i64, i64, i64) = conn.query_row(
                "SELECT COUNT(*), COALESCE(SUM(success), 0), COALESCE(SUM(failed), 0) FROM broadcasts",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )?;
            Ok(DashboardStats {
                recipients: recipients as u64,
                broadcasts: broadcasts as u64,
                total_success: success as u64,
                total_failed: failed as u64,
            })
        })
    }

    // -- Action log --

    pub fn insert_action(&self, action: &str, at: DateTime<Utc>) -> Result<ActionLogEntry> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO action_log (action, created_at) VALUES (?1, ?2)",
                rusqlite::params![action, format_timestamp(at)],
            )?;
            Ok(ActionLogEntry {
                id: conn.last_insert_rowid(),
                action: action.to_string(),
                created_at: at,
            })
        })
    }

    pub fn recent_actions(&self, limit: u32) -> Result<Vec<ActionLogEntry>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, action, created_at FROM action_log ORDER BY id DESC LIMIT ?1",
            )?;
            let rows = stmt
                .query_map([limit], |row| {
                    Ok(ActionRow {
                        id: row.get(0)?,
                        action: row.get(1)?,
                        created_at: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            rows.into_iter().map(ActionLogEntry::try_from).collect()
        })
    }
}

fn map_recipient_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RecipientRow> {
    Ok(RecipientRow {
        user_id: row.get(0)?,
        name: row.get(1)?,
        joined_at: row.get(2)?,
        blocked: row.get(3)?,
    })
}

fn query_recipients(conn: &Connection) -> Result<Vec<Recipient>> {
    let mut stmt = conn.prepare(
        "SELECT user_id, name, joined_at, blocked FROM recipients
         ORDER BY joined_at DESC, rowid DESC",
    )?;

    let rows = stmt
        .query_map([], map_recipient_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter().map(Recipient::try_from).collect()
}

fn query_broadcasts(conn: &Connection, limit: u32) -> Result<Vec<BroadcastRun>> {
    let mut stmt = conn.prepare(
        "SELECT id, message, sent_at, success, failed FROM broadcasts
         ORDER BY id DESC
         LIMIT ?1",
    )?;

    let rows = stmt
        .query_map([limit], |row| {
            Ok(BroadcastRow {
                id: row.get(0)?,
                message: row.get(1)?,
                sent_at: row.get(2)?,
                success: row.get(3)?,
                failed: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter().map(BroadcastRun::try_from).collect()
}
