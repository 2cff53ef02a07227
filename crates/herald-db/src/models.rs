//! Database row types. These map directly to SQLite rows.
//! Distinct from herald-types models to keep the DB layer independent.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

use herald_types::models::{ActionLogEntry, BroadcastRun, Recipient, RecipientId};

use crate::{Result, StorageError};

pub struct RecipientRow {
    pub user_id: i64,
    pub name: String,
    pub joined_at: String,
    pub blocked: bool,
}

pub struct BroadcastRow {
    pub id: i64,
    pub message: String,
    pub sent_at: String,
    pub success: i64,
    pub failed: i64,
}

pub struct ActionRow {
    pub id: i64,
    pub action: String,
    pub created_at: String,
}

impl TryFrom<RecipientRow> for Recipient {
    type Error = StorageError;

    fn try_from(row: RecipientRow) -> Result<Self> {
        Ok(Recipient {
            id: RecipientId(row.user_id),
            joined_at: parse_timestamp("joined_at", &row.joined_at)?,
            display_name: row.name,
            blocked: row.blocked,
        })
    }
}

impl TryFrom<BroadcastRow> for BroadcastRun {
    type Error = StorageError;

    fn try_from(row: BroadcastRow) -> Result<Self> {
        Ok(BroadcastRun {
            id: row.id,
            sent_at: parse_timestamp("sent_at", &row.sent_at)?,
            success_count: parse_count("success", row.success)?,
            failed_count: parse_count("failed", row.failed)?,
            message: row.message,
        })
    }
}

impl TryFrom<ActionRow> for ActionLogEntry {
    type Error = StorageError;

    fn try_from(row: ActionRow) -> Result<Self> {
        Ok(ActionLogEntry {
            id: row.id,
            created_at: parse_timestamp("created_at", &row.created_at)?,
            action: row.action,
        })
    }
}

/// Fixed-width RFC 3339 so that text ordering in SQL matches time ordering.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Accepts RFC 3339 plus the two naive layouts older databases were written
/// with ("YYYY-MM-DD HH:MM:SS" and "YYYY-MM-DD HH:MM"), read as UTC.
pub fn parse_timestamp(column: &'static str, value: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|ndt| ndt.and_utc())
        .ok_or_else(|| StorageError::Corrupt {
            column,
            value: value.to_string(),
        })
}

fn parse_count(column: &'static str, value: i64) -> Result<u32> {
    u32::try_from(value).map_err(|_| StorageError::Corrupt {
        column,
        value: value.to_string(),
    })
}
