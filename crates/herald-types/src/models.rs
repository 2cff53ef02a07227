use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Platform-assigned identifier of a recipient. Stable for the lifetime of
/// the account, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipientId(pub i64);

impl fmt::Display for RecipientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecipientId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

impl From<i64> for RecipientId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub id: RecipientId,
    pub display_name: String,
    pub joined_at: DateTime<Utc>,
    pub blocked: bool,
}

/// A broadcast outcome before the ledger has assigned it an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBroadcastRun {
    pub message: String,
    pub sent_at: DateTime<Utc>,
    pub success_count: u32,
    pub failed_count: u32,
}

/// One completed broadcast as recorded in the ledger. Never mutated after
/// it is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastRun {
    pub id: i64,
    pub message: String,
    pub sent_at: DateTime<Utc>,
    pub success_count: u32,
    pub failed_count: u32,
}

impl BroadcastRun {
    pub fn attempted(&self) -> u32 {
        self.success_count + self.failed_count
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLogEntry {
    pub id: i64,
    pub action: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub recipients: u64,
    pub broadcasts: u64,
    pub total_success: u64,
    pub total_failed: u64,
}
