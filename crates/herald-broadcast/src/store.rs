use chrono::{DateTime, Utc};

use herald_db::Database;
use herald_types::models::{BroadcastRun, NewBroadcastRun, Recipient, RecipientId};

pub use herald_db::StorageError;

/// Durable set of recipients with a blocked flag.
///
/// Every mutating call is atomic on its own. Calls are synchronous and
/// expected to be quick; they are not suspension points of a broadcast run.
pub trait RecipientStore: Send + Sync {
    /// Registers `id` unless it is already known. Never overwrites an
    /// existing record. Returns `true` when a new recipient was created.
    fn upsert_new(
        &self,
        id: RecipientId,
        display_name: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StorageError>;

    /// Snapshot of unblocked recipient ids in listing order.
    fn list_eligible(&self) -> Result<Vec<RecipientId>, StorageError>;

    /// Idempotent removal.
    fn remove(&self, id: RecipientId) -> Result<(), StorageError>;

    /// Returns `false` if the recipient does not exist.
    fn set_blocked(&self, id: RecipientId, blocked: bool) -> Result<bool, StorageError>;

    fn all(&self) -> Result<Vec<Recipient>, StorageError>;

    /// Every stored recipient, blocked ones included.
    fn count(&self) -> Result<u64, StorageError>;
}

/// Append-only history of completed broadcast runs.
pub trait BroadcastLedger: Send + Sync {
    /// Records a finished run and returns it with its assigned id. Ids are
    /// strictly increasing.
    fn append(&self, run: NewBroadcastRun) -> Result<BroadcastRun, StorageError>;

    /// Most recent first, at most `limit` entries.
    fn recent(&self, limit: u32) -> Result<Vec<BroadcastRun>, StorageError>;
}

impl RecipientStore for Database {
    fn upsert_new(
        &self,
        id: RecipientId,
        display_name: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        self.insert_recipient_if_absent(id, display_name, now)
    }

    fn list_eligible(&self) -> Result<Vec<RecipientId>, StorageError> {
        self.eligible_recipient_ids()
    }

    fn remove(&self, id: RecipientId) -> Result<(), StorageError> {
        self.delete_recipient(id).map(|_| ())
    }

    fn set_blocked(&self, id: RecipientId, blocked: bool) -> Result<bool, StorageError> {
        self.set_recipient_blocked(id, blocked)
    }

    fn all(&self) -> Result<Vec<Recipient>, StorageError> {
        self.list_recipients()
    }

    fn count(&self) -> Result<u64, StorageError> {
        self.count_recipients()
    }
}

impl BroadcastLedger for Database {
    fn append(&self, run: NewBroadcastRun) -> Result<BroadcastRun, StorageError> {
        self.insert_broadcast(&run)
    }

    fn recent(&self, limit: u32) -> Result<Vec<BroadcastRun>, StorageError> {
        self.recent_broadcasts(limit)
    }
}
