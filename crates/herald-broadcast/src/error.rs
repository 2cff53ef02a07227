use thiserror::Error;

use crate::store::StorageError;

/// Why a broadcast run could not be completed and recorded.
///
/// Individual delivery failures never show up here; they are tallied into
/// the run's `failed_count`.
#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}
