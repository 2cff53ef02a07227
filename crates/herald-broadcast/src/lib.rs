//! Broadcast dispatch engine.
//!
//! A [`Dispatcher`] takes one outbound message, snapshots the eligible
//! recipients from a [`RecipientStore`], delivers to each through a
//! [`DeliveryChannel`] paced by a [`Pacer`], and appends the aggregate
//! outcome to a [`BroadcastLedger`]. The [`IngressAdapter`] is the other
//! writer of the store: it registers senders of inbound updates.

pub mod channel;
pub mod dispatcher;
pub mod error;
pub mod ingress;
pub mod pacing;
pub mod store;

pub use channel::{DeliveryChannel, DeliveryError};
pub use dispatcher::Dispatcher;
pub use error::BroadcastError;
pub use ingress::{HandlerError, IngressAdapter, UpdateHandler};
pub use pacing::{FixedInterval, NoPacing, Pacer, TokenBucket};
pub use store::{BroadcastLedger, RecipientStore, StorageError};
