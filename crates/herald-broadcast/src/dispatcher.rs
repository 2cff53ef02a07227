use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{info, warn};

use herald_types::models::{BroadcastRun, NewBroadcastRun};

use crate::channel::{DeliveryChannel, DeliveryError};
use crate::error::BroadcastError;
use crate::pacing::Pacer;
use crate::store::{BroadcastLedger, RecipientStore};

/// Runs broadcasts: one message to every eligible recipient, one ledger
/// entry per completed run.
///
/// Cheap to clone; all clones share the same store, ledger, channel and
/// pacer.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    store: Arc<dyn RecipientStore>,
    ledger: Arc<dyn BroadcastLedger>,
    channel: Arc<dyn DeliveryChannel>,
    pacer: Arc<dyn Pacer>,

    /// Present in exclusive mode: overlapping runs wait for each other.
    run_lock: Option<Mutex<()>>,
}

/// Running success/failure counts for one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Tally {
    success: u32,
    failed: u32,
}

impl Tally {
    fn record(&mut self, outcome: &Result<(), DeliveryError>) {
        match outcome {
            Ok(()) => self.success += 1,
            Err(_) => self.failed += 1,
        }
    }

    fn into_run(self, message: &str, sent_at: DateTime<Utc>) -> NewBroadcastRun {
        NewBroadcastRun {
            message: message.to_string(),
            sent_at,
            success_count: self.success,
            failed_count: self.failed,
        }
    }
}

impl Dispatcher {
    /// Overlapping runs are allowed and proceed independently.
    pub fn new(
        store: Arc<dyn RecipientStore>,
        ledger: Arc<dyn BroadcastLedger>,
        channel: Arc<dyn DeliveryChannel>,
        pacer: Arc<dyn Pacer>,
    ) -> Self {
        Self::build(store, ledger, channel, pacer, false)
    }

    /// Like [`Dispatcher::new`], but a run started while another is in
    /// progress waits for it to finish first.
    pub fn exclusive(
        store: Arc<dyn RecipientStore>,
        ledger: Arc<dyn BroadcastLedger>,
        channel: Arc<dyn DeliveryChannel>,
        pacer: Arc<dyn Pacer>,
    ) -> Self {
        Self::build(store, ledger, channel, pacer, true)
    }

    fn build(
        store: Arc<dyn RecipientStore>,
        ledger: Arc<dyn BroadcastLedger>,
        channel: Arc<dyn DeliveryChannel>,
        pacer: Arc<dyn Pacer>,
        exclusive: bool,
    ) -> Self {
        Self {
            inner: Arc::new(DispatcherInner {
                store,
                ledger,
                channel,
                pacer,
                run_lock: exclusive.then(|| Mutex::new(())),
            }),
        }
    }

    pub fn is_exclusive(&self) -> bool {
        self.inner.run_lock.is_some()
    }

    /// Delivers `message` to every recipient eligible at the start of the
    /// run, in listing order, one at a time.
    ///
    /// Delivery failures are counted, never propagated. Storage failures
    /// abort the run; deliveries already made are not undone and no ledger
    /// entry is written.
    pub async fn run_broadcast(&self, message: &str) -> Result<BroadcastRun, BroadcastError> {
        let _guard = match &self.inner.run_lock {
            Some(lock) => Some(lock.lock().await),
            None => None,
        };

        let recipients = self.inner.store.list_eligible()?;
        let total = recipients.len();
        info!(recipients = total, "Broadcast started");

        let started = Instant::now();
        let mut tally = Tally::default();

        for recipient in recipients {
            let outcome = self.inner.channel.deliver(recipient, message).await;
            if let Err(e) = &outcome {
                warn!(recipient = %recipient, error = %e, "Delivery failed");
            }
            tally.record(&outcome);

            self.inner.pacer.pace().await;
        }

        let run = self
            .inner
            .ledger
            .append(tally.into_run(message, Utc::now()))?;

        if run.failed_count > 0 {
            warn!(
                run_id = run.id,
                success = run.success_count,
                failed = run.failed_count,
                "Broadcast finished with failures"
            );
        }
        info!(
            run_id = run.id,
            success = run.success_count,
            failed = run.failed_count,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Broadcast complete"
        );

        Ok(run)
    }
}
