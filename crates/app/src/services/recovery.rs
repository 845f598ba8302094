//! Abandoned-cart recovery sync.
//!
//! For signed-in shoppers, every settled cart change is pushed to the
//! recovery service so an abandoned session can be rescued by email. The
//! push is fire-and-forget: debounced behind a restartable timer, logged on
//! failure, never retried, never surfaced to the shopper.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use mockall::automock;
use reqwest::Client;
use sillage::items::LineItem;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::{identity::IdentityProvider, storage::records::LineItemRecord, store::CartChangeListener};

/// Delay between the last cart change and the sync call.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(2);

/// Errors from the recovery sync call.
#[derive(Debug, Error)]
pub enum RecoverySyncError {
    /// An HTTP transport error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Pushes cart snapshots to the recovery service.
#[automock]
#[async_trait]
pub trait CartRecoverySync: Send + Sync {
    /// Push the shopper's current lines. No response body is relied upon.
    ///
    /// # Errors
    ///
    /// Returns [`RecoverySyncError::Http`] on transport failure; callers
    /// log and drop it.
    async fn sync(&self, email: &str, items: Vec<LineItemRecord>) -> Result<(), RecoverySyncError>;
}

/// HTTP client for the recovery service.
#[derive(Debug, Clone)]
pub struct HttpCartRecoverySync {
    base_url: String,
    http: Client,
}

impl HttpCartRecoverySync {
    /// Create a client against the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: Client::new(),
        }
    }
}

#[async_trait]
impl CartRecoverySync for HttpCartRecoverySync {
    async fn sync(&self, email: &str, items: Vec<LineItemRecord>) -> Result<(), RecoverySyncError> {
        let url = format!("{}/cart-recovery/sync", self.base_url);
        let body = serde_json::json!({ "email": email, "items": items });

        self.http
            .post(&url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}

/// Debounces recovery syncs behind a restartable timer.
///
/// Every [`RecoverySyncDebouncer::schedule`] call cancels the pending sync
/// and arms a fresh timer, so a burst of cart changes settles into one call.
/// Signed-out shoppers schedule nothing. Must run inside a tokio runtime;
/// without one the sync is skipped with a warning rather than panicking.
pub struct RecoverySyncDebouncer {
    sync: Arc<dyn CartRecoverySync>,
    identity: Arc<dyn IdentityProvider>,
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl RecoverySyncDebouncer {
    /// A debouncer with the storefront's ~2s settle delay.
    #[must_use]
    pub fn new(sync: Arc<dyn CartRecoverySync>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self::with_delay(sync, identity, DEFAULT_DEBOUNCE)
    }

    /// A debouncer with a custom settle delay (tests use short ones).
    #[must_use]
    pub fn with_delay(
        sync: Arc<dyn CartRecoverySync>,
        identity: Arc<dyn IdentityProvider>,
        delay: Duration,
    ) -> Self {
        Self {
            sync,
            identity,
            delay,
            pending: Mutex::new(None),
        }
    }

    /// Restart the timer with a fresh snapshot, cancelling any pending sync.
    pub fn schedule(&self, items: Vec<LineItemRecord>) {
        let Some(email) = self.identity.current_email() else {
            return;
        };

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("no async runtime available; skipping cart recovery sync");
            return;
        };

        let sync = Arc::clone(&self.sync);
        let delay = self.delay;

        let task = runtime.spawn(async move {
            tokio::time::sleep(delay).await;

            if let Err(error) = sync.sync(&email, items).await {
                warn!(%error, "cart recovery sync failed");
            }
        });

        if let Some(previous) = self.lock_pending().replace(task) {
            previous.abort();
        }
    }

    /// Cancel the pending sync, if any.
    pub fn cancel(&self) {
        if let Some(previous) = self.lock_pending().take() {
            previous.abort();
        }
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        match self.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl CartChangeListener for RecoverySyncDebouncer {
    fn cart_changed(&self, items: &[LineItem]) {
        self.schedule(items.iter().map(LineItemRecord::from_item).collect());
    }
}

impl Drop for RecoverySyncDebouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use rusty_money::{Money, iso::TWD};
    use sillage::items::Size;

    use crate::identity::FixedIdentity;

    use super::*;

    struct RecordingSync {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CartRecoverySync for RecordingSync {
        async fn sync(
            &self,
            _email: &str,
            _items: Vec<LineItemRecord>,
        ) -> Result<(), RecoverySyncError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn record() -> LineItemRecord {
        LineItemRecord::from_item(&LineItem {
            id: "p-1".to_string(),
            size: Size::Ml(10),
            unit_price: Money::from_major(150, TWD),
            quantity: 1,
            is_prize: false,
            is_lottery_item: false,
            brand: String::new(),
            category: String::new(),
            stock_ml: None,
        })
    }

    fn debouncer(
        identity: FixedIdentity,
        delay: Duration,
    ) -> (Arc<RecordingSync>, RecoverySyncDebouncer) {
        let sync = Arc::new(RecordingSync {
            calls: AtomicUsize::new(0),
        });
        let debouncer = RecoverySyncDebouncer::with_delay(
            Arc::clone(&sync) as Arc<dyn CartRecoverySync>,
            Arc::new(identity),
            delay,
        );

        (sync, debouncer)
    }

    #[tokio::test]
    async fn a_burst_of_changes_settles_into_one_sync() {
        let (sync, debouncer) = debouncer(
            FixedIdentity::signed_in("shopper@example.com"),
            Duration::from_millis(20),
        );

        debouncer.schedule(vec![record()]);
        debouncer.schedule(vec![record()]);
        debouncer.schedule(vec![record()]);

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(sync.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn signed_out_shoppers_never_sync() {
        let (sync, debouncer) = debouncer(FixedIdentity::signed_out(), Duration::from_millis(5));

        debouncer.schedule(vec![record()]);

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(sync.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cancel_drops_the_pending_sync() {
        let (sync, debouncer) = debouncer(
            FixedIdentity::signed_in("shopper@example.com"),
            Duration::from_millis(20),
        );

        debouncer.schedule(vec![record()]);
        debouncer.cancel();

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(sync.calls.load(Ordering::SeqCst), 0);
    }
}
