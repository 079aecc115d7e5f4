//! # Sale Queue Manager
//!
//! Offline-first sale capture: every checkout lands here first, whatever
//! the network is doing.
//!
//! ## Record Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  enqueue ──► synced = false ──► mark_synced ──► synced = true ──► purge │
//! │     │                               │                              │    │
//! │     ▼                               ▼                              ▼    │
//! │  Enqueued                        Synced                         Purged  │
//! │                                                                         │
//! │  every event also republishes the pending count on a watch channel     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Subscribers (status bar, sync engine) react to events instead of polling.

use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{broadcast, watch, Mutex};
use tracing::{debug, info};

use shoppos_core::{NewSale, QueuedSale};
use shoppos_db::{SaleQueueRepository, ScanDirection};

use crate::error::SyncResult;

const EVENT_CAPACITY: usize = 64;

/// Change notification published by [`SaleQueue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueEvent {
    /// A sale was captured.
    Enqueued { local_id: i64, code: String },

    /// A sale was confirmed by the remote store.
    Synced { local_id: i64 },

    /// Synced sales were deleted.
    Purged { count: u64 },
}

/// Queue of captured sales.
#[derive(Debug, Clone)]
pub struct SaleQueue {
    repo: SaleQueueRepository,
    events: broadcast::Sender<QueueEvent>,
    pending: Arc<watch::Sender<i64>>,
    /// Recount and send happen as one step, so the last value published
    /// is never an older count.
    publish_lock: Arc<Mutex<()>>,
    history_limit: u32,
}

impl SaleQueue {
    /// Opens the queue and seeds the pending count from the store.
    pub async fn open(repo: SaleQueueRepository) -> SyncResult<Self> {
        Self::open_with_history_limit(repo, shoppos_core::DEFAULT_PAGE_LIMIT).await
    }

    pub async fn open_with_history_limit(
        repo: SaleQueueRepository,
        history_limit: u32,
    ) -> SyncResult<Self> {
        let pending = repo.count_by_synced(false).await?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let (pending_tx, _) = watch::channel(pending);

        debug!(pending, "Sale queue opened");

        Ok(SaleQueue {
            repo,
            events,
            pending: Arc::new(pending_tx),
            publish_lock: Arc::new(Mutex::new(())),
            history_limit,
        })
    }

    /// Persists a sale as pending. Never touches the network.
    ///
    /// ## Errors
    /// Any store failure propagates, `StorageUnavailable` included, so the
    /// caller never confirms a sale that was not written.
    pub async fn enqueue(&self, sale: &NewSale) -> SyncResult<QueuedSale> {
        let queued = self.repo.insert(sale, Utc::now()).await?;

        info!(
            local_id = queued.local_id,
            code = %queued.code,
            total = queued.total_amount,
            "Sale queued"
        );

        self.publish(QueueEvent::Enqueued {
            local_id: queued.local_id,
            code: queued.code.clone(),
        })
        .await;

        Ok(queued)
    }

    /// All pending sales, in capture order.
    pub async fn list_pending(&self) -> SyncResult<Vec<QueuedSale>> {
        Ok(self.repo.list_by_synced(false).await?)
    }

    /// Marks a sale synced. Returns `false` (and publishes nothing) when it
    /// was already synced or does not exist.
    pub async fn mark_synced(&self, local_id: i64) -> SyncResult<bool> {
        let changed = self.repo.mark_synced(local_id, Utc::now()).await?;
        if changed {
            self.publish(QueueEvent::Synced { local_id }).await;
        }
        Ok(changed)
    }

    /// Most recent sales first, synced and pending alike.
    pub async fn list_recent(&self) -> SyncResult<Vec<QueuedSale>> {
        self.list_recent_with_limit(self.history_limit).await
    }

    pub async fn list_recent_with_limit(&self, limit: u32) -> SyncResult<Vec<QueuedSale>> {
        Ok(self
            .repo
            .scan_by_created_at(ScanDirection::Descending, limit)
            .await?)
    }

    pub async fn get(&self, local_id: i64) -> SyncResult<Option<QueuedSale>> {
        Ok(self.repo.get(local_id).await?)
    }

    pub async fn count_pending(&self) -> SyncResult<i64> {
        Ok(self.repo.count_by_synced(false).await?)
    }

    /// Deletes every synced sale. Explicit maintenance only.
    pub async fn purge_synced(&self) -> SyncResult<u64> {
        let count = self.repo.purge_synced().await?;
        info!(count, "Purged synced sales");
        if count > 0 {
            self.publish(QueueEvent::Purged { count }).await;
        }
        Ok(count)
    }

    /// Subscribes to queue change events.
    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.events.subscribe()
    }

    /// Watches the number of pending sales.
    pub fn pending_count(&self) -> watch::Receiver<i64> {
        self.pending.subscribe()
    }

    async fn publish(&self, event: QueueEvent) {
        let _published = self.publish_lock.lock().await;
        // the write already succeeded; a failed recount keeps the last value
        match self.repo.count_by_synced(false).await {
            Ok(count) => {
                self.pending.send_replace(count);
            }
            Err(e) => debug!(error = %e, "Pending recount failed"),
        }
        // no subscribers is fine
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shoppos_core::{assemble_sale, Cart, PaymentMethod, Product};
    use shoppos_db::{Database, DbConfig};

    fn sale(price: i64) -> NewSale {
        let mut cart = Cart::new();
        cart.add_product(&Product {
            id: format!("p-{}", price),
            shop_id: "shop-1".into(),
            barcode: None,
            name: "Cà phê sữa".into(),
            price,
            cost_price: 0,
            stock_quantity: 0,
            image: None,
            is_active: true,
            created_at: None,
        })
        .unwrap();
        assemble_sale("shop-1", &cart, PaymentMethod::Cash, Utc::now()).unwrap()
    }

    async fn queue() -> (Database, SaleQueue) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let queue = SaleQueue::open(db.sales_queue()).await.unwrap();
        (db, queue)
    }

    #[tokio::test]
    async fn test_enqueued_sale_is_immediately_pending() {
        let (_db, queue) = queue().await;

        let queued = queue.enqueue(&sale(25_000)).await.unwrap();

        let pending = queue.list_pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].local_id, queued.local_id);
        assert!(!pending[0].synced);
        assert_eq!(pending[0].total_amount, 25_000);
    }

    #[tokio::test]
    async fn test_mark_synced_is_idempotent() {
        let (_db, queue) = queue().await;
        let queued = queue.enqueue(&sale(10_000)).await.unwrap();

        assert!(queue.mark_synced(queued.local_id).await.unwrap());
        let after_first = queue.get(queued.local_id).await.unwrap().unwrap();

        assert!(!queue.mark_synced(queued.local_id).await.unwrap());
        assert!(!queue.mark_synced(424242).await.unwrap());

        let after_second = queue.get(queued.local_id).await.unwrap().unwrap();
        assert_eq!(after_first, after_second);
        assert!(queue.list_pending().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_events_and_pending_count() {
        let (_db, queue) = queue().await;
        let mut events = queue.subscribe();
        let pending = queue.pending_count();
        assert_eq!(*pending.borrow(), 0);

        let a = queue.enqueue(&sale(1_000)).await.unwrap();
        queue.enqueue(&sale(2_000)).await.unwrap();
        assert_eq!(*pending.borrow(), 2);

        queue.mark_synced(a.local_id).await.unwrap();
        queue.mark_synced(a.local_id).await.unwrap();
        assert_eq!(*pending.borrow(), 1);

        assert_eq!(queue.purge_synced().await.unwrap(), 1);

        assert!(matches!(events.recv().await.unwrap(), QueueEvent::Enqueued { .. }));
        assert!(matches!(events.recv().await.unwrap(), QueueEvent::Enqueued { .. }));
        assert_eq!(
            events.recv().await.unwrap(),
            QueueEvent::Synced { local_id: a.local_id }
        );
        // the second mark_synced changed nothing and published nothing
        assert_eq!(events.recv().await.unwrap(), QueueEvent::Purged { count: 1 });
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_pending_count_settles_under_concurrent_writes() {
        let (_db, queue) = queue().await;
        let mut first = Vec::new();
        for price in 1..=10 {
            first.push(queue.enqueue(&sale(price * 1_000)).await.unwrap());
        }

        let mut tasks = Vec::new();
        for sale_ref in &first {
            let queue = queue.clone();
            let local_id = sale_ref.local_id;
            tasks.push(tokio::spawn(async move {
                queue.mark_synced(local_id).await.unwrap();
            }));
        }
        for price in 11..=20 {
            let queue = queue.clone();
            tasks.push(tokio::spawn(async move {
                queue.enqueue(&sale(price * 1_000)).await.unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let stored = queue.count_pending().await.unwrap();
        assert_eq!(stored, 10);
        assert_eq!(*queue.pending_count().borrow(), stored);
    }

    #[tokio::test]
    async fn test_list_recent_includes_synced_newest_first() {
        let (_db, queue) = queue().await;
        let a = queue.enqueue(&sale(1_000)).await.unwrap();
        let b = queue.enqueue(&sale(2_000)).await.unwrap();
        queue.mark_synced(a.local_id).await.unwrap();

        let recent = queue.list_recent().await.unwrap();
        let ids: Vec<i64> = recent.iter().map(|s| s.local_id).collect();
        assert_eq!(ids, vec![b.local_id, a.local_id]);
        assert!(recent[1].synced);

        assert_eq!(queue.list_recent_with_limit(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_open_seeds_pending_count() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let first = SaleQueue::open(db.sales_queue()).await.unwrap();
        first.enqueue(&sale(1_000)).await.unwrap();

        let reopened = SaleQueue::open(db.sales_queue()).await.unwrap();
        assert_eq!(*reopened.pending_count().borrow(), 1);
        assert_eq!(reopened.count_pending().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_enqueue_fails_loudly_when_store_is_closed() {
        let (db, queue) = queue().await;
        db.close().await;

        let err = queue.enqueue(&sale(1_000)).await.unwrap_err();
        assert!(err.is_storage_unavailable());
    }
}
