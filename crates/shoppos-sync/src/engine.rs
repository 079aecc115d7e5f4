//! # Synchronization Engine
//!
//! Moves sales from the local queue to the remote store and the catalog
//! from the remote store to the local cache.
//!
//! ## Engine Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         SyncEngine                                      │
//! │                                                                         │
//! │  TRIGGERS (one tokio::select! loop)         GUARDS                      │
//! │  ──────────────────────────────────         ──────                      │
//! │  timer tick (push_interval)  ──┐            push: Semaphore(1)          │
//! │  offline → online            ──┼──► push_pending()   try_acquire, so a  │
//! │  request_push()  (mpsc(1))   ──┘            second trigger is a no-op   │
//! │  shutdown                    ──► exit       pull: Semaphore(1)          │
//! │                                                                         │
//! │  DRAIN PASS (sequential, one sale at a time)                           │
//! │  ──────────────────────────────────────────                             │
//! │  for sale in queue.list_pending():                                     │
//! │     1. sales?shop_id&client_ref     found → reuse id | none → insert   │
//! │     2. sale_items?sale_id           found → done     | none → insert   │
//! │     3. queue.mark_synced(local_id)                                     │
//! │     any step fails → record SaleFailure, sale stays pending, next sale │
//! │                                                                         │
//! │  STATUS: watch<SyncStatus> + SyncEventEmitter (presentation layer)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Retry Safety
//! Every remote write is keyed by the sale's `client_ref`. A header left
//! behind by a failed items insert is found and completed by the next pass
//! instead of being inserted twice. Between the two passes the remote side
//! holds a header without items; the failure is reported with
//! [`SyncStage::Items`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch, Mutex, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use shoppos_core::validation::validate_void_reason;
use shoppos_core::{Product, QueuedSale};
use shoppos_db::Database;

use crate::catalog::ProductCache;
use crate::config::PosConfig;
use crate::connectivity::Connectivity;
use crate::error::{SyncError, SyncResult};
use crate::queue::SaleQueue;
use crate::remote::{
    row_id, to_row, Filter, RemoteProduct, RemoteQuery, RemoteSaleHeader, RemoteSaleItem,
    RemoteStore, RemoteTable,
};
use crate::session::Session;

// =============================================================================
// Status
// =============================================================================

/// What the engine is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    #[default]
    Idle,
    Pushing,
    Pulling,
}

/// Current sync status for the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncStatus {
    pub phase: SyncPhase,

    /// Last reported connectivity.
    pub online: bool,

    /// Sales captured but not yet confirmed by the remote store.
    pub pending_count: i64,

    /// End of the last push pass, or of the last successful catalog
    /// refresh. Display only.
    pub last_sync: Option<DateTime<Utc>>,

    /// Last failure message, cleared by a clean pass.
    pub last_error: Option<String>,
}

// =============================================================================
// Event Emitter Trait
// =============================================================================

/// Trait for forwarding engine events to the presentation layer.
pub trait SyncEventEmitter: Send + Sync {
    /// Emits a sync status change event.
    fn emit_status(&self, status: &SyncStatus);

    /// Emits a sync error event.
    fn emit_error(&self, message: &str, retryable: bool);
}

/// No-op event emitter.
pub struct NoOpEmitter;

impl SyncEventEmitter for NoOpEmitter {
    fn emit_status(&self, _status: &SyncStatus) {}
    fn emit_error(&self, _message: &str, _retryable: bool) {}
}

// =============================================================================
// Pass Results
// =============================================================================

/// Step of a sale push that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStage {
    /// Finding or inserting the `sales` row.
    Header,
    /// Finding or inserting the `sale_items` rows. The header may already exist.
    Items,
    /// Flipping the local `synced` flag.
    MarkSynced,
}

/// One sale that stayed pending.
#[derive(Debug)]
pub struct SaleFailure {
    pub local_id: i64,
    pub code: String,
    pub stage: SyncStage,
    pub error: SyncError,
}

impl fmt::Display for SaleFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sale {} ({}) failed at {:?}: {}",
            self.code, self.local_id, self.stage, self.error
        )
    }
}

/// Result of one drain pass.
#[derive(Debug, Default)]
pub struct PushReport {
    /// Pending sales in the snapshot.
    pub attempted: usize,
    /// Sales confirmed and marked synced.
    pub synced: usize,
    pub failures: Vec<SaleFailure>,
}

impl PushReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Outcome of a push request.
#[derive(Debug)]
pub enum PushOutcome {
    /// A drain pass ran.
    Completed(PushReport),
    /// Another pass holds the push guard; nothing was read.
    AlreadyRunning,
    /// Device offline; nothing was read.
    Offline,
    /// Sync turned off in configuration; nothing was read.
    Disabled,
}

/// Outcome of a catalog refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    Refreshed { count: usize },
    AlreadyRunning,
    /// Sync turned off in configuration; the cache was left alone.
    Disabled,
}

/// Outcome of saving a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Cached locally and written to the remote store.
    Pushed,
    /// Cached locally only (offline, signed out or sync disabled).
    LocalOnly,
}

#[derive(Debug, Clone, Copy)]
enum Trigger {
    Timer,
    Reconnect,
    Request,
}

// =============================================================================
// Settings
// =============================================================================

/// Engine settings.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub shop_id: String,
    pub push_interval: Duration,
    /// When off, the engine never talks to the remote store.
    pub enabled: bool,
}

impl EngineSettings {
    pub fn new(shop_id: impl Into<String>) -> Self {
        EngineSettings {
            shop_id: shop_id.into(),
            push_interval: Duration::from_secs(120),
            enabled: true,
        }
    }

    pub fn push_interval(mut self, interval: Duration) -> Self {
        self.push_interval = interval;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn from_config(config: &PosConfig) -> Self {
        EngineSettings {
            shop_id: config.shop_id().to_string(),
            push_interval: config.sync.push_interval(),
            enabled: config.is_sync_enabled(),
        }
    }
}

// =============================================================================
// Engine
// =============================================================================

struct EngineInner {
    settings: EngineSettings,
    queue: SaleQueue,
    cache: ProductCache,
    remote: Arc<dyn RemoteStore>,
    connectivity: Connectivity,
    session: Session,
    emitter: Arc<dyn SyncEventEmitter>,
    push_guard: Semaphore,
    pull_guard: Semaphore,
    status: watch::Sender<SyncStatus>,
}

struct RunningLoop {
    shutdown_tx: mpsc::Sender<()>,
    handle: JoinHandle<mpsc::Receiver<()>>,
}

#[derive(Default)]
struct LoopSlot {
    trigger_rx: Option<mpsc::Receiver<()>>,
    running: Option<RunningLoop>,
}

/// The synchronization engine. Construct with [`SyncEngineBuilder`].
pub struct SyncEngine {
    inner: Arc<EngineInner>,
    trigger_tx: mpsc::Sender<()>,
    slot: Mutex<LoopSlot>,
}

impl SyncEngine {
    pub fn builder(settings: EngineSettings) -> SyncEngineBuilder {
        SyncEngineBuilder::new(settings)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Spawns the trigger loop.
    ///
    /// The first timer tick fires immediately, so starting while online
    /// drains the queue right away. With sync disabled no loop is spawned
    /// and sales stay queued locally.
    pub async fn start(&self) -> SyncResult<()> {
        let mut slot = self.slot.lock().await;
        if slot.running.is_some() {
            return Err(SyncError::AlreadyRunning);
        }
        if !self.inner.settings.enabled {
            info!(shop_id = %self.inner.settings.shop_id, "Sync disabled, engine not started");
            return Ok(());
        }
        let trigger_rx = slot
            .trigger_rx
            .take()
            .ok_or_else(|| SyncError::Internal("push trigger channel lost".into()))?;

        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let handle = tokio::spawn(run_loop(self.inner.clone(), trigger_rx, shutdown_rx));
        slot.running = Some(RunningLoop {
            shutdown_tx,
            handle,
        });

        info!(
            shop_id = %self.inner.settings.shop_id,
            interval_secs = self.inner.settings.push_interval.as_secs(),
            "Sync engine started"
        );
        Ok(())
    }

    /// Stops the loop, waiting for an in-flight pass to finish.
    /// Stopping a stopped engine does nothing.
    pub async fn stop(&self) -> SyncResult<()> {
        let mut slot = self.slot.lock().await;
        let Some(running) = slot.running.take() else {
            return Ok(());
        };

        let _ = running.shutdown_tx.send(()).await;
        match running.handle.await {
            Ok(trigger_rx) => {
                slot.trigger_rx = Some(trigger_rx);
                info!("Sync engine stopped");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Sync loop ended abnormally");
                Err(SyncError::Internal(format!("sync loop failed: {}", e)))
            }
        }
    }

    pub async fn is_running(&self) -> bool {
        self.slot.lock().await.running.is_some()
    }

    // =========================================================================
    // Push
    // =========================================================================

    /// Asks the loop for a push pass without waiting for it.
    ///
    /// Requests made while one is already queued collapse into it.
    pub fn request_push(&self) {
        if !self.inner.settings.enabled {
            debug!("Sync disabled, push request ignored");
            return;
        }
        match self.trigger_tx.try_send(()) {
            Ok(()) => debug!("Push requested"),
            Err(TrySendError::Full(_)) => debug!("Push already requested"),
            Err(TrySendError::Closed(_)) => warn!("Push requested but the sync loop is gone"),
        }
    }

    /// Runs one drain pass now, unless one is already in flight.
    ///
    /// ## Errors
    /// `NoSession` when no user is signed in; local store failures while
    /// reading the queue. Remote failures never surface here; they are in
    /// the report.
    pub async fn push_pending(&self) -> SyncResult<PushOutcome> {
        self.inner.push_pending().await
    }

    // =========================================================================
    // Pull
    // =========================================================================

    /// Replaces the product cache with the shop's active remote products.
    ///
    /// On any failure the previous cache is left intact and the error is
    /// returned.
    pub async fn refresh_catalog(&self) -> SyncResult<PullOutcome> {
        let inner = &self.inner;
        if !inner.settings.enabled {
            debug!("Sync disabled, catalog refresh skipped");
            return Ok(PullOutcome::Disabled);
        }
        let _permit = match inner.pull_guard.try_acquire() {
            Ok(permit) => permit,
            Err(_) => {
                debug!("Catalog refresh already in flight");
                return Ok(PullOutcome::AlreadyRunning);
            }
        };
        if !inner.connectivity.is_online() {
            return Err(SyncError::Offline);
        }

        inner.update_status(|s| s.phase = SyncPhase::Pulling);
        let result = inner.pull_products().await;

        let phase = inner.phase_after(SyncPhase::Pulling);
        let now = Utc::now();
        inner.update_status(|s| {
            s.phase = phase;
            match &result {
                Ok(_) => {
                    s.last_sync = Some(now);
                    s.last_error = None;
                }
                Err(e) => s.last_error = Some(e.to_string()),
            }
        });

        match result {
            Ok(count) => {
                info!(count, "Catalog refreshed");
                Ok(PullOutcome::Refreshed { count })
            }
            Err(e) => {
                warn!(error = %e, "Catalog refresh failed, keeping previous cache");
                inner.emitter.emit_error(&e.to_string(), e.is_retryable());
                Err(e)
            }
        }
    }

    // =========================================================================
    // Products & Voids
    // =========================================================================

    /// Caches a created or edited product, then writes it to the remote
    /// store when online and signed in.
    ///
    /// The local write stands even if the remote write fails.
    pub async fn save_product(&self, product: &Product) -> SyncResult<SaveOutcome> {
        let inner = &self.inner;
        let shop_id = inner.settings.shop_id.as_str();

        let mut product = product.clone();
        product.shop_id = shop_id.to_string();
        inner.cache.upsert_one(&product).await?;

        if !inner.settings.enabled
            || !inner.connectivity.is_online()
            || inner.session.user_id().is_none()
        {
            debug!(id = %product.id, "Product saved locally only");
            return Ok(SaveOutcome::LocalOnly);
        }

        let row = to_row(&RemoteProduct::new(&product, shop_id))?;
        let existing = inner
            .remote
            .select(
                RemoteTable::Products,
                &RemoteQuery::new().eq("id", product.id.as_str()).limit(1),
            )
            .await?;

        if existing.is_empty() {
            inner.remote.insert(RemoteTable::Products, vec![row]).await?;
        } else {
            let filters = [
                Filter::eq("id", product.id.as_str()),
                Filter::eq("shop_id", shop_id),
            ];
            inner.remote.update(RemoteTable::Products, &filters, row).await?;
        }

        info!(id = %product.id, name = %product.name, "Product pushed");
        Ok(SaveOutcome::Pushed)
    }

    /// Voids a synced sale on the remote store.
    ///
    /// ## Errors
    /// - `Validation` for a blank reason
    /// - `SaleNotFound` for an unknown `local_id`
    /// - `NotSynced` while the sale is still pending
    /// - `SyncDisabled` when sync is turned off
    /// - `Offline` without connectivity
    pub async fn void_sale(&self, local_id: i64, reason: &str) -> SyncResult<()> {
        let inner = &self.inner;
        let reason = validate_void_reason(reason)?;

        let sale = inner
            .queue
            .get(local_id)
            .await?
            .ok_or(SyncError::SaleNotFound { local_id })?;
        if !sale.synced {
            return Err(SyncError::NotSynced {
                local_id,
                code: sale.code,
            });
        }
        if !inner.settings.enabled {
            return Err(SyncError::SyncDisabled);
        }
        if !inner.connectivity.is_online() {
            return Err(SyncError::Offline);
        }

        let filters = [
            Filter::eq("shop_id", sale.shop_id.as_str()),
            Filter::eq("client_ref", sale.client_ref.as_str()),
        ];
        let patch = json!({
            "is_void": true,
            "void_reason": reason,
            "void_at": Utc::now(),
        });
        let updated = inner.remote.update(RemoteTable::Sales, &filters, patch).await?;
        if updated.is_empty() {
            return Err(SyncError::RemoteRejected {
                status: 404,
                message: format!("no remote sale for {}", sale.code),
            });
        }

        info!(local_id, code = %sale.code, "Sale voided");
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn shop_id(&self) -> &str {
        &self.inner.settings.shop_id
    }

    pub fn queue(&self) -> &SaleQueue {
        &self.inner.queue
    }

    pub fn cache(&self) -> &ProductCache {
        &self.inner.cache
    }

    pub fn connectivity(&self) -> &Connectivity {
        &self.inner.connectivity
    }

    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    /// Watches the engine status.
    pub fn status(&self) -> watch::Receiver<SyncStatus> {
        self.inner.status.subscribe()
    }

    pub fn status_snapshot(&self) -> SyncStatus {
        self.inner.status.borrow().clone()
    }
}

// =============================================================================
// Pass Implementation
// =============================================================================

impl EngineInner {
    async fn push_pending(&self) -> SyncResult<PushOutcome> {
        if !self.settings.enabled {
            debug!("Sync disabled, push skipped");
            return Ok(PushOutcome::Disabled);
        }
        // checked before the first await so overlapping triggers see it
        let _permit = match self.push_guard.try_acquire() {
            Ok(permit) => permit,
            Err(_) => {
                debug!("Push already in flight");
                return Ok(PushOutcome::AlreadyRunning);
            }
        };
        if !self.connectivity.is_online() {
            debug!("Offline, push skipped");
            return Ok(PushOutcome::Offline);
        }
        let user_id = self.session.user_id().ok_or(SyncError::NoSession)?;

        self.update_status(|s| s.phase = SyncPhase::Pushing);
        let result = self.drain(&user_id).await;

        let pending = self.queue.count_pending().await.ok();
        let phase = self.phase_after(SyncPhase::Pushing);
        let now = Utc::now();
        let last_error = match &result {
            Ok(report) => report.failures.last().map(|f| f.to_string()),
            Err(e) => Some(e.to_string()),
        };
        self.update_status(|s| {
            s.phase = phase;
            s.last_sync = Some(now);
            s.last_error = last_error.clone();
            if let Some(pending) = pending {
                s.pending_count = pending;
            }
        });

        match &result {
            Ok(report) if !report.is_clean() => {
                let retryable = report.failures.iter().all(|f| f.error.is_retryable());
                let message = format!(
                    "{} of {} sales could not be synced",
                    report.failures.len(),
                    report.attempted
                );
                self.emitter.emit_error(&message, retryable);
            }
            Ok(_) => {}
            Err(e) => self.emitter.emit_error(&e.to_string(), e.is_retryable()),
        }

        result.map(PushOutcome::Completed)
    }

    async fn drain(&self, user_id: &str) -> SyncResult<PushReport> {
        let pending = self.queue.list_pending().await?;
        let mut report = PushReport {
            attempted: pending.len(),
            ..Default::default()
        };

        if pending.is_empty() {
            debug!("No pending sales");
            return Ok(report);
        }

        info!(count = pending.len(), "Pushing pending sales");

        for sale in &pending {
            match self.push_sale(sale, user_id).await {
                Ok(()) => report.synced += 1,
                Err(failure) => {
                    warn!(
                        local_id = failure.local_id,
                        code = %failure.code,
                        stage = ?failure.stage,
                        error = %failure.error,
                        "Sale push failed, will retry next pass"
                    );
                    report.failures.push(failure);
                }
            }
        }

        info!(
            attempted = report.attempted,
            synced = report.synced,
            failed = report.failures.len(),
            "Push pass finished"
        );
        Ok(report)
    }

    async fn push_sale(&self, sale: &QueuedSale, user_id: &str) -> Result<(), SaleFailure> {
        let fail = |stage, error| SaleFailure {
            local_id: sale.local_id,
            code: sale.code.clone(),
            stage,
            error,
        };

        let sale_id = self
            .ensure_header(sale, user_id)
            .await
            .map_err(|e| fail(SyncStage::Header, e))?;
        self.ensure_items(sale, &sale_id)
            .await
            .map_err(|e| fail(SyncStage::Items, e))?;
        self.queue
            .mark_synced(sale.local_id)
            .await
            .map_err(|e| fail(SyncStage::MarkSynced, e))?;

        debug!(local_id = sale.local_id, remote_id = %sale_id, "Sale synced");
        Ok(())
    }

    /// Remote id of the sale's header, inserting it if absent.
    async fn ensure_header(&self, sale: &QueuedSale, user_id: &str) -> SyncResult<String> {
        let query = RemoteQuery::new()
            .eq("shop_id", sale.shop_id.as_str())
            .eq("client_ref", sale.client_ref.as_str())
            .limit(1);
        let existing = self.remote.select(RemoteTable::Sales, &query).await?;
        if let Some(row) = existing.first() {
            let id = row_id(row)?;
            debug!(local_id = sale.local_id, remote_id = %id, "Sale header already on remote");
            return Ok(id);
        }

        let header = to_row(&RemoteSaleHeader::from_queued(sale, user_id))?;
        let inserted = self.remote.insert(RemoteTable::Sales, vec![header]).await?;
        let row = inserted
            .first()
            .ok_or_else(|| SyncError::InvalidResponse("sale insert returned no row".into()))?;
        row_id(row)
    }

    /// Inserts all line items unless the remote already has some.
    async fn ensure_items(&self, sale: &QueuedSale, sale_id: &str) -> SyncResult<()> {
        if sale.items.is_empty() {
            return Ok(());
        }

        let query = RemoteQuery::new().eq("sale_id", sale_id).limit(1);
        let present = self.remote.select(RemoteTable::SaleItems, &query).await?;
        if !present.is_empty() {
            debug!(local_id = sale.local_id, "Sale items already on remote");
            return Ok(());
        }

        let rows = sale
            .items
            .iter()
            .map(|line| to_row(&RemoteSaleItem::from_line(sale_id, line)))
            .collect::<SyncResult<Vec<_>>>()?;
        self.remote.insert(RemoteTable::SaleItems, rows).await?;
        Ok(())
    }

    async fn pull_products(&self) -> SyncResult<usize> {
        let query = RemoteQuery::new()
            .eq("shop_id", self.settings.shop_id.as_str())
            .eq("is_active", true);
        let rows = self.remote.select(RemoteTable::Products, &query).await?;

        let products = rows
            .into_iter()
            .map(serde_json::from_value::<Product>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| SyncError::InvalidResponse(format!("product row: {}", e)))?;

        self.cache.refresh_all(&products).await
    }

    async fn run_pass(&self, trigger: Trigger) {
        match self.push_pending().await {
            Ok(PushOutcome::Completed(report)) => {
                debug!(?trigger, synced = report.synced, "Triggered push done")
            }
            Ok(other) => debug!(?trigger, outcome = ?other, "Triggered push skipped"),
            Err(e) => warn!(?trigger, error = %e, "Triggered push failed"),
        }
    }

    /// Phase to show once `finished` ends, given the other guard.
    fn phase_after(&self, finished: SyncPhase) -> SyncPhase {
        match finished {
            SyncPhase::Pushing if self.pull_guard.available_permits() == 0 => SyncPhase::Pulling,
            SyncPhase::Pulling if self.push_guard.available_permits() == 0 => SyncPhase::Pushing,
            _ => SyncPhase::Idle,
        }
    }

    fn update_status(&self, change: impl FnOnce(&mut SyncStatus)) {
        self.status.send_modify(change);
        let snapshot = self.status.borrow().clone();
        self.emitter.emit_status(&snapshot);
    }
}

/// The trigger loop. Hands the request channel back on exit so the engine
/// can be started again.
async fn run_loop(
    inner: Arc<EngineInner>,
    mut trigger_rx: mpsc::Receiver<()>,
    mut shutdown_rx: mpsc::Receiver<()>,
) -> mpsc::Receiver<()> {
    let mut ticker = tokio::time::interval(inner.settings.push_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut online_rx = inner.connectivity.subscribe();
    let mut pending_rx = inner.queue.pending_count();
    let online = *online_rx.borrow_and_update();
    let mut seen_reconnects = inner.connectivity.reconnect_count();
    let pending = *pending_rx.borrow_and_update();
    inner.update_status(|s| {
        s.online = online;
        s.pending_count = pending;
    });

    loop {
        tokio::select! {
            biased;

            _ = shutdown_rx.recv() => {
                info!("Sync loop received shutdown");
                break;
            }

            Ok(()) = online_rx.changed() => {
                let online = *online_rx.borrow_and_update();
                inner.update_status(|s| s.online = online);
                // counted, so a blip during a running pass is not lost
                let reconnects = inner.connectivity.reconnect_count();
                if online && reconnects != seen_reconnects {
                    seen_reconnects = reconnects;
                    inner.run_pass(Trigger::Reconnect).await;
                }
            }

            Ok(()) = pending_rx.changed() => {
                let pending = *pending_rx.borrow_and_update();
                inner.update_status(|s| s.pending_count = pending);
            }

            Some(()) = trigger_rx.recv() => {
                inner.run_pass(Trigger::Request).await;
            }

            _ = ticker.tick() => {
                inner.run_pass(Trigger::Timer).await;
            }
        }
    }

    trigger_rx
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`SyncEngine`].
pub struct SyncEngineBuilder {
    settings: EngineSettings,
    queue: Option<SaleQueue>,
    cache: Option<ProductCache>,
    remote: Option<Arc<dyn RemoteStore>>,
    connectivity: Option<Connectivity>,
    session: Option<Session>,
    emitter: Option<Arc<dyn SyncEventEmitter>>,
}

impl SyncEngineBuilder {
    pub fn new(settings: EngineSettings) -> Self {
        SyncEngineBuilder {
            settings,
            queue: None,
            cache: None,
            remote: None,
            connectivity: None,
            session: None,
            emitter: None,
        }
    }

    /// Wires queue, cache, session and settings from `config` over an
    /// open database. Connectivity starts offline.
    pub async fn from_config(
        config: &PosConfig,
        db: &Database,
        remote: Arc<dyn RemoteStore>,
    ) -> SyncResult<Self> {
        let queue =
            SaleQueue::open_with_history_limit(db.sales_queue(), config.sync.history_limit)
                .await?;
        let cache = ProductCache::with_search_limit(db.products(), config.sync.search_limit);

        Ok(SyncEngineBuilder::new(EngineSettings::from_config(config))
            .queue(queue)
            .cache(cache)
            .remote(remote)
            .session(Session::new(config.user_id().map(str::to_string))))
    }

    pub fn queue(mut self, queue: SaleQueue) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn cache(mut self, cache: ProductCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn remote(mut self, remote: Arc<dyn RemoteStore>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Defaults to a fresh, offline flag.
    pub fn connectivity(mut self, connectivity: Connectivity) -> Self {
        self.connectivity = Some(connectivity);
        self
    }

    /// Defaults to signed out.
    pub fn session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    pub fn emitter(mut self, emitter: Arc<dyn SyncEventEmitter>) -> Self {
        self.emitter = Some(emitter);
        self
    }

    /// Builds the engine. The loop is not started.
    pub fn build(self) -> SyncResult<SyncEngine> {
        if self.settings.shop_id.trim().is_empty() {
            return Err(SyncError::MissingShopId);
        }
        if self.settings.push_interval.is_zero() {
            return Err(SyncError::InvalidConfig(
                "push interval must be greater than zero".into(),
            ));
        }

        let queue = self
            .queue
            .ok_or_else(|| SyncError::InvalidConfig("Sale queue required".into()))?;
        let cache = self
            .cache
            .ok_or_else(|| SyncError::InvalidConfig("Product cache required".into()))?;
        let remote = self
            .remote
            .ok_or_else(|| SyncError::InvalidConfig("Remote store required".into()))?;
        let connectivity = self.connectivity.unwrap_or_default();
        let session = self.session.unwrap_or_default();
        let emitter = self.emitter.unwrap_or_else(|| Arc::new(NoOpEmitter));

        let initial = SyncStatus {
            online: connectivity.is_online(),
            pending_count: *queue.pending_count().borrow(),
            ..Default::default()
        };
        let (status, _) = watch::channel(initial);
        let (trigger_tx, trigger_rx) = mpsc::channel(1);

        let inner = EngineInner {
            settings: self.settings,
            queue,
            cache,
            remote,
            connectivity,
            session,
            emitter,
            push_guard: Semaphore::new(1),
            pull_guard: Semaphore::new(1),
            status,
        };

        Ok(SyncEngine {
            inner: Arc::new(inner),
            trigger_tx,
            slot: Mutex::new(LoopSlot {
                trigger_rx: Some(trigger_rx),
                running: None,
            }),
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryRemote, Op};
    use shoppos_core::{assemble_sale, Cart, NewSale, PaymentMethod};
    use shoppos_db::{Database, DbConfig};
    use std::sync::Mutex as StdMutex;

    const SHOP: &str = "shop-1";

    struct Harness {
        _db: Database,
        engine: SyncEngine,
        remote: Arc<MemoryRemote>,
    }

    async fn harness_with(online: bool, interval: Duration, emitter: Arc<dyn SyncEventEmitter>) -> Harness {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let remote = Arc::new(MemoryRemote::new());
        let engine = SyncEngine::builder(EngineSettings::new(SHOP).push_interval(interval))
            .queue(SaleQueue::open(db.sales_queue()).await.unwrap())
            .cache(ProductCache::new(db.products()))
            .remote(remote.clone())
            .connectivity(Connectivity::new(online))
            .session(Session::new(Some("user-1".into())))
            .emitter(emitter)
            .build()
            .unwrap();
        Harness {
            _db: db,
            engine,
            remote,
        }
    }

    async fn harness(online: bool) -> Harness {
        harness_with(online, Duration::from_secs(3600), Arc::new(NoOpEmitter)).await
    }

    fn product(id: &str, price: i64) -> Product {
        Product {
            id: id.into(),
            shop_id: SHOP.into(),
            barcode: Some(format!("893{}", id)),
            name: format!("Sản phẩm {}", id),
            price,
            cost_price: 0,
            stock_quantity: 10,
            image: None,
            is_active: true,
            created_at: None,
        }
    }

    fn sale_of(total: i64) -> NewSale {
        let mut cart = Cart::new();
        cart.add_product(&product(&format!("p{}", total), total)).unwrap();
        assemble_sale(SHOP, &cart, PaymentMethod::Cash, Utc::now()).unwrap()
    }

    fn completed(outcome: PushOutcome) -> PushReport {
        match outcome {
            PushOutcome::Completed(report) => report,
            other => panic!("expected a completed pass, got {:?}", other),
        }
    }

    async fn wait_for_pending(engine: &SyncEngine, want: i64) {
        let mut rx = engine.queue().pending_count();
        tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|c| *c == want))
            .await
            .expect("timed out waiting for pending count")
            .unwrap();
    }

    #[tokio::test]
    async fn test_offline_sales_sync_after_reconnect() {
        let h = harness(false).await;
        for total in [10_000, 20_000, 15_000] {
            h.engine.queue().enqueue(&sale_of(total)).await.unwrap();
        }

        assert!(matches!(
            h.engine.push_pending().await.unwrap(),
            PushOutcome::Offline
        ));
        assert!(h.remote.rows(RemoteTable::Sales).is_empty());

        h.engine.connectivity().set_online(true);
        let report = completed(h.engine.push_pending().await.unwrap());
        assert_eq!(report.attempted, 3);
        assert_eq!(report.synced, 3);
        assert!(report.is_clean());

        assert!(h.engine.queue().list_pending().await.unwrap().is_empty());
        let totals: Vec<i64> = h
            .remote
            .rows(RemoteTable::Sales)
            .iter()
            .map(|r| r["total_amount"].as_i64().unwrap())
            .collect();
        assert_eq!(totals, vec![10_000, 20_000, 15_000]);
        assert_eq!(h.remote.rows(RemoteTable::SaleItems).len(), 3);

        assert_eq!(*h.engine.queue().pending_count().borrow(), 0);
        let status = h.engine.status_snapshot();
        assert_eq!(status.pending_count, 0);
        assert_eq!(status.phase, SyncPhase::Idle);
        assert!(status.last_sync.is_some());
        assert_eq!(status.last_error, None);
    }

    #[tokio::test]
    async fn test_header_failure_keeps_sale_pending() {
        let h = harness(true).await;
        let queued = h.engine.queue().enqueue(&sale_of(12_000)).await.unwrap();
        h.remote.fail(RemoteTable::Sales, Op::Insert);

        let report = completed(h.engine.push_pending().await.unwrap());
        assert_eq!(report.synced, 0);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].stage, SyncStage::Header);
        assert!(report.failures[0].error.is_retryable());

        let pending = h.engine.queue().list_pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].local_id, queued.local_id);
        assert!(h.remote.rows(RemoteTable::Sales).is_empty());
        assert!(h.engine.status_snapshot().last_error.is_some());
    }

    #[tokio::test]
    async fn test_items_failure_leaves_header_then_next_pass_completes_it() {
        let h = harness(true).await;
        h.engine.queue().enqueue(&sale_of(8_000)).await.unwrap();
        h.remote.fail(RemoteTable::SaleItems, Op::Insert);

        let report = completed(h.engine.push_pending().await.unwrap());
        assert_eq!(report.failures[0].stage, SyncStage::Items);
        assert_eq!(h.engine.queue().list_pending().await.unwrap().len(), 1);
        // header without items on the remote until the next pass
        assert_eq!(h.remote.rows(RemoteTable::Sales).len(), 1);
        assert!(h.remote.rows(RemoteTable::SaleItems).is_empty());

        h.remote.clear_failures();
        let report = completed(h.engine.push_pending().await.unwrap());
        assert_eq!(report.synced, 1);

        assert_eq!(h.remote.rows(RemoteTable::Sales).len(), 1);
        assert_eq!(h.remote.calls(RemoteTable::Sales, Op::Insert), 1);
        let items = h.remote.rows(RemoteTable::SaleItems);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["sale_id"], h.remote.rows(RemoteTable::Sales)[0]["id"]);
        assert!(h.engine.queue().list_pending().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_existing_remote_header_is_reused() {
        let h = harness(true).await;
        let queued = h.engine.queue().enqueue(&sale_of(5_000)).await.unwrap();
        // an earlier pass inserted everything but lost the response
        h.remote.seed(
            RemoteTable::Sales,
            vec![json!({"id": "s-1", "shop_id": SHOP, "client_ref": queued.client_ref})],
        );
        h.remote.seed(
            RemoteTable::SaleItems,
            vec![json!({"id": "i-1", "sale_id": "s-1"})],
        );

        let report = completed(h.engine.push_pending().await.unwrap());
        assert_eq!(report.synced, 1);
        assert_eq!(h.remote.calls(RemoteTable::Sales, Op::Insert), 0);
        assert_eq!(h.remote.calls(RemoteTable::SaleItems, Op::Insert), 0);
        assert_eq!(h.remote.rows(RemoteTable::Sales).len(), 1);
    }

    #[tokio::test]
    async fn test_overlapping_pushes_run_one_pass() {
        let h = harness(true).await;
        h.engine.queue().enqueue(&sale_of(1_000)).await.unwrap();
        h.engine.queue().enqueue(&sale_of(2_000)).await.unwrap();

        let (a, b) = tokio::join!(h.engine.push_pending(), h.engine.push_pending());
        let outcomes = [a.unwrap(), b.unwrap()];

        let passes = outcomes
            .iter()
            .filter(|o| matches!(o, PushOutcome::Completed(_)))
            .count();
        let skipped = outcomes
            .iter()
            .filter(|o| matches!(o, PushOutcome::AlreadyRunning))
            .count();
        assert_eq!((passes, skipped), (1, 1));
        assert_eq!(h.remote.rows(RemoteTable::Sales).len(), 2);

        // guard released afterwards
        let report = completed(h.engine.push_pending().await.unwrap());
        assert_eq!(report.attempted, 0);
    }

    #[tokio::test]
    async fn test_push_without_session_fails() {
        let h = harness(true).await;
        h.engine.queue().enqueue(&sale_of(1_000)).await.unwrap();
        h.engine.session().set_user(None);

        let err = h.engine.push_pending().await.unwrap_err();
        assert!(matches!(err, SyncError::NoSession));
        assert_eq!(h.engine.queue().count_pending().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_pushed_header_carries_attribution_and_dates() {
        let h = harness(true).await;
        let queued = h.engine.queue().enqueue(&sale_of(3_000)).await.unwrap();
        h.engine.push_pending().await.unwrap();

        let row = &h.remote.rows(RemoteTable::Sales)[0];
        assert_eq!(row["created_by"], json!("user-1"));
        assert_eq!(row["code"], json!(queued.code));
        assert_eq!(
            row["sale_local_date"],
            json!(queued.sale_local_date.to_string())
        );
        assert!(row.get("local_id").is_none());
    }

    #[tokio::test]
    async fn test_loop_pushes_on_request() {
        let h = harness(true).await;
        h.engine.start().await.unwrap();
        assert!(matches!(h.engine.start().await, Err(SyncError::AlreadyRunning)));

        h.engine.queue().enqueue(&sale_of(4_000)).await.unwrap();
        h.engine.request_push();
        wait_for_pending(&h.engine, 0).await;

        h.engine.stop().await.unwrap();
        h.engine.stop().await.unwrap();
        assert!(!h.engine.is_running().await);

        // restartable
        h.engine.start().await.unwrap();
        h.engine.stop().await.unwrap();
        assert_eq!(h.remote.rows(RemoteTable::Sales).len(), 1);
    }

    #[tokio::test]
    async fn test_loop_pushes_on_reconnect() {
        let h = harness(false).await;
        h.engine.queue().enqueue(&sale_of(6_000)).await.unwrap();
        h.engine.start().await.unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(h.engine.queue().count_pending().await.unwrap(), 1);

        h.engine.connectivity().set_online(true);
        wait_for_pending(&h.engine, 0).await;

        h.engine.stop().await.unwrap();
        assert_eq!(h.remote.rows(RemoteTable::Sales).len(), 1);
    }

    #[tokio::test]
    async fn test_reconnect_during_a_pass_still_pushes() {
        let h = harness(true).await;
        h.engine.queue().enqueue(&sale_of(6_100)).await.unwrap();

        let held = h.remote.hold();
        h.engine.start().await.unwrap();
        tokio::time::timeout(Duration::from_secs(5), async {
            while h.remote.calls(RemoteTable::Sales, Op::Select) == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("first pass never reached the remote store");

        // blip while the timer pass is parked on its first remote call
        h.engine.connectivity().set_online(false);
        h.engine.connectivity().set_online(true);
        h.engine.queue().enqueue(&sale_of(6_200)).await.unwrap();
        drop(held);

        wait_for_pending(&h.engine, 0).await;
        h.engine.stop().await.unwrap();
        assert_eq!(h.remote.rows(RemoteTable::Sales).len(), 2);
    }

    #[tokio::test]
    async fn test_loop_pushes_on_timer() {
        let h = harness_with(true, Duration::from_millis(50), Arc::new(NoOpEmitter)).await;
        h.engine.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        h.engine.queue().enqueue(&sale_of(7_000)).await.unwrap();
        wait_for_pending(&h.engine, 0).await;
        h.engine.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_refresh_catalog_replaces_cache_with_active_shop_products() {
        let h = harness(true).await;
        let mut inactive = product("p3", 1_000);
        inactive.is_active = false;
        let mut foreign = product("p4", 1_000);
        foreign.shop_id = "shop-2".into();
        h.remote.seed(
            RemoteTable::Products,
            vec![
                serde_json::to_value(product("p1", 5_000)).unwrap(),
                serde_json::to_value(product("p2", 9_000)).unwrap(),
                serde_json::to_value(inactive).unwrap(),
                serde_json::to_value(foreign).unwrap(),
            ],
        );

        let outcome = h.engine.refresh_catalog().await.unwrap();
        assert_eq!(outcome, PullOutcome::Refreshed { count: 2 });
        assert_eq!(h.engine.cache().count().await.unwrap(), 2);
        assert!(h.engine.cache().find_by_barcode("893p1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_refresh_accepts_products_without_barcode() {
        let h = harness(true).await;
        let mut blank = serde_json::to_value(product("p2", 2_000)).unwrap();
        blank["barcode"] = json!("");
        let mut spaces = serde_json::to_value(product("p3", 3_000)).unwrap();
        spaces["barcode"] = json!("  ");
        h.remote.seed(
            RemoteTable::Products,
            vec![serde_json::to_value(product("p1", 1_000)).unwrap(), blank, spaces],
        );

        let outcome = h.engine.refresh_catalog().await.unwrap();
        assert_eq!(outcome, PullOutcome::Refreshed { count: 3 });
        assert_eq!(h.engine.cache().count().await.unwrap(), 3);
        assert_eq!(h.engine.cache().get("p2").await.unwrap().unwrap().barcode, None);
        assert!(h.engine.status_snapshot().last_error.is_none());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_cache_and_reports() {
        let h = harness(true).await;
        h.engine.cache().upsert_one(&product("old", 1_000)).await.unwrap();
        h.remote.fail(RemoteTable::Products, Op::Select);

        let err = h.engine.refresh_catalog().await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(h.engine.cache().count().await.unwrap(), 1);
        let status = h.engine.status_snapshot();
        assert!(status.last_error.is_some());
        assert!(status.last_sync.is_none());

        h.remote.clear_failures();
        h.engine.refresh_catalog().await.unwrap();
        let status = h.engine.status_snapshot();
        assert!(status.last_error.is_none());
        assert!(status.last_sync.is_some());

        h.engine.connectivity().set_online(false);
        assert!(matches!(
            h.engine.refresh_catalog().await,
            Err(SyncError::Offline)
        ));
    }

    #[tokio::test]
    async fn test_save_product_local_then_remote() {
        let h = harness(false).await;
        let mut p = product("p1", 20_000);

        assert_eq!(h.engine.save_product(&p).await.unwrap(), SaveOutcome::LocalOnly);
        assert!(h.remote.rows(RemoteTable::Products).is_empty());
        assert!(h.engine.cache().get("p1").await.unwrap().is_some());

        h.engine.connectivity().set_online(true);
        assert_eq!(h.engine.save_product(&p).await.unwrap(), SaveOutcome::Pushed);

        p.name = "Bánh bao".into();
        h.engine.save_product(&p).await.unwrap();
        let rows = h.remote.rows(RemoteTable::Products);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], json!("Bánh bao"));
    }

    #[tokio::test]
    async fn test_save_product_remote_failure_keeps_local_write() {
        let h = harness(true).await;
        h.remote.fail(RemoteTable::Products, Op::Select);

        assert!(h.engine.save_product(&product("p9", 1_000)).await.is_err());
        assert!(h.engine.cache().get("p9").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_void_requires_synced_sale() {
        let h = harness(true).await;
        let queued = h.engine.queue().enqueue(&sale_of(9_000)).await.unwrap();

        assert!(matches!(
            h.engine.void_sale(queued.local_id, "Khách trả hàng").await,
            Err(SyncError::NotSynced { .. })
        ));
        assert!(matches!(
            h.engine.void_sale(999, "Khách trả hàng").await,
            Err(SyncError::SaleNotFound { local_id: 999 })
        ));
        assert!(matches!(
            h.engine.void_sale(queued.local_id, "   ").await,
            Err(SyncError::Validation(_))
        ));

        h.engine.push_pending().await.unwrap();
        h.engine.void_sale(queued.local_id, "Khách trả hàng").await.unwrap();

        let row = &h.remote.rows(RemoteTable::Sales)[0];
        assert_eq!(row["is_void"], json!(true));
        assert_eq!(row["void_reason"], json!("Khách trả hàng"));
        assert!(row.get("void_at").is_some());

        h.engine.connectivity().set_online(false);
        assert!(matches!(
            h.engine.void_sale(queued.local_id, "again").await,
            Err(SyncError::Offline)
        ));
    }

    #[derive(Default)]
    struct RecordingEmitter {
        errors: StdMutex<Vec<(String, bool)>>,
        statuses: StdMutex<Vec<SyncStatus>>,
    }

    impl SyncEventEmitter for RecordingEmitter {
        fn emit_status(&self, status: &SyncStatus) {
            self.statuses.lock().unwrap().push(status.clone());
        }

        fn emit_error(&self, message: &str, retryable: bool) {
            self.errors.lock().unwrap().push((message.to_string(), retryable));
        }
    }

    #[tokio::test]
    async fn test_emitter_sees_phases_and_errors() {
        let emitter = Arc::new(RecordingEmitter::default());
        let h = harness_with(true, Duration::from_secs(3600), emitter.clone()).await;
        h.engine.queue().enqueue(&sale_of(1_000)).await.unwrap();
        h.remote.fail(RemoteTable::Sales, Op::Select);

        h.engine.push_pending().await.unwrap();

        let phases: Vec<SyncPhase> = emitter
            .statuses
            .lock()
            .unwrap()
            .iter()
            .map(|s| s.phase)
            .collect();
        assert_eq!(phases, vec![SyncPhase::Pushing, SyncPhase::Idle]);

        let errors = emitter.errors.lock().unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].0.contains("1 of 1"));
        assert!(errors[0].1);
    }

    #[tokio::test]
    async fn test_builder_from_config() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut config = PosConfig::default();
        config.shop.id = SHOP.into();
        config.session.user_id = Some("user-9".into());
        config.sync.push_interval_secs = 30;
        config.sync.history_limit = 2;

        let engine = SyncEngineBuilder::from_config(&config, &db, Arc::new(MemoryRemote::new()))
            .await
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(engine.shop_id(), SHOP);
        assert_eq!(engine.session().user_id().as_deref(), Some("user-9"));
        assert!(!engine.connectivity().is_online());
        for total in [1_000, 2_000, 3_000] {
            engine.queue().enqueue(&sale_of(total)).await.unwrap();
        }
        assert_eq!(engine.queue().list_recent().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_disabled_sync_stays_local() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut config = PosConfig::default();
        config.shop.id = SHOP.into();
        config.session.user_id = Some("user-1".into());
        config.sync.enabled = false;
        let remote = Arc::new(MemoryRemote::new());

        let engine = SyncEngineBuilder::from_config(&config, &db, remote.clone())
            .await
            .unwrap()
            .connectivity(Connectivity::new(true))
            .build()
            .unwrap();
        let queued = engine.queue().enqueue(&sale_of(4_000)).await.unwrap();

        engine.start().await.unwrap();
        assert!(!engine.is_running().await);
        engine.request_push();

        assert!(matches!(
            engine.push_pending().await.unwrap(),
            PushOutcome::Disabled
        ));
        assert_eq!(engine.refresh_catalog().await.unwrap(), PullOutcome::Disabled);
        assert_eq!(
            engine.save_product(&product("p1", 1_000)).await.unwrap(),
            SaveOutcome::LocalOnly
        );
        assert_eq!(engine.cache().count().await.unwrap(), 1);
        assert_eq!(engine.queue().count_pending().await.unwrap(), 1);

        engine.queue().mark_synced(queued.local_id).await.unwrap();
        assert!(matches!(
            engine.void_sale(queued.local_id, "Khách trả hàng").await,
            Err(SyncError::SyncDisabled)
        ));

        for table in [RemoteTable::Sales, RemoteTable::SaleItems, RemoteTable::Products] {
            for op in [Op::Insert, Op::Select, Op::Update] {
                assert_eq!(remote.calls(table, op), 0);
            }
        }
    }

    #[test]
    fn test_builder_requires_shop_and_collaborators() {
        let err = SyncEngine::builder(EngineSettings::new(" ")).build().err().unwrap();
        assert!(matches!(err, SyncError::MissingShopId));

        let err = SyncEngine::builder(EngineSettings::new(SHOP)).build().err().unwrap();
        assert!(matches!(err, SyncError::InvalidConfig(_)));

        let err = SyncEngine::builder(EngineSettings::new(SHOP).push_interval(Duration::ZERO))
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, SyncError::InvalidConfig(_)));
    }
}
