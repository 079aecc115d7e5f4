//! # shoppos-sync: Offline-First Sync Layer for ShopPOS
//!
//! Everything between the cart and the remote store: the product cache,
//! the sale queue, the remote contract and the engine that reconciles them.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Sync Layer                                      │
//! │                                                                         │
//! │  checkout ──► SaleQueue::enqueue ──► request_push ─┐                    │
//! │                   │ (SQLite, never the network)    │                    │
//! │                   ▼                                ▼                    │
//! │           pending count (watch)          ┌──────────────────┐          │
//! │                                          │    SyncEngine    │          │
//! │  Connectivity ── offline→online ────────►│  push: queue →   │          │
//! │  Session      ── user id ───────────────►│        remote    │          │
//! │                                          │  pull: remote →  │          │
//! │  ProductCache ◄── refresh_all ───────────│        cache     │          │
//! │   (barcode / name search)                └────────┬─────────┘          │
//! │                                                   │                     │
//! │                                          ┌────────┴─────────┐          │
//! │                                          │   RemoteStore    │          │
//! │                                          │ (PostgrestStore) │          │
//! │                                          └──────────────────┘          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`catalog`] - Product Cache Manager
//! - [`queue`] - Sale Queue Manager
//! - [`engine`] - Synchronization Engine
//! - [`checkout`] - Cart to queued sale
//! - [`remote`] - Remote store contract and row shapes
//! - [`postgrest`] - HTTP implementation of the remote store
//! - [`connectivity`] / [`session`] - Externally reported state
//! - [`config`] - TOML configuration
//! - [`error`] - Sync error types

pub mod catalog;
pub mod checkout;
pub mod config;
pub mod connectivity;
pub mod engine;
pub mod error;
pub mod postgrest;
pub mod queue;
pub mod remote;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use catalog::ProductCache;
pub use checkout::{add_quick_sale, checkout, checkout_at, CheckoutReceipt, QuickSaleItem};
pub use config::PosConfig;
pub use connectivity::Connectivity;
pub use engine::{
    EngineSettings, NoOpEmitter, PullOutcome, PushOutcome, PushReport, SaleFailure, SaveOutcome,
    SyncEngine, SyncEngineBuilder, SyncEventEmitter, SyncPhase, SyncStage, SyncStatus,
};
pub use error::{SyncError, SyncResult};
pub use postgrest::PostgrestStore;
pub use queue::{QueueEvent, SaleQueue};
pub use remote::{Filter, RemoteQuery, RemoteStore, RemoteTable};
pub use session::Session;
