//! # Connectivity
//!
//! The online/offline flag, fed by a platform adapter and watched by the
//! sync engine.
//!
//! ```text
//! platform signal ──► set_online(bool) ──► watch::Sender<bool>
//!                                               │
//!                      SyncEngine loop ◄────────┘  offline → online starts a push
//! ```
//!
//! Going offline never cancels a pass already running; it only keeps new
//! passes from starting.
//!
//! The watch only holds the latest value, so an offline/online blip that
//! happens while the engine is busy would be invisible to it. Every
//! offline → online transition therefore also bumps a reconnect counter.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Shared connectivity flag. Clones observe and drive the same flag.
#[derive(Debug, Clone)]
pub struct Connectivity {
    tx: Arc<watch::Sender<bool>>,
    reconnects: Arc<AtomicU64>,
}

impl Connectivity {
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        Connectivity {
            tx: Arc::new(tx),
            reconnects: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Records the platform's current reachability.
    ///
    /// Subscribers are only woken on an actual transition.
    pub fn set_online(&self, online: bool) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                if online {
                    // Bumped before subscribers are woken
                    self.reconnects.fetch_add(1, Ordering::SeqCst);
                }
                true
            }
        });
        if changed {
            info!(online, "Connectivity changed");
        }
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Number of offline → online transitions so far.
    pub fn reconnect_count(&self) -> u64 {
        self.reconnects.load(Ordering::SeqCst)
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for Connectivity {
    fn default() -> Self {
        Connectivity::new(false)
    }
}
