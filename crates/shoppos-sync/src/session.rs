//! # Session
//!
//! Who is signed in. Credentials belong to the external auth collaborator;
//! the sync layer only needs the user id to attribute pushed sales.

use std::sync::{Arc, RwLock};
use tracing::debug;

/// Shared, replaceable user id.
#[derive(Debug, Clone, Default)]
pub struct Session {
    user_id: Arc<RwLock<Option<String>>>,
}

impl Session {
    pub fn new(user_id: Option<String>) -> Self {
        Session {
            user_id: Arc::new(RwLock::new(user_id)),
        }
    }

    /// Called by the auth collaborator on sign-in (`Some`) and sign-out (`None`).
    pub fn set_user(&self, user_id: Option<String>) {
        debug!(signed_in = user_id.is_some(), "Session user changed");
        match self.user_id.write() {
            Ok(mut guard) => *guard = user_id,
            Err(poisoned) => *poisoned.into_inner() = user_id,
        }
    }

    pub fn user_id(&self) -> Option<String> {
        match self.user_id.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}
