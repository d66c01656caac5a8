//! Per-user single-flight admission control
//!
//! [`AdmissionTracker`] records which users currently have a request in flight.
//! It is constructed explicitly and shared by cloning (all clones see the same
//! set). The orchestrator holds an [`AdmissionGuard`] for the lifetime of a
//! request so the entry is released on every exit path, including early
//! returns, panics and task cancellation.

use crate::types::UserId;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Concurrent set of users with an active request
#[derive(Clone, Debug, Default)]
pub struct AdmissionTracker {
    active: Arc<Mutex<HashSet<UserId>>>,
}

impl AdmissionTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave the set half-updated, so a
    // poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, HashSet<UserId>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Atomically claim the slot for `user`
    ///
    /// Returns `true` if this call inserted the entry (the caller now owns the
    /// slot) and `false` if the user already had one.
    pub fn try_acquire(&self, user: UserId) -> bool {
        self.lock().insert(user)
    }

    /// Remove the entry for `user`; a no-op if there is none
    pub fn release(&self, user: UserId) {
        if self.lock().remove(&user) {
            debug!(user_id = user.0, "admission released");
        }
    }

    /// Claim the slot for `user` and return a guard that releases it on drop
    pub fn try_claim(&self, user: UserId) -> Option<AdmissionGuard> {
        if self.try_acquire(user) {
            debug!(user_id = user.0, "admission granted");
            Some(AdmissionGuard {
                tracker: self.clone(),
                user,
            })
        } else {
            None
        }
    }

    /// Whether `user` currently holds a slot
    pub fn is_active(&self, user: UserId) -> bool {
        self.lock().contains(&user)
    }

    /// Number of users with a request in flight
    pub fn active_count(&self) -> usize {
        self.lock().len()
    }
}

/// Ownership of one user's admission slot
///
/// Dropping the guard releases the slot exactly once.
#[must_use = "dropping the guard releases the admission slot immediately"]
#[derive(Debug)]
pub struct AdmissionGuard {
    tracker: AdmissionTracker,
    user: UserId,
}

impl AdmissionGuard {
    /// User this guard belongs to
    pub fn user(&self) -> UserId {
        self.user
    }
}

impl Drop for AdmissionGuard {
    fn drop(&mut self) {
        self.tracker.release(self.user);
    }
}
