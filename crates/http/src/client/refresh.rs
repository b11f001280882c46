//! Single-flight coordination of session refreshes
//!
//! The first request that needs a refresh takes a [`RefreshLease`] and performs
//! it. Requests that need a refresh while the lease is held queue a
//! continuation instead. Settling the lease drains the queue in arrival order,
//! handing every continuation the same outcome, and releases the lock.
//!
//! The lease owns a handle to the coordinator, so the refresh can run on a
//! spawned task that outlives the request which started it.

use super::RefreshError;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// New access token, or the reason the refresh failed
pub type RefreshOutcome = Result<String, RefreshError>;

type Continuation = Box<dyn FnOnce(RefreshOutcome) + Send>;

#[derive(Default)]
struct RefreshState {
    refreshing: bool,
    pending: VecDeque<Continuation>,
}

/// Refresh lock plus the queue of requests waiting on it
#[derive(Default)]
pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
}

/// Result of trying to start a refresh
pub enum Acquire {
    /// Caller owns this refresh cycle and must settle the lease
    Owner(RefreshLease),
    /// Another caller is refreshing; wait for its outcome
    Waiter(PendingRefresh),
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a refresh cycle is in progress
    pub fn is_refreshing(&self) -> bool {
        self.lock().refreshing
    }

    /// Number of continuations waiting on the current cycle
    pub fn pending(&self) -> usize {
        self.lock().pending.len()
    }

    /// Become the refresh owner, or queue behind the refresh in progress
    pub fn acquire_or_wait(self: &Arc<Self>) -> Acquire {
        let (sender, receiver) = oneshot::channel();
        let lease = self.acquire_or_enqueue(move |outcome| {
            // The waiter may have been dropped; nothing to deliver then.
            let _ = sender.send(outcome);
        });

        match lease {
            Some(lease) => Acquire::Owner(lease),
            None => Acquire::Waiter(PendingRefresh { receiver }),
        }
    }

    /// Become the refresh owner, or queue `continuation` for the cycle in progress
    ///
    /// The continuation is dropped unused when the caller becomes the owner.
    pub fn acquire_or_enqueue<F>(self: &Arc<Self>, continuation: F) -> Option<RefreshLease>
    where
        F: FnOnce(RefreshOutcome) + Send + 'static,
    {
        let mut state = self.lock();
        if state.refreshing {
            state.pending.push_back(Box::new(continuation));
            debug!(pending = state.pending.len(), "Queued behind session refresh");
            None
        } else {
            state.refreshing = true;
            Some(RefreshLease {
                coordinator: Arc::clone(self),
                settled: false,
            })
        }
    }

    fn settle_all(&self, outcome: &RefreshOutcome) {
        let pending = {
            let mut state = self.lock();
            state.refreshing = false;
            std::mem::take(&mut state.pending)
        };

        debug!(
            waiters = pending.len(),
            success = outcome.is_ok(),
            "Settling session refresh"
        );

        for continuation in pending {
            continuation(outcome.clone());
        }
    }
}

/// Ownership of one refresh cycle
///
/// Dropping an unsettled lease rejects every waiter with
/// [`RefreshError::Abandoned`].
pub struct RefreshLease {
    coordinator: Arc<RefreshCoordinator>,
    settled: bool,
}

impl RefreshLease {
    /// End the cycle, handing `outcome` to every queued continuation in order
    pub fn settle(mut self, outcome: &RefreshOutcome) {
        self.settled = true;
        self.coordinator.settle_all(outcome);
    }
}

impl Drop for RefreshLease {
    fn drop(&mut self) {
        if !self.settled {
            warn!("Session refresh dropped before completion");
            self.coordinator.settle_all(&Err(RefreshError::Abandoned));
        }
    }
}

/// A queued request waiting for the refresh in progress
pub struct PendingRefresh {
    receiver: oneshot::Receiver<RefreshOutcome>,
}

impl PendingRefresh {
    /// Wait until the owner settles the cycle
    pub async fn wait(self) -> RefreshOutcome {
        self.receiver
            .await
            .unwrap_or(Err(RefreshError::Abandoned))
    }
}
