//! Server lifetime - process-wide holds and the one-shot shutdown signal
//!
//! Every live instance contributes one hold, and so does every explicit
//! `lock_server` call. When the last hold is released the server is marked
//! stopped, once, and the hosting loop is notified.
//!
//! # Single-word state
//!
//! ```text
//!  63        62 ........................................ 0
//! ┌─────────┬──────────────────────────────────────────────┐
//! │ STOPPED │                 hold count                   │
//! └─────────┴──────────────────────────────────────────────┘
//! ```
//!
//! Acquiring checks STOPPED and increments in one CAS; releasing the last hold
//! swaps `1` for `STOPPED` in one CAS. A creation can therefore never slip in
//! after shutdown has been signaled.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;

use crate::core_types::InstanceId;
use crate::error::ExchangeError;

const TARGET_LIFETIME: &str = "ARRAKIS::LIFETIME";

const STOPPED: u64 = 1 << 63;
const COUNT_MASK: u64 = STOPPED - 1;

/// Process-wide lifetime coordinator.
///
/// Constructed once at process start and shared (`Arc`) with the factory and
/// every hold.
pub struct ServerLifetime {
    state: AtomicU64,
    next_instance: AtomicU64,
    shutdown: watch::Sender<bool>,
}

impl ServerLifetime {
    pub fn new() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            state: AtomicU64::new(0),
            next_instance: AtomicU64::new(1),
            shutdown,
        }
    }

    /// Take a hold unless the server has already stopped.
    ///
    /// # Errors
    /// `ServerStopping` once the last hold has been released.
    pub fn acquire(self: &Arc<Self>) -> Result<ServerHold, ExchangeError> {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            if current & STOPPED != 0 {
                return Err(ExchangeError::ServerStopping);
            }
            match self.state.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    tracing::trace!(target: TARGET_LIFETIME, holds = current + 1, "hold acquired");
                    return Ok(ServerHold {
                        lifetime: Arc::clone(self),
                    });
                }
                Err(actual) => current = actual,
            }
        }
    }

    /// Explicit external hold that keeps the server alive without an
    /// instance. Dropping it releases the hold.
    ///
    /// # Errors
    /// `ServerStopping` once the server has stopped.
    pub fn lock_server(self: &Arc<Self>) -> Result<ServerHold, ExchangeError> {
        let hold = self.acquire()?;
        tracing::debug!(target: TARGET_LIFETIME, holds = self.holds(), "server locked");
        Ok(hold)
    }

    /// Outstanding holds.
    pub fn holds(&self) -> u64 {
        self.state.load(Ordering::Acquire) & COUNT_MASK
    }

    /// True once the last hold has been released.
    pub fn is_stopping(&self) -> bool {
        self.state.load(Ordering::Acquire) & STOPPED != 0
    }

    /// Receiver that flips to `true` exactly once, on shutdown.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// Resolves once the server has stopped.
    pub async fn stopped(&self) {
        let mut rx = self.shutdown.subscribe();
        // The sender lives in `self`, so the channel cannot close under us.
        let _ = rx.wait_for(|stopped| *stopped).await;
    }

    pub(crate) fn next_instance_id(&self) -> InstanceId {
        self.next_instance.fetch_add(1, Ordering::Relaxed)
    }

    fn release(&self) {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            let count = current & COUNT_MASK;
            debug_assert!(count > 0, "hold released with no outstanding holds");
            let next = if count == 1 { STOPPED } else { current - 1 };
            match self.state.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }

        if current & COUNT_MASK == 1 {
            tracing::info!(target: TARGET_LIFETIME, "last hold released, server stopping");
            self.shutdown.send_replace(true);
        } else {
            tracing::trace!(target: TARGET_LIFETIME, holds = (current & COUNT_MASK) - 1, "hold released");
        }
    }
}

impl Default for ServerLifetime {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ServerLifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerLifetime")
            .field("holds", &self.holds())
            .field("stopping", &self.is_stopping())
            .finish()
    }
}

// ============================================================
// SERVER HOLD
// ============================================================

/// One unit of process liveness. Released on drop.
#[must_use = "dropping a hold releases it immediately"]
pub struct ServerHold {
    lifetime: Arc<ServerLifetime>,
}

impl ServerHold {
    /// Another hold on the same server.
    ///
    /// Infallible: while `self` is alive the count is at least one, so the
    /// server cannot be stopped.
    pub fn duplicate(&self) -> ServerHold {
        self.lifetime.state.fetch_add(1, Ordering::AcqRel);
        ServerHold {
            lifetime: Arc::clone(&self.lifetime),
        }
    }

    pub fn lifetime(&self) -> &Arc<ServerLifetime> {
        &self.lifetime
    }
}

impl Drop for ServerHold {
    fn drop(&mut self) {
        self.lifetime.release();
    }
}

impl fmt::Debug for ServerHold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerHold")
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_acquire_and_release() {
        let lifetime = Arc::new(ServerLifetime::new());
        assert_eq!(lifetime.holds(), 0);
        assert!(!lifetime.is_stopping());

        let a = lifetime.acquire().unwrap();
        let b = lifetime.acquire().unwrap();
        assert_eq!(lifetime.holds(), 2);

        drop(a);
        assert_eq!(lifetime.holds(), 1);
        assert!(!lifetime.is_stopping());

        drop(b);
        assert_eq!(lifetime.holds(), 0);
        assert!(lifetime.is_stopping());
    }

    #[test]
    fn test_acquire_after_stop_fails() {
        let lifetime = Arc::new(ServerLifetime::new());
        drop(lifetime.acquire().unwrap());
        assert!(lifetime.is_stopping());

        assert_eq!(
            lifetime.acquire().unwrap_err(),
            ExchangeError::ServerStopping
        );
        assert_eq!(
            lifetime.lock_server().unwrap_err(),
            ExchangeError::ServerStopping
        );
        assert_eq!(lifetime.holds(), 0);
    }

    #[test]
    fn test_duplicate_counts_separately() {
        let lifetime = Arc::new(ServerLifetime::new());
        let a = lifetime.acquire().unwrap();
        let b = a.duplicate();
        assert_eq!(lifetime.holds(), 2);
        drop(a);
        assert!(!lifetime.is_stopping());
        drop(b);
        assert!(lifetime.is_stopping());
    }

    #[test]
    fn test_signal_fires_once() {
        let lifetime = Arc::new(ServerLifetime::new());
        let mut rx = lifetime.subscribe();
        assert!(!*rx.borrow_and_update());

        drop(lifetime.acquire().unwrap());
        assert!(rx.has_changed().unwrap());
        assert!(*rx.borrow_and_update());

        // A refused acquire must not re-publish.
        let _ = lifetime.acquire();
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_instance_ids_increase() {
        let lifetime = ServerLifetime::new();
        let a = lifetime.next_instance_id();
        let b = lifetime.next_instance_id();
        assert!(b > a);
    }

    #[tokio::test]
    async fn test_stopped_resolves() {
        let lifetime = Arc::new(ServerLifetime::new());
        let hold = lifetime.lock_server().unwrap();

        let waiter = {
            let lifetime = Arc::clone(&lifetime);
            tokio::spawn(async move { lifetime.stopped().await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        drop(hold);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("shutdown not signaled")
            .unwrap();
    }

    #[tokio::test]
    async fn test_stopped_after_the_fact() {
        let lifetime = Arc::new(ServerLifetime::new());
        drop(lifetime.acquire().unwrap());
        tokio::time::timeout(Duration::from_secs(1), lifetime.stopped())
            .await
            .expect("already-stopped server must resolve immediately");
    }

    #[test]
    fn test_concurrent_holds_balance_out() {
        let lifetime = Arc::new(ServerLifetime::new());
        let anchor = lifetime.lock_server().unwrap();

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..1_000 {
                        let h = lifetime.acquire().unwrap();
                        let d = h.duplicate();
                        drop(h);
                        drop(d);
                    }
                });
            }
        });

        assert_eq!(lifetime.holds(), 1);
        assert!(!lifetime.is_stopping());
        drop(anchor);
        assert!(lifetime.is_stopping());
    }
}
