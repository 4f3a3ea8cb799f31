// Network lease manager - reference counting, bounded acquisition, and
// immediate or delayed release
//
// Callers, provider callbacks, and the grace timer all serialize through one
// mutex; a single Notify broadcast covers every wake-up and waiters re-check
// the predicate after waking. The lock is never held across an await:
// provider calls happen strictly outside it, with the in-flight registration
// recorded in `pending` before the lock is dropped. That ordering is what
// keeps the no-duplicate-request invariant under arbitrary interleaving.

use super::network::{NetworkHandle, NetworkInfo, NetworkSpec, RequestId};
use super::state::{LeaseState, TeardownCause};
use crate::config::LeaseConfig;
use crate::error::{Error, Result};
use crate::provider::ConnectivityProvider;
use crate::SubscriptionId;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::time::{self, Instant};
use tracing::{debug, warn};

struct Shared {
    spec: NetworkSpec,
    config: LeaseConfig,
    provider: Arc<dyn ConnectivityProvider>,
    state: Mutex<LeaseState>,
    available: Notify,
}

impl Shared {
    /// Unregister a torn-down registration with the provider. A rejection
    /// means the provider already considers the handle invalid, which is the
    /// state we wanted anyway.
    async fn unregister(&self, request: Option<RequestId>) {
        if let Some(request) = request {
            if let Err(err) = self.provider.release_request(request).await {
                debug!("provider rejected unregister for {request}: {err}");
            }
        }
    }
}

/// Brokers shared access to one subscription's on-demand network.
///
/// Clones share the same lease state; one instance exists per subscription
/// for the process lifetime (see [`crate::LeaseRegistry`]).
#[derive(Clone)]
pub struct NetworkLeaseManager {
    shared: Arc<Shared>,
}

/// Outcome of the entry bookkeeping done under the lock at the top of
/// `acquire`.
enum Entry {
    Leased(NetworkHandle),
    Waiting(RequestId),
    Issue(RequestId),
}

impl NetworkLeaseManager {
    pub fn new(
        spec: NetworkSpec,
        provider: Arc<dyn ConnectivityProvider>,
        config: LeaseConfig,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                spec,
                config,
                provider,
                state: Mutex::new(LeaseState::new()),
                available: Notify::new(),
            }),
        }
    }

    /// Take a lease on the network, provisioning it if necessary.
    ///
    /// Returns as soon as a usable network exists, sharing a single
    /// outstanding provisioning request among concurrent callers. Bounded by
    /// `acquire_timeout` from entry; on expiry the request is torn down and
    /// every co-waiter fails with [`Error::AcquireTimeout`] as well, so a
    /// retry starts from the empty state.
    pub async fn acquire(&self, caller: &str) -> Result<NetworkHandle> {
        let deadline = Instant::now() + self.shared.config.acquire_timeout;

        let entry = {
            let mut state = self.shared.state.lock();
            state.note_acquire();
            if let Some(handle) = state.network {
                Entry::Leased(handle)
            } else if let Some(request) = state.pending {
                Entry::Waiting(request)
            } else {
                let request = RequestId::new();
                state.begin_request(request);
                Entry::Issue(request)
            }
        };

        let request = match entry {
            Entry::Leased(handle) => {
                debug!("acquire({caller}): {} already leased", handle);
                return Ok(handle);
            }
            Entry::Waiting(request) => {
                debug!("acquire({caller}): joining in-flight {request}");
                request
            }
            Entry::Issue(request) => {
                debug!(
                    "acquire({caller}): requesting {} network as {request}",
                    self.shared.spec.subscription
                );
                let monitor = NetworkMonitor {
                    shared: Arc::clone(&self.shared),
                    request,
                };
                let issued = self
                    .shared
                    .provider
                    .request_network(&self.shared.spec, monitor, self.shared.config.acquire_timeout)
                    .await;
                if let Err(err) = issued {
                    warn!("acquire({caller}): provider rejected {request}: {err}");
                    {
                        let mut state = self.shared.state.lock();
                        if state.pending == Some(request) {
                            // never registered, so nothing to unregister
                            state.reset(TeardownCause::Unavailable);
                        }
                    }
                    self.shared.available.notify_waiters();
                    return Err(Error::NetworkUnavailable);
                }
                request
            }
        };

        loop {
            let notified = self.shared.available.notified();
            tokio::pin!(notified);
            // register with the Notify before checking the predicate, so a
            // wake-up landing between the check and the await is not lost
            notified.as_mut().enable();
            {
                let state = self.shared.state.lock();
                if let Some(handle) = state.network {
                    return Ok(handle);
                }
                if state.pending != Some(request) {
                    // torn down behind our back: rejection, loss, or a
                    // co-waiter's deadline
                    return Err(self.waiter_error(state.last_teardown));
                }
            }
            if time::timeout_at(deadline, notified).await.is_err() {
                let torn = {
                    let mut state = self.shared.state.lock();
                    if let Some(handle) = state.network {
                        // availability beat the deadline to the lock
                        return Ok(handle);
                    }
                    if state.pending != Some(request) {
                        return Err(self.waiter_error(state.last_teardown));
                    }
                    state.reset(TeardownCause::Timeout)
                };
                warn!("acquire({caller}): {request} timed out, tearing down");
                self.shared.available.notify_waiters();
                self.shared.unregister(torn).await;
                return Err(Error::AcquireTimeout {
                    waited: self.shared.config.acquire_timeout,
                });
            }
        }
    }

    /// Give up a lease previously obtained with [`acquire`](Self::acquire).
    ///
    /// When the last holder leaves, the network is torn down immediately, or
    /// kept alive for the grace window when `delay` is set so a follow-up
    /// operation reuses it. A new acquisition inside the window cancels the
    /// teardown.
    pub async fn release(&self, caller: &str, delay: bool) {
        let torn = {
            let mut state = self.shared.state.lock();
            let remaining = state.note_release();
            debug!("release({caller}): {remaining} holders left, delay={delay}");
            if remaining > 0 {
                None
            } else if delay {
                state.cancel_deferred();
                let epoch = state.release_epoch();
                let timer = tokio::spawn(expire_after(Arc::clone(&self.shared), epoch));
                state.arm_deferred(timer);
                None
            } else {
                Some(state.reset(TeardownCause::Released))
            }
        };
        if let Some(torn) = torn {
            self.shared.available.notify_waiters();
            self.shared.unregister(torn).await;
        }
    }

    /// Handle of the currently leased network, if one is usable right now.
    /// Valid only between a successful `acquire` and the matching `release`;
    /// a protocol-client factory keys off this.
    pub fn current_network(&self) -> Option<NetworkHandle> {
        self.shared.state.lock().network
    }

    /// Number of callers currently holding the lease.
    pub fn holders(&self) -> u32 {
        self.shared.state.lock().ref_count
    }

    pub fn subscription(&self) -> SubscriptionId {
        self.shared.spec.subscription
    }

    /// Transport metadata for the leased network, fetched from the provider.
    /// `Ok(None)` when nothing is leased. Read-only; plays no part in lease
    /// correctness.
    pub async fn network_info(&self) -> Result<Option<NetworkInfo>> {
        let Some(handle) = self.current_network() else {
            return Ok(None);
        };
        Ok(self.shared.provider.query_network_info(handle).await?)
    }

    fn waiter_error(&self, cause: Option<TeardownCause>) -> Error {
        match cause {
            Some(TeardownCause::Lost) => Error::NetworkLost,
            Some(TeardownCause::Timeout) => Error::AcquireTimeout {
                waited: self.shared.config.acquire_timeout,
            },
            _ => Error::NetworkUnavailable,
        }
    }
}

/// One-shot deferred teardown. The epoch baked in at schedule time is
/// re-checked under the lock, so firing after a cancellation (or after the
/// abort landed too late) is a no-op.
async fn expire_after(shared: Arc<Shared>, epoch: u64) {
    time::sleep(shared.config.release_grace).await;
    let torn = {
        let mut state = shared.state.lock();
        if !state.deferred_live(epoch) || state.ref_count > 0 {
            return;
        }
        state.disarm_deferred();
        state.reset(TeardownCause::Expired)
    };
    debug!(
        "grace window elapsed, tearing down {} network",
        shared.spec.subscription
    );
    shared.available.notify_waiters();
    shared.unregister(torn).await;
}

/// Callback handle the manager registers with the connectivity provider.
///
/// Carries the registration identity so a notification that races a teardown
/// is recognized as stale and dropped instead of resurrecting state. Methods
/// mutate state and notify but never wait on the lease's waiters, so they are
/// safe to call from the provider's own delivery task.
#[derive(Clone)]
pub struct NetworkMonitor {
    shared: Arc<Shared>,
    request: RequestId,
}

impl NetworkMonitor {
    pub fn request_id(&self) -> RequestId {
        self.request
    }

    /// The provider produced a usable network for this registration.
    pub fn available(&self, handle: NetworkHandle) {
        {
            let mut state = self.shared.state.lock();
            if state.pending != Some(self.request) {
                debug!("dropping stale availability of {handle} for {}", self.request);
                return;
            }
            debug!("{handle} available for {}", self.request);
            state.network = Some(handle);
        }
        self.shared.available.notify_waiters();
    }

    /// The network was pulled away after having been available. Active
    /// holders observe the loss on their next use; nothing is retried here.
    pub async fn lost(&self, handle: NetworkHandle) {
        let torn = {
            let mut state = self.shared.state.lock();
            if state.pending != Some(self.request) {
                debug!("dropping stale loss of {handle} for {}", self.request);
                return;
            }
            warn!("{handle} lost while {} holders active", state.ref_count);
            state.reset(TeardownCause::Lost)
        };
        self.shared.available.notify_waiters();
        self.shared.unregister(torn).await;
    }

    /// The provider rejected or failed the request before availability.
    pub async fn unavailable(&self) {
        let torn = {
            let mut state = self.shared.state.lock();
            if state.pending != Some(self.request) {
                debug!("dropping stale unavailability for {}", self.request);
                return;
            }
            warn!("{} unavailable, tearing down", self.request);
            state.reset(TeardownCause::Unavailable)
        };
        self.shared.available.notify_waiters();
        self.shared.unregister(torn).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{test_config, FakeProvider, GrantMode};

    fn test_manager(mode: GrantMode) -> (NetworkLeaseManager, Arc<FakeProvider>) {
        let provider = Arc::new(FakeProvider::new(mode));
        let spec = NetworkSpec::carrier_data(crate::SubscriptionId(1));
        let manager = NetworkLeaseManager::new(
            spec,
            Arc::clone(&provider) as Arc<dyn ConnectivityProvider>,
            test_config(),
        );
        (manager, provider)
    }

    #[tokio::test]
    async fn test_second_acquire_reuses_leased_network() {
        let (manager, provider) = test_manager(GrantMode::Grant);

        let first = manager.acquire("a").await.unwrap();
        let second = manager.acquire("b").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(provider.request_count(), 1);
        assert_eq!(manager.holders(), 2);
    }

    #[tokio::test]
    async fn test_holders_drop_to_zero_tears_down() {
        let (manager, provider) = test_manager(GrantMode::Grant);

        manager.acquire("a").await.unwrap();
        manager.acquire("b").await.unwrap();
        manager.release("a", false).await;
        assert_eq!(manager.holders(), 1);
        assert!(manager.current_network().is_some());
        assert!(provider.released().is_empty());

        manager.release("b", false).await;
        assert_eq!(manager.holders(), 0);
        assert!(manager.current_network().is_none());
        assert_eq!(provider.released().len(), 1);
    }

    #[tokio::test]
    async fn test_network_info_roundtrip() {
        let (manager, _provider) = test_manager(GrantMode::Grant);

        assert!(manager.network_info().await.unwrap().is_none());
        let handle = manager.acquire("a").await.unwrap();
        let info = manager.network_info().await.unwrap().unwrap();
        assert_eq!(info.handle, handle);
        manager.release("a", false).await;
    }
}
