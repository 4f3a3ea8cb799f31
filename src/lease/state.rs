// Lease state transitions
//
// One record per manager, guarded by the manager's mutex. The methods here
// are the pure transitions; provider calls and waiter wake-ups stay in the
// manager so these remain unit-testable without a runtime.

use super::network::{NetworkHandle, RequestId};
use tokio::task::JoinHandle;

/// Why the last teardown happened. A waiter woken by someone else's teardown
/// reads this to report the right failure to its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TeardownCause {
    /// Last holder released with no delay.
    Released,
    /// Grace window elapsed with no new holder.
    Expired,
    /// A waiter's acquisition deadline passed.
    Timeout,
    /// Provider rejected or failed the request before availability.
    Unavailable,
    /// Provider pulled the network away mid-use.
    Lost,
}

#[derive(Debug, Default)]
pub(crate) struct LeaseState {
    /// Present means the network is usable right now.
    pub network: Option<NetworkHandle>,

    /// Callers currently holding an active lease. Zero is the only state
    /// from which teardown may start.
    pub ref_count: u32,

    /// Identity of the in-flight provisioning registration. At most one may
    /// be outstanding; cleared only by `reset`.
    pub pending: Option<RequestId>,

    /// Set by every teardown, cleared when a fresh request is issued.
    pub last_teardown: Option<TeardownCause>,

    /// Scheduled grace-window teardown, if any.
    deferred: Option<JoinHandle<()>>,

    /// Bumped whenever a deferred teardown is scheduled or cancelled. A
    /// fired timer re-checks this under the lock, so a timer that was
    /// already running when its abort landed can never tear down a network
    /// that has since been re-leased.
    release_epoch: u64,
}

impl LeaseState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A caller enters the lease. Any pending deferred teardown is dropped
    /// so the still-live network is reused.
    pub fn note_acquire(&mut self) {
        self.ref_count += 1;
        self.cancel_deferred();
    }

    /// A caller leaves the lease. Returns the remaining holder count,
    /// floored at zero.
    pub fn note_release(&mut self) -> u32 {
        self.ref_count = self.ref_count.saturating_sub(1);
        self.ref_count
    }

    /// Record a freshly issued provisioning registration.
    pub fn begin_request(&mut self, request: RequestId) {
        debug_assert!(self.pending.is_none());
        self.pending = Some(request);
        self.last_teardown = None;
    }

    /// Abort and forget any scheduled teardown, invalidating timers that
    /// are already past their sleep.
    pub fn cancel_deferred(&mut self) {
        if let Some(timer) = self.deferred.take() {
            timer.abort();
        }
        self.release_epoch += 1;
    }

    /// Store the timer task for a freshly scheduled deferred teardown. The
    /// caller reads `release_epoch` first and bakes it into the task.
    pub fn arm_deferred(&mut self, timer: JoinHandle<()>) {
        debug_assert!(self.deferred.is_none());
        self.deferred = Some(timer);
    }

    /// Whether the deferred teardown scheduled at `epoch` is still the live
    /// one.
    pub fn deferred_live(&self, epoch: u64) -> bool {
        self.deferred.is_some() && self.release_epoch == epoch
    }

    /// The fired timer takes its own slot without aborting itself.
    pub fn disarm_deferred(&mut self) {
        self.deferred = None;
    }

    pub fn release_epoch(&self) -> u64 {
        self.release_epoch
    }

    pub fn deferred_scheduled(&self) -> bool {
        self.deferred.is_some()
    }

    /// Teardown: reset to the empty form, recording why. Returns the
    /// registration that must be unregistered with the provider, which the
    /// caller does after dropping the lock. This is the only path that
    /// clears `pending`, so it is idempotent across timeout, release, and
    /// loss.
    pub fn reset(&mut self, cause: TeardownCause) -> Option<RequestId> {
        self.cancel_deferred();
        self.network = None;
        self.ref_count = 0;
        self.last_teardown = Some(cause);
        self.pending.take()
    }

    /// Empty form: no network, no holders, no outstanding registration.
    pub fn is_empty(&self) -> bool {
        self.network.is_none() && self.ref_count == 0 && self.pending.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_acquire_release_counting() {
        let mut state = LeaseState::new();
        state.note_acquire();
        state.note_acquire();
        state.note_acquire();
        assert_eq!(state.ref_count, 3);

        assert_eq!(state.note_release(), 2);
        assert_eq!(state.note_release(), 1);
        assert_eq!(state.note_release(), 0);
        // floor at zero, a double release is a caller bug but must not wrap
        assert_eq!(state.note_release(), 0);
    }

    #[test]
    fn test_reset_returns_pending_once() {
        let mut state = LeaseState::new();
        let request = RequestId::new();
        state.note_acquire();
        state.begin_request(request);
        state.network = Some(NetworkHandle(7));

        assert_eq!(state.reset(TeardownCause::Released), Some(request));
        assert!(state.is_empty());
        assert_eq!(state.last_teardown, Some(TeardownCause::Released));

        // second reset finds nothing to unregister
        assert_eq!(state.reset(TeardownCause::Released), None);
    }

    #[test]
    fn test_begin_request_clears_stale_cause() {
        let mut state = LeaseState::new();
        state.reset(TeardownCause::Timeout);
        state.begin_request(RequestId::new());
        assert!(state.last_teardown.is_none());
    }

    #[tokio::test]
    async fn test_acquire_cancels_deferred_teardown() {
        let mut state = LeaseState::new();
        state.cancel_deferred();
        let epoch = state.release_epoch();
        state.arm_deferred(tokio::spawn(async {}));
        assert!(state.deferred_live(epoch));

        state.note_acquire();
        assert!(!state.deferred_scheduled());
        assert!(!state.deferred_live(epoch));
    }

    #[tokio::test]
    async fn test_fired_timer_epoch_goes_stale_after_reschedule() {
        let mut state = LeaseState::new();
        state.cancel_deferred();
        let first_epoch = state.release_epoch();
        state.arm_deferred(tokio::spawn(async {}));

        // a second delayed release supersedes the first
        state.cancel_deferred();
        let second_epoch = state.release_epoch();
        state.arm_deferred(tokio::spawn(async {}));

        assert!(!state.deferred_live(first_epoch));
        assert!(state.deferred_live(second_epoch));
    }

    proptest! {
        /// Holder count mirrors the acquire/release history with a zero
        /// floor, and a teardown always lands back on the empty form.
        #[test]
        fn prop_ref_count_matches_history(ops in proptest::collection::vec(0u8..3, 0..64)) {
            let mut state = LeaseState::new();
            let mut model: u32 = 0;
            for op in ops {
                match op {
                    0 => {
                        state.note_acquire();
                        model += 1;
                    }
                    1 => {
                        state.note_release();
                        model = model.saturating_sub(1);
                    }
                    _ => {
                        state.reset(TeardownCause::Released);
                        model = 0;
                        prop_assert!(state.is_empty());
                    }
                }
                prop_assert_eq!(state.ref_count, model);
            }
        }
    }
}
