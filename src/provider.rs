// External connectivity boundary

use crate::lease::{NetworkHandle, NetworkInfo, NetworkMonitor, NetworkSpec, RequestId};
use async_trait::async_trait;
use std::time::Duration;

/// The platform subsystem that provisions networks on demand.
///
/// `request_network` is asynchronous in effect: the provider later invokes
/// exactly one of `available` or `unavailable` on the supplied monitor, and
/// may follow `available` with `lost`, from any task it owns. The monitor
/// carries the registration identity the manager later passes to
/// `release_request`.
#[async_trait]
pub trait ConnectivityProvider: Send + Sync {
    /// Ask for a network satisfying `spec`. `timeout_hint` tells the
    /// provider how long the caller is prepared to wait; it may bound its
    /// own effort with it.
    async fn request_network(
        &self,
        spec: &NetworkSpec,
        monitor: NetworkMonitor,
        timeout_hint: Duration,
    ) -> anyhow::Result<()>;

    /// Unregister a previously issued request. An id the provider already
    /// invalidated must be treated as success.
    async fn release_request(&self, request: RequestId) -> anyhow::Result<()>;

    /// Read-only transport metadata for an active network.
    async fn query_network_info(
        &self,
        handle: NetworkHandle,
    ) -> anyhow::Result<Option<NetworkInfo>>;
}
