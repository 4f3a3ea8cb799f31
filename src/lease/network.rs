// Core network descriptor types

use crate::SubscriptionId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier for a provisioned network, handed out by the
/// connectivity provider. Presence of a handle is the only thing the lease
/// manager shares; the handle itself is never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetworkHandle(pub u64);

impl std::fmt::Display for NetworkHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "net{}", self.0)
    }
}

/// Identity of one provisioning request registered with the provider.
///
/// A fresh id is minted per empty-to-leased transition attempt; callbacks
/// carry it so notifications for a torn-down registration can be recognized
/// and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// Transport the requested network must ride on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Transport {
    /// Carrier data path, typically metered.
    Cellular,
    /// Any transport the provider considers suitable.
    Any,
}

/// What the manager asks the connectivity provider for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub subscription: SubscriptionId,
    pub transport: Transport,
}

impl NetworkSpec {
    /// Spec for the carrier-billed data channel of one subscription.
    pub fn carrier_data(subscription: SubscriptionId) -> Self {
        Self {
            subscription,
            transport: Transport::Cellular,
        }
    }
}

/// Read-only transport metadata for a leased network, resolved on demand.
/// Callers use it to configure their protocol client; it plays no part in
/// lease correctness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInfo {
    pub handle: NetworkHandle,
    /// Interface name the network is bound to, when the provider knows it.
    pub interface: Option<String>,
    /// Access point the carrier routed the request through.
    pub apn: Option<String>,
    pub mtu: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_carrier_data_spec() {
        let spec = NetworkSpec::carrier_data(crate::SubscriptionId(3));
        assert_eq!(spec.transport, Transport::Cellular);
        assert_eq!(spec.subscription, crate::SubscriptionId(3));
    }

    #[test]
    fn test_request_ids_are_unique() {
        assert_ne!(RequestId::new(), RequestId::new());
    }
}
