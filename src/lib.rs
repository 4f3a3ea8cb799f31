#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod lease;
pub mod provider;
pub mod registry;

pub mod test_utils;

pub use config::LeaseConfig;
pub use error::{Error, Result};
pub use lease::{
    NetworkHandle, NetworkInfo, NetworkLeaseManager, NetworkMonitor, NetworkSpec, RequestId,
    Transport,
};
pub use provider::ConnectivityProvider;
pub use registry::LeaseRegistry;

/// Identity of the subscription (carrier account) a lease is scoped to.
/// One manager instance exists per subscription for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct SubscriptionId(pub i32);

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub{}", self.0)
    }
}
