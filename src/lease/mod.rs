// Metered network lease management
//
// Brokers exclusive on-demand access to a carrier-billed data path with:
// - Reference-counted sharing across concurrent callers
// - One outstanding provisioning request at a time
// - Bounded acquisition against an entry-time deadline
// - Delayed teardown to absorb back-to-back operations

pub mod manager;
pub mod network;

mod state;

pub use manager::{NetworkLeaseManager, NetworkMonitor};
pub use network::{NetworkHandle, NetworkInfo, NetworkSpec, RequestId, Transport};
