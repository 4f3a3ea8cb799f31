// Test doubles for the connectivity boundary

use crate::config::LeaseConfig;
use crate::lease::{NetworkHandle, NetworkInfo, NetworkMonitor, NetworkSpec, RequestId};
use crate::provider::ConnectivityProvider;
use anyhow::bail;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

/// Short windows so tests exercising the timeout and grace paths finish
/// quickly.
pub fn test_config() -> LeaseConfig {
    LeaseConfig {
        acquire_timeout: Duration::from_millis(200),
        release_grace: Duration::from_millis(100),
    }
}

/// How the fake provider answers a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantMode {
    /// Grant a fresh network before `request_network` returns.
    Grant,
    /// Grant from a spawned task after the delay.
    GrantAfter(Duration),
    /// Reject before availability.
    Reject,
    /// Never answer; the test drives the monitor by hand or lets the
    /// acquisition time out.
    Silent,
}

/// A registration the fake provider has seen, with the monitor the test can
/// drive callbacks through.
#[derive(Clone)]
pub struct IssuedRequest {
    pub request: RequestId,
    pub spec: NetworkSpec,
    pub monitor: NetworkMonitor,
}

/// Scripted stand-in for the platform connectivity service.
pub struct FakeProvider {
    mode: GrantMode,
    next_handle: AtomicU64,
    fail_release: AtomicBool,
    requests: Mutex<Vec<IssuedRequest>>,
    released: Mutex<Vec<RequestId>>,
}

impl FakeProvider {
    pub fn new(mode: GrantMode) -> Self {
        Self {
            mode,
            next_handle: AtomicU64::new(1),
            fail_release: AtomicBool::new(false),
            requests: Mutex::new(Vec::new()),
            released: Mutex::new(Vec::new()),
        }
    }

    /// Make every subsequent `release_request` fail, the way the platform
    /// rejects a handle it already invalidated.
    pub fn fail_releases(&self) {
        self.fail_release.store(true, Ordering::SeqCst);
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<IssuedRequest> {
        self.requests.lock().clone()
    }

    /// Monitor of the most recent registration.
    pub fn last_monitor(&self) -> NetworkMonitor {
        self.requests
            .lock()
            .last()
            .expect("no request issued yet")
            .monitor
            .clone()
    }

    /// Every id passed to `release_request`, including failed attempts.
    pub fn released(&self) -> Vec<RequestId> {
        self.released.lock().clone()
    }

    fn mint_handle(&self) -> NetworkHandle {
        NetworkHandle(self.next_handle.fetch_add(1, Ordering::SeqCst))
    }
}

#[async_trait]
impl ConnectivityProvider for FakeProvider {
    async fn request_network(
        &self,
        spec: &NetworkSpec,
        monitor: NetworkMonitor,
        _timeout_hint: Duration,
    ) -> anyhow::Result<()> {
        self.requests.lock().push(IssuedRequest {
            request: monitor.request_id(),
            spec: spec.clone(),
            monitor: monitor.clone(),
        });
        match self.mode {
            GrantMode::Grant => monitor.available(self.mint_handle()),
            GrantMode::GrantAfter(delay) => {
                let handle = self.mint_handle();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    monitor.available(handle);
                });
            }
            GrantMode::Reject => monitor.unavailable().await,
            GrantMode::Silent => {}
        }
        Ok(())
    }

    async fn release_request(&self, request: RequestId) -> anyhow::Result<()> {
        self.released.lock().push(request);
        if self.fail_release.load(Ordering::SeqCst) {
            bail!("no registered callback for {request}");
        }
        Ok(())
    }

    async fn query_network_info(
        &self,
        handle: NetworkHandle,
    ) -> anyhow::Result<Option<NetworkInfo>> {
        Ok(Some(NetworkInfo {
            handle,
            interface: Some("ccmni0".to_string()),
            apn: Some("fast.carrier".to_string()),
            mtu: Some(1500),
        }))
    }
}
