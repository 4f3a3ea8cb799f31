// Walks one full lease cycle: provision on demand, share the network with a
// follow-up operation through the grace window, then tear down.

use std::sync::Arc;
use std::time::Duration;

use netlease::test_utils::{FakeProvider, GrantMode};
use netlease::{ConnectivityProvider, LeaseConfig, LeaseRegistry, SubscriptionId};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== Network Lease Cycle Demo ===\n");

    let provider = Arc::new(FakeProvider::new(GrantMode::GrantAfter(
        Duration::from_millis(150),
    )));
    let registry = LeaseRegistry::new(
        Arc::clone(&provider) as Arc<dyn ConnectivityProvider>,
        LeaseConfig {
            acquire_timeout: Duration::from_secs(5),
            release_grace: Duration::from_millis(500),
        },
    );

    let manager = registry.manager_for(SubscriptionId(1));

    // The download provisions the network and waits for the grant
    let handle = manager.acquire("download").await?;
    println!("download leased {handle}");
    if let Some(info) = manager.network_info().await? {
        println!(
            "  interface={} apn={}",
            info.interface.as_deref().unwrap_or("?"),
            info.apn.as_deref().unwrap_or("?"),
        );
    }

    // Done downloading; keep the network warm for the acknowledgment
    manager.release("download", true).await;
    println!("download released with grace window");

    // The acknowledgment arrives inside the window and reuses the network
    let ack_handle = manager.acquire("ack").await?;
    println!("ack leased {ack_handle} (same network: {})", ack_handle == handle);
    println!("provisioning requests issued: {}", provider.request_count());

    manager.release("ack", false).await;
    println!("ack released, network torn down");
    println!("unregistered requests: {}", provider.released().len());

    Ok(())
}
