// Several operations racing for the network while it is still being
// provisioned: all of them share one provider request and one grant.

use std::sync::Arc;
use std::time::Duration;

use netlease::test_utils::{FakeProvider, GrantMode};
use netlease::{ConnectivityProvider, LeaseConfig, NetworkLeaseManager, NetworkSpec, SubscriptionId};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== Shared Acquisition Demo ===\n");

    let provider = Arc::new(FakeProvider::new(GrantMode::GrantAfter(
        Duration::from_millis(300),
    )));
    let manager = NetworkLeaseManager::new(
        NetworkSpec::carrier_data(SubscriptionId(1)),
        Arc::clone(&provider) as Arc<dyn ConnectivityProvider>,
        LeaseConfig {
            acquire_timeout: Duration::from_secs(5),
            release_grace: Duration::from_millis(200),
        },
    );

    let mut workers = Vec::new();
    for i in 0..4u64 {
        let manager = manager.clone();
        workers.push(tokio::spawn(async move {
            let caller = format!("worker{i}");
            let handle = manager.acquire(&caller).await?;
            println!("{caller} leased {handle}");
            // simulate a short transfer over the leased network
            tokio::time::sleep(Duration::from_millis(50 * (i + 1))).await;
            manager.release(&caller, false).await;
            println!("{caller} released");
            anyhow::Ok(handle)
        }));
    }

    let mut handles = Vec::new();
    for worker in workers {
        handles.push(worker.await??);
    }

    assert!(handles.windows(2).all(|pair| pair[0] == pair[1]));
    println!("\nall workers shared one network over {} provider request(s)", provider.request_count());
    println!("network torn down: {}", manager.current_network().is_none());

    Ok(())
}
