use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use tokio::runtime::Runtime;

use netlease::test_utils::{test_config, FakeProvider, GrantMode};
use netlease::{ConnectivityProvider, NetworkLeaseManager, NetworkSpec, SubscriptionId};

fn leased_manager(rt: &Runtime) -> NetworkLeaseManager {
    let provider = Arc::new(FakeProvider::new(GrantMode::Grant));
    let manager = NetworkLeaseManager::new(
        NetworkSpec::carrier_data(SubscriptionId(1)),
        provider as Arc<dyn ConnectivityProvider>,
        test_config(),
    );
    rt.block_on(manager.acquire("warm")).unwrap();
    manager
}

fn acquire_release_benchmark(c: &mut Criterion) {
    c.bench_function("leased fast path", |b| {
        let rt = Runtime::new().unwrap();
        let manager = leased_manager(&rt);
        b.iter(|| {
            rt.block_on(async {
                let handle = manager.acquire("bench").await.unwrap();
                manager.release("bench", true).await;
                handle
            })
        })
    });

    c.bench_function("provision and tear down", |b| {
        b.iter(|| {
            let rt = Runtime::new().unwrap();
            let provider = Arc::new(FakeProvider::new(GrantMode::Grant));
            let manager = NetworkLeaseManager::new(
                NetworkSpec::carrier_data(SubscriptionId(1)),
                provider as Arc<dyn ConnectivityProvider>,
                test_config(),
            );
            rt.block_on(async {
                manager.acquire("bench").await.unwrap();
                manager.release("bench", false).await;
            });
        })
    });
}

criterion_group!(benches, acquire_release_benchmark);
criterion_main!(benches);
