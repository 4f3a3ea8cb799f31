// Per-subscription manager pool

use crate::config::LeaseConfig;
use crate::lease::{NetworkLeaseManager, NetworkSpec};
use crate::provider::ConnectivityProvider;
use crate::SubscriptionId;
use dashmap::DashMap;
use std::sync::Arc;

/// One lease manager per subscription, created on first use and kept for the
/// process lifetime. Owned explicitly rather than hidden behind a global so
/// tests can build independent pools.
pub struct LeaseRegistry {
    provider: Arc<dyn ConnectivityProvider>,
    config: LeaseConfig,
    managers: DashMap<SubscriptionId, Arc<NetworkLeaseManager>>,
}

impl LeaseRegistry {
    pub fn new(provider: Arc<dyn ConnectivityProvider>, config: LeaseConfig) -> Self {
        Self {
            provider,
            config,
            managers: DashMap::new(),
        }
    }

    /// The manager for `subscription`, creating it on first use. All
    /// managers share the registry's provider and config.
    pub fn manager_for(&self, subscription: SubscriptionId) -> Arc<NetworkLeaseManager> {
        self.managers
            .entry(subscription)
            .or_insert_with(|| {
                Arc::new(NetworkLeaseManager::new(
                    NetworkSpec::carrier_data(subscription),
                    Arc::clone(&self.provider),
                    self.config.clone(),
                ))
            })
            .clone()
    }

    pub fn len(&self) -> usize {
        self.managers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.managers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{test_config, FakeProvider, GrantMode};

    #[test]
    fn test_one_manager_per_subscription() {
        let provider = Arc::new(FakeProvider::new(GrantMode::Silent));
        let registry = LeaseRegistry::new(provider, test_config());

        let a = registry.manager_for(SubscriptionId(1));
        let b = registry.manager_for(SubscriptionId(1));
        let c = registry.manager_for(SubscriptionId(2));

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(registry.len(), 2);
        assert_eq!(c.subscription(), SubscriptionId(2));
    }
}
