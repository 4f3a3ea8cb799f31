use std::time::Duration;

/// Timing knobs for the lease manager.
///
/// The defaults mirror the platform behavior: a long acquisition bound so a
/// queued transfer survives slow provisioning, and a short grace window so a
/// fetch immediately followed by its acknowledgment reuses the same network.
#[derive(Debug, Clone)]
pub struct LeaseConfig {
    /// Upper bound on how long `acquire` waits for the provider to hand over
    /// a usable network.
    pub acquire_timeout: Duration,

    /// How long a zero-holder network is kept alive when released with
    /// `delay = true` before it is torn down.
    pub release_grace: Duration,
}

impl Default for LeaseConfig {
    fn default() -> Self {
        Self {
            acquire_timeout: Duration::from_secs(30 * 60), // 30 minutes
            release_grace: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_windows() {
        let config = LeaseConfig::default();
        assert_eq!(config.acquire_timeout, Duration::from_secs(1800));
        assert_eq!(config.release_grace, Duration::from_secs(5));
    }
}
