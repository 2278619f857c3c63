use std::time::Duration;

// ── Paths ──────────────────────────────────────────────────────────

pub const DEFAULT_CONFIG_PATH: &str = "/etc/policyfw/agent.yaml";
pub const DEFAULT_POLICY_PATH: &str = "./firewall-policies.json";

// ── Policy store ───────────────────────────────────────────────────

/// Enforcement point used when the policy document cannot be loaded.
pub const DEFAULT_ENFORCEMENT_POINT: u64 = 1;

/// Upper bound on policies per document. Each policy can expand to
/// |protocols| × |ethertypes| criteria.
pub const MAX_POLICIES: usize = 4096;

// ── Channel capacities ─────────────────────────────────────────────

pub const EVENT_CHANNEL_CAPACITY: usize = 10_000;

// ── Timeouts ───────────────────────────────────────────────────────

pub const GRACEFUL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_capacity_is_positive() {
        assert!(EVENT_CHANNEL_CAPACITY > 0);
    }

    #[test]
    fn shutdown_timeout_is_reasonable() {
        assert!(GRACEFUL_SHUTDOWN_TIMEOUT.as_secs() >= 1);
        assert!(GRACEFUL_SHUTDOWN_TIMEOUT.as_secs() <= 30);
    }

    #[test]
    fn policy_limit_is_positive() {
        assert!(MAX_POLICIES > 0);
    }
}
