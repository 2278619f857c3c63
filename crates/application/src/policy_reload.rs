use std::sync::Arc;

use domain::policy::entity::PolicySet;
use tokio::sync::{Mutex, RwLock};

use crate::enforcement_service_impl::EnforcementAppService;

/// Outcome of one policy reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadSummary {
    pub policies: usize,
    pub criteria: usize,
    pub dropped_fields: usize,
}

/// Application-level service for hot-reloading the policy set.
///
/// Serializes reloads (one at a time) and pre-compiles the new set so
/// problems show up in the logs at reload time rather than on the next
/// activation.
pub struct PolicyReloadService {
    enforcement: Arc<RwLock<EnforcementAppService>>,
    reload_mutex: Mutex<()>,
}

impl PolicyReloadService {
    pub fn new(enforcement: Arc<RwLock<EnforcementAppService>>) -> Self {
        Self {
            enforcement,
            reload_mutex: Mutex::new(()),
        }
    }

    /// Swap in a new policy set. Rules already installed stay in place;
    /// the new set is installed on the next activation.
    pub async fn reload(&self, policy_set: PolicySet) -> ReloadSummary {
        let _guard = self.reload_mutex.lock().await;

        let mut svc = self.enforcement.write().await;
        let previous = svc.policy_set().len();
        svc.reload(Arc::new(policy_set));

        let report = svc.compile();
        let summary = ReloadSummary {
            policies: svc.policy_set().len(),
            criteria: report.criteria.len(),
            dropped_fields: report.dropped.len(),
        };

        tracing::info!(
            switch = %svc.policy_set().enforcement_point(),
            previous,
            policies = summary.policies,
            criteria = summary.criteria,
            dropped_fields = summary.dropped_fields,
            "policy set reloaded"
        );
        summary
    }
}
