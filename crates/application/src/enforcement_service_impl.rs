use std::sync::Arc;

use domain::common::entity::EnforcementPointId;
use domain::common::error::DomainError;
use domain::policy::compiler::{CompileReport, PolicyCompiler};
use domain::policy::entity::PolicySet;
use ports::secondary::enforcement_sink::EnforcementSink;

/// Application-level enforcement service.
///
/// Holds the active policy set and installs its compiled criteria on the
/// configured enforcement point when that point becomes active. Designed
/// to be wrapped in `RwLock` so reloads can swap the policy set.
pub struct EnforcementAppService {
    policy_set: Arc<PolicySet>,
    compiler: PolicyCompiler,
    sink: Arc<dyn EnforcementSink>,
}

impl EnforcementAppService {
    pub fn new(
        policy_set: Arc<PolicySet>,
        compiler: PolicyCompiler,
        sink: Arc<dyn EnforcementSink>,
    ) -> Self {
        Self {
            policy_set,
            compiler,
            sink,
        }
    }

    pub fn policy_set(&self) -> &Arc<PolicySet> {
        &self.policy_set
    }

    /// Replace the policy set. Takes effect on the next activation;
    /// criteria already installed are left alone.
    pub fn reload(&mut self, policy_set: Arc<PolicySet>) {
        self.policy_set = policy_set;
    }

    /// Compile the active policy set and log anything that was dropped.
    pub fn compile(&self) -> CompileReport {
        let report = self.compiler.compile_with_report(&self.policy_set);

        for dropped in &report.dropped {
            tracing::warn!(
                policy = dropped.policy_index,
                field = %dropped.field,
                value = %dropped.value,
                error = %dropped.error,
                "policy field dropped from compiled criteria"
            );
        }
        for &index in &report.empty_criteria {
            tracing::warn!(
                criterion = index,
                "compiled criterion has no fields and matches all traffic"
            );
        }

        report
    }

    /// Install every compiled criterion on `point` if it is the configured
    /// enforcement point. Returns the number of criteria submitted.
    ///
    /// Compilation finishes before the first submission. A sink error
    /// stops the remaining submissions and is returned.
    pub fn on_enforcement_point_active(
        &self,
        point: EnforcementPointId,
    ) -> Result<usize, DomainError> {
        if point != self.policy_set.enforcement_point() {
            tracing::debug!(
                switch = %point,
                configured = %self.policy_set.enforcement_point(),
                "enforcement point is not the configured one, nothing to install"
            );
            return Ok(0);
        }

        let report = self.compile();

        for (installed, criterion) in report.criteria.iter().enumerate() {
            if let Err(e) = self.sink.submit(point, criterion) {
                tracing::error!(
                    switch = %point,
                    installed,
                    total = report.criteria.len(),
                    error = %e,
                    "failed to install firewall rule"
                );
                return Err(e);
            }
            tracing::debug!(switch = %point, criterion = %criterion, "firewall rule submitted");
        }

        tracing::info!(
            switch = %point,
            count = report.criteria.len(),
            "firewall rules installed"
        );
        Ok(report.criteria.len())
    }
}
