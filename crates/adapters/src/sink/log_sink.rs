use domain::common::entity::EnforcementPointId;
use domain::common::error::DomainError;
use domain::policy::entity::CompiledCriterion;
use ports::secondary::enforcement_sink::EnforcementSink;

/// Enforcement sink that logs each criterion via tracing.
///
/// Used as the default sink when the agent runs without a datapath.
pub struct LogEnforcementSink;

impl EnforcementSink for LogEnforcementSink {
    fn submit(
        &self,
        point: EnforcementPointId,
        criterion: &CompiledCriterion,
    ) -> Result<(), DomainError> {
        tracing::info!(
            event_type = "flow_mod",
            switch = %point,
            action = "drop",
            fields = criterion.len(),
            criterion = %criterion,
            "discard rule"
        );
        Ok(())
    }
}
