use domain::common::entity::EnforcementPointId;
use domain::common::error::DomainError;
use domain::policy::entity::CompiledCriterion;

/// Secondary port through which compiled criteria leave the core.
///
/// Each call installs one discard rule on the given enforcement point.
/// Calls for one activation arrive in compilation order and must not be
/// reordered by the implementation.
pub trait EnforcementSink: Send + Sync {
    fn submit(
        &self,
        point: EnforcementPointId,
        criterion: &CompiledCriterion,
    ) -> Result<(), DomainError>;
}
