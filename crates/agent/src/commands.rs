use std::io::Write;
use std::sync::Arc;

use adapters::sink::json_lines_sink::JsonLinesSink;
use application::enforcement_service_impl::EnforcementAppService;
use domain::common::entity::EnforcementPointId;
use domain::policy::compiler::PolicyCompiler;
use domain::policy::entity::PolicySet;
use infrastructure::config::AgentConfig;
use infrastructure::policy_store::PolicyStore;

/// `compile`: load the policy document, compile it and write one JSON
/// discard rule per line to `out`. Unlike daemon mode a document that
/// fails to load is an error.
pub fn cmd_compile<W: Write + Send + 'static>(
    config: &AgentConfig,
    switch: Option<u64>,
    out: W,
) -> anyhow::Result<usize> {
    let store = PolicyStore::default();
    let mut set = store.try_load(&config.policies.path)?;
    if let Some(id) = switch {
        set = PolicySet::new(EnforcementPointId(id), set.policies().to_vec());
    }
    let point = set.enforcement_point();

    let service = EnforcementAppService::new(
        Arc::new(set),
        PolicyCompiler::default(),
        Arc::new(JsonLinesSink::new(out)),
    );
    let installed = service.on_enforcement_point_active(point)?;
    Ok(installed)
}
