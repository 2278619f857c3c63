use std::path::{Path, PathBuf};
use std::sync::Arc;

use application::policy_reload::{PolicyReloadService, ReloadSummary};
use infrastructure::policy_store::PolicyStore;
use tokio_util::sync::CancellationToken;

/// Re-read the policy document and hand it to the reload service.
///
/// A document that fails to load leaves the current policy set in
/// place, unlike startup which falls back to an empty set.
pub async fn reload_policies(
    path: &Path,
    store: &PolicyStore,
    reload_service: &PolicyReloadService,
) -> Option<ReloadSummary> {
    match store.try_load(path) {
        Ok(set) => Some(reload_service.reload(set).await),
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "policy reload failed, keeping current policy set"
            );
            None
        }
    }
}

/// Spawn a background task that reloads the policy document on SIGHUP.
///
/// Returns the `JoinHandle` so the caller can await cleanup on shutdown.
pub fn spawn_reload_task(
    policy_path: PathBuf,
    store: PolicyStore,
    reload_service: Arc<PolicyReloadService>,
    cancel_token: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};

            let mut sighup = match signal(SignalKind::hangup()) {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to install SIGHUP handler, reload disabled");
                    cancel_token.cancelled().await;
                    return;
                }
            };
            tracing::info!(path = %policy_path.display(), "policy reload on SIGHUP enabled");

            loop {
                tokio::select! {
                    () = cancel_token.cancelled() => break,
                    received = sighup.recv() => {
                        if received.is_none() {
                            break;
                        }
                        tracing::info!("SIGHUP received, reloading policies");
                        reload_policies(&policy_path, &store, &reload_service).await;
                    }
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = (&policy_path, &store, &reload_service);
            cancel_token.cancelled().await;
        }

        tracing::debug!("reload task stopped");
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use application::enforcement_service_impl::EnforcementAppService;
    use domain::common::entity::EnforcementPointId;
    use domain::policy::compiler::PolicyCompiler;
    use domain::policy::entity::PolicySet;
    use ports::test_utils::RecordingSink;
    use tokio::sync::RwLock;

    use super::*;

    fn make_reload_service() -> (Arc<RwLock<EnforcementAppService>>, PolicyReloadService) {
        let enforcement = Arc::new(RwLock::new(EnforcementAppService::new(
            Arc::new(PolicySet::empty(EnforcementPointId(1))),
            PolicyCompiler::default(),
            Arc::new(RecordingSink::new()),
        )));
        let reload = PolicyReloadService::new(Arc::clone(&enforcement));
        (enforcement, reload)
    }

    fn write_policies(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn reload_swaps_policy_set() {
        let (enforcement, reload) = make_reload_service();
        let file = write_policies(
            r#"{"discard_policies":[{"tp_dst":"80"},{"tp_src":"53"}],"firewall_switch_id":3}"#,
        );

        let summary = reload_policies(file.path(), &PolicyStore::default(), &reload)
            .await
            .unwrap();
        assert_eq!(summary.policies, 2);

        let svc = enforcement.read().await;
        assert_eq!(svc.policy_set().enforcement_point(), EnforcementPointId(3));
        assert_eq!(svc.policy_set().len(), 2);
    }

    #[tokio::test]
    async fn failed_reload_keeps_current_set() {
        let (enforcement, reload) = make_reload_service();
        let good = write_policies(r#"{"discard_policies":[{"tp_dst":"80"}],"firewall_switch_id":2}"#);
        reload_policies(good.path(), &PolicyStore::default(), &reload).await;

        let bad = write_policies("{ not json");
        let summary = reload_policies(bad.path(), &PolicyStore::default(), &reload).await;
        assert!(summary.is_none());

        let svc = enforcement.read().await;
        assert_eq!(svc.policy_set().enforcement_point(), EnforcementPointId(2));
        assert_eq!(svc.policy_set().len(), 1);
    }

    #[tokio::test]
    async fn reload_task_stops_on_cancel() {
        let (_enforcement, reload) = make_reload_service();
        let cancel = CancellationToken::new();
        let handle = spawn_reload_task(
            PathBuf::from("/nonexistent/policies.json"),
            PolicyStore::default(),
            Arc::new(reload),
            cancel.clone(),
        );
        cancel.cancel();
        tokio::time::timeout(std::time::Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
