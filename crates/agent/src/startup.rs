use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use adapters::events::json_lines_reader::JsonLinesEventReader;
use adapters::sink::json_lines_sink::JsonLinesSink;
use adapters::sink::log_sink::LogEnforcementSink;
use application::controller_service_impl::ControllerAppService;
use application::enforcement_service_impl::EnforcementAppService;
use application::event_pipeline::EventDispatcher;
use application::flow_monitor::FlowMonitor;
use application::policy_reload::PolicyReloadService;
use domain::policy::compiler::PolicyCompiler;
use domain::policy::enumeration::EnumerationTables;
use infrastructure::config::{AgentConfig, SinkKind};
use infrastructure::constants::{EVENT_CHANNEL_CAPACITY, GRACEFUL_SHUTDOWN_TIMEOUT};
use infrastructure::policy_store::PolicyStore;
use ports::secondary::enforcement_sink::EnforcementSink;
use tokio::io::BufReader;
use tokio::sync::{RwLock, mpsc};
use tracing::info;

use crate::cli::Cli;
use crate::reload::spawn_reload_task;
use crate::shutdown::create_shutdown_token;

/// Resolve the agent config from the CLI.
///
/// An explicit `--config` must exist. Without one, `default_path` is used
/// when present and built-in defaults otherwise. CLI flags take
/// precedence over the file.
pub fn resolve_config(cli: &Cli, default_path: &Path) -> anyhow::Result<AgentConfig> {
    let mut config = match &cli.config {
        Some(path) => AgentConfig::load(path)?,
        None => match AgentConfig::load(default_path) {
            Ok(config) => config,
            Err(e) if e.is_not_found() => AgentConfig::default(),
            Err(e) => return Err(e.into()),
        },
    };

    if let Some(level) = cli.log_level {
        config.agent.log_level = level;
    }
    if let Some(format) = cli.log_format {
        config.agent.log_format = format;
    }
    if let Some(path) = &cli.policies {
        config.policies.path.clone_from(path);
    }
    if let Some(sink) = cli.sink {
        config.sink = sink;
    }
    config.validate()?;
    Ok(config)
}

fn build_sink(kind: SinkKind) -> Arc<dyn EnforcementSink> {
    match kind {
        SinkKind::Log => Arc::new(LogEnforcementSink),
        SinkKind::Json => Arc::new(JsonLinesSink::new(std::io::stdout())),
    }
}

/// Daemon mode: read controller events from stdin until end of input or
/// a shutdown signal.
pub async fn run(config: AgentConfig) -> anyhow::Result<()> {
    // Service root span, fields appear in every subsequent log entry
    let _root_span = tracing::span!(
        tracing::Level::INFO,
        "service",
        service.name = "policyfw",
        service.version = env!("CARGO_PKG_VERSION"),
    )
    .entered();

    info!(
        policies_path = %config.policies.path.display(),
        sink = config.sink.as_str(),
        log_level = config.agent.log_level.as_str(),
        log_format = config.agent.log_format.as_str(),
        "policyfw agent starting"
    );

    // ── 1. Load policies ────────────────────────────────────────────
    let tables = Arc::new(EnumerationTables::standard());
    let store = PolicyStore::new(Arc::clone(&tables));
    let policy_set = store.load(&config.policies.path);
    info!(
        switch = %policy_set.enforcement_point(),
        policies = policy_set.len(),
        "policy store loaded"
    );

    // ── 2. Wire services ────────────────────────────────────────────
    let enforcement = Arc::new(RwLock::new(EnforcementAppService::new(
        Arc::new(policy_set),
        PolicyCompiler::new(tables),
        build_sink(config.sink),
    )));
    {
        let report = enforcement.read().await.compile();
        info!(criteria = report.criteria.len(), "policy set compiled");
    }

    let monitor = Arc::new(FlowMonitor::new());
    let controller = Arc::new(ControllerAppService::new(
        Arc::clone(&enforcement),
        Arc::clone(&monitor),
    ));
    let reload_service = Arc::new(PolicyReloadService::new(Arc::clone(&enforcement)));

    // ── 3. Spawn tasks ──────────────────────────────────────────────
    let cancel_token = create_shutdown_token();
    let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

    let dispatcher = EventDispatcher::new(controller);
    let dispatcher_handle = tokio::spawn(dispatcher.run(event_rx, cancel_token.clone()));

    let reader = JsonLinesEventReader::new(BufReader::new(tokio::io::stdin()));
    let mut reader_handle = tokio::spawn(reader.run(event_tx, cancel_token.clone()));

    let reload_handle = spawn_reload_task(
        config.policies.path.clone(),
        store,
        reload_service,
        cancel_token.clone(),
    );

    info!("policyfw agent ready, reading events from stdin");

    // ── 4. Wait for shutdown or end of input ───────────────────────
    let reader_done = tokio::select! {
        () = cancel_token.cancelled() => false,
        _ = &mut reader_handle => {
            info!("event input closed");
            true
        }
    };

    info!("shutdown phase 1: cancelling tasks");
    cancel_token.cancel();

    info!("shutdown phase 2: draining events");
    if !reader_done {
        let _ = tokio::time::timeout(Duration::from_secs(1), reader_handle).await;
    }
    let _ = tokio::time::timeout(GRACEFUL_SHUTDOWN_TIMEOUT, dispatcher_handle).await;

    info!("shutdown phase 3: stopping reload task");
    let _ = tokio::time::timeout(Duration::from_secs(1), reload_handle).await;

    info!(
        packets_classified = monitor.packets_classified(),
        packets_skipped = monitor.packets_skipped(),
        stats_reports = monitor.stats_reports(),
        "policyfw agent stopped"
    );
    Ok(())
}
