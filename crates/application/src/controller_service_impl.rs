use std::sync::Arc;

use domain::common::entity::EnforcementPointId;
use domain::common::error::DomainError;
use domain::flow::entity::{FlowStatsEntry, FlowTuple};
use ports::primary::controller_events::{ControllerEventHandler, HandlerFuture};
use tokio::sync::RwLock;

use crate::enforcement_service_impl::EnforcementAppService;
use crate::flow_monitor::FlowMonitor;

/// Routes controller notifications to the enforcement service and the
/// flow monitor.
pub struct ControllerAppService {
    enforcement: Arc<RwLock<EnforcementAppService>>,
    monitor: Arc<FlowMonitor>,
}

impl ControllerAppService {
    pub fn new(enforcement: Arc<RwLock<EnforcementAppService>>, monitor: Arc<FlowMonitor>) -> Self {
        Self {
            enforcement,
            monitor,
        }
    }

    pub fn monitor(&self) -> &Arc<FlowMonitor> {
        &self.monitor
    }
}

impl ControllerEventHandler for ControllerAppService {
    fn on_enforcement_point_active(
        &self,
        point: EnforcementPointId,
    ) -> HandlerFuture<'_, Result<usize, DomainError>> {
        Box::pin(async move {
            tracing::info!(switch = %point, "enforcement point active");
            self.enforcement
                .read()
                .await
                .on_enforcement_point_active(point)
        })
    }

    fn on_packet_observed<'a>(
        &'a self,
        point: EnforcementPointId,
        frame: &'a [u8],
    ) -> HandlerFuture<'a, Result<FlowTuple, DomainError>> {
        Box::pin(async move {
            self.monitor
                .on_packet_observed(point, frame)
                .map_err(DomainError::from)
        })
    }

    fn on_flow_stats_received<'a>(
        &'a self,
        point: EnforcementPointId,
        stats: &'a [FlowStatsEntry],
    ) -> HandlerFuture<'a, ()> {
        Box::pin(async move {
            self.monitor.on_flow_stats_received(point, stats);
        })
    }
}
