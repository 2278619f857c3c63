use std::future::Future;
use std::pin::Pin;

use domain::common::entity::EnforcementPointId;
use domain::common::error::DomainError;
use domain::flow::entity::{FlowStatsEntry, FlowTuple};

/// Boxed future returned by [`ControllerEventHandler`] methods.
pub type HandlerFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Primary port: the controller notifications the core reacts to.
///
/// Uses boxed futures (instead of RPITIT) so the trait is dyn-compatible
/// and can be shared as `Arc<dyn ControllerEventHandler>`.
pub trait ControllerEventHandler: Send + Sync {
    /// An enforcement point finished its handshake. Returns the number of
    /// criteria submitted to it (0 when it is not the configured point).
    fn on_enforcement_point_active(
        &self,
        point: EnforcementPointId,
    ) -> HandlerFuture<'_, Result<usize, DomainError>>;

    /// A packet was forwarded to the controller.
    fn on_packet_observed<'a>(
        &'a self,
        point: EnforcementPointId,
        frame: &'a [u8],
    ) -> HandlerFuture<'a, Result<FlowTuple, DomainError>>;

    /// Counters for installed rules arrived.
    fn on_flow_stats_received<'a>(
        &'a self,
        point: EnforcementPointId,
        stats: &'a [FlowStatsEntry],
    ) -> HandlerFuture<'a, ()>;
}
