use std::sync::Arc;

use domain::common::entity::EnforcementPointId;
use domain::flow::entity::FlowStatsEntry;
use ports::primary::controller_events::ControllerEventHandler;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Notification from the SDN controller host.
///
/// Tagged by `type` for the JSON-lines form; packet bytes travel as hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControllerEvent {
    EnforcementPointActive {
        #[serde(rename = "switch")]
        point: EnforcementPointId,
    },
    PacketObserved {
        #[serde(rename = "switch")]
        point: EnforcementPointId,
        #[serde(with = "hex")]
        frame: Vec<u8>,
    },
    FlowStatsReceived {
        #[serde(rename = "switch")]
        point: EnforcementPointId,
        #[serde(default)]
        stats: Vec<FlowStatsEntry>,
    },
}

impl ControllerEvent {
    pub fn point(&self) -> EnforcementPointId {
        match self {
            Self::EnforcementPointActive { point }
            | Self::PacketObserved { point, .. }
            | Self::FlowStatsReceived { point, .. } => *point,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::EnforcementPointActive { .. } => "enforcement_point_active",
            Self::PacketObserved { .. } => "packet_observed",
            Self::FlowStatsReceived { .. } => "flow_stats_received",
        }
    }
}

/// Feeds controller events to a handler one at a time.
///
/// Uses `tokio::select!` for cancellation awareness and drains queued
/// events before stopping.
pub struct EventDispatcher {
    handler: Arc<dyn ControllerEventHandler>,
}

impl EventDispatcher {
    pub fn new(handler: Arc<dyn ControllerEventHandler>) -> Self {
        Self { handler }
    }

    /// Main event loop. Returns the number of events dispatched once the
    /// channel closes or the token is cancelled.
    pub async fn run(
        self,
        mut rx: mpsc::Receiver<ControllerEvent>,
        cancel_token: CancellationToken,
    ) -> u64 {
        let mut count: u64 = 0;

        loop {
            tokio::select! {
                () = cancel_token.cancelled() => {
                    while let Ok(event) = rx.try_recv() {
                        count += 1;
                        self.dispatch(event).await;
                    }
                    break;
                }
                msg = rx.recv() => {
                    match msg {
                        Some(event) => {
                            count += 1;
                            self.dispatch(event).await;
                        }
                        None => break,
                    }
                }
            }
        }

        tracing::info!(total_events = count, "event dispatcher stopped");
        count
    }

    async fn dispatch(&self, event: ControllerEvent) {
        match event {
            ControllerEvent::EnforcementPointActive { point } => {
                if let Err(e) = self.handler.on_enforcement_point_active(point).await {
                    tracing::error!(switch = %point, error = %e, "rule installation failed");
                }
            }
            ControllerEvent::PacketObserved { point, frame } => {
                // Classification failures are already logged by the monitor.
                let _ = self.handler.on_packet_observed(point, &frame).await;
            }
            ControllerEvent::FlowStatsReceived { point, stats } => {
                self.handler.on_flow_stats_received(point, &stats).await;
            }
        }
    }
}
