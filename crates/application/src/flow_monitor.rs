use std::sync::atomic::{AtomicU64, Ordering};

use domain::common::entity::EnforcementPointId;
use domain::flow::classifier::classify;
use domain::flow::entity::{FlowStatsEntry, FlowStatsSummary, FlowTuple};
use domain::flow::error::FlowError;

/// Diagnostic logging for packets and flow statistics seen by the controller.
///
/// Stateless apart from a few counters. Nothing here influences which
/// criteria are installed.
#[derive(Debug, Default)]
pub struct FlowMonitor {
    packets_classified: AtomicU64,
    packets_skipped: AtomicU64,
    stats_reports: AtomicU64,
}

impl FlowMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify a forwarded frame and log its flow tuple.
    pub fn on_packet_observed(
        &self,
        point: EnforcementPointId,
        frame: &[u8],
    ) -> Result<FlowTuple, FlowError> {
        match classify(frame) {
            Ok(tuple) => {
                self.packets_classified.fetch_add(1, Ordering::Relaxed);
                tracing::info!(
                    switch = %point,
                    protocol = %tuple.protocol_label(),
                    src = %tuple.src,
                    dst = %tuple.dst,
                    vlan = ?tuple.vlan_id,
                    "packet observed"
                );
                Ok(tuple)
            }
            Err(e) => {
                self.packets_skipped.fetch_add(1, Ordering::Relaxed);
                match e {
                    FlowError::NotIp { ether_type } => {
                        tracing::trace!(switch = %point, ether_type, "non-IP frame skipped");
                    }
                    _ => {
                        tracing::debug!(
                            switch = %point,
                            len = frame.len(),
                            error = %e,
                            "malformed frame skipped"
                        );
                    }
                }
                Err(e)
            }
        }
    }

    /// Log one flow statistics report: each entry at debug, totals at info.
    pub fn on_flow_stats_received(
        &self,
        point: EnforcementPointId,
        stats: &[FlowStatsEntry],
    ) -> FlowStatsSummary {
        self.stats_reports.fetch_add(1, Ordering::Relaxed);

        for entry in stats {
            tracing::debug!(
                switch = %point,
                match_fields = %entry.match_fields,
                packets = entry.packet_count,
                bytes = entry.byte_count,
                duration_sec = entry.duration_sec,
                "flow stats entry"
            );
        }

        let summary = FlowStatsSummary::from_entries(stats);
        tracing::info!(
            switch = %point,
            flows = summary.flows,
            packets = summary.packets,
            bytes = summary.bytes,
            "flow stats received"
        );
        summary
    }

    pub fn packets_classified(&self) -> u64 {
        self.packets_classified.load(Ordering::Relaxed)
    }

    pub fn packets_skipped(&self) -> u64 {
        self.packets_skipped.load(Ordering::Relaxed)
    }

    pub fn stats_reports(&self) -> u64 {
        self.stats_reports.load(Ordering::Relaxed)
    }
}
