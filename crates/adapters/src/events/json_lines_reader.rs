use application::event_pipeline::ControllerEvent;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Reads controller events, one JSON object per line, from an async reader.
///
/// ```text
/// {"type":"enforcement_point_active","switch":1}
/// {"type":"packet_observed","switch":1,"frame":"ffffffffffff0000..."}
/// {"type":"flow_stats_received","switch":1,"stats":[{"packet_count":3}]}
/// ```
///
/// Blank lines are skipped. Lines that do not parse are logged and skipped.
pub struct JsonLinesEventReader<R> {
    reader: R,
}

impl<R: AsyncBufRead + Unpin> JsonLinesEventReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Forward parsed events to `tx` until end of input, cancellation, or
    /// the receiver is dropped. Returns the number of events forwarded.
    pub async fn run(self, tx: mpsc::Sender<ControllerEvent>, cancel_token: CancellationToken) -> u64 {
        let mut lines = self.reader.lines();
        let mut line_no: u64 = 0;
        let mut forwarded: u64 = 0;

        loop {
            let line = tokio::select! {
                () = cancel_token.cancelled() => break,
                next = lines.next_line() => match next {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        debug!("event input closed");
                        break;
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to read event input");
                        break;
                    }
                },
            };
            line_no += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let event = match serde_json::from_str::<ControllerEvent>(trimmed) {
                Ok(event) => event,
                Err(e) => {
                    warn!(line = line_no, error = %e, "skipping malformed event");
                    continue;
                }
            };

            debug!(line = line_no, kind = event.kind(), switch = %event.point(), "event read");
            if tx.send(event).await.is_err() {
                debug!("event channel closed, stopping reader");
                break;
            }
            forwarded += 1;
        }

        info!(lines = line_no, events = forwarded, "event reader stopped");
        forwarded
    }
}

#[cfg(test)]
mod tests {
    use domain::common::entity::EnforcementPointId;

    use super::*;

    async fn read_all(input: &str) -> (u64, Vec<ControllerEvent>) {
        let (tx, mut rx) = mpsc::channel(16);
        let reader = JsonLinesEventReader::new(input.as_bytes());
        let count = reader.run(tx, CancellationToken::new()).await;

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        (count, events)
    }

    #[tokio::test]
    async fn reads_each_event_kind() {
        let frame = hex::encode([0xAAu8; 14]);
        let packet = format!(r#"{{"type":"packet_observed","switch":1,"frame":"{frame}"}}"#);
        let input = [
            r#"{"type":"enforcement_point_active","switch":1}"#,
            packet.as_str(),
            r#"{"type":"flow_stats_received","switch":1,"stats":[{"packet_count":3,"byte_count":180}]}"#,
        ]
        .join("\n");

        let (count, events) = read_all(&input).await;
        assert_eq!(count, 3);
        assert_eq!(
            events[0],
            ControllerEvent::EnforcementPointActive {
                point: EnforcementPointId(1)
            }
        );
        assert!(matches!(
            &events[1],
            ControllerEvent::PacketObserved { frame, .. } if frame.len() == 14
        ));
        assert!(matches!(
            &events[2],
            ControllerEvent::FlowStatsReceived { stats, .. }
                if stats.len() == 1 && stats[0].byte_count == 180
        ));
    }

    #[tokio::test]
    async fn malformed_and_blank_lines_are_skipped() {
        let input = concat!(
            "\n",
            "not json\n",
            "{\"type\":\"unknown\",\"switch\":1}\n",
            "{\"type\":\"packet_observed\",\"switch\":1,\"frame\":\"zz\"}\n",
            "{\"type\":\"enforcement_point_active\",\"switch\":2}\n",
        );
        let (count, events) = read_all(input).await;
        assert_eq!(count, 1);
        assert_eq!(events[0].point(), EnforcementPointId(2));
    }

    #[tokio::test]
    async fn stops_when_receiver_dropped() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let input = "{\"type\":\"enforcement_point_active\",\"switch\":1}\n";
        let count = JsonLinesEventReader::new(input.as_bytes())
            .run(tx, CancellationToken::new())
            .await;
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn stops_on_cancellation() {
        let (tx, _rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();
        cancel.cancel();
        // A reader that never yields: duplex with the write half kept open.
        let (_client, server) = tokio::io::duplex(64);
        let reader = tokio::io::BufReader::new(server);
        let count = JsonLinesEventReader::new(reader).run(tx, cancel).await;
        assert_eq!(count, 0);
    }
}
