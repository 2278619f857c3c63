use std::io::Write;
use std::sync::Mutex;

use domain::common::entity::EnforcementPointId;
use domain::common::error::DomainError;
use domain::policy::entity::CompiledCriterion;
use ports::secondary::enforcement_sink::EnforcementSink;
use serde::Serialize;

#[derive(Serialize)]
struct DiscardRule<'a> {
    switch: String,
    dpid: u64,
    #[serde(rename = "match")]
    criterion: &'a CompiledCriterion,
}

/// Enforcement sink that writes one JSON object per criterion to a writer.
///
/// ```json
/// {"switch":"00-00-00-00-00-01","dpid":1,"match":{"transport-protocol":6}}
/// ```
///
/// Each line is flushed before `submit` returns so a downstream consumer
/// sees rules in submission order.
pub struct JsonLinesSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Consume the sink and return the writer.
    pub fn into_inner(self) -> Result<W, DomainError> {
        self.writer
            .into_inner()
            .map_err(|e| DomainError::EngineError(e.to_string()))
    }
}

impl<W: Write + Send> EnforcementSink for JsonLinesSink<W> {
    fn submit(
        &self,
        point: EnforcementPointId,
        criterion: &CompiledCriterion,
    ) -> Result<(), DomainError> {
        let record = DiscardRule {
            switch: point.to_string(),
            dpid: point.as_u64(),
            criterion,
        };
        let mut line = serde_json::to_vec(&record)
            .map_err(|e| DomainError::EngineError(format!("serialize criterion: {e}")))?;
        line.push(b'\n');

        let mut writer = self
            .writer
            .lock()
            .map_err(|e| DomainError::EngineError(e.to_string()))?;
        writer
            .write_all(&line)
            .and_then(|()| writer.flush())
            .map_err(|e| DomainError::SinkUnavailable(e.to_string()))
    }
}
