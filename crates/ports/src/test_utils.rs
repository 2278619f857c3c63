use std::sync::Mutex;

use domain::common::entity::EnforcementPointId;
use domain::common::error::DomainError;
use domain::policy::entity::CompiledCriterion;

use crate::secondary::enforcement_sink::EnforcementSink;

/// Sink that records every submission in order.
#[derive(Default)]
pub struct RecordingSink {
    submissions: Mutex<Vec<(EnforcementPointId, CompiledCriterion)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all submissions so far.
    pub fn submissions(&self) -> Vec<(EnforcementPointId, CompiledCriterion)> {
        self.submissions
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.submissions.lock().map(|s| s.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EnforcementSink for RecordingSink {
    fn submit(
        &self,
        point: EnforcementPointId,
        criterion: &CompiledCriterion,
    ) -> Result<(), DomainError> {
        self.submissions
            .lock()
            .map_err(|e| DomainError::EngineError(e.to_string()))?
            .push((point, criterion.clone()));
        Ok(())
    }
}

/// Sink that accepts `fail_after` submissions, then rejects every call.
pub struct FailingSink {
    fail_after: usize,
    accepted: Mutex<usize>,
}

impl FailingSink {
    pub fn new(fail_after: usize) -> Self {
        Self {
            fail_after,
            accepted: Mutex::new(0),
        }
    }

    pub fn accepted(&self) -> usize {
        self.accepted.lock().map(|n| *n).unwrap_or_default()
    }
}

impl EnforcementSink for FailingSink {
    fn submit(
        &self,
        _point: EnforcementPointId,
        _criterion: &CompiledCriterion,
    ) -> Result<(), DomainError> {
        let mut accepted = self
            .accepted
            .lock()
            .map_err(|e| DomainError::EngineError(e.to_string()))?;
        if *accepted >= self.fail_after {
            return Err(DomainError::SinkUnavailable("connection lost".to_string()));
        }
        *accepted += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_sink_keeps_order() {
        let sink = RecordingSink::new();
        sink.submit(EnforcementPointId(1), &CompiledCriterion::new())
            .unwrap();
        sink.submit(EnforcementPointId(2), &CompiledCriterion::new())
            .unwrap();
        let points: Vec<u64> = sink.submissions().iter().map(|(p, _)| p.0).collect();
        assert_eq!(points, vec![1, 2]);
    }

    #[test]
    fn failing_sink_fails_after_threshold() {
        let sink = FailingSink::new(1);
        let c = CompiledCriterion::new();
        assert!(sink.submit(EnforcementPointId(1), &c).is_ok());
        assert!(matches!(
            sink.submit(EnforcementPointId(1), &c),
            Err(DomainError::SinkUnavailable(_))
        ));
        assert_eq!(sink.accepted(), 1);
    }
}
