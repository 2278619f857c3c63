use domain::common::entity::EnforcementPointId;
use domain::common::error::DomainError;
use domain::policy::entity::CompiledCriterion;
use ports::secondary::enforcement_sink::EnforcementSink;
use tokio::sync::mpsc;

/// A criterion handed to an in-process host.
pub type Submission = (EnforcementPointId, CompiledCriterion);

/// Enforcement sink that forwards criteria into an unbounded channel.
///
/// For embedding the compiler in a host that installs rules itself. The
/// channel is unbounded so `submit` never blocks the event loop; a
/// dropped receiver surfaces as `SinkUnavailable`.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Submission>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<Submission>) -> Self {
        Self { tx }
    }

    /// Create a sink together with its receiving end.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Submission>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl EnforcementSink for ChannelSink {
    fn submit(
        &self,
        point: EnforcementPointId,
        criterion: &CompiledCriterion,
    ) -> Result<(), DomainError> {
        self.tx
            .send((point, criterion.clone()))
            .map_err(|_| DomainError::SinkUnavailable("receiver dropped".to_string()))
    }
}
