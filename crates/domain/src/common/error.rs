use thiserror::Error;

use crate::flow::error::FlowError;
use crate::policy::error::PolicyError;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("invalid policy: {0}")]
    InvalidPolicy(String),

    #[error("invalid packet: {0}")]
    InvalidPacket(String),

    #[error("enforcement sink unavailable: {0}")]
    SinkUnavailable(String),

    #[error("engine error: {0}")]
    EngineError(String),
}

impl From<PolicyError> for DomainError {
    fn from(err: PolicyError) -> Self {
        Self::InvalidPolicy(err.to_string())
    }
}

impl From<FlowError> for DomainError {
    fn from(err: FlowError) -> Self {
        Self::InvalidPacket(err.to_string())
    }
}
