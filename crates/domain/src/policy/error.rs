use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("unrecognized policy field: {name}")]
    UnrecognizedField { name: String },

    #[error("invalid port: {value}")]
    InvalidPort { value: String },

    #[error("invalid MAC address: {value}")]
    InvalidMacAddress { value: String },

    #[error("invalid network address '{value}': {reason}")]
    InvalidNetworkAddress { value: String, reason: &'static str },

    #[error("unknown transport protocol: {value}")]
    UnknownProtocol { value: String },

    #[error("unknown ethertype: {value}")]
    UnknownEtherType { value: String },
}
