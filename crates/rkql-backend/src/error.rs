//! Backend-specific error types.

use thiserror::Error;

/// Errors that can occur during query conversion or pipeline application.
#[derive(Debug, Error)]
pub enum BackendError {
    /// A comparison combination is structurally impossible for this target.
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),

    /// A regex flag has no mapping in the backend's flag table.
    #[error("unsupported regex flag: {0}")]
    UnsupportedFlag(String),

    /// A CIDR literal failed to parse.
    #[error("invalid CIDR: {0}")]
    InvalidCidr(#[from] ipnet::AddrParseError),

    /// An output format name is not provided by this backend.
    #[error("unknown output format '{0}'")]
    UnknownFormat(String),

    /// A pipeline definition is malformed.
    #[error("invalid pipeline: {0}")]
    InvalidPipeline(String),

    /// A pipeline YAML document failed to parse.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A pipeline file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, BackendError>;
