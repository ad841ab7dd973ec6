use thiserror::Error;

/// Core error type shared across tabmimic crates.
#[derive(Debug, Error)]
pub enum Error {
    /// A declared column type has no generation mapping.
    #[error("unsupported data type: {0}")]
    UnsupportedType(String),
    /// A column specification violates its invariants.
    #[error("invalid column spec: {0}")]
    InvalidSpec(String),
    /// A raw cell could not be read as the declared type.
    #[error("invalid value: {0}")]
    InvalidValue(String),
    /// Options are out of range or inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The source collaborator failed.
    #[error("source error: {0}")]
    Source(String),
    /// The sink collaborator failed.
    #[error("sink error: {0}")]
    Sink(String),
}

/// Convenience alias for results returned by tabmimic crates.
pub type Result<T> = std::result::Result<T, Error>;
