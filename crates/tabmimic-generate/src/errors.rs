use thiserror::Error;

/// Errors emitted by generators and the batch orchestrator.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Core(#[from] tabmimic_core::Error),
    #[error("generator for '{column}' used before activation")]
    NotActivated { column: String },
    #[error("generator for '{column}' is already active")]
    AlreadyActivated { column: String },
    #[error("column '{column}' has no strategy (schema-only profile)")]
    MissingStrategy { column: String },
    #[error("column '{column}': invalid spec: {reason}")]
    InvalidSpec { column: String, reason: String },
    #[error("column '{column}': probabilities sum to zero")]
    ZeroProbabilityMass { column: String },
    #[error("column '{column}': invalid pattern: {reason}")]
    InvalidPattern { column: String, reason: String },
    #[error("column '{column}': referenced {table}.{referenced} has no values")]
    EmptyReference {
        column: String,
        table: String,
        referenced: String,
    },
    #[error("column '{column}' produced {actual} values, expected {expected}")]
    BatchMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },
    #[error("generator for {columns:?} returned {actual} sequences, expected {expected}")]
    FragmentShape {
        columns: Vec<String>,
        expected: usize,
        actual: usize,
    },
    #[error("column '{0}' is produced by more than one generator")]
    DuplicateColumn(String),
}
