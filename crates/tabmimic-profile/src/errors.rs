use thiserror::Error;

use tabmimic_core::StrategyKind;

/// Errors emitted while profiling a source.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error(transparent)]
    Core(#[from] tabmimic_core::Error),
    #[error("continuous estimation needs at least 2 distinct values, got {distinct}")]
    DegenerateContinuous { distinct: usize },
    #[error("estimated probability mass is zero")]
    ZeroMass,
    #[error("value {0} cannot be mapped onto the real line")]
    NotNumeric(String),
    #[error("strategy {0} cannot be inferred from samples and must be supplied")]
    RequiresParameters(StrategyKind),
    #[error("column '{column}': {source}")]
    Column {
        column: String,
        #[source]
        source: Box<ProfileError>,
    },
}

impl ProfileError {
    pub(crate) fn for_column(self, column: &str) -> Self {
        ProfileError::Column {
            column: column.to_string(),
            source: Box::new(self),
        }
    }
}
