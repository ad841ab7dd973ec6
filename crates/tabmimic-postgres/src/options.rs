use serde::{Deserialize, Serialize};

/// Connection settings for [`crate::PostgresStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostgresOptions {
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    /// Schema used when a table name is not qualified.
    pub default_schema: String,
}

impl Default for PostgresOptions {
    fn default() -> Self {
        Self {
            max_connections: 5,
            acquire_timeout_secs: 10,
            default_schema: "public".to_string(),
        }
    }
}
