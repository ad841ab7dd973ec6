use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use tabmimic_core::{ColumnSpec, GenerateOptions, Profile, ProfileOptions, SemanticKind, Strategy};
use tabmimic_postgres::PostgresOptions;
use tabmimic_profile::ColumnOverride;

use crate::errors::CliError;

/// Contents of the optional `--config` TOML file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    pub profile: ProfileOptions,
    pub generate: GenerateOptions,
    pub postgres: PostgresOptions,
    /// Per-column decisions keyed by column name.
    pub columns: BTreeMap<String, ColumnConfig>,
}

/// One `[columns.<name>]` table.
///
/// ```toml
/// [columns.client_id]
/// strategy = "foreign_key"
/// table = "clients"
/// column = "id"
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ColumnConfig {
    Categorical,
    Continuous {
        #[serde(default)]
        midnight: bool,
    },
    FreeText,
    Regex {
        pattern: String,
    },
    Faker {
        kind: SemanticKind,
    },
    CurrentTimestamp,
    IncrementalId,
    ForeignKey {
        table: String,
        column: String,
    },
    Null,
}

impl ColumnConfig {
    /// The strategy used verbatim, for entries that need no estimation.
    pub fn fixed_strategy(&self) -> Option<Strategy> {
        match self {
            ColumnConfig::Categorical | ColumnConfig::Continuous { .. } | ColumnConfig::FreeText => {
                None
            }
            ColumnConfig::Regex { pattern } => Some(Strategy::FreeTextRegex {
                pattern: pattern.clone(),
            }),
            ColumnConfig::Faker { kind } => Some(Strategy::SemanticText { kind: *kind }),
            ColumnConfig::CurrentTimestamp => Some(Strategy::CurrentTimestamp),
            ColumnConfig::IncrementalId => Some(Strategy::IncrementalId),
            ColumnConfig::ForeignKey { table, column } => Some(Strategy::ForeignKey {
                table: table.clone(),
                column: column.clone(),
            }),
            ColumnConfig::Null => Some(Strategy::ExplicitNull),
        }
    }

    pub fn to_override(&self) -> ColumnOverride {
        if let Some(strategy) = self.fixed_strategy() {
            return ColumnOverride::Fixed(strategy);
        }
        match self {
            ColumnConfig::Continuous { midnight } => ColumnOverride::Continuous {
                midnight: *midnight,
            },
            ColumnConfig::FreeText => ColumnOverride::FreeText,
            _ => ColumnOverride::Categorical,
        }
    }
}

impl CliConfig {
    /// Read the file at `path`, or fall back to defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self, CliError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: CliConfig = toml::from_str(&content)?;
        config.profile.validate()?;
        config.generate.validate()?;
        info!(path = %path.display(), columns = config.columns.len(), "config loaded");
        Ok(config)
    }

    /// Profiling-time overrides.
    pub fn overrides(&self) -> BTreeMap<String, ColumnOverride> {
        self.columns
            .iter()
            .map(|(name, column)| (name.clone(), column.to_override()))
            .collect()
    }

    /// Replace the strategy of every profiled column that the config fixes.
    /// Returns the number of replaced columns.
    pub fn apply_fixed(&self, profile: &mut Profile) -> usize {
        let mut replaced = Vec::new();
        for (name, column) in &self.columns {
            let Some(strategy) = column.fixed_strategy() else {
                continue;
            };
            match profile.get(name) {
                Some(existing) => replaced.push(ColumnSpec::new(
                    name.clone(),
                    existing.declared_type,
                    strategy,
                )),
                None => warn!(column = %name, "fixed strategy ignored, column is not in the profile"),
            }
        }
        let count = replaced.len();
        profile.merge(replaced);
        count
    }
}
