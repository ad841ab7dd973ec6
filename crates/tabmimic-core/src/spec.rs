use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::adapter::ColumnDef;
use crate::error::{Error, Result};
use crate::types::DeclaredType;
use crate::value::Value;

/// Semantic text families synthesized by the faker component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticKind {
    /// `ИВАНОВ ИВАН ИВАНОВИЧ`
    FullNameUpper,
    /// `Иванов Иван Иванович`
    FullNameTitleCase,
    Email,
}

impl SemanticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticKind::FullNameUpper => "full_name_upper",
            SemanticKind::FullNameTitleCase => "full_name_title_case",
            SemanticKind::Email => "email",
        }
    }
}

/// Mapping applied to a float drawn from a continuous distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputType {
    /// Truncation toward zero.
    Int,
    /// Rounded to `precision` fractional digits.
    Decimal { precision: u32 },
    Float,
    /// Inverse of the proleptic Gregorian day ordinal.
    Date,
    /// Inverse of epoch seconds.
    DateTime,
    /// Inverse of epoch seconds truncated to the start of the day.
    DateTimeAtMidnight,
}

impl OutputType {
    /// Output mapping implied by a declared type.
    pub fn for_declared(declared: &DeclaredType, midnight: bool) -> Result<Self> {
        match declared {
            DeclaredType::Int => Ok(OutputType::Int),
            DeclaredType::Decimal { scale, .. } => Ok(OutputType::Decimal { precision: *scale }),
            DeclaredType::Double => Ok(OutputType::Float),
            DeclaredType::Date => Ok(OutputType::Date),
            DeclaredType::Timestamp if midnight => Ok(OutputType::DateTimeAtMidnight),
            DeclaredType::Timestamp => Ok(OutputType::DateTime),
            DeclaredType::Boolean | DeclaredType::String | DeclaredType::Varchar(_) => Err(
                Error::UnsupportedType(format!("{declared} has no continuous mapping")),
            ),
        }
    }
}

/// Strategy tag without parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    Categorical,
    Continuous,
    FreeTextRegex,
    SemanticText(SemanticKind),
    CurrentTimestamp,
    IncrementalId,
    ForeignKey,
    ExplicitNull,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Categorical => write!(f, "categorical"),
            StrategyKind::Continuous => write!(f, "continuous"),
            StrategyKind::FreeTextRegex => write!(f, "free_text_regex"),
            StrategyKind::SemanticText(kind) => write!(f, "semantic_text({})", kind.as_str()),
            StrategyKind::CurrentTimestamp => write!(f, "current_timestamp"),
            StrategyKind::IncrementalId => write!(f, "incremental_id"),
            StrategyKind::ForeignKey => write!(f, "foreign_key"),
            StrategyKind::ExplicitNull => write!(f, "explicit_null"),
        }
    }
}

/// Generation strategy with its learned or caller-supplied parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    Categorical {
        values: Vec<Value>,
        probabilities: Vec<f64>,
    },
    Continuous {
        intervals: Vec<(f64, f64)>,
        probabilities: Vec<f64>,
        output: OutputType,
    },
    FreeTextRegex {
        pattern: String,
    },
    SemanticText {
        kind: SemanticKind,
    },
    CurrentTimestamp,
    IncrementalId,
    ForeignKey {
        table: String,
        column: String,
    },
    ExplicitNull,
}

impl Strategy {
    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::Categorical { .. } => StrategyKind::Categorical,
            Strategy::Continuous { .. } => StrategyKind::Continuous,
            Strategy::FreeTextRegex { .. } => StrategyKind::FreeTextRegex,
            Strategy::SemanticText { kind } => StrategyKind::SemanticText(*kind),
            Strategy::CurrentTimestamp => StrategyKind::CurrentTimestamp,
            Strategy::IncrementalId => StrategyKind::IncrementalId,
            Strategy::ForeignKey { .. } => StrategyKind::ForeignKey,
            Strategy::ExplicitNull => StrategyKind::ExplicitNull,
        }
    }

    /// Check the structural invariants of the parameters.
    ///
    /// Probability vectors only need to be non-negative here; they are
    /// normalized when a generator is activated.
    pub fn validate(&self) -> Result<()> {
        match self {
            Strategy::Categorical {
                values,
                probabilities,
            } => {
                if values.is_empty() {
                    return Err(Error::InvalidSpec(
                        "categorical values must not be empty".to_string(),
                    ));
                }
                if values.len() != probabilities.len() {
                    return Err(Error::InvalidSpec(format!(
                        "categorical has {} values but {} probabilities",
                        values.len(),
                        probabilities.len()
                    )));
                }
                let mut seen = HashSet::new();
                if !values.iter().all(|value| seen.insert(value)) {
                    return Err(Error::InvalidSpec(
                        "categorical values must be distinct".to_string(),
                    ));
                }
                check_probabilities(probabilities)
            }
            Strategy::Continuous {
                intervals,
                probabilities,
                ..
            } => {
                if intervals.is_empty() {
                    return Err(Error::InvalidSpec(
                        "continuous intervals must not be empty".to_string(),
                    ));
                }
                if intervals.len() != probabilities.len() {
                    return Err(Error::InvalidSpec(format!(
                        "continuous has {} intervals but {} probabilities",
                        intervals.len(),
                        probabilities.len()
                    )));
                }
                for (low, high) in intervals {
                    if !(low.is_finite() && high.is_finite() && low < high) {
                        return Err(Error::InvalidSpec(format!(
                            "interval [{low}, {high}) is empty or not finite"
                        )));
                    }
                }
                for pair in intervals.windows(2) {
                    if let [(_, prev_high), (next_low, _)] = pair
                        && next_low < prev_high
                    {
                        return Err(Error::InvalidSpec(
                            "continuous intervals must be sorted and non-overlapping"
                                .to_string(),
                        ));
                    }
                }
                check_probabilities(probabilities)
            }
            Strategy::FreeTextRegex { .. }
            | Strategy::SemanticText { .. }
            | Strategy::CurrentTimestamp
            | Strategy::IncrementalId
            | Strategy::ExplicitNull => Ok(()),
            Strategy::ForeignKey { table, column } => {
                if table.trim().is_empty() || column.trim().is_empty() {
                    return Err(Error::InvalidSpec(
                        "foreign key needs a referenced table and column".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }
}

fn check_probabilities(probabilities: &[f64]) -> Result<()> {
    if probabilities
        .iter()
        .any(|p| !p.is_finite() || *p < 0.0)
    {
        return Err(Error::InvalidSpec(
            "probabilities must be finite and non-negative".to_string(),
        ));
    }
    Ok(())
}

/// Learned description of a single column.
///
/// A spec without a strategy is schema-only: the source was empty when it
/// was profiled.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    pub name: String,
    pub declared_type: DeclaredType,
    pub strategy: Option<Strategy>,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, declared_type: DeclaredType, strategy: Strategy) -> Self {
        Self {
            name: name.into(),
            declared_type,
            strategy: Some(strategy),
        }
    }

    pub fn schema_only(name: impl Into<String>, declared_type: DeclaredType) -> Self {
        Self {
            name: name.into(),
            declared_type,
            strategy: None,
        }
    }

    pub fn kind(&self) -> Option<StrategyKind> {
        self.strategy.as_ref().map(Strategy::kind)
    }
}

/// Ordered set of column specs keyed by unique column name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Profile {
    columns: Vec<ColumnSpec>,
}

impl Profile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a spec, replacing one with the same name in place.
    pub fn insert(&mut self, spec: ColumnSpec) -> Option<ColumnSpec> {
        match self.columns.iter_mut().find(|column| column.name == spec.name) {
            Some(existing) => Some(std::mem::replace(existing, spec)),
            None => {
                self.columns.push(spec);
                None
            }
        }
    }

    /// Apply overrides on top of the profile: matching names are replaced in
    /// place, new names are appended.
    pub fn merge(&mut self, overrides: impl IntoIterator<Item = ColumnSpec>) {
        for spec in overrides {
            self.insert(spec);
        }
    }

    pub fn get(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ColumnSpec> {
        self.columns.iter()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|column| column.name.clone()).collect()
    }

    /// Name/type pairs used to create the destination table.
    pub fn column_defs(&self) -> Vec<ColumnDef> {
        self.columns
            .iter()
            .map(|column| ColumnDef {
                name: column.name.clone(),
                declared_type: column.declared_type,
            })
            .collect()
    }
}

impl FromIterator<ColumnSpec> for Profile {
    fn from_iter<I: IntoIterator<Item = ColumnSpec>>(iter: I) -> Self {
        let mut profile = Profile::new();
        profile.merge(iter);
        profile
    }
}

impl<'a> IntoIterator for &'a Profile {
    type Item = &'a ColumnSpec;
    type IntoIter = std::slice::Iter<'a, ColumnSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}
