use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use tabmimic_core::{
    ColumnSpec, DeclaredType, OutputType, Profile, ProfileOptions, Source, Strategy,
    StrategyKind, Value,
};

use crate::classify::{ColumnOverride, Thresholds, classify};
use crate::errors::ProfileError;
use crate::estimate::{categorical_distribution, continuous_distribution};
use crate::pattern::infer_pattern;

/// Builds profiles from a sampled source.
#[derive(Debug, Clone)]
pub struct Profiler {
    options: ProfileOptions,
}

impl Profiler {
    pub fn new(options: ProfileOptions) -> Result<Self, ProfileError> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &ProfileOptions {
        &self.options
    }

    /// Describe, filter, sample and classify every column of `source`.
    ///
    /// A zero-row sample yields schema-only columns, except where a fixed
    /// override supplies the strategy. Overrides naming a column that is not
    /// profiled are ignored.
    pub fn profile(
        &self,
        source: &dyn Source,
        overrides: &BTreeMap<String, ColumnOverride>,
    ) -> Result<Profile, ProfileError> {
        let mut described = source.describe()?;
        if let Some(include) = &self.options.columns_to_include {
            for name in include {
                if !described.iter().any(|column| &column.name == name) {
                    warn!(column = %name, "included column not found in source");
                }
            }
            described.retain(|column| include.contains(&column.name));
        }

        let columns = described
            .iter()
            .map(|column| {
                column
                    .declared_type()
                    .map(|declared| (column.name.clone(), declared))
                    .map_err(|err| ProfileError::from(err).for_column(&column.name))
            })
            .collect::<Result<Vec<(String, DeclaredType)>, _>>()?;

        for name in overrides.keys() {
            if !columns.iter().any(|(column, _)| column == name) {
                warn!(column = %name, "override ignored, column is not profiled");
            }
        }

        let names: Vec<String> = columns.iter().map(|(name, _)| name.clone()).collect();
        let frame = source.sample(&names, self.options.sample_rows)?;
        info!(
            columns = names.len(),
            rows = frame.row_count(),
            "source sampled"
        );

        if frame.is_empty() {
            warn!("sample is empty, only fixed overrides keep a strategy");
            let mut profile = Profile::new();
            for (name, declared) in columns {
                let spec = match overrides.get(&name) {
                    Some(ColumnOverride::Fixed(strategy)) => {
                        strategy
                            .validate()
                            .map_err(|err| ProfileError::from(err).for_column(&name))?;
                        ColumnSpec::new(name, declared, strategy.clone())
                    }
                    _ => ColumnSpec::schema_only(name, declared),
                };
                profile.insert(spec);
            }
            return Ok(profile);
        }

        let mut profile = Profile::new();
        for (name, declared) in columns {
            let sample = frame.column(&name).unwrap_or_default();
            let spec = self
                .profile_column(&name, declared, sample, overrides.get(&name))
                .map_err(|err| err.for_column(&name))?;
            profile.insert(spec);
        }
        Ok(profile)
    }

    /// Classify one sampled column and estimate its parameters.
    pub fn profile_column(
        &self,
        name: &str,
        declared: DeclaredType,
        sample: &[Value],
        column_override: Option<&ColumnOverride>,
    ) -> Result<ColumnSpec, ProfileError> {
        if let Some(ColumnOverride::Fixed(strategy)) = column_override {
            strategy.validate()?;
            info!(column = %name, strategy = %strategy.kind(), "column fixed by override");
            return Ok(ColumnSpec::new(name, declared, strategy.clone()));
        }

        let thresholds = Thresholds::from(&self.options);
        let kind = classify(sample, &declared, column_override, &thresholds);
        let strategy = match kind {
            StrategyKind::Categorical => {
                let (values, probabilities) = categorical_distribution(sample);
                Strategy::Categorical {
                    values,
                    probabilities,
                }
            }
            StrategyKind::Continuous => {
                let midnight = matches!(
                    column_override,
                    Some(ColumnOverride::Continuous { midnight: true })
                );
                let output = OutputType::for_declared(&declared, midnight)?;
                let (intervals, probabilities) =
                    continuous_distribution(sample, self.options.number_of_intervals)?;
                Strategy::Continuous {
                    intervals,
                    probabilities,
                    output,
                }
            }
            StrategyKind::FreeTextRegex => {
                let rendered = sample.iter().filter_map(Value::render);
                Strategy::FreeTextRegex {
                    pattern: infer_pattern(rendered),
                }
            }
            StrategyKind::SemanticText(kind) => Strategy::SemanticText { kind },
            StrategyKind::ExplicitNull => Strategy::ExplicitNull,
            StrategyKind::CurrentTimestamp
            | StrategyKind::IncrementalId
            | StrategyKind::ForeignKey => return Err(ProfileError::RequiresParameters(kind)),
        };

        debug!(column = %name, sampled = sample.len(), "column estimated");
        info!(column = %name, data_type = %declared, strategy = %kind, "column classified");
        Ok(ColumnSpec::new(name, declared, strategy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_options() {
        let options = ProfileOptions {
            number_of_intervals: 0,
            ..ProfileOptions::default()
        };
        assert!(Profiler::new(options).is_err());
    }

    #[test]
    fn fixed_continuous_is_not_re_estimated() {
        let profiler = Profiler::new(ProfileOptions::default()).unwrap();
        let fixed = Strategy::Continuous {
            intervals: vec![(0.0, 1.0)],
            probabilities: vec![1.0],
            output: OutputType::Float,
        };
        let spec = profiler
            .profile_column(
                "x",
                DeclaredType::Double,
                &[Value::Float(5.0), Value::Float(6.0)],
                Some(&ColumnOverride::Fixed(fixed.clone())),
            )
            .unwrap();
        assert_eq!(spec.strategy, Some(fixed));
    }

    #[test]
    fn midnight_override_selects_truncated_output() {
        let profiler = Profiler::new(ProfileOptions::default()).unwrap();
        let day = chrono::NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let sample: Vec<Value> = (0..10)
            .map(|hour| Value::Timestamp(day.and_hms_opt(hour, 30, 0).unwrap()))
            .collect();
        let spec = profiler
            .profile_column(
                "t",
                DeclaredType::Timestamp,
                &sample,
                Some(&ColumnOverride::Continuous { midnight: true }),
            )
            .unwrap();
        assert!(matches!(
            spec.strategy,
            Some(Strategy::Continuous {
                output: OutputType::DateTimeAtMidnight,
                ..
            })
        ));
    }
}
