use chrono::{Local, NaiveDateTime, Timelike};
use rand::Rng;
use rand::SeedableRng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand_chacha::ChaCha8Rng;
use rand_regex::Regex as RandRegex;

use tabmimic_core::{ColumnSpec, Lookup, OutputType, SemanticKind, Strategy, Value};

use crate::errors::GenerationError;

pub mod continuous;
pub mod semantic;

const DEFAULT_MAX_REPEAT: u32 = 32;

/// Pull-based producer of one or more output columns.
///
/// `next_fragment(n)` returns one sequence of exactly `n` values per column
/// named by `columns()`, in that order.
pub trait FragmentGenerator {
    fn columns(&self) -> &[String];

    fn is_active(&self) -> bool;

    /// Prepare runtime state. Allowed exactly once.
    fn activate(&mut self, lookup: &dyn Lookup) -> Result<(), GenerationError>;

    fn next_fragment(
        &mut self,
        n: usize,
        lookup: &dyn Lookup,
    ) -> Result<Vec<Vec<Value>>, GenerationError>;
}

#[derive(Debug)]
enum Runtime {
    Categorical {
        values: Vec<Value>,
        index: WeightedIndex<f64>,
    },
    Continuous {
        intervals: Vec<(f64, f64)>,
        index: WeightedIndex<f64>,
        output: OutputType,
    },
    Pattern(RandRegex),
    Semantic(SemanticKind),
    CurrentTimestamp,
    Incremental {
        next: i64,
    },
    ForeignKey {
        table: String,
        column: String,
    },
    Null,
}

#[derive(Debug)]
enum State {
    Idle,
    Active(Runtime),
}

/// Stateful generator bound to a single column spec.
#[derive(Debug)]
pub struct ColumnGenerator {
    name: String,
    strategy: Strategy,
    rng: ChaCha8Rng,
    state: State,
    calls: usize,
}

impl ColumnGenerator {
    /// Bind a generator to `spec` with its own random stream.
    pub fn new(spec: &ColumnSpec, seed: u64) -> Result<Self, GenerationError> {
        let strategy = spec
            .strategy
            .clone()
            .ok_or_else(|| GenerationError::MissingStrategy {
                column: spec.name.clone(),
            })?;
        Ok(Self {
            name: spec.name.clone(),
            strategy,
            rng: ChaCha8Rng::seed_from_u64(seed),
            state: State::Idle,
            calls: 0,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    /// Number of `next_batch` calls served so far.
    pub fn calls(&self) -> usize {
        self.calls
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, State::Active(_))
    }

    pub fn activate(&mut self, lookup: &dyn Lookup) -> Result<(), GenerationError> {
        if self.is_active() {
            return Err(GenerationError::AlreadyActivated {
                column: self.name.clone(),
            });
        }
        self.strategy
            .validate()
            .map_err(|err| GenerationError::InvalidSpec {
                column: self.name.clone(),
                reason: err.to_string(),
            })?;

        let runtime = match &self.strategy {
            Strategy::Categorical {
                values,
                probabilities,
            } => Runtime::Categorical {
                values: values.clone(),
                index: self.weighted_index(probabilities)?,
            },
            Strategy::Continuous {
                intervals,
                probabilities,
                output,
            } => Runtime::Continuous {
                intervals: intervals.clone(),
                index: self.weighted_index(probabilities)?,
                output: *output,
            },
            Strategy::FreeTextRegex { pattern } => {
                let regex = RandRegex::compile(pattern, DEFAULT_MAX_REPEAT).map_err(|err| {
                    GenerationError::InvalidPattern {
                        column: self.name.clone(),
                        reason: err.to_string(),
                    }
                })?;
                Runtime::Pattern(regex)
            }
            Strategy::SemanticText { kind } => Runtime::Semantic(*kind),
            Strategy::CurrentTimestamp => Runtime::CurrentTimestamp,
            Strategy::IncrementalId => {
                let next = lookup
                    .max_value(&self.name)?
                    .map_or(1, |max| max.saturating_add(1));
                Runtime::Incremental { next }
            }
            Strategy::ForeignKey { table, column } => Runtime::ForeignKey {
                table: table.clone(),
                column: column.clone(),
            },
            Strategy::ExplicitNull => Runtime::Null,
        };
        self.state = State::Active(runtime);
        Ok(())
    }

    /// Produce the next `n` values. `n == 0` only counts the call.
    pub fn next_batch(
        &mut self,
        n: usize,
        lookup: &dyn Lookup,
    ) -> Result<Vec<Value>, GenerationError> {
        let Self {
            name,
            rng,
            state,
            calls,
            ..
        } = self;
        let State::Active(runtime) = state else {
            return Err(GenerationError::NotActivated {
                column: name.clone(),
            });
        };
        *calls += 1;
        if n == 0 {
            return Ok(Vec::new());
        }

        match runtime {
            Runtime::Categorical { values, index } => Ok((0..n)
                .map(|_| values[index.sample(rng)].clone())
                .collect()),
            Runtime::Continuous {
                intervals,
                index,
                output,
            } => (0..n)
                .map(|_| {
                    let (low, high) = intervals[index.sample(rng)];
                    continuous::map_output(rng.random_range(low..high), *output)
                })
                .collect(),
            Runtime::Pattern(regex) => Ok((0..n)
                .map(|_| Value::Text(rng.sample::<String, _>(&*regex)))
                .collect()),
            Runtime::Semantic(kind) => Ok((0..n)
                .map(|_| Value::Text(semantic::generate(*kind, rng)))
                .collect()),
            Runtime::CurrentTimestamp => {
                let now = current_timestamp();
                Ok(vec![Value::Timestamp(now); n])
            }
            Runtime::Incremental { next } => {
                let start = *next;
                let end = i64::try_from(n)
                    .ok()
                    .and_then(|count| start.checked_add(count))
                    .ok_or_else(|| GenerationError::InvalidSpec {
                        column: name.clone(),
                        reason: format!("{n} identifiers from {start} overflow i64"),
                    })?;
                *next = end;
                Ok((start..end).map(Value::Int).collect())
            }
            Runtime::ForeignKey { table, column } => {
                let pool = lookup.sample_values(table, column, n)?;
                if pool.is_empty() {
                    return Err(GenerationError::EmptyReference {
                        column: name.clone(),
                        table: table.clone(),
                        referenced: column.clone(),
                    });
                }
                Ok((0..n)
                    .map(|_| pool[rng.random_range(0..pool.len())].clone())
                    .collect())
            }
            Runtime::Null => Ok(vec![Value::Null; n]),
        }
    }

    /// Normalize `probabilities` into a sampling index.
    fn weighted_index(&self, probabilities: &[f64]) -> Result<WeightedIndex<f64>, GenerationError> {
        let total: f64 = probabilities.iter().sum();
        if !(total.is_finite() && total > 0.0) {
            return Err(GenerationError::ZeroProbabilityMass {
                column: self.name.clone(),
            });
        }
        WeightedIndex::new(probabilities.iter().map(|p| p / total)).map_err(|err| {
            GenerationError::InvalidSpec {
                column: self.name.clone(),
                reason: err.to_string(),
            }
        })
    }
}

impl FragmentGenerator for ColumnGenerator {
    fn columns(&self) -> &[String] {
        std::slice::from_ref(&self.name)
    }

    fn is_active(&self) -> bool {
        ColumnGenerator::is_active(self)
    }

    fn activate(&mut self, lookup: &dyn Lookup) -> Result<(), GenerationError> {
        ColumnGenerator::activate(self, lookup)
    }

    fn next_fragment(
        &mut self,
        n: usize,
        lookup: &dyn Lookup,
    ) -> Result<Vec<Vec<Value>>, GenerationError> {
        Ok(vec![self.next_batch(n, lookup)?])
    }
}

/// Local wall-clock time truncated to whole seconds.
fn current_timestamp() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use tabmimic_core::{DeclaredType, MemorySink, Sink};

    use super::*;

    #[test]
    fn schema_only_spec_has_no_generator() {
        let spec = ColumnSpec::schema_only("a", DeclaredType::Int);
        assert!(matches!(
            ColumnGenerator::new(&spec, 1),
            Err(GenerationError::MissingStrategy { .. })
        ));
    }

    #[test]
    fn zero_mass_fails_activation() {
        let spec = ColumnSpec::new(
            "a",
            DeclaredType::Int,
            Strategy::Categorical {
                values: vec![Value::Int(1), Value::Int(2)],
                probabilities: vec![0.0, 0.0],
            },
        );
        let mut generator = ColumnGenerator::new(&spec, 1).unwrap();
        let sink = MemorySink::new("t");
        assert!(matches!(
            generator.activate(&sink),
            Err(GenerationError::ZeroProbabilityMass { .. })
        ));
        assert!(!generator.is_active());
    }

    #[test]
    fn incremental_overflow_is_reported() {
        let spec = ColumnSpec::new("id", DeclaredType::Int, Strategy::IncrementalId);
        let mut sink = MemorySink::new("t");
        sink.append(&tabmimic_core::RowBatch {
            columns: vec!["id".to_string()],
            rows: vec![vec![Value::Int(i64::MAX - 3)]],
        })
        .unwrap();
        let mut generator = ColumnGenerator::new(&spec, 1).unwrap();
        generator.activate(&sink).unwrap();

        let values = generator.next_batch(2, &sink).unwrap();
        assert_eq!(
            values,
            vec![Value::Int(i64::MAX - 2), Value::Int(i64::MAX - 1)]
        );
        assert!(matches!(
            generator.next_batch(2, &sink),
            Err(GenerationError::InvalidSpec { ref column, .. }) if column == "id"
        ));
    }

    #[test]
    fn current_timestamp_has_whole_seconds() {
        let spec = ColumnSpec::new("t", DeclaredType::Timestamp, Strategy::CurrentTimestamp);
        let sink = MemorySink::new("t");
        let mut generator = ColumnGenerator::new(&spec, 1).unwrap();
        generator.activate(&sink).unwrap();
        let values = generator.next_batch(3, &sink).unwrap();
        assert_eq!(values.len(), 3);
        for value in values {
            let Value::Timestamp(ts) = value else {
                panic!("expected timestamp");
            };
            assert_eq!(ts.nanosecond(), 0);
        }
    }
}
