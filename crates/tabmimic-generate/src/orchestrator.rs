use std::collections::HashSet;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use tabmimic_core::{Error, GenerateOptions, Profile, RowBatch, Sink, Value};

use crate::errors::GenerationError;
use crate::generators::{ColumnGenerator, FragmentGenerator};

/// Outcome of a generation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub run_id: String,
    /// Row counts of each flushed batch, in order.
    pub flushes: Vec<usize>,
    pub rows_written: usize,
    pub duration_ms: u64,
}

/// Drives generators in lock-step and flushes fixed-size batches.
#[derive(Debug, Clone, Copy)]
pub struct BatchOrchestrator {
    batch_size: usize,
}

impl BatchOrchestrator {
    pub fn new(batch_size: usize) -> Result<Self, GenerationError> {
        if batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be >= 1".to_string()).into());
        }
        Ok(Self { batch_size })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Generate `total_rows` rows into `sink`.
    ///
    /// Inactive generators are activated first. Every batch asks each
    /// generator for `min(batch_size, remaining)` rows; a generator returning
    /// any other count aborts the run before the batch is flushed.
    pub fn run<S: Sink>(
        &self,
        generators: &mut [Box<dyn FragmentGenerator>],
        total_rows: usize,
        sink: &mut S,
    ) -> Result<RunReport, GenerationError> {
        let start = Instant::now();
        let run_id = Uuid::new_v4().to_string();

        let mut columns = Vec::new();
        let mut seen = HashSet::new();
        for generator in generators.iter() {
            for column in generator.columns() {
                if !seen.insert(column.clone()) {
                    return Err(GenerationError::DuplicateColumn(column.clone()));
                }
                columns.push(column.clone());
            }
        }

        for generator in generators.iter_mut() {
            if !generator.is_active() {
                generator.activate(&*sink)?;
            }
        }

        info!(
            run_id = %run_id,
            columns = columns.len(),
            rows = total_rows,
            batch_size = self.batch_size,
            "generation started"
        );

        let mut flushes = Vec::new();
        let mut remaining = total_rows;
        while remaining > 0 {
            let n = remaining.min(self.batch_size);
            let mut data: Vec<Vec<Value>> = Vec::with_capacity(columns.len());
            for generator in generators.iter_mut() {
                let fragment = generator.next_fragment(n, &*sink)?;
                let names = generator.columns();
                if fragment.len() != names.len() {
                    warn!(run_id = %run_id, columns = ?names, "fragment shape mismatch");
                    return Err(GenerationError::FragmentShape {
                        columns: names.to_vec(),
                        expected: names.len(),
                        actual: fragment.len(),
                    });
                }
                for (name, values) in names.iter().zip(&fragment) {
                    if values.len() != n {
                        warn!(run_id = %run_id, column = %name, "batch size mismatch");
                        return Err(GenerationError::BatchMismatch {
                            column: name.clone(),
                            expected: n,
                            actual: values.len(),
                        });
                    }
                    debug!(column = %name, rows = n, "column generated");
                }
                data.extend(fragment);
            }

            let batch = RowBatch {
                columns: columns.clone(),
                rows: transpose(data, n),
            };
            sink.append(&batch)?;
            remaining -= n;
            flushes.push(n);
            info!(run_id = %run_id, rows = n, remaining, "batch flushed");
        }

        let rows_written: usize = flushes.iter().sum();
        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            run_id = %run_id,
            rows_written,
            batches = flushes.len(),
            duration_ms,
            "generation completed"
        );
        Ok(RunReport {
            run_id,
            flushes,
            rows_written,
            duration_ms,
        })
    }
}

/// One seeded generator per profiled column, in profile order.
pub fn build_generators(
    profile: &Profile,
    seed: u64,
) -> Result<Vec<Box<dyn FragmentGenerator>>, GenerationError> {
    profile
        .iter()
        .map(|spec| {
            ColumnGenerator::new(spec, hash_seed(seed, &spec.name))
                .map(|generator| Box::new(generator) as Box<dyn FragmentGenerator>)
        })
        .collect()
}

/// Create the destination from the profile and fill it with `rows` rows.
pub fn generate_into<S: Sink>(
    profile: &Profile,
    options: &GenerateOptions,
    sink: &mut S,
    rows: usize,
) -> Result<RunReport, GenerationError> {
    options.validate()?;
    let orchestrator = BatchOrchestrator::new(options.batch_size)?;
    sink.create_if_absent(&profile.column_defs())?;

    let seed = options.seed.unwrap_or_else(rand::random);
    info!(columns = profile.len(), rows, seed, "destination ready");
    if rows == 0 {
        return orchestrator.run(&mut [], 0, sink);
    }
    let mut generators = build_generators(profile, seed)?;
    orchestrator.run(&mut generators, rows, sink)
}

/// Column-major values to row-major rows.
fn transpose(columns: Vec<Vec<Value>>, rows: usize) -> Vec<Vec<Value>> {
    let mut out: Vec<Vec<Value>> = (0..rows)
        .map(|_| Vec::with_capacity(columns.len()))
        .collect();
    for column in columns {
        for (row, value) in out.iter_mut().zip(column) {
            row.push(value);
        }
    }
    out
}

fn hash_seed(seed: u64, key: &str) -> u64 {
    let mut hash = seed ^ 0xcbf29ce484222325;
    for byte in key.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}
