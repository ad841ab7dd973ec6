//! Synthetic row generation for tabmimic.
//!
//! Each profiled column becomes a seeded, stateful generator. The batch
//! orchestrator pulls equally sized fragments from every generator, assembles
//! rows in profile order and flushes them to a sink.

pub mod errors;
pub mod generators;
pub mod orchestrator;
pub mod output;

pub use errors::GenerationError;
pub use generators::{ColumnGenerator, FragmentGenerator};
pub use orchestrator::{BatchOrchestrator, RunReport, build_generators, generate_into};
pub use output::csv::CsvSink;
