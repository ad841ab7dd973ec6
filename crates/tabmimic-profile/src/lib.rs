//! Column profiling for tabmimic.
//!
//! Samples a source, decides a generation strategy per column and learns its
//! parameters: frequency tables, kernel density masses over equal-width
//! intervals and per-position character-class patterns.

pub mod classify;
pub mod errors;
pub mod estimate;
pub mod kde;
pub mod pattern;
pub mod profiler;
pub mod semantic;

pub use classify::{ColumnOverride, Thresholds, classify};
pub use errors::ProfileError;
pub use estimate::{categorical_distribution, continuous_distribution, to_float};
pub use kde::GaussianKde;
pub use pattern::infer_pattern;
pub use profiler::Profiler;
pub use semantic::{detect_semantic_kind, match_ratio};
