//! Core contracts for tabmimic.
//!
//! Defines the declared column types, the value model, the column
//! specification sum type, the profile document codec and the collaborator
//! traits shared by the profiling and generation crates.

pub mod adapter;
pub mod codec;
pub mod error;
pub mod memory;
pub mod options;
pub mod spec;
pub mod types;
pub mod value;

pub use adapter::{ColumnDef, ColumnDescription, Lookup, RowBatch, SampleFrame, Sink, Source};
pub use codec::{CodecError, decode_profile, encode_profile, load_profile, save_profile};
pub use error::{Error, Result};
pub use memory::{MemorySink, MemorySource};
pub use options::{GenerateOptions, ProfileOptions};
pub use spec::{ColumnSpec, OutputType, Profile, SemanticKind, Strategy, StrategyKind};
pub use types::DeclaredType;
pub use value::Value;
