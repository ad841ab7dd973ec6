//! Collaborator contracts for the data stores around the engine.
//!
//! All calls are synchronous; adapters backed by async drivers block on their
//! own runtime.

use crate::error::Result;
use crate::types::DeclaredType;
use crate::value::Value;

/// One row of a source's schema description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescription {
    pub name: String,
    pub raw_type: String,
    pub max_length: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
}

impl ColumnDescription {
    pub fn new(name: impl Into<String>, raw_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            raw_type: raw_type.into(),
            max_length: None,
            precision: None,
            scale: None,
        }
    }

    pub fn declared_type(&self) -> Result<DeclaredType> {
        DeclaredType::from_raw(&self.raw_type, self.max_length, self.precision, self.scale)
    }
}

/// Column-major sample read from a source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleFrame {
    columns: Vec<(String, Vec<Value>)>,
    row_count: usize,
}

impl SampleFrame {
    /// Build a frame from rows laid out in `columns` order. Short rows are
    /// padded with nulls.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let row_count = rows.len();
        let mut data: Vec<(String, Vec<Value>)> = columns
            .into_iter()
            .map(|name| (name, Vec::with_capacity(row_count)))
            .collect();
        for row in rows {
            let mut cells = row.into_iter();
            for (_, values) in &mut data {
                values.push(cells.next().unwrap_or(Value::Null));
            }
        }
        Self {
            columns: data,
            row_count,
        }
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, values)| values.as_slice())
    }
}

/// Column name and type used to create a destination table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub declared_type: DeclaredType,
}

/// Rows flushed to a sink in one append.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowBatch {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl RowBatch {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Sampling side of a data store.
pub trait Source {
    /// Describe the columns of the sampled table, in table order.
    fn describe(&self) -> Result<Vec<ColumnDescription>>;

    /// Read up to `limit` random rows (all rows when `None`), without
    /// replacement, restricted to `columns`.
    fn sample(&self, columns: &[String], limit: Option<usize>) -> Result<SampleFrame>;
}

/// Read-only lookups generators perform against the destination.
pub trait Lookup {
    /// Largest integer currently stored in `column` of the destination table.
    fn max_value(&self, column: &str) -> Result<Option<i64>>;

    /// Up to `limit` values currently stored in `table.column`.
    fn sample_values(&self, table: &str, column: &str, limit: usize) -> Result<Vec<Value>>;
}

/// Destination of synthetic rows.
pub trait Sink: Lookup {
    /// Create the destination table if it does not exist yet.
    fn create_if_absent(&mut self, columns: &[ColumnDef]) -> Result<()>;

    /// Append one batch of rows.
    fn append(&mut self, batch: &RowBatch) -> Result<()>;
}
