use std::collections::BTreeMap;

use crate::adapter::{
    ColumnDef, ColumnDescription, Lookup, RowBatch, SampleFrame, Sink, Source,
};
use crate::error::{Error, Result};
use crate::value::Value;

/// Source backed by rows held in memory.
///
/// Sampling returns the first `limit` rows in insertion order, which keeps
/// tests deterministic.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    columns: Vec<ColumnDescription>,
    rows: Vec<Vec<Value>>,
}

impl MemorySource {
    pub fn new(columns: Vec<ColumnDescription>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn with_rows(mut self, rows: Vec<Vec<Value>>) -> Self {
        self.rows = rows;
        self
    }

    pub fn push_row(&mut self, row: Vec<Value>) {
        self.rows.push(row);
    }
}

impl Source for MemorySource {
    fn describe(&self) -> Result<Vec<ColumnDescription>> {
        Ok(self.columns.clone())
    }

    fn sample(&self, columns: &[String], limit: Option<usize>) -> Result<SampleFrame> {
        let positions = columns
            .iter()
            .map(|name| {
                self.columns
                    .iter()
                    .position(|column| &column.name == name)
                    .ok_or_else(|| Error::Source(format!("unknown column '{name}'")))
            })
            .collect::<Result<Vec<_>>>()?;
        let take = limit.unwrap_or(self.rows.len());
        let rows = self
            .rows
            .iter()
            .take(take)
            .map(|row| {
                positions
                    .iter()
                    .map(|idx| row.get(*idx).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();
        Ok(SampleFrame::from_rows(columns.to_vec(), rows))
    }
}

#[derive(Debug, Clone, Default)]
struct MemoryTable {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl MemoryTable {
    fn column_values(&self, column: &str) -> Option<impl Iterator<Item = &Value>> {
        let idx = self.columns.iter().position(|name| name == column)?;
        Some(self.rows.iter().filter_map(move |row| row.get(idx)))
    }
}

/// Sink that keeps every table in memory and records each flush.
#[derive(Debug, Clone)]
pub struct MemorySink {
    table: String,
    tables: BTreeMap<String, MemoryTable>,
    flushes: Vec<usize>,
}

impl MemorySink {
    /// Sink writing into `table`.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            tables: BTreeMap::new(),
            flushes: Vec::new(),
        }
    }

    /// Seed an existing table, e.g. a referenced parent or rows already in
    /// the destination.
    pub fn with_table(
        mut self,
        table: impl Into<String>,
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
    ) -> Self {
        self.tables
            .insert(table.into(), MemoryTable { columns, rows });
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Sizes of the batches appended so far, in order.
    pub fn flushes(&self) -> &[usize] {
        &self.flushes
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        self.tables
            .get(&self.table)
            .map(|table| table.rows.as_slice())
            .unwrap_or_default()
    }

    pub fn columns(&self) -> &[String] {
        self.tables
            .get(&self.table)
            .map(|table| table.columns.as_slice())
            .unwrap_or_default()
    }

    /// Values of one column of the destination table.
    pub fn column(&self, name: &str) -> Vec<Value> {
        self.tables
            .get(&self.table)
            .and_then(|table| table.column_values(name))
            .map(|values| values.cloned().collect())
            .unwrap_or_default()
    }
}

impl Lookup for MemorySink {
    fn max_value(&self, column: &str) -> Result<Option<i64>> {
        let Some(values) = self
            .tables
            .get(&self.table)
            .and_then(|table| table.column_values(column))
        else {
            return Ok(None);
        };
        Ok(values.filter_map(Value::as_i64).max())
    }

    fn sample_values(&self, table: &str, column: &str, limit: usize) -> Result<Vec<Value>> {
        let values = self
            .tables
            .get(table)
            .and_then(|table| table.column_values(column))
            .ok_or_else(|| Error::Sink(format!("unknown column '{table}.{column}'")))?;
        Ok(values.filter(|value| !value.is_null()).take(limit).cloned().collect())
    }
}

impl Sink for MemorySink {
    fn create_if_absent(&mut self, columns: &[ColumnDef]) -> Result<()> {
        self.tables
            .entry(self.table.clone())
            .or_insert_with(|| MemoryTable {
                columns: columns.iter().map(|column| column.name.clone()).collect(),
                rows: Vec::new(),
            });
        Ok(())
    }

    fn append(&mut self, batch: &RowBatch) -> Result<()> {
        let table = self
            .tables
            .entry(self.table.clone())
            .or_insert_with(|| MemoryTable {
                columns: batch.columns.clone(),
                rows: Vec::new(),
            });
        if table.columns != batch.columns {
            return Err(Error::Sink(format!(
                "batch columns {:?} do not match table columns {:?}",
                batch.columns, table.columns
            )));
        }
        table.rows.extend(batch.rows.iter().cloned());
        self.flushes.push(batch.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DeclaredType;

    #[test]
    fn max_value_reads_destination_column() {
        let sink = MemorySink::new("dest").with_table(
            "dest",
            vec!["id".to_string()],
            vec![vec![Value::Int(3)], vec![Value::Int(41)], vec![Value::Null]],
        );
        assert_eq!(sink.max_value("id").unwrap(), Some(41));
        assert_eq!(sink.max_value("missing").unwrap(), None);
    }

    #[test]
    fn append_checks_column_layout() {
        let mut sink = MemorySink::new("dest");
        sink.create_if_absent(&[ColumnDef {
            name: "a".to_string(),
            declared_type: DeclaredType::Int,
        }])
        .unwrap();
        let batch = RowBatch {
            columns: vec!["b".to_string()],
            rows: vec![vec![Value::Int(1)]],
        };
        assert!(sink.append(&batch).is_err());
        assert!(sink.flushes().is_empty());
    }

    #[test]
    fn source_samples_requested_columns() {
        let source = MemorySource::new(vec![
            ColumnDescription::new("a", "int"),
            ColumnDescription::new("b", "text"),
        ])
        .with_rows(vec![
            vec![Value::Int(1), Value::from("x")],
            vec![Value::Int(2), Value::from("y")],
        ]);
        let frame = source.sample(&["b".to_string()], Some(1)).unwrap();
        assert_eq!(frame.row_count(), 1);
        assert_eq!(frame.column("b"), Some(&[Value::from("x")][..]));
        assert!(frame.column("a").is_none());
    }
}
