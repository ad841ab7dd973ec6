use std::fs::{File, OpenOptions};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use rand::seq::IteratorRandom;
use tabmimic_core::{ColumnDef, Error, Lookup, Result, RowBatch, Sink, Value};

/// Sink writing one CSV file per table under a directory.
///
/// The destination table lives in `<dir>/<table>.csv`; lookups of other
/// tables read their files from the same directory. Nulls are written as
/// empty cells. `sample_values` draws a uniform random subset of the
/// non-empty cells.
#[derive(Debug, Clone)]
pub struct CsvSink {
    dir: PathBuf,
    table: String,
}

impl CsvSink {
    pub fn new(dir: impl Into<PathBuf>, table: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            table: table.into(),
        }
    }

    /// Path of the destination file.
    pub fn path(&self) -> PathBuf {
        self.table_path(&self.table)
    }

    fn table_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{table}.csv"))
    }

    fn write_header(&self, path: &Path, columns: &[String]) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(sink_error)?;
        let mut writer = csv::Writer::from_writer(BufWriter::new(
            File::create(path).map_err(sink_error)?,
        ));
        writer.write_record(columns).map_err(sink_error)?;
        writer.flush().map_err(sink_error)?;
        Ok(())
    }
}

/// Cells of `column` in a CSV file; `None` when the file or column is absent.
fn read_column(path: &Path, column: &str) -> Result<Option<Vec<String>>> {
    if !path.exists() {
        return Ok(None);
    }
    let mut reader = csv::Reader::from_path(path).map_err(sink_error)?;
    let Some(idx) = reader
        .headers()
        .map_err(sink_error)?
        .iter()
        .position(|name| name == column)
    else {
        return Ok(None);
    };
    let mut cells = Vec::new();
    for record in reader.records() {
        let record = record.map_err(sink_error)?;
        if let Some(cell) = record.get(idx) {
            cells.push(cell.to_string());
        }
    }
    Ok(Some(cells))
}

fn sink_error(err: impl std::fmt::Display) -> Error {
    Error::Sink(err.to_string())
}

impl Lookup for CsvSink {
    fn max_value(&self, column: &str) -> Result<Option<i64>> {
        let cells = read_column(&self.path(), column)?.unwrap_or_default();
        Ok(cells
            .iter()
            .filter_map(|cell| cell.trim().parse::<i64>().ok())
            .max())
    }

    fn sample_values(&self, table: &str, column: &str, limit: usize) -> Result<Vec<Value>> {
        let cells = read_column(&self.table_path(table), column)?
            .ok_or_else(|| Error::Sink(format!("unknown column '{table}.{column}'")))?;
        let picked = cells
            .into_iter()
            .filter(|cell| !cell.is_empty())
            .choose_multiple(&mut rand::rng(), limit);
        Ok(picked.into_iter().map(Value::Text).collect())
    }
}

impl Sink for CsvSink {
    fn create_if_absent(&mut self, columns: &[ColumnDef]) -> Result<()> {
        let path = self.path();
        if path.exists() {
            return Ok(());
        }
        let names: Vec<String> = columns.iter().map(|column| column.name.clone()).collect();
        self.write_header(&path, &names)
    }

    fn append(&mut self, batch: &RowBatch) -> Result<()> {
        let path = self.path();
        if !path.exists() {
            self.write_header(&path, &batch.columns)?;
        }
        let file = OpenOptions::new()
            .append(true)
            .open(&path)
            .map_err(sink_error)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(BufWriter::new(file));
        for row in &batch.rows {
            let record: Vec<String> = row
                .iter()
                .map(|value| value.render().unwrap_or_default())
                .collect();
            writer.write_record(&record).map_err(sink_error)?;
        }
        writer.flush().map_err(sink_error)?;
        Ok(())
    }
}
