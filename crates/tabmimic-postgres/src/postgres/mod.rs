use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, info};

use tabmimic_core::{
    ColumnDef, ColumnDescription, Error, Lookup, Result, RowBatch, SampleFrame, Sink, Source,
    Value,
};

use crate::options::PostgresOptions;

mod mapper;
mod queries;

pub use mapper::TableRef;

/// A Postgres table used as a profiling source and as a generation sink.
///
/// The store owns a current-thread runtime and blocks on every query, so it
/// must not be used from inside another async runtime.
pub struct PostgresStore {
    runtime: Runtime,
    pool: PgPool,
    table: TableRef,
    default_schema: String,
    /// Cast type per destination column, loaded on first append.
    casts: Option<HashMap<String, String>>,
}

impl PostgresStore {
    pub fn connect(url: &str, table: &str, options: &PostgresOptions) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| Error::Source(err.to_string()))?;
        let pool = runtime
            .block_on(
                PgPoolOptions::new()
                    .max_connections(options.max_connections)
                    .acquire_timeout(Duration::from_secs(options.acquire_timeout_secs))
                    .connect(url),
            )
            .map_err(|err| Error::Source(err.to_string()))?;
        let table = TableRef::parse(table, &options.default_schema);
        info!(table = %table.qualified(), "connected to postgres");
        Ok(Self {
            runtime,
            pool,
            table,
            default_schema: options.default_schema.clone(),
            casts: None,
        })
    }

    pub fn table(&self) -> &TableRef {
        &self.table
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    fn load_casts(&self) -> Result<HashMap<String, String>> {
        let columns = self.block_on(queries::list_columns(&self.pool, &self.table))?;
        Ok(columns
            .into_iter()
            .map(|column| (column.name, column.udt_name))
            .collect())
    }
}

impl Source for PostgresStore {
    fn describe(&self) -> Result<Vec<ColumnDescription>> {
        let raw = self.block_on(queries::list_columns(&self.pool, &self.table))?;
        if raw.is_empty() {
            return Err(Error::Source(format!(
                "table {} not found or has no columns",
                self.table.qualified()
            )));
        }
        Ok(mapper::map_columns(raw))
    }

    fn sample(&self, columns: &[String], limit: Option<usize>) -> Result<SampleFrame> {
        let described = self.describe()?;
        let types = columns
            .iter()
            .map(|name| {
                described
                    .iter()
                    .find(|column| &column.name == name)
                    .ok_or_else(|| Error::Source(format!("unknown column '{name}'")))
                    .and_then(ColumnDescription::declared_type)
            })
            .collect::<Result<Vec<_>>>()?;

        let raw = self.block_on(queries::sample_rows(&self.pool, &self.table, columns, limit))?;
        let rows = raw
            .into_iter()
            .map(|cells| {
                cells
                    .iter()
                    .zip(&types)
                    .map(|(cell, declared)| declared.parse_value(cell.as_deref()))
                    .collect::<Result<Vec<Value>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(table = %self.table.qualified(), rows = rows.len(), "sampled rows");
        Ok(SampleFrame::from_rows(columns.to_vec(), rows))
    }
}

impl Lookup for PostgresStore {
    fn max_value(&self, column: &str) -> Result<Option<i64>> {
        let exists = self
            .block_on(queries::list_columns(&self.pool, &self.table))?
            .iter()
            .any(|raw| raw.name == column);
        if !exists {
            return Ok(None);
        }
        let Some(max) = self.block_on(queries::max_as_text(&self.pool, &self.table, column))?
        else {
            return Ok(None);
        };
        max.trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| Error::Sink(format!("max of '{column}' is not an integer: {max}")))
    }

    fn sample_values(&self, table: &str, column: &str, limit: usize) -> Result<Vec<Value>> {
        let table = TableRef::parse(table, &self.default_schema);
        let values = self.block_on(queries::sample_column(&self.pool, &table, column, limit))?;
        Ok(values.into_iter().map(Value::Text).collect())
    }
}

impl Sink for PostgresStore {
    fn create_if_absent(&mut self, columns: &[ColumnDef]) -> Result<()> {
        let sql = mapper::create_table_sql(&self.table, columns);
        self.block_on(queries::execute(&self.pool, &sql))?;
        self.casts = None;
        info!(table = %self.table.qualified(), columns = columns.len(), "destination table ready");
        Ok(())
    }

    fn append(&mut self, batch: &RowBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        if self.casts.is_none() {
            self.casts = Some(self.load_casts()?);
        }
        let known = self
            .casts
            .as_ref()
            .ok_or_else(|| Error::Sink("destination column types not loaded".to_string()))?;
        let casts = batch
            .columns
            .iter()
            .map(|name| {
                known
                    .get(name)
                    .map(|cast| (name.clone(), cast.clone()))
                    .ok_or_else(|| Error::Sink(format!("unknown destination column '{name}'")))
            })
            .collect::<Result<Vec<_>>>()?;

        let statements = batch
            .rows
            .chunks(mapper::rows_per_statement(casts.len()))
            .map(|chunk| {
                let sql = mapper::insert_sql(&self.table, &casts, chunk.len());
                let params = chunk
                    .iter()
                    .flat_map(|row| row.iter().map(Value::render))
                    .collect();
                (sql, params)
            })
            .collect();
        self.block_on(queries::insert_chunks(&self.pool, statements))?;
        debug!(table = %self.table.qualified(), rows = batch.len(), "batch inserted");
        Ok(())
    }
}
