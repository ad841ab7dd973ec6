use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use tabmimic_core::{Error, Result};

use super::mapper::{self, TableRef};

pub struct RawColumn {
    pub name: String,
    pub data_type: String,
    pub udt_name: String,
    pub character_max_length: Option<i32>,
    pub numeric_precision: Option<i32>,
    pub numeric_scale: Option<i32>,
}

pub async fn list_columns(pool: &PgPool, table: &TableRef) -> Result<Vec<RawColumn>> {
    let rows: Vec<(String, String, String, Option<i32>, Option<i32>, Option<i32>)> =
        sqlx::query_as(
            r#"
            select
              column_name::text,
              data_type::text,
              udt_name::text,
              character_maximum_length::int4,
              numeric_precision::int4,
              numeric_scale::int4
            from information_schema.columns
            where table_schema = $1
              and table_name = $2
            order by ordinal_position
            "#,
        )
        .bind(&table.schema)
        .bind(&table.name)
        .fetch_all(pool)
        .await
        .map_err(|err| Error::Source(err.to_string()))?;

    Ok(rows
        .into_iter()
        .map(
            |(name, data_type, udt_name, character_max_length, numeric_precision, numeric_scale)| {
                RawColumn {
                    name,
                    data_type,
                    udt_name,
                    character_max_length,
                    numeric_precision,
                    numeric_scale,
                }
            },
        )
        .collect())
}

/// Random rows of `columns`, every cell cast to text.
pub async fn sample_rows(
    pool: &PgPool,
    table: &TableRef,
    columns: &[String],
    limit: Option<usize>,
) -> Result<Vec<Vec<Option<String>>>> {
    let sql = mapper::select_sample_sql(table, columns, limit.is_some());
    let mut query = sqlx::query(&sql);
    if let Some(limit) = limit {
        query = query.bind(limit as i64);
    }
    let rows: Vec<PgRow> = query
        .fetch_all(pool)
        .await
        .map_err(|err| Error::Source(err.to_string()))?;

    rows.iter()
        .map(|row| {
            (0..columns.len())
                .map(|idx| {
                    row.try_get::<Option<String>, _>(idx)
                        .map_err(|err| Error::Source(err.to_string()))
                })
                .collect()
        })
        .collect()
}

pub async fn max_as_text(pool: &PgPool, table: &TableRef, column: &str) -> Result<Option<String>> {
    sqlx::query_scalar::<_, Option<String>>(&mapper::select_max_sql(table, column))
        .fetch_one(pool)
        .await
        .map_err(|err| Error::Sink(err.to_string()))
}

pub async fn sample_column(
    pool: &PgPool,
    table: &TableRef,
    column: &str,
    limit: usize,
) -> Result<Vec<String>> {
    sqlx::query_scalar::<_, String>(&mapper::select_column_sample_sql(table, column))
        .bind(limit as i64)
        .fetch_all(pool)
        .await
        .map_err(|err| Error::Sink(err.to_string()))
}

pub async fn execute(pool: &PgPool, sql: &str) -> Result<()> {
    sqlx::query(sql)
        .execute(pool)
        .await
        .map_err(|err| Error::Sink(err.to_string()))?;
    Ok(())
}

/// Run parameterized inserts in one transaction.
pub async fn insert_chunks(
    pool: &PgPool,
    statements: Vec<(String, Vec<Option<String>>)>,
) -> Result<()> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|err| Error::Sink(err.to_string()))?;
    for (sql, params) in statements {
        let mut query = sqlx::query(&sql);
        for param in params {
            query = query.bind(param);
        }
        query
            .execute(&mut *tx)
            .await
            .map_err(|err| Error::Sink(err.to_string()))?;
    }
    tx.commit()
        .await
        .map_err(|err| Error::Sink(err.to_string()))
}
