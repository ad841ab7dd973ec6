use tabmimic_core::{ColumnDef, ColumnDescription};

use super::queries::RawColumn;

/// Bind parameters Postgres accepts in a single statement.
pub const MAX_BIND_PARAMS: usize = 65_535;

/// Schema-qualified table name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub schema: String,
    pub name: String,
}

impl TableRef {
    /// Parse `table` or `schema.table`.
    pub fn parse(raw: &str, default_schema: &str) -> Self {
        match raw.split_once('.') {
            Some((schema, name)) => Self {
                schema: schema.trim().to_string(),
                name: name.trim().to_string(),
            },
            None => Self {
                schema: default_schema.to_string(),
                name: raw.trim().to_string(),
            },
        }
    }

    pub fn qualified(&self) -> String {
        format!("{}.{}", quote_ident(&self.schema), quote_ident(&self.name))
    }
}

pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

pub fn map_columns(raw: Vec<RawColumn>) -> Vec<ColumnDescription> {
    raw.into_iter()
        .map(|column| {
            let mut description = ColumnDescription::new(column.name, column.data_type);
            description.max_length = column.character_max_length.and_then(to_u32);
            description.precision = column.numeric_precision.and_then(to_u32);
            description.scale = column.numeric_scale.and_then(to_u32);
            description
        })
        .collect()
}

fn to_u32(value: i32) -> Option<u32> {
    u32::try_from(value).ok()
}

pub fn select_sample_sql(table: &TableRef, columns: &[String], limited: bool) -> String {
    let projection = columns
        .iter()
        .map(|column| format!("{}::text", quote_ident(column)))
        .collect::<Vec<_>>()
        .join(", ");
    let limit = if limited { " limit $1" } else { "" };
    format!(
        "select {projection} from {} order by random(){limit}",
        table.qualified()
    )
}

pub fn select_max_sql(table: &TableRef, column: &str) -> String {
    format!(
        "select max({})::text from {}",
        quote_ident(column),
        table.qualified()
    )
}

pub fn select_column_sample_sql(table: &TableRef, column: &str) -> String {
    let column = quote_ident(column);
    format!(
        "select {column}::text from {} where {column} is not null order by random() limit $1",
        table.qualified()
    )
}

pub fn create_table_sql(table: &TableRef, columns: &[ColumnDef]) -> String {
    let definitions = columns
        .iter()
        .map(|column| {
            format!(
                "{} {}",
                quote_ident(&column.name),
                column.declared_type.sql_type()
            )
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "create table if not exists {} ({definitions})",
        table.qualified()
    )
}

/// Multi-row insert binding every cell as text and casting it to the
/// column's type: `($1::text::int8, $2::text::varchar), ...`.
pub fn insert_sql(table: &TableRef, columns: &[(String, String)], rows: usize) -> String {
    let names = columns
        .iter()
        .map(|(name, _)| quote_ident(name))
        .collect::<Vec<_>>()
        .join(", ");
    let mut param = 0;
    let tuples = (0..rows)
        .map(|_| {
            let cells = columns
                .iter()
                .map(|(_, cast)| {
                    param += 1;
                    format!("${param}::text::{cast}")
                })
                .collect::<Vec<_>>()
                .join(", ");
            format!("({cells})")
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "insert into {} ({names}) values {tuples}",
        table.qualified()
    )
}

/// Rows per insert statement for `columns` columns.
pub fn rows_per_statement(columns: usize) -> usize {
    (MAX_BIND_PARAMS / columns.max(1)).max(1)
}

#[cfg(test)]
mod tests {
    use tabmimic_core::DeclaredType;

    use super::*;

    #[test]
    fn parses_qualified_names() {
        let table = TableRef::parse("crm.clients", "public");
        assert_eq!(table.qualified(), "\"crm\".\"clients\"");
        let table = TableRef::parse("clients", "public");
        assert_eq!(table.schema, "public");
    }

    #[test]
    fn quotes_embedded_quotes() {
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn builds_create_table() {
        let table = TableRef::parse("t", "public");
        let sql = create_table_sql(
            &table,
            &[
                ColumnDef {
                    name: "id".to_string(),
                    declared_type: DeclaredType::Int,
                },
                ColumnDef {
                    name: "name".to_string(),
                    declared_type: DeclaredType::Varchar(Some(20)),
                },
            ],
        );
        assert_eq!(
            sql,
            "create table if not exists \"public\".\"t\" (\"id\" bigint, \"name\" varchar(20))"
        );
    }

    #[test]
    fn numbers_insert_parameters_across_rows() {
        let table = TableRef::parse("t", "public");
        let sql = insert_sql(
            &table,
            &[
                ("a".to_string(), "int8".to_string()),
                ("b".to_string(), "text".to_string()),
            ],
            2,
        );
        assert_eq!(
            sql,
            "insert into \"public\".\"t\" (\"a\", \"b\") values \
             ($1::text::int8, $2::text::text), ($3::text::int8, $4::text::text)"
        );
        assert_eq!(rows_per_statement(3), 21_845);
        assert_eq!(rows_per_statement(0), 65_535);
    }

    #[test]
    fn sample_sql_casts_cells_to_text() {
        let table = TableRef::parse("t", "public");
        assert_eq!(
            select_sample_sql(&table, &["a".to_string(), "b".to_string()], true),
            "select \"a\"::text, \"b\"::text from \"public\".\"t\" order by random() limit $1"
        );
    }
}
