//! PostgreSQL source and sink for tabmimic.

pub mod options;
pub mod postgres;

pub use options::PostgresOptions;
pub use postgres::PostgresStore;
