use std::collections::BTreeMap;
use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tabmimic_core::{
    ColumnDef, ColumnSpec, DeclaredType, GenerateOptions, Lookup, Profile, ProfileOptions,
    RowBatch, Sink, Source, Strategy, StrategyKind, Value,
};
use tabmimic_generate::generate_into;
use tabmimic_postgres::{PostgresOptions, PostgresStore};
use tabmimic_profile::{ColumnOverride, Profiler};

fn database_url() -> Option<String> {
    env::var("TEST_DATABASE_URL")
        .or_else(|_| env::var("DATABASE_URL"))
        .ok()
}

fn drop_tables(url: &str, tables: &[&str]) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(10))
            .connect(url)
            .await
            .context("connecting to Postgres")?;
        for table in tables {
            sqlx::query(&format!("drop table if exists public.\"{table}\""))
                .execute(&pool)
                .await
                .with_context(|| format!("dropping {table}"))?;
        }
        Ok(())
    })
}

fn seed_clients(store: &mut PostgresStore) -> Result<()> {
    store.create_if_absent(&[
        ColumnDef {
            name: "id".to_string(),
            declared_type: DeclaredType::Int,
        },
        ColumnDef {
            name: "city".to_string(),
            declared_type: DeclaredType::Varchar(Some(32)),
        },
        ColumnDef {
            name: "balance".to_string(),
            declared_type: DeclaredType::Decimal {
                precision: 12,
                scale: 2,
            },
        },
    ])?;
    let cities = ["Kazan", "Omsk", "Tver"];
    let rows = (1..=60)
        .map(|idx| {
            vec![
                Value::Int(idx),
                Value::from(cities[idx as usize % cities.len()]),
                Value::Float(idx as f64 * 10.25),
            ]
        })
        .collect();
    store.append(&RowBatch {
        columns: vec!["id".to_string(), "city".to_string(), "balance".to_string()],
        rows,
    })?;
    Ok(())
}

#[test]
fn profiles_and_generates_through_postgres() -> Result<()> {
    let Some(url) = database_url() else {
        eprintln!("TEST_DATABASE_URL not set, skipping postgres integration test");
        return Ok(());
    };
    let suffix = std::process::id();
    let clients_table = format!("tabmimic_it_clients_{suffix}");
    let orders_table = format!("tabmimic_it_orders_{suffix}");
    let options = PostgresOptions::default();

    drop_tables(&url, &[&orders_table, &clients_table])?;
    let mut clients =
        PostgresStore::connect(&url, &clients_table, &options).context("connecting to Postgres")?;
    seed_clients(&mut clients)?;

    let described = clients.describe()?;
    assert_eq!(described.len(), 3);
    assert_eq!(
        described[2].declared_type()?,
        DeclaredType::Decimal {
            precision: 12,
            scale: 2
        }
    );
    assert_eq!(clients.max_value("id")?, Some(60));
    assert_eq!(clients.max_value("missing")?, None);

    let mut overrides = BTreeMap::new();
    overrides.insert(
        "id".to_string(),
        ColumnOverride::Fixed(Strategy::IncrementalId),
    );
    let profile = Profiler::new(ProfileOptions::default())?.profile(&clients, &overrides)?;
    assert_eq!(
        profile.get("city").and_then(|c| c.kind()),
        Some(StrategyKind::Categorical)
    );
    assert_eq!(
        profile.get("balance").and_then(|c| c.kind()),
        Some(StrategyKind::Continuous)
    );

    let report = generate_into(&profile, &GenerateOptions::default(), &mut clients, 40)?;
    assert_eq!(report.flushes, vec![40]);
    assert_eq!(clients.max_value("id")?, Some(100));

    let mut orders = PostgresStore::connect(&url, &orders_table, &options)?;
    let order_profile: Profile = [
        ColumnSpec::new("id", DeclaredType::Int, Strategy::IncrementalId),
        ColumnSpec::new(
            "client_id",
            DeclaredType::Int,
            Strategy::ForeignKey {
                table: clients_table.clone(),
                column: "id".to_string(),
            },
        ),
    ]
    .into_iter()
    .collect();
    let options = GenerateOptions {
        batch_size: 7,
        seed: Some(3),
    };
    let report = generate_into(&order_profile, &options, &mut orders, 15)?;
    assert_eq!(report.flushes, vec![7, 7, 1]);
    let referenced = orders.sample_values(&orders_table, "client_id", 100)?;
    assert_eq!(referenced.len(), 15);

    drop(orders);
    drop(clients);
    drop_tables(&url, &[&orders_table, &clients_table])
}
