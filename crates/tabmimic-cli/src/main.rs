mod config;
mod errors;
mod logging;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use tabmimic_core::{GenerateOptions, Profile, ProfileOptions, load_profile, save_profile};
use tabmimic_generate::{CsvSink, RunReport, generate_into};
use tabmimic_postgres::PostgresStore;
use tabmimic_profile::Profiler;
use tracing::info;

use config::CliConfig;
use errors::CliError;
use logging::init_logging;

#[derive(Parser, Debug)]
#[command(
    name = "tabmimic",
    version,
    about = "Profile a table and generate look-alike rows"
)]
struct Cli {
    /// TOML file with [profile], [generate], [postgres] and [columns.<name>] tables.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Emit logs as JSON lines.
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Learn a profile from a source table and write it as JSON.
    Profile(ProfileArgs),
    /// Generate rows from a saved profile.
    Generate(GenerateArgs),
    /// Profile a source table and fill a destination in one go.
    FakeTable(FakeTableArgs),
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Source database connection string.
    #[arg(long, value_name = "CONNECTION_STRING")]
    conn: String,
    /// Source table, optionally schema-qualified.
    #[arg(long)]
    table: String,
    /// Cap on sampled rows.
    #[arg(long)]
    sample_rows: Option<usize>,
    /// Equal-width intervals per continuous column.
    #[arg(long)]
    intervals: Option<usize>,
    /// Distinct/non-null ratio below which a column is categorical.
    #[arg(long)]
    categorical_threshold: Option<f64>,
    /// Columns to profile; all when omitted.
    #[arg(long, value_name = "COLUMN", value_delimiter = ',')]
    columns: Vec<String>,
}

#[derive(Args, Debug)]
struct TargetArgs {
    /// Destination table.
    #[arg(long)]
    dest_table: String,
    /// Destination database connection string.
    #[arg(long, value_name = "CONNECTION_STRING")]
    dest_conn: Option<String>,
    /// Write CSV files into this directory instead of a database.
    #[arg(long, conflicts_with = "dest_conn")]
    csv_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Number of rows to generate.
    #[arg(long)]
    rows: usize,
    /// Rows per flushed batch.
    #[arg(long)]
    batch_size: Option<usize>,
    /// Seed for reproducible output.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args, Debug)]
struct ProfileArgs {
    #[command(flatten)]
    source: SourceArgs,
    /// Output path for the profile document.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Profile document produced by `profile`.
    #[arg(long)]
    profile: PathBuf,
    #[command(flatten)]
    target: TargetArgs,
    #[command(flatten)]
    run: RunArgs,
}

#[derive(Args, Debug)]
struct FakeTableArgs {
    #[command(flatten)]
    source: SourceArgs,
    #[command(flatten)]
    target: TargetArgs,
    #[command(flatten)]
    run: RunArgs,
    /// Also save the learned profile here.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    init_logging(cli.log_json)?;
    let config = CliConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Profile(args) => run_profile(args, &config),
        Command::Generate(args) => run_generate(args, &config),
        Command::FakeTable(args) => run_fake_table(args, &config),
    }
}

fn run_profile(args: ProfileArgs, config: &CliConfig) -> Result<(), CliError> {
    let timer = Instant::now();
    let profile = learn_profile(&args.source, config)?;
    save_profile(&args.out, &profile)?;
    info!(
        event = "profile_written",
        path = %args.out.display(),
        columns = profile.len(),
        duration_ms = timer.elapsed().as_millis() as u64
    );
    Ok(())
}

fn run_generate(args: GenerateArgs, config: &CliConfig) -> Result<(), CliError> {
    let mut profile = load_profile(&args.profile)?;
    let replaced = config.apply_fixed(&mut profile);
    info!(
        event = "profile_loaded",
        path = %args.profile.display(),
        columns = profile.len(),
        replaced
    );
    let options = generate_options(&args.run, config);
    let report = write_rows(&profile, &options, &args.target, None, config, args.run.rows)?;
    print_report(&report)
}

fn run_fake_table(args: FakeTableArgs, config: &CliConfig) -> Result<(), CliError> {
    let profile = learn_profile(&args.source, config)?;
    if let Some(out) = &args.out {
        save_profile(out, &profile)?;
        info!(event = "profile_written", path = %out.display());
    }
    let options = generate_options(&args.run, config);
    let report = write_rows(
        &profile,
        &options,
        &args.target,
        Some(args.source.conn.as_str()),
        config,
        args.run.rows,
    )?;
    print_report(&report)
}

fn learn_profile(args: &SourceArgs, config: &CliConfig) -> Result<Profile, CliError> {
    let engine = detect_engine(&args.conn)?;
    info!(event = "engine_detected", engine = %engine, table = %args.table);

    let store = PostgresStore::connect(&args.conn, &args.table, &config.postgres)?;
    let profiler = Profiler::new(profile_options(args, config))?;
    let profile = profiler.profile(&store, &config.overrides())?;
    info!(event = "profile_learned", table = %args.table, columns = profile.len());
    Ok(profile)
}

fn write_rows(
    profile: &Profile,
    options: &GenerateOptions,
    target: &TargetArgs,
    fallback_conn: Option<&str>,
    config: &CliConfig,
    rows: usize,
) -> Result<RunReport, CliError> {
    if let Some(dir) = &target.csv_dir {
        let mut sink = CsvSink::new(dir.clone(), target.dest_table.clone());
        info!(event = "destination_selected", path = %sink.path().display());
        return Ok(generate_into(profile, options, &mut sink, rows)?);
    }

    let conn = target.dest_conn.as_deref().or(fallback_conn).ok_or_else(|| {
        CliError::InvalidConfig("either --dest-conn or --csv-dir is required".to_string())
    })?;
    let engine = detect_engine(conn)?;
    info!(event = "destination_selected", engine = %engine, table = %target.dest_table);
    let mut sink = PostgresStore::connect(conn, &target.dest_table, &config.postgres)?;
    Ok(generate_into(profile, options, &mut sink, rows)?)
}

/// File values first, then command-line flags.
fn profile_options(args: &SourceArgs, config: &CliConfig) -> ProfileOptions {
    let mut options = config.profile.clone();
    if let Some(rows) = args.sample_rows {
        options.sample_rows = Some(rows);
    }
    if let Some(intervals) = args.intervals {
        options.number_of_intervals = intervals;
    }
    if let Some(threshold) = args.categorical_threshold {
        options.categorical_threshold = threshold;
    }
    if !args.columns.is_empty() {
        options.columns_to_include = Some(args.columns.clone());
    }
    options
}

fn generate_options(args: &RunArgs, config: &CliConfig) -> GenerateOptions {
    let mut options = config.generate.clone();
    if let Some(batch_size) = args.batch_size {
        options.batch_size = batch_size;
    }
    if args.seed.is_some() {
        options.seed = args.seed;
    }
    options
}

fn print_report(report: &RunReport) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

fn detect_engine(conn: &str) -> Result<&'static str, CliError> {
    if conn.starts_with("postgres://") || conn.starts_with("postgresql://") {
        Ok("postgres")
    } else {
        Err(CliError::UnsupportedEngine(conn.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_generate_into_csv() {
        let cli = Cli::try_parse_from([
            "tabmimic",
            "generate",
            "--profile",
            "profile.json",
            "--dest-table",
            "clients",
            "--csv-dir",
            "out",
            "--rows",
            "250",
            "--seed",
            "9",
        ])
        .unwrap();
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.run.rows, 250);
        assert_eq!(args.target.csv_dir, Some(PathBuf::from("out")));
        assert_eq!(args.target.dest_conn, None);

        let options = generate_options(&args.run, &CliConfig::default());
        assert_eq!(options.batch_size, 100);
        assert_eq!(options.seed, Some(9));
    }

    #[test]
    fn csv_dir_conflicts_with_destination_connection() {
        let parsed = Cli::try_parse_from([
            "tabmimic",
            "generate",
            "--profile",
            "p.json",
            "--dest-table",
            "t",
            "--dest-conn",
            "postgres://localhost/db",
            "--csv-dir",
            "out",
            "--rows",
            "1",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn flags_override_file_options() {
        let cli = Cli::try_parse_from([
            "tabmimic",
            "profile",
            "--conn",
            "postgres://localhost/db",
            "--table",
            "clients",
            "--out",
            "clients.json",
            "--intervals",
            "12",
            "--columns",
            "id,city",
        ])
        .unwrap();
        let Command::Profile(args) = cli.command else {
            panic!("expected profile");
        };
        let mut config = CliConfig::default();
        config.profile.number_of_intervals = 3;
        config.profile.sample_rows = Some(1000);

        let options = profile_options(&args.source, &config);
        assert_eq!(options.number_of_intervals, 12);
        assert_eq!(options.sample_rows, Some(1000));
        assert_eq!(
            options.columns_to_include,
            Some(vec!["id".to_string(), "city".to_string()])
        );
    }

    #[test]
    fn detects_postgres_urls_only() {
        assert_eq!(detect_engine("postgresql://u@h/db").unwrap(), "postgres");
        assert!(matches!(
            detect_engine("mysql://u@h/db"),
            Err(CliError::UnsupportedEngine(_))
        ));
    }
}
