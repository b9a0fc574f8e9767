//! shortcode CLI - inspect and render job files
//!
//! Usage:
//!   shortcode fields <job.toml>
//!   shortcode sql <job.toml> [--dialect <dialect>]
//!   shortcode describe <job.toml>
//!   shortcode render <job.toml> [--output data]
//!
//! Examples:
//!   shortcode sql jobs/order.toml --dialect postgres
//!   RUST_LOG=shortcode=debug shortcode render jobs/order.toml

use clap::{Parser, Subcommand, ValueEnum};
use shortcode::aggregator::Aggregator;
use shortcode::config::{JobFile, Settings};
use shortcode::executor::RecordingExecutor;
use shortcode::sql::Dialect;
use shortcode::ShortcodeResult;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "shortcode")]
#[command(about = "shortcode - declarative data fetching for Mustache templates")]
#[command(version)]
struct Cli {
    /// Settings file (defaults to $SHORTCODE_CONFIG, ./shortcode.toml, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding spec configuration files
    #[arg(long, global = true)]
    spec_dir: Option<PathBuf>,

    /// SQL dialect to generate
    #[arg(short, long, global = true)]
    dialect: Option<DialectArg>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the field references a job's template uses
    Fields {
        /// Path to the job file
        job: PathBuf,
    },

    /// Print the SQL each group of a job would run
    Sql {
        /// Path to the job file
        job: PathBuf,
    },

    /// Print the field description tree as JSON
    Describe {
        /// Path to the job file
        job: PathBuf,
    },

    /// Fetch a job's data from its fixtures and input, then render it
    Render {
        /// Path to the job file
        job: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        output: OutputFormat,
    },
}

#[derive(Clone, ValueEnum)]
enum DialectArg {
    Mysql,
    Postgres,
    Duckdb,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Mysql => Dialect::MySql,
            DialectArg::Postgres => Dialect::Postgres,
            DialectArg::Duckdb => Dialect::DuckDb,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Rendered template
    Text,
    /// Fetched data tree as JSON
    Data,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Fields { job } => cmd_fields(&cli, job),
        Commands::Sql { job } => cmd_sql(&cli, job),
        Commands::Describe { job } => cmd_describe(&cli, job),
        Commands::Render { job, output } => cmd_render(&cli, job, output),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_settings(cli: &Cli) -> ShortcodeResult<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::load()?,
    };
    if let Some(dir) = &cli.spec_dir {
        settings.spec_dir = dir.display().to_string();
    }
    Ok(settings)
}

fn build_aggregator(cli: &Cli) -> ShortcodeResult<Aggregator> {
    let settings = load_settings(cli)?;
    let mut aggregator = Aggregator::from_settings(&settings, RecordingExecutor::new())?;
    if let Some(dialect) = &cli.dialect {
        aggregator = aggregator.with_dialect(dialect.clone().into());
    }
    Ok(aggregator)
}

/// An aggregator with the whole job applied.
fn prepare(cli: &Cli, job: &Path) -> ShortcodeResult<(Aggregator, JobFile)> {
    let job = JobFile::from_file(job)?;
    let mut aggregator = build_aggregator(cli)?;
    job.apply(&mut aggregator)?;
    Ok((aggregator, job))
}

fn cmd_fields(cli: &Cli, path: &Path) -> ShortcodeResult<()> {
    let job = JobFile::from_file(path)?;
    let mut aggregator = build_aggregator(cli)?;
    aggregator.init_specs(job.requests(), job.add_global)?;
    if let Some(template) = &job.template {
        aggregator.set_template(template.clone());
    }

    let fields = aggregator.extract_fields()?;
    let unknown = aggregator.check_fields(&fields);

    println!("Fields:");
    for field in &fields {
        let marker = if unknown.contains(field) { " (unknown)" } else { "" };
        println!("  - {}{}", field, marker);
    }
    if fields.is_empty() {
        println!("  (none)");
    }
    Ok(())
}

fn cmd_sql(cli: &Cli, path: &Path) -> ShortcodeResult<()> {
    let (aggregator, _) = prepare(cli, path)?;

    for (i, group) in aggregator.groups().iter().enumerate() {
        let Some(resolved) = group.resolve(aggregator.specs()) else {
            println!("-- group {}: skipped", i);
            println!();
            continue;
        };
        println!("-- group {}: {}", i, resolved.key);
        match aggregator.sql_for(group) {
            Some(sql) => println!("{};", sql),
            None => println!("-- (no SQL)"),
        }
        println!();
    }
    Ok(())
}

fn cmd_describe(cli: &Cli, path: &Path) -> ShortcodeResult<()> {
    let (aggregator, _) = prepare(cli, path)?;
    println!("{}", to_json(&aggregator.field_descriptions())?);
    Ok(())
}

fn cmd_render(cli: &Cli, path: &Path, output: &OutputFormat) -> ShortcodeResult<()> {
    let (mut aggregator, job) = prepare(cli, path)?;
    aggregator.fetch_with(&job.input)?;

    if aggregator.has_no_results() {
        tracing::warn!("some groups fell back to SQL and returned no rows");
    }

    match output {
        OutputFormat::Text => print!("{}", aggregator.render()?),
        OutputFormat::Data => println!("{}", to_json(aggregator.data())?),
    }
    Ok(())
}

fn to_json(value: &serde_json::Value) -> ShortcodeResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| shortcode::ShortcodeError::Invalid(e.to_string()))
}
