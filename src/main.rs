//! rowdiff - Keyed row-level diff for tabular data

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use log::debug;
use termcolor::{ColorChoice, StandardStream};

use rowdiff::config::{Config, DiffMode, DiffOptions, OutputFormat};
use rowdiff::output::{render_to_stdout, write_summary};
use rowdiff::parser::ParserFactory;
use rowdiff::{DiffEngine, DiffSummary};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliOutputFormat {
    Terminal,
    Json,
    Csv,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(f: CliOutputFormat) -> Self {
        match f {
            CliOutputFormat::Terminal => OutputFormat::Terminal,
            CliOutputFormat::Json => OutputFormat::Json,
            CliOutputFormat::Csv => OutputFormat::Csv,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliDiffMode {
    ColumnByColumn,
    SideBySide,
    LeftSide,
    RightSide,
}

impl From<CliDiffMode> for DiffMode {
    fn from(m: CliDiffMode) -> Self {
        match m {
            CliDiffMode::ColumnByColumn => DiffMode::ColumnByColumn,
            CliDiffMode::SideBySide => DiffMode::SideBySide,
            CliDiffMode::LeftSide => DiffMode::LeftSide,
            CliDiffMode::RightSide => DiffMode::RightSide,
        }
    }
}

/// Keyed row-level diff for tabular data (CSV, JSON, Parquet)
#[derive(Parser, Debug)]
#[command(name = "rowdiff")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Left (old) file to compare
    left_file: PathBuf,

    /// Right (new) file to compare
    right_file: PathBuf,

    /// Identifier column(s) used to match rows (comma-separated);
    /// without ids whole rows are matched
    #[arg(short = 'k', long = "key", value_delimiter = ',')]
    key: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "terminal")]
    format: CliOutputFormat,

    /// JSON file with diff options; command line flags take precedence
    #[arg(long)]
    options: Option<PathBuf>,

    /// Name of the diff indicator column
    #[arg(long)]
    diff_column: Option<String>,

    /// Add a column listing the changed value columns
    #[arg(long)]
    change_column: Option<String>,

    /// Prefix for left value columns
    #[arg(long)]
    left_prefix: Option<String>,

    /// Prefix for right value columns
    #[arg(long)]
    right_prefix: Option<String>,

    /// Layout of the value columns
    #[arg(long, value_enum)]
    diff_mode: Option<CliDiffMode>,

    /// Null out equal values of matched rows
    #[arg(long)]
    sparse: bool,

    /// Column(s) carried into the output but never compared (comma-separated)
    #[arg(long, value_delimiter = ',')]
    ignore_column: Vec<String>,

    /// Ignore case when comparing string values
    #[arg(long)]
    ignore_case: bool,

    /// Ignore leading/trailing whitespace in string values
    #[arg(long)]
    ignore_whitespace: bool,

    /// Tolerance for numeric comparisons (e.g., 0.001)
    #[arg(long)]
    numeric_tolerance: Option<f64>,

    /// Column to sort both inputs by before diffing
    #[arg(long)]
    sort_by: Option<String>,

    /// CSV field delimiter
    #[arg(short, long)]
    delimiter: Option<char>,

    /// Only show the per-label counts
    #[arg(long)]
    stats_only: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if cli.verbose { "debug" } else { "warn" }),
    )
    .init();

    match run(cli) {
        Ok(has_changes) => {
            if has_changes {
                ExitCode::from(1) // Differences found
            } else {
                ExitCode::SUCCESS // No differences
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<bool> {
    let config = build_config(cli)?;

    let factory = ParserFactory::new();
    let (left, right) = factory.parse_pair(&config.left_file, &config.right_file, &config.read)?;

    let engine = DiffEngine::new(config.options.clone())?;
    let diff = engine.diff(&left, &right, config.id_columns.as_slice())?;
    let summary = DiffSummary::from_table(&diff, engine.options());
    debug!("{:?}", summary);

    let color = if std::io::stdout().is_terminal() {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };

    if config.stats_only {
        let mut stdout = StandardStream::stdout(color);
        write_summary(&summary, &mut stdout)?;
        return Ok(summary.has_changes());
    }

    render_to_stdout(&diff, &summary, config.output_format, color)?;

    Ok(summary.has_changes())
}

fn build_config(cli: Cli) -> Result<Config> {
    let mut options = match &cli.options {
        Some(path) => DiffOptions::from_json_file(path)?,
        None => DiffOptions::default(),
    };

    if let Some(name) = cli.diff_column {
        options = options.with_diff_column(name);
    }
    if let Some(name) = cli.change_column {
        options = options.with_change_column(name);
    }
    if let Some(prefix) = cli.left_prefix {
        options = options.with_left_column_prefix(prefix);
    }
    if let Some(prefix) = cli.right_prefix {
        options = options.with_right_column_prefix(prefix);
    }
    if let Some(mode) = cli.diff_mode {
        options = options.with_diff_mode(mode.into());
    }
    if cli.sparse {
        options = options.with_sparse_mode(true);
    }
    options.ignore_columns.extend(cli.ignore_column);

    let mut comparator = options.default_comparator.clone();
    comparator.ignore_case |= cli.ignore_case;
    comparator.ignore_whitespace |= cli.ignore_whitespace;
    if cli.numeric_tolerance.is_some() {
        comparator.numeric_tolerance = cli.numeric_tolerance;
    }
    options = options.with_default_comparator(comparator);

    let mut config = Config::new(cli.left_file, cli.right_file)
        .with_id_columns(cli.key)
        .with_options(options)
        .with_output_format(cli.format.into())
        .with_stats_only(cli.stats_only);
    if let Some(column) = cli.sort_by {
        config = config.with_sort_by(column);
    }
    if let Some(delimiter) = cli.delimiter {
        if !delimiter.is_ascii() {
            bail!("Delimiter must be a single ASCII character, got '{}'", delimiter);
        }
        config.read.delimiter = Some(delimiter as u8);
    }

    Ok(config)
}
