//! bprep CLI - Command-line interface for beth-prep
//!
//! Commands:
//! - transform: Flatten a batch of audit records into a feature table
//! - validate: Check table shape and args parseability without writing output

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use beth_prep::{BethPrep, RunReport, Table, TransformError, PREP_VERSION};

/// bprep - Deterministic feature engineering for BETH-style audit events
#[derive(Parser)]
#[command(name = "bprep")]
#[command(version = PREP_VERSION)]
#[command(about = "Flatten security audit events into feature tables", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Flatten a batch of audit records into a feature table
    Transform {
        /// Input file path (use - for stdin), NDJSON records
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Write a run report (counts + diagnostics) to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Check table shape and args parseability without writing output
    Validate {
        /// Input file path (use - for stdin), NDJSON records
        #[arg(short, long)]
        input: PathBuf,

        /// Output the run report as JSON instead of a text summary
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one feature row per line)
    Ndjson,
    /// JSON table (columns + rows)
    Json,
    /// Pretty-printed JSON table
    JsonPretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), PrepCliError> {
    match cli.command {
        Commands::Transform {
            input,
            output,
            output_format,
            report,
        } => cmd_transform(&input, &output, output_format, report.as_deref()),

        Commands::Validate { input, json } => cmd_validate(&input, json),
    }
}

fn cmd_transform(
    input: &Path,
    output: &Path,
    output_format: OutputFormat,
    report: Option<&Path>,
) -> Result<(), PrepCliError> {
    let table = read_table(input)?;
    if table.n_rows() == 0 {
        return Err(PrepCliError::NoRecords);
    }

    let prep = BethPrep::new();
    let result = prep.fit(&table)?.transform(&table)?;

    // Diagnostics go to stderr so they never mix with the feature table
    for diagnostic in &result.diagnostics {
        eprintln!(
            "row {}: unparseable args {:?} ({})",
            diagnostic.row, diagnostic.text, diagnostic.reason
        );
    }

    if let Some(report_path) = report {
        let run_report = RunReport::new(&table, &result);
        fs::write(report_path, serde_json::to_string_pretty(&run_report)?)?;
    }

    let output_data = format_output(&result.table, &output_format)?;
    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_validate(input: &Path, json: bool) -> Result<(), PrepCliError> {
    let table = read_table(input)?;
    if table.n_rows() == 0 {
        return Err(PrepCliError::NoRecords);
    }

    let prep = BethPrep::new();
    let result = prep.fit(&table)?.transform(&table)?;
    let report = RunReport::new(&table, &result);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "{} rows: {} flattened, {} empty args, {} unparseable",
            report.rows_in, report.rows_flattened, report.rows_empty_args, report.rows_failed
        );
        for diagnostic in &report.diagnostics {
            println!(
                "  row {}: {:?} ({})",
                diagnostic.row, diagnostic.text, diagnostic.reason
            );
        }
    }

    Ok(())
}

/// Read NDJSON records from a file or stdin and assemble them into a table
fn read_table(input: &Path) -> Result<Table, PrepCliError> {
    let input_data = if input.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            return Err(PrepCliError::StdinIsTty);
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    let mut records = Vec::new();
    for line in input_data.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let record: serde_json::Map<String, serde_json::Value> = serde_json::from_str(trimmed)?;
        records.push(record);
    }

    Ok(Table::from_records(&records))
}

fn format_output(table: &Table, format: &OutputFormat) -> Result<String, PrepCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut out = String::new();
            for row in table.rows() {
                let record: serde_json::Map<String, serde_json::Value> = table
                    .columns()
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect();
                out.push_str(&serde_json::to_string(&record)?);
                out.push('\n');
            }
            Ok(out)
        }
        OutputFormat::Json => Ok(serde_json::to_string(table)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(table)?),
    }
}

// Error types

#[derive(Debug)]
enum PrepCliError {
    Io(io::Error),
    Transform(TransformError),
    Json(serde_json::Error),
    NoRecords,
    StdinIsTty,
}

impl From<io::Error> for PrepCliError {
    fn from(e: io::Error) -> Self {
        PrepCliError::Io(e)
    }
}

impl From<TransformError> for PrepCliError {
    fn from(e: TransformError) -> Self {
        PrepCliError::Transform(e)
    }
}

impl From<serde_json::Error> for PrepCliError {
    fn from(e: serde_json::Error) -> Self {
        PrepCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<PrepCliError> for CliError {
    fn from(e: PrepCliError) -> Self {
        match e {
            PrepCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            PrepCliError::Transform(e) => CliError {
                code: "TRANSFORM_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'bprep validate' for details".to_string()),
            },
            PrepCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Ensure input is one JSON record per line".to_string()),
            },
            PrepCliError::NoRecords => CliError {
                code: "NO_RECORDS".to_string(),
                message: "No records found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            PrepCliError::StdinIsTty => CliError {
                code: "STDIN_IS_TTY".to_string(),
                message: "Refusing to read records from an interactive terminal".to_string(),
                hint: Some("Pipe NDJSON records in, or pass --input <path>".to_string()),
            },
        }
    }
}
