//! `shapediff` CLI: structural diffs, path queries and canonical conversion of
//! JSON and XML documents.
//!
//! ## Usage
//!
//! ```sh
//! # Compare two documents (exit 0 = same, 1 = different, 2 = error)
//! shapediff diff before.json after.json
//!
//! # Align an array by key, tolerate drift on prices, report as JSON
//! shapediff diff a.json b.json --keyed-by '$.items=id' --vary-by '$..price=0.05' --output json
//!
//! # Load hints and caveats from a settings file
//! shapediff diff a.xml b.xml --settings diff-settings.json
//!
//! # Print every token a path selects
//! shapediff query order.json '$.items[?(@.qty > 1)].sku'
//!
//! # Show the canonical tree of an XML document as JSON
//! shapediff convert order.xml
//! ```
//!
//! A file argument of `-` reads that document from stdin.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use shapediff_core::{DiffSettings, DocumentFormat, JsonPath, Tree};
use std::io::{self, Read};
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "shapediff",
    version,
    about = "Structural diff for JSON and XML documents"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log hint binding and alignment decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two documents
    Diff {
        /// First document (`-` for stdin)
        first: String,
        /// Second document (`-` for stdin)
        second: String,
        /// JSON file with `hints` and `caveats`
        #[arg(long)]
        settings: Option<String>,
        /// Align the arrays at PATH by the property KEY (repeatable)
        #[arg(long = "keyed-by", value_name = "PATH=KEY", value_parser = parse_assignment)]
        keyed_by: Vec<(String, String)>,
        /// Let numeric values at PATH differ by up to AMOUNT (repeatable)
        #[arg(long = "vary-by", value_name = "PATH=AMOUNT", value_parser = parse_variance)]
        vary_by: Vec<(String, f64)>,
        /// Align the arrays at PATH by longest common subsequence (repeatable)
        #[arg(long, value_name = "PATH")]
        subsequence: Vec<String>,
        /// Input format of both documents (detected per document when omitted)
        #[arg(long, value_enum)]
        format: Option<Format>,
        /// Report format
        #[arg(long, value_enum, default_value_t = Output::Text)]
        output: Output,
    },
    /// Print the tokens a path selects, with their paths
    Query {
        /// Document (`-` for stdin)
        document: String,
        /// Path expression, e.g. `$.items[*].id`
        path: String,
        /// Fail on the first step that cannot apply instead of skipping it
        #[arg(long)]
        strict: bool,
        /// Input format (detected when omitted)
        #[arg(long, value_enum)]
        format: Option<Format>,
        /// Result format
        #[arg(long, value_enum, default_value_t = Output::Text)]
        output: Output,
    },
    /// Print the canonical tree of a document as JSON
    Convert {
        /// Document (`-` for stdin)
        document: String,
        /// Input format (detected when omitted)
        #[arg(long, value_enum)]
        format: Option<Format>,
        /// Single-line JSON instead of indented
        #[arg(long)]
        compact: bool,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Xml,
}

impl From<Format> for DocumentFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Json => DocumentFormat::Json,
            Format::Xml => DocumentFormat::Xml,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Output {
    Text,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli.command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(2)
        }
    }
}

/// Send library events to stderr. `RUST_LOG` takes precedence over `-v`.
fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .init();
}

fn run(command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Diff {
            first,
            second,
            settings,
            keyed_by,
            vary_by,
            subsequence,
            format,
            output,
        } => {
            if first == "-" && second == "-" {
                anyhow::bail!("Only one document can be read from stdin");
            }
            let mut diff_settings = match settings.as_deref() {
                Some(path) => load_settings(path)?,
                None => DiffSettings::new(),
            };
            let mut extra = DiffSettings::new();
            for (path, key) in keyed_by {
                extra = extra.keyed_by(path, key);
            }
            for path in subsequence {
                extra = extra.aligned_by_subsequence(path);
            }
            for (path, amount) in vary_by {
                extra = extra.can_vary_by(path, amount);
            }
            diff_settings.extend(extra);

            let a = load_document(&first, format)?;
            let b = load_document(&second, format)?;
            let result = shapediff_core::compare(&a, &b, &diff_settings)
                .context("Failed to apply diff settings")?;

            match output {
                Output::Text => print!("{result}"),
                Output::Json => println!("{}", serde_json::to_string_pretty(&result)?),
            }
            Ok(if result.are_same() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            })
        }
        Commands::Query {
            document,
            path,
            strict,
            format,
            output,
        } => {
            let tree = load_document(&document, format)?;
            let parsed: JsonPath = path
                .parse()
                .with_context(|| format!("Invalid path: {path}"))?;
            let matches = if strict {
                tree.select_tokens_strict(&parsed)
                    .collect::<Result<Vec<_>, _>>()
                    .with_context(|| format!("Path '{path}' did not apply"))?
            } else {
                tree.select_tokens(&parsed).collect()
            };
            tracing::debug!(path = %parsed, matches = matches.len(), "evaluated path");

            match output {
                Output::Text => {
                    for &node in &matches {
                        println!("{} = {}", tree.path(node), tree.to_json_string(node));
                    }
                }
                Output::Json => {
                    let rows: Vec<_> = matches
                        .iter()
                        .map(|&node| {
                            json!({
                                "path": tree.path(node).to_string(),
                                "value": tree.to_json_value(node),
                            })
                        })
                        .collect();
                    println!("{}", serde_json::to_string_pretty(&rows)?);
                }
            }
            Ok(if matches.is_empty() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            })
        }
        Commands::Convert {
            document,
            format,
            compact,
            output,
        } => {
            let tree = load_document(&document, format)?;
            let mut text = if compact {
                tree.to_json_string(tree.root())
            } else {
                tree.to_json_pretty(tree.root())
            };
            text.push('\n');
            write_output(output.as_deref(), &text)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// `PATH=VALUE`, split at the last `=` so query paths may contain `==`.
fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    match raw.rsplit_once('=') {
        Some((path, value)) if !path.is_empty() && !value.is_empty() => {
            Ok((path.to_string(), value.to_string()))
        }
        _ => Err(format!("expected PATH=VALUE, got '{raw}'")),
    }
}

fn parse_variance(raw: &str) -> Result<(String, f64), String> {
    let (path, amount) = parse_assignment(raw)?;
    let amount: f64 = amount
        .parse()
        .map_err(|_| format!("variance '{amount}' is not a number"))?;
    if !amount.is_finite() || amount < 0.0 {
        return Err(format!("variance must be a non-negative number, got {amount}"));
    }
    Ok((path, amount))
}

fn load_settings(path: &str) -> Result<DiffSettings> {
    let text = read_input(path)?;
    serde_json::from_str(&text).with_context(|| format!("Invalid settings file: {path}"))
}

/// Read and adapt one document. An explicit format wins; otherwise the file
/// extension, then the content, decides.
fn load_document(path: &str, format: Option<Format>) -> Result<Tree> {
    let text = read_input(path)?;
    let format = format
        .map(DocumentFormat::from)
        .or_else(|| DocumentFormat::from_path(Path::new(path)))
        .unwrap_or_else(|| DocumentFormat::sniff(&text));
    tracing::debug!(path, format = ?format, bytes = text.len(), "loading document");
    format
        .adapt(&text)
        .with_context(|| format!("Failed to read {format:?} document: {path}"))
}

fn read_input(path: &str) -> Result<String> {
    if path == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read from stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {path}"))
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content).with_context(|| format!("Failed to write file: {path}"))?;
        }
        None => print!("{content}"),
    }
    Ok(())
}
