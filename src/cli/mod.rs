//! Command-line interface for roster-diff.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **diff**: Exact cell-level comparison of two CSV files
//! - **track**: Track changes of people present in both roster snapshots
//!
//! ## Usage
//!
//! ```text
//! # Unordered comparison keyed by an ID column
//! roster-diff diff old.csv new.csv --key EmployeeId
//!
//! # Positional comparison with the raw line diff appended
//! roster-diff diff old.csv new.csv --ordered --include-raw-diff
//!
//! # Roster change tracking, JSON output
//! roster-diff --format json track lotus.csv corp.csv
//!
//! # HTML report of a Latin-1 export against a UTF-8 one
//! roster-diff --format html diff old.csv new.csv --key Name --old-encoding latin1 -o report.html
//! ```
//!
//! Exit status is 0 when no differences were found, 1 when there were
//! differences and 2 on error.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::core::row::Dataset;
use crate::matching::aggregate::DiffResult;
use crate::parsing::csv::{read_csv_file_with_encoding, TextEncoding};

pub mod diff;
mod html;
pub mod track;

#[derive(Parser)]
#[command(name = "roster-diff")]
#[command(author = "Fulcrum Genomics")]
#[command(version)]
#[command(about = "Compare CSV snapshots and track changes to existing entities")]
#[command(
    long_about = "roster-diff compares two snapshots of the same tabular data.\n\nIt provides:\n- Exact cell-level diffs with ordered or key-based row matching\n- Roster change tracking that resolves people by name and scores each changed field\n- Text, JSON, HTML and one-line summary output"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compare two CSV files cell by cell
    Diff(diff::DiffArgs),

    /// Track field changes of entities present in both files
    Track(track::TrackArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Summary,
    Html,
}

/// Parse a `--delimiter` value: a single character, `tab` or `\t`
pub(crate) fn parse_delimiter(s: &str) -> Result<char, String> {
    match s {
        "tab" | "\\t" => Ok('\t'),
        _ => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c != '"' && c != '\n' && c != '\r' => Ok(c),
                _ => Err(format!("delimiter must be a single character, got '{s}'")),
            }
        }
    }
}

/// Parse an `--encoding` value: `auto`, `utf-8` or `latin1`
pub(crate) fn parse_encoding(s: &str) -> Result<TextEncoding, String> {
    s.parse()
}

/// Input encoding options shared by both commands
#[derive(clap::Args, Clone, Copy, Debug, Default)]
pub struct EncodingArgs {
    /// Encoding of both input files: auto, utf-8 or latin1
    #[arg(long, value_parser = parse_encoding, default_value = "auto")]
    pub encoding: TextEncoding,

    /// Encoding of the old file (overrides --encoding)
    #[arg(long, value_parser = parse_encoding)]
    pub old_encoding: Option<TextEncoding>,

    /// Encoding of the new file (overrides --encoding)
    #[arg(long, value_parser = parse_encoding)]
    pub new_encoding: Option<TextEncoding>,
}

impl EncodingArgs {
    #[must_use]
    pub fn for_old(&self) -> TextEncoding {
        self.old_encoding.unwrap_or(self.encoding)
    }

    #[must_use]
    pub fn for_new(&self) -> TextEncoding {
        self.new_encoding.unwrap_or(self.encoding)
    }
}

/// Read one input file, naming it in any error
pub(crate) fn load_dataset(
    path: &Path,
    delimiter: Option<char>,
    encoding: TextEncoding,
) -> anyhow::Result<Dataset> {
    read_csv_file_with_encoding(path, delimiter, encoding)
        .with_context(|| format!("Failed to read {}", path.display()))
}

/// Write a rendered report to a file, or stdout when no path is given
pub(crate) fn write_output(output: Option<&PathBuf>, content: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => std::fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            println!("{content}");
            Ok(())
        }
    }
}

/// One-line counts, shared by both commands
pub(crate) fn summary_line(result: &DiffResult) -> String {
    let s = &result.summary;
    format!(
        "added={} removed={} modified={} unchanged={}",
        s.added, s.removed, s.modified, s.unchanged
    )
}

/// Quote a value the way JSON would, so whitespace changes stay visible
pub(crate) fn quoted(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{value}\""))
}
