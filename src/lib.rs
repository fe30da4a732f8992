//! # roster-diff
//!
//! A library for comparing two snapshots of the same tabular data.
//!
//! Directory exports, staff rosters and other CSV extracts are regenerated
//! from different systems over time. Rows get reordered, names pick up stray
//! whitespace, and people join and leave. A plain line diff of the two files
//! reports all of that as noise.
//!
//! `roster-diff` parses both snapshots into rows, pairs rows that describe the
//! same entity, and reports what changed field by field.
//!
//! ## Features
//!
//! - **Ordered matching**: pair rows by position
//! - **Key matching**: pair rows by the exact values of one or more key columns
//! - **Whole-row matching**: compare files as multisets of rows
//! - **Entity tracking**: resolve people by whitespace-normalized name and
//!   score each changed field by similarity
//! - **Severity classes**: Minor (possible typo), Moderate and Major changes
//! - **Duplicate diagnostics**: repeated keys are reported, first occurrence wins
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use roster_diff::parsing::csv::read_csv_file;
//! use roster_diff::{track_changes, TrackerConfig};
//!
//! let old = read_csv_file(Path::new("lotus.csv"), None).unwrap();
//! let new = read_csv_file(Path::new("corp.csv"), None).unwrap();
//!
//! let result = track_changes(&old, &new, &TrackerConfig::default()).unwrap();
//! for entry in &result.modified {
//!     println!("{}: {} field(s) changed", entry.key, entry.changes.len());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Rows, datasets, keys and change classification
//! - [`matching`]: Key derivation, row matching, comparison and aggregation
//! - [`parsing`]: CSV reader
//! - [`utils`]: Raw line diff of the input files
//! - [`cli`]: Command-line interface implementation

pub mod cli;
pub mod core;
pub mod matching;
pub mod parsing;
pub mod utils;

// Re-export commonly used types for convenience
pub use core::error::DiffError;
pub use core::row::{Dataset, Row};
pub use core::types::*;
pub use matching::aggregate::{DiffResult, DiffSummary, ModifiedEntry, RowEntry};
pub use matching::compare::FieldChange;
pub use matching::engine::{diff, track_changes, ChangeTracker, DiffConfig, DiffMode, TrackerConfig};
pub use matching::matcher::{DuplicatePolicy, UnresolvedPolicy};
pub use matching::scoring::Thresholds;
