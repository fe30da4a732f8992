//! Readers turning delimited files into [`Dataset`](crate::core::row::Dataset)s.
//!
//! ## Example
//!
//! ```rust,no_run
//! use roster_diff::parsing::csv::{parse_csv_text, read_csv_file};
//! use std::path::Path;
//!
//! // Delimiter sniffed from the header line
//! let roster = read_csv_file(Path::new("phonelist.csv"), None).unwrap();
//!
//! // Or parse text directly with an explicit delimiter
//! let roster = parse_csv_text("Name\tTitle\nAlice\tEng\n", Some('\t')).unwrap();
//! ```

pub mod csv;
