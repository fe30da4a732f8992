use thiserror::Error;

use crate::core::types::Side;

/// Fatal conditions that abort a comparison before any result is produced
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiffError {
    #[error("Key column '{column}' not found in {side} file (row {row_index})")]
    MissingKeyColumn {
        side: Side,
        row_index: usize,
        column: String,
    },

    #[error("{} row(s) in {side} file have no derivable identity (rows: {})", .rows.len(), format_indices(.rows))]
    UnresolvableEntity { side: Side, rows: Vec<usize> },

    #[error("Comparison field '{field}' is missing from the {side} file")]
    SchemaMismatch { side: Side, field: String },

    #[error("Duplicate key '{key}' in {side} file: rows {first_index} and {duplicate_index}")]
    DuplicateKey {
        side: Side,
        key: String,
        first_index: usize,
        duplicate_index: usize,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

fn format_indices(rows: &[usize]) -> String {
    const SHOWN: usize = 20;
    let mut listed: Vec<String> = rows.iter().take(SHOWN).map(usize::to_string).collect();
    if rows.len() > SHOWN {
        listed.push(format!("... {} more", rows.len() - SHOWN));
    }
    listed.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolvable_message_lists_rows() {
        let err = DiffError::UnresolvableEntity {
            side: Side::New,
            rows: vec![4, 9],
        };
        assert_eq!(
            err.to_string(),
            "2 row(s) in new file have no derivable identity (rows: 4, 9)"
        );
    }

    #[test]
    fn test_unresolvable_message_truncates_long_lists() {
        let err = DiffError::UnresolvableEntity {
            side: Side::Old,
            rows: (0..25).collect(),
        };
        assert!(err.to_string().ends_with("19, ... 5 more)"));
    }

    #[test]
    fn test_missing_key_column_message() {
        let err = DiffError::MissingKeyColumn {
            side: Side::Old,
            row_index: 0,
            column: "Id".to_string(),
        };
        assert_eq!(err.to_string(), "Key column 'Id' not found in old file (row 0)");
    }
}
