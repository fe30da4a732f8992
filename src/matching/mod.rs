//! Row matching, field comparison and result aggregation.
//!
//! - [`diff`]: exact comparison with ordered, key-based or whole-row matching
//! - [`track_changes`]: entity resolution by normalized name with
//!   similarity-scored field changes; joiners and leavers are only counted
//!
//! ## Pipeline
//!
//! 1. **Key derivation** ([`key`]): explicit key columns, a normalized entity name,
//!    or whole-row content
//! 2. **Matching** ([`matcher`]): pair rows by position or key; first occurrence of
//!    a duplicated key wins
//! 3. **Field comparison** ([`compare`]): exact equality or similarity scoring
//! 4. **Aggregation** ([`aggregate`]): modified entries, counts and a
//!    worst-severity breakdown
//!
//! ## Severity
//!
//! | Similarity | Severity |
//! |------------|----------|
//! | >= 0.80    | Minor    |
//! | >= 0.50    | Moderate |
//! | <  0.50    | Major    |
//!
//! ## Example
//!
//! ```rust
//! use roster_diff::{diff, Dataset, DiffConfig};
//!
//! let old = Dataset::from_records(["Name", "Title"], vec![vec!["Alice", "Eng"]]);
//! let new = Dataset::from_records(["Name", "Title"], vec![vec!["Alice", "Senior Eng"]]);
//!
//! let result = diff(&old, &new, &DiffConfig::keyed(["Name"])).unwrap();
//! assert_eq!(result.modified.len(), 1);
//! ```

pub mod aggregate;
pub mod compare;
pub mod engine;
pub mod key;
pub mod matcher;
pub mod scoring;
pub mod similarity;

pub use aggregate::{DiffResult, DiffSummary, ModifiedEntry, RowEntry};
pub use compare::{ComparisonPolicy, FieldChange};
pub use engine::{diff, track_changes, ChangeTracker, DiffConfig, DiffMode, TrackerConfig};
pub use key::KeyStrategy;
pub use matcher::{DuplicateKey, DuplicatePolicy, UnresolvedPolicy, UnresolvedRow};
pub use scoring::Thresholds;
