//! Core data types for tabular comparison.
//!
//! - [`Row`]: one parsed record, an ordered column -> string mapping plus its position
//! - [`Dataset`]: the header and rows of one file
//! - [`Key`]: the identity used to match rows across the two snapshots
//! - [`Severity`], [`ChangeKind`]: field change classification
//! - [`DiffError`]: fatal comparison errors
//!
//! ## Missing columns
//!
//! Rows are open-ended mappings. Reading a column a row does not have yields an
//! empty string everywhere except key derivation, where an absent key column is
//! an error.

pub mod error;
pub mod row;
pub mod types;

pub use error::DiffError;
pub use row::{Dataset, Row};
pub use types::{ChangeKind, Key, Severity, Side};
