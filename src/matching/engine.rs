use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::error::DiffError;
use crate::core::row::{union_columns, Dataset};
use crate::core::types::Side;
use crate::matching::aggregate::{aggregate, DiffResult, UnmatchedRows};
use crate::matching::compare::{compare_fields, ComparisonPolicy, FieldChange};
use crate::matching::key::KeyStrategy;
use crate::matching::matcher::{
    match_rows, DuplicatePolicy, MatchMode, MatchOutcome, UnresolvedPolicy,
};
use crate::matching::scoring::Thresholds;

/// Default primary name column of a roster
pub const DEFAULT_NAME_COLUMN: &str = "Name";

/// Default secondary name column of a roster
pub const DEFAULT_SECONDARY_COLUMN: &str = "Chi Name";

/// Default fields compared by the change tracker
pub const DEFAULT_TRACKED_FIELDS: [&str; 5] = ["Name", "Title", "Phone", "Fax", "Location"];

/// Row pairing used by the general diff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffMode {
    /// Pair rows by position
    Ordered,
    /// Pair rows by the exact values of these columns
    Key(Vec<String>),
    /// No key: compare rows as a multiset of whole-row contents
    WholeRow,
}

/// Configuration of [`diff`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    pub mode: DiffMode,
    /// Fields to compare; `None` compares the union of both headers
    pub fields: Option<Vec<String>>,
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            mode: DiffMode::WholeRow,
            fields: None,
            duplicate_policy: DuplicatePolicy::Record,
        }
    }
}

impl DiffConfig {
    pub fn ordered() -> Self {
        Self {
            mode: DiffMode::Ordered,
            ..Self::default()
        }
    }

    pub fn keyed<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mode: DiffMode::Key(columns.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }
}

/// Configuration of [`track_changes`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub name_column: String,
    pub secondary_column: Option<String>,
    pub fields: Vec<String>,
    pub thresholds: Thresholds,
    pub unresolved_policy: UnresolvedPolicy,
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            name_column: DEFAULT_NAME_COLUMN.to_string(),
            secondary_column: Some(DEFAULT_SECONDARY_COLUMN.to_string()),
            fields: DEFAULT_TRACKED_FIELDS.iter().map(ToString::to_string).collect(),
            thresholds: Thresholds::default(),
            unresolved_policy: UnresolvedPolicy::Abort,
            duplicate_policy: DuplicatePolicy::Record,
        }
    }
}

impl TrackerConfig {
    /// # Errors
    ///
    /// Returns `DiffError::InvalidConfig` for bad thresholds, an empty name
    /// column or an empty field list.
    pub fn validate(&self) -> Result<(), DiffError> {
        self.thresholds.validate()?;
        if self.name_column.is_empty() {
            return Err(DiffError::InvalidConfig(
                "name column must not be empty".to_string(),
            ));
        }
        if self.fields.is_empty() {
            return Err(DiffError::InvalidConfig(
                "at least one field must be tracked".to_string(),
            ));
        }
        Ok(())
    }
}

/// Compare two CSV snapshots exactly.
///
/// # Errors
///
/// Returns `DiffError::InvalidConfig` for an empty key column list,
/// `DiffError::SchemaMismatch` when an explicitly requested field is missing
/// from either header, and propagates matching errors.
pub fn diff(old: &Dataset, new: &Dataset, config: &DiffConfig) -> Result<DiffResult, DiffError> {
    let fields = match &config.fields {
        Some(fields) => {
            require_fields(old, new, fields)?;
            fields.clone()
        }
        None => union_columns(&old.headers, &new.headers),
    };

    let mode = match &config.mode {
        DiffMode::Ordered => MatchMode::Ordered,
        DiffMode::Key(columns) if columns.is_empty() => {
            return Err(DiffError::InvalidConfig(
                "key mode needs at least one key column".to_string(),
            ));
        }
        DiffMode::Key(columns) => MatchMode::Keyed(KeyStrategy::Columns(columns.clone())),
        DiffMode::WholeRow => MatchMode::Keyed(KeyStrategy::Content(union_columns(
            &old.headers,
            &new.headers,
        ))),
    };
    debug!(?mode, fields = fields.len(), "Starting diff");

    let outcome = match_rows(
        &old.rows,
        &new.rows,
        &mode,
        UnresolvedPolicy::Abort,
        config.duplicate_policy,
    )?;
    let changes = compare_pairs(&outcome, &fields, &ComparisonPolicy::Exact);

    Ok(aggregate(
        &outcome,
        changes,
        old.len(),
        new.len(),
        UnmatchedRows::Itemize,
    ))
}

/// Track changes of entities present in both snapshots.
///
/// Rows are matched by their whitespace-normalized name (plus secondary name),
/// changed fields are scored by similarity, and entities found in only one
/// snapshot are counted but not itemized.
///
/// # Errors
///
/// Returns `DiffError::InvalidConfig` for an invalid configuration and
/// propagates matching errors.
pub fn track_changes(
    old: &Dataset,
    new: &Dataset,
    config: &TrackerConfig,
) -> Result<DiffResult, DiffError> {
    ChangeTracker::with_config(config.clone()).track(old, new)
}

/// Entity-resolving change tracker
pub struct ChangeTracker {
    config: TrackerConfig,
}

impl Default for ChangeTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeTracker {
    /// Create a tracker with the default roster configuration
    pub fn new() -> Self {
        Self {
            config: TrackerConfig::default(),
        }
    }

    pub fn with_config(config: TrackerConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// # Errors
    ///
    /// See [`track_changes`].
    pub fn track(&self, old: &Dataset, new: &Dataset) -> Result<DiffResult, DiffError> {
        self.config.validate()?;

        for (side, dataset) in [(Side::Old, old), (Side::New, new)] {
            for field in &self.config.fields {
                if !dataset.has_column(field) {
                    debug!("Field '{}' absent from {} file, reading as empty", field, side);
                }
            }
        }

        let mode = MatchMode::Keyed(KeyStrategy::Entity {
            name_column: self.config.name_column.clone(),
            secondary_column: self.config.secondary_column.clone(),
        });
        let outcome = match_rows(
            &old.rows,
            &new.rows,
            &mode,
            self.config.unresolved_policy,
            self.config.duplicate_policy,
        )?;

        let policy = ComparisonPolicy::Similarity(self.config.thresholds);
        let changes = compare_pairs(&outcome, &self.config.fields, &policy);
        let result = aggregate(
            &outcome,
            changes,
            old.len(),
            new.len(),
            UnmatchedRows::CountOnly,
        );

        info!(
            "Found {} common entities ({} joiners and {} leavers ignored), {} with changes",
            result.summary.matched,
            result.summary.added,
            result.summary.removed,
            result.summary.modified
        );

        Ok(result)
    }
}

fn compare_pairs(
    outcome: &MatchOutcome<'_>,
    fields: &[String],
    policy: &ComparisonPolicy,
) -> Vec<Vec<FieldChange>> {
    outcome
        .pairs
        .iter()
        .map(|pair| compare_fields(pair.old, pair.new, fields, policy))
        .collect()
}

fn require_fields(old: &Dataset, new: &Dataset, fields: &[String]) -> Result<(), DiffError> {
    for field in fields {
        for (side, dataset) in [(Side::Old, old), (Side::New, new)] {
            if !dataset.has_column(field) {
                return Err(DiffError::SchemaMismatch {
                    side,
                    field: field.clone(),
                });
            }
        }
    }
    Ok(())
}
