//! Assembling matched, added and removed rows into a [`DiffResult`].

use serde::Serialize;

use crate::core::row::Row;
use crate::core::types::{Key, Severity};
use crate::matching::compare::FieldChange;
use crate::matching::matcher::{DuplicateKey, KeyedRow, MatchOutcome, UnresolvedRow};
use crate::matching::scoring::SeverityBreakdown;

/// A row present in only one snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowEntry {
    pub key: Key,
    pub row: Row,
}

impl From<&KeyedRow<'_>> for RowEntry {
    fn from(keyed: &KeyedRow<'_>) -> Self {
        Self {
            key: keyed.key.clone(),
            row: keyed.row.clone(),
        }
    }
}

/// A matched entity with at least one changed field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModifiedEntry {
    pub key: Key,
    pub old_index: usize,
    pub new_index: usize,
    /// Changed fields only, in comparison order
    pub changes: Vec<FieldChange>,
    /// Old-side row, for renderers that label entries by other columns
    #[serde(skip)]
    pub old_row: Row,
}

impl ModifiedEntry {
    /// Worst severity among the changes; `None` when no change carries one
    #[must_use]
    pub fn worst_severity(&self) -> Option<Severity> {
        self.changes.iter().filter_map(|c| c.kind.severity()).max()
    }
}

/// Summary statistics of a comparison
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    pub old_rows: usize,
    pub new_rows: usize,
    pub matched: usize,
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
    pub unchanged: usize,
    pub field_changes: usize,
    pub duplicates: usize,
    pub unresolved: usize,
    pub by_severity: SeverityBreakdown,
}

/// The classified difference between two snapshots.
///
/// Every matched key is either itemized in `modified` or counted in
/// `unchanged_count`; every unmatched key is in `added` or `removed` (or only
/// counted in `summary` when joiners and leavers are suppressed).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiffResult {
    pub added: Vec<RowEntry>,
    pub removed: Vec<RowEntry>,
    pub modified: Vec<ModifiedEntry>,
    pub unchanged_count: usize,
    pub duplicate_keys: Vec<DuplicateKey>,
    pub unresolved: Vec<UnresolvedRow>,
    pub summary: DiffSummary,
}

impl DiffResult {
    /// `true` when anything was added, removed or modified
    #[must_use]
    pub fn has_differences(&self) -> bool {
        self.summary.added + self.summary.removed + self.summary.modified > 0
    }
}

/// Whether rows found on one side only are itemized in the result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnmatchedRows {
    Itemize,
    CountOnly,
}

/// Build the result from a match outcome and the field changes of each pair.
///
/// `changes[i]` belongs to `outcome.pairs[i]`. Pairs whose changes are all
/// unchanged are counted, not itemized.
pub fn aggregate(
    outcome: &MatchOutcome<'_>,
    changes: Vec<Vec<FieldChange>>,
    old_rows: usize,
    new_rows: usize,
    unmatched: UnmatchedRows,
) -> DiffResult {
    debug_assert_eq!(outcome.pairs.len(), changes.len());

    let mut summary = DiffSummary {
        old_rows,
        new_rows,
        matched: outcome.pairs.len(),
        added: outcome.added.len(),
        removed: outcome.removed.len(),
        duplicates: outcome.duplicates.len(),
        unresolved: outcome.unresolved.len(),
        ..DiffSummary::default()
    };

    let mut modified = Vec::new();
    for (pair, pair_changes) in outcome.pairs.iter().zip(changes) {
        let changed: Vec<FieldChange> = pair_changes
            .into_iter()
            .filter(|c| c.kind.is_change())
            .collect();
        if changed.is_empty() {
            summary.unchanged += 1;
            continue;
        }

        let entry = ModifiedEntry {
            key: pair.key.clone(),
            old_index: pair.old.source_index,
            new_index: pair.new.source_index,
            changes: changed,
            old_row: pair.old.clone(),
        };
        summary.field_changes += entry.changes.len();
        summary.by_severity.record(entry.worst_severity());
        modified.push(entry);
    }
    summary.modified = modified.len();

    let (added, removed) = match unmatched {
        UnmatchedRows::Itemize => (
            outcome.added.iter().map(RowEntry::from).collect(),
            outcome.removed.iter().map(RowEntry::from).collect(),
        ),
        UnmatchedRows::CountOnly => (Vec::new(), Vec::new()),
    };

    DiffResult {
        added,
        removed,
        modified,
        unchanged_count: summary.unchanged,
        duplicate_keys: outcome.duplicates.clone(),
        unresolved: outcome.unresolved.clone(),
        summary,
    }
}
