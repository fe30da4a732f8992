//! Pairing rows of the old and new snapshots.
//!
//! Ordered matching pairs rows by position. Keyed matching derives a [`Key`]
//! per row and pairs equal keys; the first occurrence of a key on each side
//! wins and later occurrences are reported as [`DuplicateKey`] diagnostics.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::error::DiffError;
use crate::core::row::Row;
use crate::core::types::{Key, Side};
use crate::matching::key::{derive_key, KeyStrategy};

/// How rows are paired
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Pair rows by position
    Ordered,
    /// Pair rows by derived key
    Keyed(KeyStrategy),
}

/// What to do with rows whose key cannot be derived
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedPolicy {
    /// Fail the comparison, listing every offending row of the side
    #[default]
    Abort,
    /// Set the rows aside in [`MatchOutcome::unresolved`]
    Bucket,
}

/// What to do when a key occurs more than once on one side
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Keep the first occurrence, record later ones as diagnostics
    #[default]
    Record,
    /// Fail on the first duplicate
    Strict,
}

/// A later row whose key was already taken by an earlier row of the same side
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateKey {
    pub side: Side,
    pub key: Key,
    /// Row that was used for matching
    pub first_index: usize,
    /// Row that was set aside
    pub duplicate_index: usize,
}

/// A row that could not be given an identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedRow {
    pub side: Side,
    pub row: Row,
}

/// Rows with equal keys (or equal positions) on both sides
#[derive(Debug, Clone)]
pub struct MatchedPair<'a> {
    pub key: Key,
    pub old: &'a Row,
    pub new: &'a Row,
}

/// A row that exists on one side only
#[derive(Debug, Clone)]
pub struct KeyedRow<'a> {
    pub key: Key,
    pub row: &'a Row,
}

/// Output of [`match_rows`]
#[derive(Debug, Clone, Default)]
pub struct MatchOutcome<'a> {
    /// Pairs in new-file order
    pub pairs: Vec<MatchedPair<'a>>,
    /// Rows only in the new snapshot, in new-file order
    pub added: Vec<KeyedRow<'a>>,
    /// Rows only in the old snapshot, in old-file order
    pub removed: Vec<KeyedRow<'a>>,
    pub duplicates: Vec<DuplicateKey>,
    pub unresolved: Vec<UnresolvedRow>,
}

/// Rows of one side indexed by key, in insertion order
struct IndexedSide<'a> {
    entries: Vec<(Key, &'a Row)>,
    positions: HashMap<Key, usize>,
}

/// Pair the rows of two snapshots.
///
/// # Errors
///
/// Propagates `DiffError::MissingKeyColumn` from key derivation. Returns
/// `DiffError::UnresolvableEntity` under [`UnresolvedPolicy::Abort`] and
/// `DiffError::DuplicateKey` under [`DuplicatePolicy::Strict`].
pub fn match_rows<'a>(
    old: &'a [Row],
    new: &'a [Row],
    mode: &MatchMode,
    unresolved_policy: UnresolvedPolicy,
    duplicate_policy: DuplicatePolicy,
) -> Result<MatchOutcome<'a>, DiffError> {
    let outcome = match mode {
        MatchMode::Ordered => match_ordered(old, new),
        MatchMode::Keyed(strategy) => {
            let mut outcome = MatchOutcome::default();
            let old_side = index_side(
                old,
                strategy,
                Side::Old,
                unresolved_policy,
                duplicate_policy,
                &mut outcome,
            )?;
            let new_side = index_side(
                new,
                strategy,
                Side::New,
                unresolved_policy,
                duplicate_policy,
                &mut outcome,
            )?;
            pair_indexed(&old_side, &new_side, &mut outcome);
            outcome
        }
    };

    debug!(
        matched = outcome.pairs.len(),
        added = outcome.added.len(),
        removed = outcome.removed.len(),
        duplicates = outcome.duplicates.len(),
        unresolved = outcome.unresolved.len(),
        "Matched rows"
    );

    Ok(outcome)
}

fn match_ordered<'a>(old: &'a [Row], new: &'a [Row]) -> MatchOutcome<'a> {
    let common = old.len().min(new.len());
    let mut outcome = MatchOutcome::default();

    for (index, (o, n)) in old.iter().zip(new).enumerate() {
        outcome.pairs.push(MatchedPair {
            key: Key::Position(index),
            old: o,
            new: n,
        });
    }
    outcome.added = new[common..]
        .iter()
        .enumerate()
        .map(|(offset, row)| KeyedRow {
            key: Key::Position(common + offset),
            row,
        })
        .collect();
    outcome.removed = old[common..]
        .iter()
        .enumerate()
        .map(|(offset, row)| KeyedRow {
            key: Key::Position(common + offset),
            row,
        })
        .collect();

    outcome
}

fn index_side<'a>(
    rows: &'a [Row],
    strategy: &KeyStrategy,
    side: Side,
    unresolved_policy: UnresolvedPolicy,
    duplicate_policy: DuplicatePolicy,
    outcome: &mut MatchOutcome<'a>,
) -> Result<IndexedSide<'a>, DiffError> {
    let mut indexed = IndexedSide {
        entries: Vec::with_capacity(rows.len()),
        positions: HashMap::with_capacity(rows.len()),
    };
    let mut unresolved: Vec<&Row> = Vec::new();
    let mut occurrences: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let key = match derive_key(row, strategy, side) {
            Ok(Key::Content { fields, .. }) => {
                let seen = occurrences.entry(fields.clone()).or_insert(0);
                let key = Key::Content {
                    fields,
                    occurrence: *seen,
                };
                *seen += 1;
                key
            }
            Ok(key) => key,
            Err(DiffError::UnresolvableEntity { .. }) => {
                unresolved.push(row);
                continue;
            }
            Err(e) => return Err(e),
        };

        if let Some(&position) = indexed.positions.get(&key) {
            let first_index = indexed.entries[position].1.source_index;
            if duplicate_policy == DuplicatePolicy::Strict {
                return Err(DiffError::DuplicateKey {
                    side,
                    key: key.to_string(),
                    first_index,
                    duplicate_index: row.source_index,
                });
            }
            warn!(
                "Duplicate key '{}' in {} file: keeping row {}, setting aside row {}",
                key, side, first_index, row.source_index
            );
            outcome.duplicates.push(DuplicateKey {
                side,
                key,
                first_index,
                duplicate_index: row.source_index,
            });
            continue;
        }

        indexed.positions.insert(key.clone(), indexed.entries.len());
        indexed.entries.push((key, row));
    }

    if !unresolved.is_empty() {
        match unresolved_policy {
            UnresolvedPolicy::Abort => {
                return Err(DiffError::UnresolvableEntity {
                    side,
                    rows: unresolved.iter().map(|r| r.source_index).collect(),
                });
            }
            UnresolvedPolicy::Bucket => {
                warn!(
                    "{} row(s) in {} file have no derivable identity and were set aside",
                    unresolved.len(),
                    side
                );
                outcome
                    .unresolved
                    .extend(unresolved.into_iter().map(|row| UnresolvedRow {
                        side,
                        row: row.clone(),
                    }));
            }
        }
    }

    Ok(indexed)
}

fn pair_indexed<'a>(
    old: &IndexedSide<'a>,
    new: &IndexedSide<'a>,
    outcome: &mut MatchOutcome<'a>,
) {
    for &(ref key, new_row) in &new.entries {
        match old.positions.get(key) {
            Some(&position) => {
                outcome.pairs.push(MatchedPair {
                    key: key.clone(),
                    old: old.entries[position].1,
                    new: new_row,
                });
            }
            None => outcome.added.push(KeyedRow {
                key: key.clone(),
                row: new_row,
            }),
        }
    }

    for &(ref key, old_row) in &old.entries {
        if !new.positions.contains_key(key) {
            outcome.removed.push(KeyedRow {
                key: key.clone(),
                row: old_row,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::row::Dataset;

    fn names(rows: &[&str]) -> Vec<Row> {
        Dataset::from_records(["Name", "Title"], rows.iter().map(|n| vec![*n, "Eng"])).rows
    }

    fn by_name() -> MatchMode {
        MatchMode::Keyed(KeyStrategy::Columns(vec!["Name".to_string()]))
    }

    fn run<'a>(old: &'a [Row], new: &'a [Row], mode: &MatchMode) -> MatchOutcome<'a> {
        match_rows(
            old,
            new,
            mode,
            UnresolvedPolicy::Abort,
            DuplicatePolicy::Record,
        )
        .unwrap()
    }

    #[test]
    fn test_ordered_tail_added() {
        let old = names(&["a", "b"]);
        let new = names(&["a", "b", "c", "d"]);
        let outcome = run(&old, &new, &MatchMode::Ordered);
        assert_eq!(outcome.pairs.len(), 2);
        assert_eq!(outcome.added.len(), 2);
        assert_eq!(outcome.added[0].key, Key::Position(2));
        assert!(outcome.removed.is_empty());
    }

    #[test]
    fn test_ordered_tail_removed() {
        let old = names(&["a", "b", "c"]);
        let new = names(&["x"]);
        let outcome = run(&old, &new, &MatchMode::Ordered);
        assert_eq!(outcome.pairs.len(), 1);
        assert_eq!(outcome.removed.len(), 2);
        assert_eq!(outcome.removed[1].row.value("Name"), "c");
    }

    #[test]
    fn test_keyed_partition_and_order() {
        let old = names(&["d", "a", "b", "c"]);
        let new = names(&["c", "e", "a", "f"]);
        let outcome = run(&old, &new, &by_name());

        let matched: Vec<&str> = outcome.pairs.iter().map(|p| p.new.value("Name")).collect();
        assert_eq!(matched, vec!["c", "a"]);

        let added: Vec<&str> = outcome.added.iter().map(|r| r.row.value("Name")).collect();
        assert_eq!(added, vec!["e", "f"]);

        let removed: Vec<&str> = outcome.removed.iter().map(|r| r.row.value("Name")).collect();
        assert_eq!(removed, vec!["d", "b"]);
    }

    #[test]
    fn test_duplicate_first_wins() {
        let old = Dataset::from_records(
            ["Name", "Title"],
            vec![vec!["x", "first"], vec!["x", "second"]],
        )
        .rows;
        let new = names(&["x"]);
        let outcome = run(&old, &new, &by_name());

        assert_eq!(outcome.pairs.len(), 1);
        assert_eq!(outcome.pairs[0].old.value("Title"), "first");
        assert_eq!(outcome.duplicates.len(), 1);
        assert_eq!(outcome.duplicates[0].first_index, 0);
        assert_eq!(outcome.duplicates[0].duplicate_index, 1);
        assert_eq!(outcome.duplicates[0].side, Side::Old);
    }

    #[test]
    fn test_duplicate_strict_fails() {
        let old = names(&["x", "x"]);
        let new = names(&["x"]);
        let err = match_rows(
            &old,
            &new,
            &by_name(),
            UnresolvedPolicy::Abort,
            DuplicatePolicy::Strict,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DiffError::DuplicateKey {
                side: Side::Old,
                first_index: 0,
                duplicate_index: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_missing_key_column_propagates() {
        let old = names(&["a"]);
        let new = names(&["a"]);
        let mode = MatchMode::Keyed(KeyStrategy::Columns(vec!["Id".to_string()]));
        let err = match_rows(
            &old,
            &new,
            &mode,
            UnresolvedPolicy::Bucket,
            DuplicatePolicy::Record,
        )
        .unwrap_err();
        assert!(matches!(err, DiffError::MissingKeyColumn { side: Side::Old, .. }));
    }

    fn entity_mode() -> MatchMode {
        MatchMode::Keyed(KeyStrategy::Entity {
            name_column: "Name".to_string(),
            secondary_column: None,
        })
    }

    #[test]
    fn test_unresolved_abort_lists_all_rows() {
        let old = names(&["a", "", "b", " "]);
        let new = names(&["a"]);
        let err = match_rows(
            &old,
            &new,
            &entity_mode(),
            UnresolvedPolicy::Abort,
            DuplicatePolicy::Record,
        )
        .unwrap_err();
        assert_eq!(
            err,
            DiffError::UnresolvableEntity {
                side: Side::Old,
                rows: vec![1, 3],
            }
        );
    }

    #[test]
    fn test_unresolved_bucket() {
        let old = names(&["a", ""]);
        let new = names(&["", "a"]);
        let outcome = match_rows(
            &old,
            &new,
            &entity_mode(),
            UnresolvedPolicy::Bucket,
            DuplicatePolicy::Record,
        )
        .unwrap();
        assert_eq!(outcome.pairs.len(), 1);
        assert_eq!(outcome.unresolved.len(), 2);
        assert_eq!(outcome.unresolved[0].side, Side::Old);
        assert_eq!(outcome.unresolved[1].side, Side::New);
    }

    #[test]
    fn test_content_mode_counts_multiplicity() {
        let columns = vec!["Name".to_string(), "Title".to_string()];
        let mode = MatchMode::Keyed(KeyStrategy::Content(columns));
        let old = names(&["a", "a", "b"]);
        let new = names(&["a", "b", "b"]);
        let outcome = run(&old, &new, &mode);

        assert_eq!(outcome.pairs.len(), 2);
        assert_eq!(outcome.added.len(), 1);
        assert_eq!(outcome.added[0].row.value("Name"), "b");
        assert_eq!(outcome.removed.len(), 1);
        assert_eq!(outcome.removed[0].row.value("Name"), "a");
        assert!(outcome.duplicates.is_empty());
    }
}
