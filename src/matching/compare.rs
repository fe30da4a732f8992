//! Field-by-field comparison of a matched pair.

use serde::{Deserialize, Serialize};

use crate::core::row::Row;
use crate::core::types::ChangeKind;
use crate::matching::scoring::Thresholds;
use crate::matching::similarity::similarity;

/// How two values of the same field are compared
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonPolicy {
    /// Byte equality; any difference is a plain modification
    Exact,
    /// Differences are scored and classified by severity
    Similarity(Thresholds),
}

/// Outcome of comparing one field of a matched pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange {
    pub field: String,
    pub old: String,
    pub new: String,
    pub kind: ChangeKind,
    /// Score of the two values when one was computed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
}

/// Compare the given fields of two rows, in the order given.
///
/// A column missing from either row reads as an empty string.
pub fn compare_fields<S: AsRef<str>>(
    old: &Row,
    new: &Row,
    fields: &[S],
    policy: &ComparisonPolicy,
) -> Vec<FieldChange> {
    fields
        .iter()
        .map(|field| {
            let field = field.as_ref();
            compare_values(field, old.value(field), new.value(field), policy)
        })
        .collect()
}

/// Compare a single pair of raw values
#[must_use]
pub fn compare_values(
    field: &str,
    old: &str,
    new: &str,
    policy: &ComparisonPolicy,
) -> FieldChange {
    let (kind, score) = match policy {
        ComparisonPolicy::Exact => {
            if old == new {
                (ChangeKind::Unchanged, None)
            } else {
                (ChangeKind::Modified(None), None)
            }
        }
        ComparisonPolicy::Similarity(thresholds) => match (old.is_empty(), new.is_empty()) {
            (true, true) => (ChangeKind::Unchanged, None),
            (true, false) => (ChangeKind::Added, None),
            (false, true) => (ChangeKind::Removed, None),
            (false, false) if old == new => (ChangeKind::Unchanged, None),
            (false, false) => {
                let score = similarity(old, new);
                (ChangeKind::Modified(Some(thresholds.classify(score))), Some(score))
            }
        },
    };

    FieldChange {
        field: field.to_string(),
        old: old.to_string(),
        new: new.to_string(),
        kind,
        similarity: score,
    }
}
