use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize};

/// Separator placed between key parts. Never expected inside CSV field content.
pub const KEY_SEPARATOR: char = '\u{1f}';

/// Which of the two snapshots a row came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Old,
    New,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Old => write!(f, "old"),
            Self::New => write!(f, "new"),
        }
    }
}

/// Identity used to match rows across the two snapshots.
///
/// Two rows with equal keys are treated as the same entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// Position of the row in its file (ordered matching)
    Position(usize),
    /// Key parts joined with [`KEY_SEPARATOR`]
    Fields(String),
    /// Whole-row content plus the occurrence number of that content within its side
    Content { fields: String, occurrence: usize },
}

impl Key {
    /// Build a field key from its parts
    pub fn from_parts<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::Fields(join_parts(parts))
    }

    /// The individual key parts, in derivation order
    #[must_use]
    pub fn parts(&self) -> Vec<String> {
        match self {
            Self::Position(index) => vec![index.to_string()],
            Self::Fields(fields) | Self::Content { fields, .. } => {
                fields.split(KEY_SEPARATOR).map(str::to_string).collect()
            }
        }
    }
}

pub(crate) fn join_parts<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut joined = String::new();
    for (i, part) in parts.into_iter().enumerate() {
        if i > 0 {
            joined.push(KEY_SEPARATOR);
        }
        joined.push_str(part.as_ref());
    }
    joined
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Position(index) => write!(f, "#{index}"),
            Self::Fields(_) => write!(f, "{}", self.parts().join(" | ")),
            Self::Content { occurrence, .. } if *occurrence > 0 => {
                write!(f, "{} (occurrence {})", self.parts().join(" | "), occurrence + 1)
            }
            Self::Content { .. } => write!(f, "{}", self.parts().join(" | ")),
        }
    }
}

/// Positions serialize as a number and field keys as their parts. Content keys
/// become `{"parts": [...], "occurrence": n}` so repeated identical rows stay distinct.
impl Serialize for Key {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Position(index) => serializer.serialize_u64(*index as u64),
            Self::Fields(_) => self.parts().serialize(serializer),
            Self::Content { occurrence, .. } => {
                let mut state = serializer.serialize_struct("ContentKey", 2)?;
                state.serialize_field("parts", &self.parts())?;
                state.serialize_field("occurrence", occurrence)?;
                state.end()
            }
        }
    }
}

/// How far a changed value drifted from its old value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Minor,
    Moderate,
    Major,
}

impl Severity {
    /// Classify a similarity score. Each bound is inclusive on its lower side.
    #[must_use]
    pub fn from_score(score: f64, minor: f64, moderate: f64) -> Self {
        if score >= minor {
            Self::Minor
        } else if score >= moderate {
            Self::Moderate
        } else {
            Self::Major
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Minor => write!(f, "Minor Change (Possible Typo)"),
            Self::Moderate => write!(f, "Moderate Change"),
            Self::Major => write!(f, "Major Change"),
        }
    }
}

/// Classification of a single field comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "severity")]
pub enum ChangeKind {
    Unchanged,
    /// Old value empty, new value present
    Added,
    /// Old value present, new value empty
    Removed,
    /// Values differ; severity only under similarity scoring
    Modified(Option<Severity>),
}

impl ChangeKind {
    #[must_use]
    pub fn is_change(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }

    #[must_use]
    pub fn severity(&self) -> Option<Severity> {
        match self {
            Self::Modified(severity) => *severity,
            _ => None,
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unchanged => write!(f, "Unchanged"),
            Self::Added => write!(f, "Added"),
            Self::Removed => write!(f, "Removed"),
            Self::Modified(Some(severity)) => write!(f, "{severity}"),
            Self::Modified(None) => write!(f, "Modified"),
        }
    }
}
