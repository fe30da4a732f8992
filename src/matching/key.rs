//! Key derivation: the identity a row is matched by.

use serde::{Deserialize, Serialize};

use crate::core::error::DiffError;
use crate::core::row::Row;
use crate::core::types::{join_parts, Key, Side};

/// How a row's key is derived
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyStrategy {
    /// Exact concatenation of the named columns, in order
    Columns(Vec<String>),

    /// Whitespace-normalized primary name plus optional secondary name
    Entity {
        name_column: String,
        secondary_column: Option<String>,
    },

    /// Every listed column; used for whole-row multiset comparison
    Content(Vec<String>),
}

/// Derive the matching key of a row.
///
/// Pure: the same row and strategy always produce the same key. For
/// [`KeyStrategy::Content`] the occurrence number is left at zero; the matcher
/// numbers repeated content.
///
/// # Errors
///
/// Returns `DiffError::MissingKeyColumn` if a column named by
/// [`KeyStrategy::Columns`] is absent from the row, or
/// `DiffError::UnresolvableEntity` if both entity name fields are empty.
pub fn derive_key(row: &Row, strategy: &KeyStrategy, side: Side) -> Result<Key, DiffError> {
    match strategy {
        KeyStrategy::Columns(columns) => {
            let mut values = Vec::with_capacity(columns.len());
            for column in columns {
                let value = row.get(column).ok_or_else(|| DiffError::MissingKeyColumn {
                    side,
                    row_index: row.source_index,
                    column: column.clone(),
                })?;
                values.push(value);
            }
            Ok(Key::Fields(join_parts(values)))
        }
        KeyStrategy::Entity {
            name_column,
            secondary_column,
        } => {
            let name = normalize_whitespace(row.value(name_column));
            let secondary = secondary_column
                .as_deref()
                .map(|column| normalize_whitespace(row.value(column)))
                .unwrap_or_default();

            match (name.is_empty(), secondary.is_empty()) {
                (true, true) => Err(DiffError::UnresolvableEntity {
                    side,
                    rows: vec![row.source_index],
                }),
                (_, true) => Ok(Key::from_parts([name])),
                _ => Ok(Key::from_parts([name, secondary])),
            }
        }
        KeyStrategy::Content(columns) => Ok(Key::Content {
            fields: join_parts(columns.iter().map(|c| row.value(c))),
            occurrence: 0,
        }),
    }
}

/// Trim and collapse internal whitespace runs to a single space.
///
/// Case and script are left untouched.
#[must_use]
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity() -> KeyStrategy {
        KeyStrategy::Entity {
            name_column: "Name".to_string(),
            secondary_column: Some("Chi Name".to_string()),
        }
    }

    #[test]
    fn test_columns_key_is_exact() {
        let row = Row::new(0, [("Id", " 7 "), ("Dept", "HR")]);
        let strategy = KeyStrategy::Columns(vec!["Dept".to_string(), "Id".to_string()]);
        let key = derive_key(&row, &strategy, Side::Old).unwrap();
        assert_eq!(key.parts(), vec!["HR", " 7 "]);
    }

    #[test]
    fn test_columns_key_missing_column() {
        let row = Row::new(3, [("Name", "Alice")]);
        let strategy = KeyStrategy::Columns(vec!["Id".to_string()]);
        let err = derive_key(&row, &strategy, Side::New).unwrap_err();
        assert_eq!(
            err,
            DiffError::MissingKeyColumn {
                side: Side::New,
                row_index: 3,
                column: "Id".to_string(),
            }
        );
    }

    #[test]
    fn test_columns_key_empty_value_is_valid() {
        let row = Row::new(0, [("Id", "")]);
        let strategy = KeyStrategy::Columns(vec!["Id".to_string()]);
        assert!(derive_key(&row, &strategy, Side::Old).is_ok());
    }

    #[test]
    fn test_entity_key_normalizes_whitespace_only() {
        let a = Row::new(0, [("Name", "  Wong  Yuk Ting, Yuki "), ("Chi Name", "")]);
        let b = Row::new(1, [("Name", "Wong Yuk Ting, Yuki"), ("Chi Name", "")]);
        let c = Row::new(2, [("Name", "WONG YUK TING, YUKI"), ("Chi Name", "")]);

        let ka = derive_key(&a, &entity(), Side::Old).unwrap();
        let kb = derive_key(&b, &entity(), Side::Old).unwrap();
        let kc = derive_key(&c, &entity(), Side::Old).unwrap();
        assert_eq!(ka, kb);
        assert_ne!(ka, kc);
    }

    #[test]
    fn test_entity_key_uses_secondary_name() {
        let a = Row::new(0, [("Name", "Chan Tai Man"), ("Chi Name", "陳大文")]);
        let b = Row::new(1, [("Name", "Chan Tai Man"), ("Chi Name", "陳小文")]);
        let ka = derive_key(&a, &entity(), Side::Old).unwrap();
        let kb = derive_key(&b, &entity(), Side::Old).unwrap();
        assert_ne!(ka, kb);
        assert_eq!(ka.parts(), vec!["Chan Tai Man", "陳大文"]);
    }

    #[test]
    fn test_entity_key_absent_secondary_column() {
        let row = Row::new(0, [("Name", "Alice")]);
        let key = derive_key(&row, &entity(), Side::Old).unwrap();
        assert_eq!(key, Key::from_parts(["Alice"]));
    }

    #[test]
    fn test_entity_key_secondary_only() {
        let row = Row::new(0, [("Name", " "), ("Chi Name", "李四")]);
        let key = derive_key(&row, &entity(), Side::Old).unwrap();
        assert_eq!(key.parts(), vec!["", "李四"]);
    }

    #[test]
    fn test_entity_key_unresolvable() {
        let row = Row::new(5, [("Name", "   "), ("Chi Name", "")]);
        let err = derive_key(&row, &entity(), Side::Old).unwrap_err();
        assert_eq!(
            err,
            DiffError::UnresolvableEntity {
                side: Side::Old,
                rows: vec![5],
            }
        );
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  a \t b\n c  "), "a b c");
        assert_eq!(normalize_whitespace(""), "");
    }
}
