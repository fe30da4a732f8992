use serde::ser::SerializeMap;
use serde::Serialize;

/// A single parsed data record.
///
/// Columns keep the order of the file header. The record is immutable once
/// built; lookups of columns the file does not have return `None` from
/// [`Row::get`] and an empty string from [`Row::value`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// 0-based position among the data rows of the originating file
    pub source_index: usize,

    fields: Vec<(String, String)>,
}

impl Row {
    pub fn new<I, K, V>(source_index: usize, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            source_index,
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Raw value of a column, or `None` if the row has no such column
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    /// Raw value of a column, treating an absent column as empty
    #[must_use]
    pub fn value(&self, column: &str) -> &str {
        self.get(column).unwrap_or("")
    }

    #[must_use]
    pub fn has_column(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Row {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// All rows of one file together with its header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl Dataset {
    pub fn new(headers: Vec<String>, rows: Vec<Row>) -> Self {
        Self { headers, rows }
    }

    /// Build a dataset from a header and positional records.
    ///
    /// Short records are padded with empty strings; surplus cells are dropped.
    pub fn from_records<H, R, C>(headers: H, records: R) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator<Item = Vec<C>>,
        C: Into<String>,
    {
        let headers: Vec<String> = headers.into_iter().map(Into::into).collect();
        let rows = records
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                let mut cells = record.into_iter().map(Into::into);
                let fields: Vec<(String, String)> = headers
                    .iter()
                    .map(|h| (h.clone(), cells.next().unwrap_or_default()))
                    .collect();
                Row::new(index, fields)
            })
            .collect();
        Self { headers, rows }
    }

    #[must_use]
    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Union of two headers: `a`'s order first, then columns only `b` has
pub fn union_columns(a: &[String], b: &[String]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::with_capacity(a.len() + b.len());
    for column in a.iter().chain(b) {
        if !columns.contains(column) {
            columns.push(column.clone());
        }
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_column_reads_empty() {
        let row = Row::new(0, [("Name", "Alice")]);
        assert_eq!(row.get("Fax"), None);
        assert_eq!(row.value("Fax"), "");
        assert_eq!(row.value("Name"), "Alice");
    }

    #[test]
    fn test_from_records_pads_and_truncates() {
        let ds = Dataset::from_records(["a", "b"], vec![vec!["1"], vec!["1", "2", "3"]]);
        assert_eq!(ds.rows[0].get("b"), Some(""));
        assert_eq!(ds.rows[1].len(), 2);
        assert_eq!(ds.rows[1].source_index, 1);
    }

    #[test]
    fn test_union_columns_keeps_order() {
        let a = vec!["Name".to_string(), "Title".to_string()];
        let b = vec!["Phone".to_string(), "Name".to_string()];
        assert_eq!(union_columns(&a, &b), vec!["Name", "Title", "Phone"]);
    }

    #[test]
    fn test_row_serializes_in_column_order() {
        let row = Row::new(0, [("z", "1"), ("a", "2")]);
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"z":"1","a":"2"}"#);
    }
}
