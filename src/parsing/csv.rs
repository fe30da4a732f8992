//! CSV reader producing a [`Dataset`].
//!
//! Supported input:
//! - `.csv`, `.tsv`, `.txt` and anything else readable as delimited text
//! - `.gz` variants of the above (gzip compressed)
//!
//! Text is decoded as UTF-8 (a leading BOM is dropped), falling back to
//! Latin-1 when the bytes are not valid UTF-8, unless a [`TextEncoding`] is
//! forced.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use flate2::read::GzDecoder;
use thiserror::Error;

use crate::core::row::Dataset;

/// Delimiters considered when none is given, in tie-break order
pub const CANDIDATE_DELIMITERS: [char; 4] = [',', '\t', ';', '|'];

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid CSV format: {0}")]
    InvalidFormat(String),

    #[error("No header row found")]
    MissingHeader,

    #[error("Invalid UTF-8 at byte {0}")]
    InvalidUtf8(usize),
}

/// How file bytes are turned into text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextEncoding {
    /// UTF-8, or Latin-1 when the bytes are not valid UTF-8
    #[default]
    Auto,
    /// UTF-8 only; invalid bytes are an error
    Utf8,
    /// ISO-8859-1, every byte maps to one character
    Latin1,
}

impl FromStr for TextEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "utf-8" | "utf8" | "utf-8-sig" => Ok(Self::Utf8),
            "latin1" | "latin-1" | "iso-8859-1" => Ok(Self::Latin1),
            _ => Err(format!(
                "unsupported encoding '{s}' (expected auto, utf-8 or latin1)"
            )),
        }
    }
}

/// Check if the path is a gzipped file
#[allow(clippy::case_sensitive_file_extension_comparisons)] // Already lowercased
fn is_gzipped(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();
    path_str.ends_with(".gz")
}

/// Read a delimited file into a dataset, detecting the encoding.
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, `ParseError::MissingHeader`
/// if it has no non-empty line, or `ParseError::InvalidFormat` for an
/// unterminated quoted field.
pub fn read_csv_file(path: &Path, delimiter: Option<char>) -> Result<Dataset, ParseError> {
    read_csv_file_with_encoding(path, delimiter, TextEncoding::Auto)
}

/// Read a delimited file into a dataset using the given encoding.
///
/// # Errors
///
/// As [`read_csv_file`], plus `ParseError::InvalidUtf8` when UTF-8 is forced
/// and the file is not valid UTF-8.
pub fn read_csv_file_with_encoding(
    path: &Path,
    delimiter: Option<char>,
    encoding: TextEncoding,
) -> Result<Dataset, ParseError> {
    let bytes = read_bytes(path)?;
    parse_csv_text(&decode_text(&bytes, encoding)?, delimiter)
}

/// Raw file contents, decompressed when the path ends in `.gz`
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read or decompressed.
pub fn read_bytes(path: &Path) -> Result<Vec<u8>, ParseError> {
    if is_gzipped(path) {
        let mut decoder = GzDecoder::new(File::open(path)?);
        let mut bytes = Vec::new();
        decoder.read_to_end(&mut bytes)?;
        Ok(bytes)
    } else {
        Ok(std::fs::read(path)?)
    }
}

/// Decode file bytes. A UTF-8 BOM is dropped unless Latin-1 is forced.
///
/// # Errors
///
/// Returns `ParseError::InvalidUtf8` for invalid bytes under [`TextEncoding::Utf8`].
pub fn decode_text(bytes: &[u8], encoding: TextEncoding) -> Result<String, ParseError> {
    if encoding == TextEncoding::Latin1 {
        return Ok(latin1(bytes));
    }

    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => Ok(text.to_string()),
        Err(e) if encoding == TextEncoding::Utf8 => Err(ParseError::InvalidUtf8(e.valid_up_to())),
        Err(_) => Ok(latin1(bytes)),
    }
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().copied().map(char::from).collect()
}

/// Guess the delimiter from the first non-blank line.
///
/// Picks the candidate occurring most often outside quotes; `,` when none occurs.
#[must_use]
pub fn sniff_delimiter(text: &str) -> char {
    let header = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");

    let mut counts = [0usize; CANDIDATE_DELIMITERS.len()];
    let mut in_quotes = false;
    for c in header.chars() {
        if c == '"' {
            in_quotes = !in_quotes;
        } else if !in_quotes {
            if let Some(i) = CANDIDATE_DELIMITERS.iter().position(|d| *d == c) {
                counts[i] += 1;
            }
        }
    }

    let mut best = 0;
    for i in 1..counts.len() {
        if counts[i] > counts[best] {
            best = i;
        }
    }
    CANDIDATE_DELIMITERS[best]
}

/// Parse delimited text: first non-empty record is the header.
///
/// Only physically empty lines are skipped. A line holding whitespace or a
/// quoted empty value is a record. Short records are padded with empty
/// strings and surplus cells dropped.
///
/// # Errors
///
/// Returns `ParseError::MissingHeader` for blank input or
/// `ParseError::InvalidFormat` for an unterminated quoted field.
pub fn parse_csv_text(text: &str, delimiter: Option<char>) -> Result<Dataset, ParseError> {
    let delimiter = delimiter.unwrap_or_else(|| sniff_delimiter(text));
    let mut records = split_records(text, delimiter)?.into_iter();

    let headers = records.next().ok_or(ParseError::MissingHeader)?;
    Ok(Dataset::from_records(headers, records))
}

/// Split text into records of fields, honoring RFC 4180 quoting.
///
/// A quote only opens a quoted section at the start of a field; `""` inside a
/// quoted section is a literal quote. Empty lines produce no record.
fn split_records(text: &str, delimiter: char) -> Result<Vec<Vec<String>>, ParseError> {
    let mut records = Vec::new();
    let mut fields: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut saw_quote = false;
    let mut quote_line = 0;
    let mut line = 1;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => {
                in_quotes = true;
                saw_quote = true;
                quote_line = line;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\r' | '\n' => {
                if !field.is_empty() || !fields.is_empty() || saw_quote {
                    fields.push(std::mem::take(&mut field));
                    records.push(std::mem::take(&mut fields));
                }
                saw_quote = false;
                line += 1;
            }
            c if c == delimiter => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(ParseError::InvalidFormat(format!(
            "unterminated quoted field starting on line {quote_line}"
        )));
    }
    if !field.is_empty() || !fields.is_empty() || saw_quote {
        fields.push(field);
        records.push(fields);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_csv_text() {
        let csv = "Name,Title,Phone\nAlice,Eng,1234\nBob,Ops,5678\n";
        let ds = parse_csv_text(csv, None).unwrap();
        assert_eq!(ds.headers, vec!["Name", "Title", "Phone"]);
        assert_eq!(ds.rows.len(), 2);
        assert_eq!(ds.rows[1].value("Phone"), "5678");
        assert_eq!(ds.rows[1].source_index, 1);
    }

    #[test]
    fn test_parse_quoted_fields() {
        let csv = "Name,Title\n\"Wong Yuk Ting, Yuki\",\"Senior \"\"Lead\"\"\"\n\"Multi\nLine\",x\n";
        let ds = parse_csv_text(csv, Some(',')).unwrap();
        assert_eq!(ds.rows[0].value("Name"), "Wong Yuk Ting, Yuki");
        assert_eq!(ds.rows[0].value("Title"), "Senior \"Lead\"");
        assert_eq!(ds.rows[1].value("Name"), "Multi\nLine");
    }

    #[test]
    fn test_values_are_not_trimmed() {
        let ds = parse_csv_text("a,b\n x , y\n", None).unwrap();
        assert_eq!(ds.rows[0].value("a"), " x ");
    }

    #[test]
    fn test_blank_lines_and_crlf() {
        let csv = "\r\nName,Phone\r\n\r\nAlice,1\r\nBob,2";
        let ds = parse_csv_text(csv, None).unwrap();
        assert_eq!(ds.headers, vec!["Name", "Phone"]);
        assert_eq!(ds.rows.len(), 2);
        assert_eq!(ds.rows[1].value("Phone"), "2");
    }

    #[test]
    fn test_empty_and_whitespace_values_are_rows() {
        let ds = parse_csv_text("Name\nAlice\n\"\"\n   \nBob\n", Some(',')).unwrap();
        let names: Vec<&str> = ds.rows.iter().map(|r| r.value("Name")).collect();
        assert_eq!(names, vec!["Alice", "", "   ", "Bob"]);
        assert_eq!(ds.rows[3].source_index, 3);
    }

    #[test]
    fn test_quoted_empty_last_line_is_a_row() {
        let ds = parse_csv_text("Name\nAlice\n\"\"", Some(',')).unwrap();
        assert_eq!(ds.rows.len(), 2);
        assert_eq!(ds.rows[1].value("Name"), "");
    }

    #[test]
    fn test_short_and_long_records() {
        let ds = parse_csv_text("a,b,c\n1\n1,2,3,4\n", None).unwrap();
        assert_eq!(ds.rows[0].value("c"), "");
        assert!(ds.rows[0].has_column("c"));
        assert_eq!(ds.rows[1].len(), 3);
    }

    #[test]
    fn test_sniff_delimiter() {
        assert_eq!(sniff_delimiter("a\tb\tc\n1\t2\t3"), '\t');
        assert_eq!(sniff_delimiter("a;b;c"), ';');
        assert_eq!(sniff_delimiter("\"x,y\";b"), ';');
        assert_eq!(sniff_delimiter("single"), ',');
    }

    #[test]
    fn test_unterminated_quote() {
        let err = parse_csv_text("a,b\n\"open,1\n", Some(',')).unwrap_err();
        assert!(matches!(err, ParseError::InvalidFormat(msg) if msg.contains("line 2")));
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(
            parse_csv_text("\n\n", None),
            Err(ParseError::MissingHeader)
        ));
    }

    #[test]
    fn test_decode_bom_and_latin1() {
        assert_eq!(decode_text(b"\xEF\xBB\xBFName", TextEncoding::Auto).unwrap(), "Name");
        assert_eq!(decode_text(b"Caf\xE9", TextEncoding::Auto).unwrap(), "Café");
    }

    #[test]
    fn test_decode_forced_encoding() {
        assert!(matches!(
            decode_text(b"Caf\xE9", TextEncoding::Utf8),
            Err(ParseError::InvalidUtf8(3))
        ));
        // UTF-8 "é" read as Latin-1 yields two characters
        assert_eq!(decode_text("é".as_bytes(), TextEncoding::Latin1).unwrap(), "Ã©");
        assert_eq!(decode_text(b"Caf\xE9", TextEncoding::Latin1).unwrap(), "Café");
    }

    #[test]
    fn test_encoding_from_str() {
        assert_eq!("UTF-8".parse::<TextEncoding>(), Ok(TextEncoding::Utf8));
        assert_eq!("latin-1".parse::<TextEncoding>(), Ok(TextEncoding::Latin1));
        assert_eq!("auto".parse::<TextEncoding>(), Ok(TextEncoding::Auto));
        assert!("cp1252".parse::<TextEncoding>().is_err());
    }

    #[test]
    fn test_read_gzipped_file() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.csv.gz");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(b"Name,Title\nAlice,Eng\n").unwrap();
        encoder.finish().unwrap();

        let ds = read_csv_file(&path, None).unwrap();
        assert_eq!(ds.rows[0].value("Title"), "Eng");
    }
}
