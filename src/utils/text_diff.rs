//! Raw line diff of two files, independent of the row model.

use similar::TextDiff;

/// Lines of context around each hunk
pub const CONTEXT_LINES: usize = 3;

/// Unified diff of two texts; empty when they are identical.
#[must_use]
pub fn unified_diff(old: &str, new: &str, old_label: &str, new_label: &str) -> String {
    if old == new {
        return String::new();
    }

    TextDiff::from_lines(old, new)
        .unified_diff()
        .context_radius(CONTEXT_LINES)
        .header(old_label, new_label)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_is_empty() {
        assert!(unified_diff("a\nb\n", "a\nb\n", "old", "new").is_empty());
    }

    #[test]
    fn test_unified_diff_headers_and_lines() {
        let out = unified_diff(
            "Name,Title\nAlice,Eng\n",
            "Name,Title\nAlice,Senior Eng\n",
            "old.csv",
            "new.csv",
        );
        assert!(out.starts_with("--- old.csv\n+++ new.csv\n"));
        assert!(out.contains("-Alice,Eng\n"));
        assert!(out.contains("+Alice,Senior Eng\n"));
        assert!(out.contains(" Name,Title\n"));
    }
}
