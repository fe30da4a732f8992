use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;

use crate::cli::html::{change_badge, escape_html, page, raw_diff_block, summary_cards};
use crate::cli::{
    load_dataset, parse_delimiter, quoted, summary_line, write_output, EncodingArgs, OutputFormat,
};
use crate::core::row::union_columns;
use crate::matching::aggregate::{DiffResult, ModifiedEntry, RowEntry};
use crate::matching::engine::{diff, DiffConfig, DiffMode};
use crate::matching::matcher::DuplicatePolicy;
use crate::parsing::csv::{decode_text, read_bytes, TextEncoding};
use crate::utils::text_diff::unified_diff;

/// Rows printed per section of the text report unless overridden
pub const DEFAULT_MAX_PRINT_ROWS: usize = 1000;

#[derive(Args)]
pub struct DiffArgs {
    /// Old CSV file (optionally gzip compressed)
    #[arg(required = true)]
    pub old: PathBuf,

    /// New CSV file (optionally gzip compressed)
    #[arg(required = true)]
    pub new: PathBuf,

    /// Comma-separated key columns; rows are matched by their values
    #[arg(short, long, value_delimiter = ',')]
    pub key: Vec<String>,

    /// Match rows by position (takes precedence over --key)
    #[arg(long)]
    pub ordered: bool,

    /// Comma-separated fields to compare (default: all columns of either file)
    #[arg(long, value_delimiter = ',')]
    pub fields: Vec<String>,

    /// Fail on the first duplicated key instead of reporting it
    #[arg(long)]
    pub strict_duplicates: bool,

    /// Field delimiter, a single character or "tab" (default: auto-detect)
    #[arg(short, long, value_parser = parse_delimiter)]
    pub delimiter: Option<char>,

    #[command(flatten)]
    pub encoding: EncodingArgs,

    /// Append a unified line diff of the raw file contents
    #[arg(long)]
    pub include_raw_diff: bool,

    /// Maximum rows listed per section of the text report
    #[arg(long, default_value_t = DEFAULT_MAX_PRINT_ROWS)]
    pub max_print_rows: usize,

    /// Write the report to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Run the diff command. Returns whether any difference was found.
pub fn run(args: DiffArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<bool> {
    let old = load_dataset(&args.old, args.delimiter, args.encoding.for_old())?;
    let new = load_dataset(&args.new, args.delimiter, args.encoding.for_new())?;

    if verbose {
        eprintln!(
            "Old: {} rows, {} columns; New: {} rows, {} columns",
            old.len(),
            old.headers.len(),
            new.len(),
            new.headers.len()
        );
    }

    let config = build_config(&args);
    let result = diff(&old, &new, &config).with_context(|| {
        format!(
            "Failed to compare {} with {}",
            args.old.display(),
            args.new.display()
        )
    })?;

    let raw_diff = if args.include_raw_diff {
        Some(raw_file_diff(&args.old, &args.new, &args.encoding)?)
    } else {
        None
    };

    let rendered = match format {
        OutputFormat::Text => render_text(&result, args.max_print_rows, raw_diff.as_deref()),
        OutputFormat::Json => render_json(&args, &config, &result, raw_diff.as_deref())?,
        OutputFormat::Summary => summary_line(&result),
        OutputFormat::Html => render_html(
            &result,
            args.max_print_rows,
            raw_diff.as_deref(),
            &args.old.display().to_string(),
            &args.new.display().to_string(),
        ),
    };
    write_output(args.output.as_ref(), &rendered)?;

    Ok(result.has_differences())
}

fn build_config(args: &DiffArgs) -> DiffConfig {
    let mode = if args.ordered {
        DiffMode::Ordered
    } else if args.key.is_empty() {
        DiffMode::WholeRow
    } else {
        DiffMode::Key(args.key.iter().map(|k| k.trim().to_string()).collect())
    };

    let fields = if args.fields.is_empty() {
        None
    } else {
        Some(args.fields.iter().map(|f| f.trim().to_string()).collect())
    };

    DiffConfig {
        mode,
        fields,
        duplicate_policy: if args.strict_duplicates {
            DuplicatePolicy::Strict
        } else {
            DuplicatePolicy::Record
        },
    }
}

fn raw_file_diff(old: &Path, new: &Path, encoding: &EncodingArgs) -> anyhow::Result<String> {
    let read = |path: &Path, encoding: TextEncoding| -> anyhow::Result<String> {
        let bytes = read_bytes(path).with_context(|| format!("Failed to read {}", path.display()))?;
        decode_text(&bytes, encoding).with_context(|| format!("Failed to decode {}", path.display()))
    };

    Ok(unified_diff(
        &read(old, encoding.for_old())?,
        &read(new, encoding.for_new())?,
        &old.display().to_string(),
        &new.display().to_string(),
    ))
}

fn format_row_entry(label: &str, entry: &RowEntry) -> String {
    let head = format!("- {label} key={}", entry.key);
    if entry.row.is_empty() {
        return head;
    }
    let cells: Vec<String> = entry
        .row
        .iter()
        .map(|(column, value)| format!("{column}={}", quoted(value)))
        .collect();
    format!("{head}: {}", cells.join(", "))
}

fn format_modified_entry(entry: &ModifiedEntry) -> String {
    let mut out = format!("- MODIFIED key={}", entry.key);
    for change in &entry.changes {
        let _ = write!(
            out,
            "\n  - {}: {} -> {}",
            change.field,
            quoted(&change.old),
            quoted(&change.new)
        );
    }
    out
}

fn push_section<T>(
    lines: &mut Vec<String>,
    title: &str,
    items: &[T],
    max_rows: usize,
    format: impl Fn(&T) -> String,
) {
    lines.push(format!("### {title}"));
    if items.is_empty() {
        lines.push("- None".to_string());
        return;
    }
    for item in items.iter().take(max_rows) {
        lines.push(format(item));
    }
    if items.len() > max_rows {
        lines.push(format!(
            "- ... and {} more ({})",
            items.len() - max_rows,
            title.to_lowercase()
        ));
    }
}

/// Render the result as a sectioned text report
pub fn render_text(result: &DiffResult, max_rows: usize, raw_diff: Option<&str>) -> String {
    let mut lines = Vec::new();

    push_section(&mut lines, "Added", &result.added, max_rows, |e| {
        format_row_entry("ADDED", e)
    });
    push_section(&mut lines, "Removed", &result.removed, max_rows, |e| {
        format_row_entry("REMOVED", e)
    });
    push_section(
        &mut lines,
        "Modified",
        &result.modified,
        max_rows,
        format_modified_entry,
    );

    if !result.duplicate_keys.is_empty() {
        lines.push("### Duplicate keys".to_string());
        for dup in &result.duplicate_keys {
            lines.push(format!(
                "- {} key={}: row {} ignored, row {} used",
                dup.side, dup.key, dup.duplicate_index, dup.first_index
            ));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Summary: {} ({} old rows, {} new rows)",
        summary_line(result),
        result.summary.old_rows,
        result.summary.new_rows
    ));

    if let Some(raw) = raw_diff.filter(|r| !r.is_empty()) {
        lines.push(String::new());
        lines.push("### Raw unified diff".to_string());
        lines.push("```diff".to_string());
        lines.push(raw.trim_end().to_string());
        lines.push("```".to_string());
    }

    lines.join("\n")
}

fn push_html_none(body: &mut String) {
    body.push_str("<p class=\"none\">None</p>\n");
}

fn push_html_truncation(body: &mut String, total: usize, max_rows: usize) {
    if total > max_rows {
        let _ = writeln!(
            body,
            "<p class=\"note\">... and {} more</p>",
            total - max_rows
        );
    }
}

fn push_html_rows(body: &mut String, title: &str, class: &str, entries: &[RowEntry], max_rows: usize) {
    let _ = writeln!(body, "<h2>{title} ({})</h2>", entries.len());
    if entries.is_empty() {
        push_html_none(body);
        return;
    }

    let shown = &entries[..entries.len().min(max_rows)];
    let mut columns: Vec<String> = Vec::new();
    for entry in shown {
        let row_columns: Vec<String> = entry.row.columns().map(str::to_string).collect();
        columns = union_columns(&columns, &row_columns);
    }

    body.push_str("<table>\n<tr><th>Key</th>");
    for column in &columns {
        let _ = write!(body, "<th>{}</th>", escape_html(column));
    }
    body.push_str("</tr>\n");
    for entry in shown {
        let _ = write!(
            body,
            "<tr class=\"{class}\"><td>{}</td>",
            escape_html(&entry.key.to_string())
        );
        for column in &columns {
            let _ = write!(
                body,
                "<td class=\"value\">{}</td>",
                escape_html(entry.row.value(column))
            );
        }
        body.push_str("</tr>\n");
    }
    body.push_str("</table>\n");
    push_html_truncation(body, entries.len(), max_rows);
}

fn push_html_modified(body: &mut String, entries: &[ModifiedEntry], max_rows: usize) {
    let _ = writeln!(body, "<h2>Modified ({})</h2>", entries.len());
    if entries.is_empty() {
        push_html_none(body);
        return;
    }

    body.push_str("<table>\n<tr><th>Key</th><th>Field</th><th>Change</th><th>Old</th><th>New</th></tr>\n");
    for entry in entries.iter().take(max_rows) {
        for (i, change) in entry.changes.iter().enumerate() {
            body.push_str("<tr class=\"modified\">");
            if i == 0 {
                let _ = write!(
                    body,
                    "<td rowspan=\"{}\">{}</td>",
                    entry.changes.len(),
                    escape_html(&entry.key.to_string())
                );
            }
            let _ = writeln!(
                body,
                "<td>{}</td><td>{}</td><td class=\"value\">{}</td><td class=\"value\">{}</td></tr>",
                escape_html(&change.field),
                change_badge(&change.kind),
                escape_html(&change.old),
                escape_html(&change.new)
            );
        }
    }
    body.push_str("</table>\n");
    push_html_truncation(body, entries.len(), max_rows);
}

/// Render the result as a standalone HTML page
pub fn render_html(
    result: &DiffResult,
    max_rows: usize,
    raw_diff: Option<&str>,
    old_label: &str,
    new_label: &str,
) -> String {
    let s = &result.summary;
    let mut body = summary_cards(&[
        ("Added", s.added, "added"),
        ("Removed", s.removed, "removed"),
        ("Modified", s.modified, "modified"),
        ("Unchanged", s.unchanged, "unchanged"),
    ]);

    push_html_rows(&mut body, "Added", "added", &result.added, max_rows);
    push_html_rows(&mut body, "Removed", "removed", &result.removed, max_rows);
    push_html_modified(&mut body, &result.modified, max_rows);

    if !result.duplicate_keys.is_empty() {
        body.push_str("<h2>Duplicate keys</h2>\n<ul>\n");
        for dup in &result.duplicate_keys {
            let _ = writeln!(
                body,
                "<li>{} key {}: row {} ignored, row {} used</li>",
                dup.side,
                escape_html(&dup.key.to_string()),
                dup.duplicate_index,
                dup.first_index
            );
        }
        body.push_str("</ul>\n");
    }

    if let Some(raw) = raw_diff {
        body.push_str(&raw_diff_block(raw));
    }

    page(
        "CSV Diff Report",
        &format!("{old_label} -> {new_label}"),
        &body,
    )
}

fn render_json(
    args: &DiffArgs,
    config: &DiffConfig,
    result: &DiffResult,
    raw_diff: Option<&str>,
) -> anyhow::Result<String> {
    let mut output = serde_json::json!({
        "old": {
            "file": args.old.display().to_string(),
            "rows": result.summary.old_rows,
        },
        "new": {
            "file": args.new.display().to_string(),
            "rows": result.summary.new_rows,
        },
        "mode": config.mode,
        "added": result.added,
        "removed": result.removed,
        "modified": result.modified,
        "duplicate_keys": result.duplicate_keys,
        "summary": result.summary,
    });
    if let Some(raw) = raw_diff {
        output["raw_diff"] = serde_json::Value::String(raw.to_string());
    }

    Ok(serde_json::to_string_pretty(&output)?)
}
