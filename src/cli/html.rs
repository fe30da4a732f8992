//! Shared pieces of the HTML reports.

use std::fmt::Write as _;

use crate::core::types::{ChangeKind, Severity};

const REPORT_CSS: &str = include_str!("templates/report.css");

/// Escape text for use in HTML element content and attribute values
pub(crate) fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Wrap a report body in a standalone page
pub(crate) fn page(title: &str, subtitle: &str, body: &str) -> String {
    let title = escape_html(title);
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n<style>\n{REPORT_CSS}</style>\n</head>\n<body>\n\
         <div class=\"container\">\n<h1>{title}</h1>\n<p class=\"subtitle\">{}</p>\n\
         {body}</div>\n</body>\n</html>\n",
        escape_html(subtitle)
    )
}

/// A row of counters: `(label, count, css class)`
pub(crate) fn summary_cards(cards: &[(&str, usize, &str)]) -> String {
    let mut out = String::from("<div class=\"summary-cards\">\n");
    for (label, count, class) in cards {
        let _ = writeln!(
            out,
            "<div class=\"summary-card\"><span class=\"number {class}\">{count}</span>\
             <span class=\"label\">{}</span></div>",
            escape_html(label)
        );
    }
    out.push_str("</div>\n");
    out
}

/// CSS class of a field change; severities get their own class
pub(crate) fn change_class(kind: &ChangeKind) -> &'static str {
    match kind {
        ChangeKind::Unchanged => "unchanged",
        ChangeKind::Added => "added",
        ChangeKind::Removed => "removed",
        ChangeKind::Modified(None) => "modified",
        ChangeKind::Modified(Some(severity)) => severity_class(*severity),
    }
}

pub(crate) fn severity_class(severity: Severity) -> &'static str {
    match severity {
        Severity::Minor => "minor",
        Severity::Moderate => "moderate",
        Severity::Major => "major",
    }
}

/// Badge labelled with the change kind
pub(crate) fn change_badge(kind: &ChangeKind) -> String {
    format!(
        "<span class=\"badge {}\">{}</span>",
        change_class(kind),
        escape_html(&kind.to_string())
    )
}

/// Highlighted unified diff, or nothing for an empty diff
pub(crate) fn raw_diff_block(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let mut out = String::from("<h2>Raw unified diff</h2>\n<pre class=\"raw-diff\">");
    for line in raw.lines() {
        let class = if line.starts_with("@@") {
            Some("hunk")
        } else if line.starts_with('+') && !line.starts_with("+++") {
            Some("add")
        } else if line.starts_with('-') && !line.starts_with("---") {
            Some("del")
        } else {
            None
        };
        match class {
            Some(class) => {
                let _ = writeln!(out, "<span class=\"{class}\">{}</span>", escape_html(line));
            }
            None => {
                let _ = writeln!(out, "{}", escape_html(line));
            }
        }
    }
    out.push_str("</pre>\n");
    out
}
