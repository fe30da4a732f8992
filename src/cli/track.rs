use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, ValueEnum};

use crate::cli::html::{change_badge, change_class, escape_html, page, severity_class, summary_cards};
use crate::cli::{
    load_dataset, parse_delimiter, summary_line, write_output, EncodingArgs, OutputFormat,
};
use crate::core::row::Row;
use crate::matching::aggregate::{DiffResult, ModifiedEntry};
use crate::matching::engine::{ChangeTracker, TrackerConfig};
use crate::matching::matcher::{DuplicatePolicy, UnresolvedPolicy};

#[derive(Args)]
pub struct TrackArgs {
    /// Old roster CSV file (optionally gzip compressed)
    #[arg(required = true)]
    pub old: PathBuf,

    /// New roster CSV file (optionally gzip compressed)
    #[arg(required = true)]
    pub new: PathBuf,

    /// TOML file with tracker settings; flags given here override it
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Comma-separated fields to track
    #[arg(long, value_delimiter = ',')]
    pub fields: Vec<String>,

    /// Column holding the primary name of each entity
    #[arg(long)]
    pub name_column: Option<String>,

    /// Column holding the secondary (e.g. Chinese) name
    #[arg(long, conflicts_with = "no_secondary")]
    pub secondary_column: Option<String>,

    /// Identify entities by the primary name only
    #[arg(long)]
    pub no_secondary: bool,

    /// Minimum similarity of a Minor change
    #[arg(long)]
    pub minor: Option<f64>,

    /// Minimum similarity of a Moderate change
    #[arg(long)]
    pub moderate: Option<f64>,

    /// What to do with rows that have no name
    #[arg(long)]
    pub unresolved: Option<UnresolvedChoice>,

    /// Fail on the first duplicated entity instead of reporting it
    #[arg(long)]
    pub strict_duplicates: bool,

    /// Field delimiter, a single character or "tab" (default: auto-detect)
    #[arg(short, long, value_parser = parse_delimiter)]
    pub delimiter: Option<char>,

    #[command(flatten)]
    pub encoding: EncodingArgs,

    /// Write the report to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum UnresolvedChoice {
    /// Stop with an error listing the offending rows
    Abort,
    /// Set the rows aside and report them
    Bucket,
}

impl From<UnresolvedChoice> for UnresolvedPolicy {
    fn from(choice: UnresolvedChoice) -> Self {
        match choice {
            UnresolvedChoice::Abort => Self::Abort,
            UnresolvedChoice::Bucket => Self::Bucket,
        }
    }
}

/// Run the track command. Returns whether any common entity changed.
pub fn run(args: TrackArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<bool> {
    let config = build_config(&args)?;
    let tracker = ChangeTracker::with_config(config);

    let old = load_dataset(&args.old, args.delimiter, args.encoding.for_old())?;
    let new = load_dataset(&args.new, args.delimiter, args.encoding.for_new())?;

    if verbose {
        eprintln!(
            "Tracking {} field(s) by '{}' across {} old and {} new rows",
            tracker.config().fields.len(),
            tracker.config().name_column,
            old.len(),
            new.len()
        );
    }

    let result = tracker.track(&old, &new).with_context(|| {
        format!(
            "Failed to track changes from {} to {}",
            args.old.display(),
            args.new.display()
        )
    })?;

    let generated = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let rendered = match format {
        OutputFormat::Text => render_text(&result, tracker.config(), &generated),
        OutputFormat::Html => render_html(&result, tracker.config(), &generated),
        OutputFormat::Json => render_json(&args, tracker.config(), &result)?,
        OutputFormat::Summary => summary_line(&result),
    };
    write_output(args.output.as_ref(), &rendered)?;

    Ok(result.summary.modified > 0)
}

fn load_config_file(path: &Path) -> anyhow::Result<TrackerConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("Failed to parse config {}", path.display()))
}

fn build_config(args: &TrackArgs) -> anyhow::Result<TrackerConfig> {
    let mut config = match &args.config {
        Some(path) => load_config_file(path)?,
        None => TrackerConfig::default(),
    };

    if !args.fields.is_empty() {
        config.fields = args.fields.iter().map(|f| f.trim().to_string()).collect();
    }
    if let Some(name) = &args.name_column {
        config.name_column.clone_from(name);
    }
    if args.no_secondary {
        config.secondary_column = None;
    } else if let Some(secondary) = &args.secondary_column {
        config.secondary_column = Some(secondary.clone());
    }
    if let Some(minor) = args.minor {
        config.thresholds.minor = minor;
    }
    if let Some(moderate) = args.moderate {
        config.thresholds.moderate = moderate;
    }
    if let Some(choice) = args.unresolved {
        config.unresolved_policy = choice.into();
    }
    if args.strict_duplicates {
        config.duplicate_policy = DuplicatePolicy::Strict;
    }

    config.validate()?;
    Ok(config)
}

/// Display name of an entity: primary name, then the secondary name in parentheses
fn entity_label(row: &Row, config: &TrackerConfig) -> String {
    let name = row.value(&config.name_column);
    match config.secondary_column.as_deref().map(|c| row.value(c)) {
        Some(secondary) if !secondary.is_empty() => format!("{name} ({secondary})"),
        _ => name.to_string(),
    }
}

fn format_similarity(score: Option<f64>) -> String {
    score.map_or_else(|| "N/A".to_string(), |s| format!("{s:.2}"))
}

/// Render the tracker result as a plain text report
pub fn render_text(result: &DiffResult, config: &TrackerConfig, generated: &str) -> String {
    let rule = "=".repeat(80);
    let thin = "-".repeat(40);
    let s = &result.summary;
    let mut lines = vec![
        rule.clone(),
        "ROSTER CHANGE TRACKING REPORT".to_string(),
        format!("Generated: {generated}"),
        rule.clone(),
        String::new(),
        "SUMMARY STATISTICS:".to_string(),
        thin.clone(),
        format!("Total records in old list: {}", s.old_rows),
        format!("Total records in new list: {}", s.new_rows),
        format!("Common entities (analyzed): {}", s.matched),
        format!("New joiners (ignored): {}", s.added),
        format!("Leavers (ignored): {}", s.removed),
        format!("Entities with changes: {}", s.modified),
        format!("Total field changes: {}", s.field_changes),
        format!(
            "By worst change: {} minor, {} moderate, {} major, {} other",
            s.by_severity.minor, s.by_severity.moderate, s.by_severity.major, s.by_severity.unscored
        ),
    ];
    if s.duplicates > 0 {
        lines.push(format!("Duplicate entities (later rows ignored): {}", s.duplicates));
    }
    if s.unresolved > 0 {
        lines.push(format!("Rows without a name (set aside): {}", s.unresolved));
    }

    lines.push(String::new());
    lines.push("DETAILED CHANGES BY ENTITY:".to_string());
    lines.push(rule);
    lines.push(String::new());

    if result.modified.is_empty() {
        lines.push("No changes detected.".to_string());
    }
    for (i, entry) in result.modified.iter().enumerate() {
        push_entry(&mut lines, i + 1, entry, config, &thin);
    }

    if !result.duplicate_keys.is_empty() {
        lines.push("DUPLICATE ENTITIES:".to_string());
        lines.push(thin.clone());
        for dup in &result.duplicate_keys {
            lines.push(format!(
                "   {} ({} file): row {} ignored, row {} used",
                dup.key, dup.side, dup.duplicate_index, dup.first_index
            ));
        }
        lines.push(String::new());
    }

    if !result.unresolved.is_empty() {
        lines.push("ROWS WITHOUT A NAME:".to_string());
        lines.push(thin);
        for unresolved in &result.unresolved {
            lines.push(format!(
                "   {} file, row {}",
                unresolved.side, unresolved.row.source_index
            ));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

fn push_entry(
    lines: &mut Vec<String>,
    number: usize,
    entry: &ModifiedEntry,
    config: &TrackerConfig,
    thin: &str,
) {
    lines.push(format!("{number}. {}", entity_label(&entry.old_row, config)));
    lines.push(thin.to_string());
    for change in &entry.changes {
        lines.push(format!("   Field: {}", change.field));
        lines.push(format!("   Type: {}", change.kind));
        lines.push(format!("   Old: '{}'", change.old));
        lines.push(format!("   New: '{}'", change.new));
        lines.push(format!("   Similarity: {}", format_similarity(change.similarity)));
        lines.push(String::new());
    }
    lines.push(String::new());
}

/// Render the tracker result as a standalone HTML page
pub fn render_html(result: &DiffResult, config: &TrackerConfig, generated: &str) -> String {
    let s = &result.summary;
    let mut body = summary_cards(&[
        ("Records in old list", s.old_rows, ""),
        ("Records in new list", s.new_rows, ""),
        ("Common entities", s.matched, ""),
        ("New joiners (ignored)", s.added, "added"),
        ("Leavers (ignored)", s.removed, "removed"),
        ("Entities with changes", s.modified, "modified"),
        ("Field changes", s.field_changes, ""),
    ]);
    body.push_str("<h2>By worst change</h2>\n");
    body.push_str(&summary_cards(&[
        ("Minor (possible typo)", s.by_severity.minor, "minor"),
        ("Moderate", s.by_severity.moderate, "moderate"),
        ("Major", s.by_severity.major, "major"),
        ("Other", s.by_severity.unscored, ""),
    ]));

    body.push_str("<h2>Detailed changes by entity</h2>\n");
    if result.modified.is_empty() {
        body.push_str("<p class=\"none\">No changes detected.</p>\n");
    }
    for (i, entry) in result.modified.iter().enumerate() {
        push_html_entry(&mut body, i + 1, entry, config);
    }

    if !result.duplicate_keys.is_empty() {
        body.push_str("<h2>Duplicate entities</h2>\n<ul>\n");
        for dup in &result.duplicate_keys {
            let _ = writeln!(
                body,
                "<li>{} ({} file): row {} ignored, row {} used</li>",
                escape_html(&dup.key.to_string()),
                dup.side,
                dup.duplicate_index,
                dup.first_index
            );
        }
        body.push_str("</ul>\n");
    }

    if !result.unresolved.is_empty() {
        body.push_str("<h2>Rows without a name</h2>\n<ul>\n");
        for unresolved in &result.unresolved {
            let _ = writeln!(
                body,
                "<li>{} file, row {}</li>",
                unresolved.side, unresolved.row.source_index
            );
        }
        body.push_str("</ul>\n");
    }

    page(
        "Roster Change Tracking Report",
        &format!("Generated: {generated}"),
        &body,
    )
}

fn push_html_entry(body: &mut String, number: usize, entry: &ModifiedEntry, config: &TrackerConfig) {
    let worst = entry
        .worst_severity()
        .map(|severity| {
            format!(
                " <span class=\"badge {}\">{}</span>",
                severity_class(severity),
                escape_html(&severity.to_string())
            )
        })
        .unwrap_or_default();
    let _ = writeln!(
        body,
        "<h3>{number}. {}{worst}</h3>",
        escape_html(&entity_label(&entry.old_row, config))
    );

    body.push_str(
        "<table>\n<tr><th>Field</th><th>Type</th><th>Old</th><th>New</th><th>Similarity</th></tr>\n",
    );
    for change in &entry.changes {
        let _ = writeln!(
            body,
            "<tr class=\"{}\"><td>{}</td><td>{}</td><td class=\"value\">{}</td>\
             <td class=\"value\">{}</td><td>{}</td></tr>",
            change_class(&change.kind),
            escape_html(&change.field),
            change_badge(&change.kind),
            escape_html(&change.old),
            escape_html(&change.new),
            format_similarity(change.similarity)
        );
    }
    body.push_str("</table>\n");
}

fn render_json(
    args: &TrackArgs,
    config: &TrackerConfig,
    result: &DiffResult,
) -> anyhow::Result<String> {
    let changes: Vec<serde_json::Value> = result
        .modified
        .iter()
        .map(|entry| {
            let secondary = config
                .secondary_column
                .as_deref()
                .map(|c| entry.old_row.value(c))
                .unwrap_or_default();
            serde_json::json!({
                "entity": entry.old_row.value(&config.name_column),
                "secondary_name": secondary,
                "key": entry.key,
                "old_index": entry.old_index,
                "new_index": entry.new_index,
                "worst_severity": entry.worst_severity(),
                "changes": entry.changes,
            })
        })
        .collect();

    let output = serde_json::json!({
        "generated": chrono::Local::now().to_rfc3339(),
        "old": {
            "file": args.old.display().to_string(),
            "rows": result.summary.old_rows,
        },
        "new": {
            "file": args.new.display().to_string(),
            "rows": result.summary.new_rows,
        },
        "config": config,
        "statistics": result.summary,
        "changes": changes,
        "duplicate_keys": result.duplicate_keys,
        "unresolved": result.unresolved,
    });

    Ok(serde_json::to_string_pretty(&output)?)
}
