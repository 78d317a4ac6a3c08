//! Shared helper functions for CLI commands
//!
//! This module contains utility functions that are used across multiple
//! command modules to avoid code duplication.

use chrono::NaiveDate;
use clap::ValueEnum;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::Path;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::identity::EntityId;
use crate::core::project::Project;
use crate::core::shortid::ShortIdIndex;
use crate::core::Config;

/// Format a record ID for display, truncating if too long
///
/// IDs longer than 16 characters are truncated to 13 chars with "..." suffix.
pub fn format_short_id_str(id: &str) -> String {
    truncate_str(id, 16)
}

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Locate the project from `--project` or the current directory
pub fn open_project(global: &GlobalOpts) -> Result<Project> {
    let found = match global.project {
        Some(ref path) => Project::discover_from(path),
        None => Project::discover(),
    };
    found.map_err(|e| miette::miette!("{}", e))
}

/// Resolve `auto` for list-style output (TSV unless configured otherwise)
pub fn list_format(global: &GlobalOpts, config: &Config) -> OutputFormat {
    match global.format {
        OutputFormat::Auto => config
            .default_format
            .as_deref()
            .and_then(|f| OutputFormat::from_str(f, true).ok())
            .filter(|f| *f != OutputFormat::Auto)
            .unwrap_or(OutputFormat::Tsv),
        f => f,
    }
}

/// Refresh short IDs for the given records and return the index
pub fn refresh_short_ids(project: &Project, ids: impl IntoIterator<Item = String>) -> ShortIdIndex {
    let mut short_ids = ShortIdIndex::load(project);
    short_ids.ensure_all(ids);
    if let Err(e) = short_ids.save(project) {
        tracing::warn!(error = %e, "could not save short ID index");
    }
    short_ids
}

/// Register a new record's short ID and return its display form
pub fn register_short_id(project: &Project, id: &EntityId) -> String {
    let mut short_ids = ShortIdIndex::load(project);
    let short = short_ids.add(id.to_string());
    if let Err(e) = short_ids.save(project) {
        tracing::warn!(error = %e, "could not save short ID index");
    }
    format!("@{}", short)
}

/// Drop a deleted record's short ID
pub fn forget_short_id(project: &Project, id: &str) {
    let mut short_ids = ShortIdIndex::load(project);
    short_ids.remove(id);
    if let Err(e) = short_ids.save(project) {
        tracing::warn!(error = %e, "could not save short ID index");
    }
}

/// Expand a free-form reference (`@N` or an ID) to a full ID where possible
pub fn expand_reference(project: &Project, reference: &str) -> String {
    ShortIdIndex::load(project)
        .resolve(reference)
        .unwrap_or_else(|| reference.to_string())
}

/// Standard confirmation line after creating a record
pub fn print_created(kind: &str, short_id: &str, path: &Path, detail: &str) {
    println!(
        "{} Created {} {}",
        style("✓").green(),
        kind,
        style(short_id).cyan()
    );
    println!("   {}", style(path.display()).dim());
    if !detail.is_empty() {
        println!("   {}", style(detail).yellow());
    }
}

/// Ask before a destructive action unless `assume_yes`
pub fn confirm(prompt: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .into_diagnostic()
}

/// Parse a `YYYY-MM-DD` date argument
pub fn parse_date(s: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

/// Format an optional float, "-" when absent
pub fn opt_float(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.prec$}", v, prec = precision))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_short_id_str() {
        assert_eq!(format_short_id_str("SHORT"), "SHORT");
        assert_eq!(format_short_id_str("PART-01J123456789ABCDEF12345"), "PART-01J12345...");
        assert_eq!(format_short_id_str("PART-01J123456789"), "PART-01J12345...");
        assert_eq!(format_short_id_str("PART-01J12345678"), "PART-01J12345678");
        // Multi-byte characters are cut on char boundaries
        assert_eq!(format_short_id_str("ÄÄÄÄÄÄÄÄÄÄÄÄÄÄÄÄÄ"), "ÄÄÄÄÄÄÄÄÄÄÄÄÄ...");
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
        assert_eq!(truncate_str("Dichtungsring ø20", 10), "Dichtun...");
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2024-06-01").unwrap(), NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert!(parse_date("06/01/2024").is_err());
    }

    #[test]
    fn test_opt_float() {
        assert_eq!(opt_float(Some(1.234), 1), "1.2");
        assert_eq!(opt_float(None, 1), "-");
    }
}
