//! YAML error diagnostics with source spans

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// YAML syntax or shape error with source location
#[derive(Debug, Error, Diagnostic)]
#[error("invalid record: {message}")]
#[diagnostic(code(depot::yaml::syntax))]
pub struct YamlSyntaxError {
    #[source_code]
    src: NamedSource<String>,

    #[label("problem here")]
    span: SourceSpan,

    #[help]
    help: Option<String>,

    message: String,
}

impl YamlSyntaxError {
    /// Create a syntax error from a serde_yml error
    pub fn from_serde_error(err: &serde_yml::Error, source: &str, filename: &str) -> Self {
        let (line, column) = err
            .location()
            .map(|loc| (loc.line(), loc.column()))
            .unwrap_or((1, 1));

        let offset = line_col_to_offset(source, line, column);
        let message = err.to_string();

        Self {
            src: NamedSource::new(filename, source.to_string()),
            span: SourceSpan::from(offset..offset.saturating_add(1)),
            help: generate_help(&message),
            message,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Error returned when reading a record file
#[derive(Debug, Error, Diagnostic)]
pub enum YamlError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] YamlSyntaxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convert a 1-based line/column to a byte offset, clamped to the source
fn line_col_to_offset(source: &str, line: usize, column: usize) -> usize {
    let line_start = source
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum::<usize>();

    let line_len = source[line_start.min(source.len())..]
        .split('\n')
        .next()
        .map_or(0, str::len);

    (line_start + column.saturating_sub(1).min(line_len)).min(source.len())
}

fn generate_help(message: &str) -> Option<String> {
    let msg = message.to_lowercase();

    if msg.contains("tab") {
        return Some("YAML requires spaces for indentation, not tabs.".to_string());
    }
    if msg.contains("duplicate") {
        return Some("Each field can only appear once in a record.".to_string());
    }
    if msg.contains("invalid type") && msg.contains("u32") {
        return Some("Quantities are whole numbers (e.g. `quantity: 12`).".to_string());
    }
    if msg.contains("invalid type") && msg.contains("f64") {
        return Some("Usage, lead time and price fields are plain numbers (e.g. `weekly_usage: 2.5`).".to_string());
    }
    if msg.contains("unknown variant") {
        return Some("Check the spelling of the enumerated value; allowed values are listed above.".to_string());
    }
    if msg.contains("missing field") {
        return Some("Add the missing field or recreate the record with `depot <type> new`.".to_string());
    }
    if msg.contains("mapping values are not allowed") {
        return Some("You may be missing a space after ':' or have incorrect indentation.".to_string());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col_to_offset() {
        let source = "line1\nline2\nline3";
        assert_eq!(line_col_to_offset(source, 1, 1), 0);
        assert_eq!(line_col_to_offset(source, 2, 1), 6);
        assert_eq!(line_col_to_offset(source, 3, 3), 14);
        assert_eq!(line_col_to_offset(source, 9, 9), source.len());
    }

    #[test]
    fn test_help_generation() {
        assert!(generate_help("found tab character").is_some());
        assert!(generate_help("quantity: invalid type: string \"x\", expected u32").is_some());
        assert!(generate_help("missing field `part`").is_some());
        assert!(generate_help("some random error").is_none());
    }
}
