//! Table formatting utilities for CLI list commands
//!
//! Every `list` subcommand builds [`TableRow`]s and hands them to a
//! [`TableFormatter`], which renders TSV, CSV, Markdown or bare IDs.
//! JSON and YAML output serialize the records themselves and never reach
//! this module.

use chrono::{DateTime, Local, Utc};
use console::style;

use std::io::Write;

use crate::cli::helpers::truncate_str;
use crate::cli::OutputFormat;
use crate::core::shortid::ShortIdIndex;
use crate::core::stock::StockStatus;

/// A typed cell value with semantic meaning for formatting
#[derive(Debug, Clone)]
pub enum CellValue {
    /// Entity ID (truncated to 16 chars, cyan)
    Id(String),
    /// Plain text, truncated to the column
    Text(String),
    /// Stock health, colored by urgency
    Stock(StockStatus),
    /// Workflow state (order, machine, quote) as lowercase text
    State(String),
    /// Money amount, rendered with the configured currency symbol
    Money(f64, String),
    /// DateTime displayed as date only
    Date(DateTime<Utc>),
    /// Integer value
    Number(i64),
    /// Float value with precision
    Float(f64, usize),
    /// Tags as comma-separated
    Tags(Vec<String>),
    /// Empty/placeholder
    Empty,
}

impl CellValue {
    /// Optional text, empty when absent
    pub fn opt_text(value: Option<&str>) -> Self {
        value.map_or(CellValue::Empty, |s| CellValue::Text(s.to_string()))
    }

    /// Format for TSV output (with colors if terminal)
    pub fn format_tsv(&self, width: usize) -> String {
        match self {
            CellValue::Id(id) => {
                let display = if id.len() > 16 {
                    format!("{}...", &id[..13])
                } else {
                    id.clone()
                };
                format!("{:<width$}", style(&display).cyan(), width = width)
            }
            CellValue::Stock(status) => {
                let s = status.to_string();
                let styled = match status {
                    StockStatus::OutOfStock => style(&s).red().bold(),
                    StockStatus::Critical => style(&s).red(),
                    StockStatus::ReorderNeeded => style(&s).yellow(),
                    StockStatus::Healthy => style(&s).green(),
                };
                format!("{:<width$}", styled, width = width)
            }
            CellValue::State(s) => {
                let styled = match s.as_str() {
                    "down" | "cancelled" | "rejected" | "expired" => style(s.as_str()).red(),
                    "maintenance" | "ordered" | "partially_received" | "pending" => {
                        style(s.as_str()).yellow()
                    }
                    "operational" | "received" | "accepted" => style(s.as_str()).green(),
                    _ => style(s.as_str()).dim(),
                };
                format!("{:<width$}", styled, width = width)
            }
            CellValue::Empty => format!("{:<width$}", "-", width = width),
            other => {
                let raw = other.raw();
                format!("{:<width$}", truncate_str(&raw, width.saturating_sub(2)), width = width)
            }
        }
    }

    /// Plain field value for CSV output; quoting is left to the csv writer
    pub fn format_csv(&self) -> String {
        match self {
            CellValue::Stock(status) => status.key().to_string(),
            CellValue::Money(amount, _) => format!("{:.2}", amount),
            other => other.raw(),
        }
    }

    /// Format for Markdown output (no colors, escaped pipes)
    pub fn format_md(&self) -> String {
        let raw = match self {
            CellValue::Empty => "-".to_string(),
            CellValue::Stock(StockStatus::OutOfStock) => "**Out of Stock**".to_string(),
            other => other.raw(),
        };
        raw.replace('|', "\\|")
    }

    /// Get raw string value (no formatting)
    pub fn raw(&self) -> String {
        match self {
            CellValue::Id(id) => id.clone(),
            CellValue::Text(s) => s.clone(),
            CellValue::Stock(status) => status.to_string(),
            CellValue::State(s) => s.clone(),
            CellValue::Money(amount, currency) => format!("{}{:.2}", currency, amount),
            CellValue::Date(dt) => {
                let local: DateTime<Local> = dt.with_timezone(&Local);
                local.format("%Y-%m-%d").to_string()
            }
            CellValue::Number(n) => n.to_string(),
            CellValue::Float(f, precision) => format!("{:.prec$}", f, prec = precision),
            CellValue::Tags(tags) => tags.join(", "),
            CellValue::Empty => String::new(),
        }
    }

    /// Display width of this cell's content (for dynamic column sizing)
    pub fn display_width(&self) -> usize {
        match self {
            CellValue::Id(id) => id.len().min(16),
            CellValue::Date(_) => 10,
            CellValue::Empty => 1,
            other => other.raw().chars().count(),
        }
    }
}

/// Column definition with header label and maximum width
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub key: &'static str,
    pub header: &'static str,
    pub width: usize,
}

impl ColumnDef {
    pub const fn new(key: &'static str, header: &'static str, width: usize) -> Self {
        Self { key, header, width }
    }
}

/// A row of cell values for table output
pub struct TableRow {
    pub short_id: String,
    pub full_id: String,
    pub cells: Vec<(&'static str, CellValue)>,
}

impl TableRow {
    pub fn new(full_id: String, short_ids: &ShortIdIndex) -> Self {
        let short_id = short_ids
            .get_short_id(&full_id)
            .map(|n| format!("@{}", n))
            .unwrap_or_default();
        Self {
            short_id,
            full_id,
            cells: Vec::new(),
        }
    }

    pub fn cell(mut self, key: &'static str, value: CellValue) -> Self {
        self.cells.push((key, value));
        self
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

/// Table formatter that outputs rows in various formats
pub struct TableFormatter<'a> {
    columns: &'a [ColumnDef],
    entity_name: &'static str,
}

impl<'a> TableFormatter<'a> {
    pub fn new(columns: &'a [ColumnDef], entity_name: &'static str) -> Self {
        Self {
            columns,
            entity_name,
        }
    }

    /// Output rows in the specified format
    pub fn output<I>(&self, rows: I, format: OutputFormat)
    where
        I: IntoIterator<Item = TableRow>,
    {
        let rows: Vec<TableRow> = rows.into_iter().collect();

        match format {
            OutputFormat::Csv => self.output_csv(&rows),
            OutputFormat::Md => self.output_md(&rows),
            OutputFormat::Id => {
                for row in &rows {
                    println!("{}", row.full_id);
                }
            }
            _ => self.output_tsv(&rows),
        }
    }

    /// Column widths from content, capped at each column's maximum
    fn calculate_widths(&self, rows: &[TableRow]) -> Vec<usize> {
        let short_width = rows
            .iter()
            .map(|r| r.short_id.len())
            .max()
            .unwrap_or(5)
            .max(5);

        let mut widths = vec![short_width];
        for col in self.columns {
            let max_content = rows
                .iter()
                .filter_map(|r| r.get(col.key))
                .map(CellValue::display_width)
                .max()
                .unwrap_or(0);
            let natural = col.header.len().max(max_content.saturating_add(2));
            widths.push(natural.min(col.width));
        }
        widths
    }

    fn output_tsv(&self, rows: &[TableRow]) {
        let widths = self.calculate_widths(rows);

        let mut header_parts = vec![format!("{:<width$}", style("SHORT").bold().dim(), width = widths[0])];
        for (col, width) in self.columns.iter().zip(&widths[1..]) {
            header_parts.push(format!("{:<width$}", style(col.header).bold(), width = *width));
        }
        println!("{}", header_parts.join(" "));

        let total_width: usize = widths.iter().sum::<usize>() + widths.len() - 1;
        println!("{}", "-".repeat(total_width));

        for row in rows {
            let mut parts = vec![format!("{:<width$}", style(&row.short_id).cyan(), width = widths[0])];
            for (col, width) in self.columns.iter().zip(&widths[1..]) {
                match row.get(col.key) {
                    Some(value) => parts.push(value.format_tsv(*width)),
                    None => parts.push(format!("{:<width$}", "-", width = *width)),
                }
            }
            println!("{}", parts.join(" "));
        }

        println!();
        println!(
            "{} {}(s) found. Use {} to reference by short ID.",
            style(rows.len()).cyan(),
            self.entity_name,
            style("@N").cyan()
        );
    }

    fn output_csv(&self, rows: &[TableRow]) {
        if let Err(e) = self.write_csv(rows, std::io::stdout()) {
            tracing::warn!(error = %e, "could not write CSV output");
        }
    }

    /// Write rows as CSV with a header of column keys
    fn write_csv<W: Write>(&self, rows: &[TableRow], sink: W) -> csv::Result<()> {
        let mut wtr = csv::Writer::from_writer(sink);

        let mut headers = vec!["short_id", "id"];
        headers.extend(self.columns.iter().map(|c| c.key));
        wtr.write_record(&headers)?;

        for row in rows {
            let mut values = vec![row.short_id.clone(), row.full_id.clone()];
            for col in self.columns {
                values.push(row.get(col.key).map(CellValue::format_csv).unwrap_or_default());
            }
            wtr.write_record(&values)?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn output_md(&self, rows: &[TableRow]) {
        let mut headers = vec!["Short", "ID"];
        headers.extend(self.columns.iter().map(|c| c.header));
        println!("| {} |", headers.join(" | "));
        let separators: Vec<&str> = headers.iter().map(|_| "---").collect();
        println!("|{}|", separators.join("|"));

        for row in rows {
            let mut values = vec![row.short_id.clone(), row.full_id.clone()];
            for col in self.columns {
                values.push(row.get(col.key).map_or_else(|| "-".to_string(), CellValue::format_md));
            }
            println!("| {} |", values.join(" | "));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_value_text_format() {
        let cell = CellValue::Text("Hello World".to_string());
        assert!(cell.format_tsv(20).contains("Hello World"));
        assert_eq!(cell.format_csv(), "Hello World");
        assert_eq!(cell.format_md(), "Hello World");
    }

    #[test]
    fn test_stock_cell_formats() {
        let cell = CellValue::Stock(StockStatus::ReorderNeeded);
        assert_eq!(cell.format_csv(), "reorder_needed");
        assert_eq!(cell.format_md(), "Reorder Needed");
        assert_eq!(CellValue::Stock(StockStatus::OutOfStock).format_md(), "**Out of Stock**");
    }

    #[test]
    fn test_money_cell() {
        let cell = CellValue::Money(12.5, "€".into());
        assert_eq!(cell.raw(), "€12.50");
        assert_eq!(cell.format_csv(), "12.50");
    }

    #[test]
    fn test_tags_and_pipes() {
        let cell = CellValue::Tags(vec!["foo".to_string(), "bar".to_string()]);
        assert_eq!(cell.format_csv(), "foo, bar");
        assert_eq!(CellValue::Text("a|b".into()).format_md(), "a\\|b");
        assert_eq!(CellValue::opt_text(None).format_md(), "-");
    }

    #[test]
    fn test_table_row_builder() {
        let mut short_ids = ShortIdIndex::new();
        short_ids.add("PART-123".to_string());
        let row = TableRow::new("PART-123".to_string(), &short_ids)
            .cell("title", CellValue::Text("Seal".to_string()))
            .cell("qty", CellValue::Number(4));

        assert_eq!(row.short_id, "@1");
        assert!(row.get("title").is_some());
        assert!(row.get("missing").is_none());
    }

    #[test]
    fn test_csv_output_quotes_fields() {
        const COLUMNS: &[ColumnDef] = &[
            ColumnDef::new("title", "TITLE", 20),
            ColumnDef::new("tags", "TAGS", 20),
            ColumnDef::new("status", "STATUS", 16),
        ];
        let short_ids = ShortIdIndex::new();
        let rows = vec![TableRow::new("PART-1".to_string(), &short_ids)
            .cell("title", CellValue::Text("Seal \"40mm\"".to_string()))
            .cell("tags", CellValue::Tags(vec!["pump".to_string(), "wet".to_string()]))
            .cell("status", CellValue::Stock(StockStatus::Critical))];

        let mut out = Vec::new();
        TableFormatter::new(COLUMNS, "part").write_csv(&rows, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(
            text,
            "short_id,id,title,tags,status\nPART-1,PART-1,\"Seal \"\"40mm\"\"\",\"pump, wet\",critical\n"
        );
    }
}
