//! Inventory value and stock health report

use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::open_project;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::analytics::inventory_summary;
use crate::core::loader::load_all;
use crate::core::stock::StockStatus;
use crate::core::Config;
use crate::entities::Part;

use super::{write_output, Names};

#[derive(clap::Args, Debug)]
pub struct InventoryArgs {
    /// Output to file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

pub fn run(args: InventoryArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();
    let parts: Vec<Part> = load_all(&project);
    let summary = inventory_summary(&parts);

    if matches!(global.format, OutputFormat::Json) {
        let json = serde_json::to_string_pretty(&summary).into_diagnostic()?;
        return write_output(&format!("{}\n", json), args.output);
    }

    let names = Names::load(&project);
    let mut output = String::new();
    output.push_str("# Inventory Report\n\n");
    output.push_str(&format!("- **Parts:** {}\n", summary.part_count));
    output.push_str(&format!("- **Units on hand:** {}\n", summary.total_units));
    output.push_str(&format!("- **Stock value:** {}\n", config.money(summary.total_value)));
    output.push_str(&format!("- **Needing reorder:** {}\n", summary.needing_reorder()));

    output.push_str("\n## Stock Health\n\n");
    let mut builder = Builder::default();
    builder.push_record(["Status", "Parts", "Share"]);
    for status in StockStatus::all() {
        let count = summary.count(status);
        let share = if summary.part_count > 0 {
            format!("{:.0}%", count as f64 * 100.0 / summary.part_count as f64)
        } else {
            "-".to_string()
        };
        builder.push_record([status.to_string(), count.to_string(), share]);
    }
    output.push_str(&builder.build().with(Style::markdown()).to_string());

    output.push_str("\n\n## Value by Category\n\n");
    let mut builder = Builder::default();
    builder.push_record(["Category", "Value"]);
    let mut categories: Vec<(&String, &f64)> = summary.value_by_category.iter().collect();
    categories.sort_by(|a, b| b.1.total_cmp(a.1));
    for (category, value) in categories {
        builder.push_record([category.clone(), config.money(*value)]);
    }
    output.push_str(&builder.build().with(Style::markdown()).to_string());

    output.push_str("\n\n## Value by Facility\n\n");
    let mut builder = Builder::default();
    builder.push_record(["Facility", "Value"]);
    for (facility, value) in &summary.value_by_facility {
        let name = if facility == "unassigned" {
            facility.clone()
        } else {
            names.facility(facility)
        };
        builder.push_record([name, config.money(*value)]);
    }
    output.push_str(&builder.build().with(Style::markdown()).to_string());
    output.push('\n');

    write_output(&output, args.output)
}
