//! `depot report` command - Markdown reports over stock, usage and purchasing

mod bom;
mod inventory;
mod orders;
mod reorder;
mod usage;

use clap::Subcommand;
use miette::{IntoDiagnostic, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use crate::cli::GlobalOpts;
use crate::core::loader::load_all;
use crate::core::project::Project;
use crate::entities::{Facility, Part, Supplier};

pub use bom::BomArgs;
pub use inventory::InventoryArgs;
pub use orders::OrdersArgs;
pub use reorder::ReorderArgs;
pub use usage::UsageArgs;

#[derive(Subcommand, Debug)]
pub enum ReportCommands {
    /// Stock value and health by status, category and facility
    Inventory(InventoryArgs),

    /// Parts needing reorder with suggested quantities
    Reorder(ReorderArgs),

    /// Actual usage from recorded movements against planned rates
    Usage(UsageArgs),

    /// Purchase order spend and lead times
    Orders(OrdersArgs),

    /// Flattened parts list of an assembly with cost and shortages
    Bom(BomArgs),
}

pub fn run(cmd: ReportCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ReportCommands::Inventory(args) => inventory::run(args, global),
        ReportCommands::Reorder(args) => reorder::run(args, global),
        ReportCommands::Usage(args) => usage::run(args, global),
        ReportCommands::Orders(args) => orders::run(args, global),
        ReportCommands::Bom(args) => bom::run(args, global),
    }
}

// Shared helper functions

pub(crate) fn write_output(content: &str, output_path: Option<PathBuf>) -> Result<()> {
    match output_path {
        Some(path) => {
            let file = File::create(&path).into_diagnostic()?;
            let mut writer = BufWriter::new(file);
            writer.write_all(content.as_bytes()).into_diagnostic()?;
            println!("Report written to: {}", path.display());
        }
        None => {
            print!("{}", content);
        }
    }
    Ok(())
}

/// Display names keyed by record ID, for report columns
pub(crate) struct Names {
    parts: HashMap<String, String>,
    suppliers: HashMap<String, String>,
    facilities: HashMap<String, String>,
}

impl Names {
    pub(crate) fn load(project: &Project) -> Self {
        Self {
            parts: load_all::<Part>(project)
                .into_iter()
                .map(|p| (p.id.to_string(), p.part_number))
                .collect(),
            suppliers: load_all::<Supplier>(project)
                .into_iter()
                .map(|s| (s.id.to_string(), s.name))
                .collect(),
            facilities: load_all::<Facility>(project)
                .into_iter()
                .map(|f| (f.id.to_string(), f.display_name().to_string()))
                .collect(),
        }
    }

    pub(crate) fn part(&self, id: &str) -> String {
        self.parts.get(id).cloned().unwrap_or_else(|| id.to_string())
    }

    pub(crate) fn supplier(&self, id: &str) -> String {
        self.suppliers.get(id).cloned().unwrap_or_else(|| id.to_string())
    }

    pub(crate) fn facility(&self, id: &str) -> String {
        self.facilities.get(id).cloned().unwrap_or_else(|| id.to_string())
    }
}
