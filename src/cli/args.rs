//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    asm::AsmCommands, completions::CompletionsArgs, export::ExportCommands,
    facility::FacilityCommands, hotspot::HotspotCommands, init::InitArgs,
    machine::MachineCommands, movement::MovementCommands, order::OrderCommands,
    part::PartCommands, quote::QuoteCommands, report::ReportCommands, status::StatusArgs,
    sup::SupCommands, validate::ValidateArgs, where_used::WhereUsedArgs,
};

#[derive(Parser)]
#[command(name = "depot")]
#[command(author, version, about = "Maintenance warehouse toolkit")]
#[command(long_about = "Track spare parts, machines and purchasing as plain YAML files, with reorder-level analysis over the stock on hand.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug logging on stderr)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Project root (default: auto-detect by finding .depot/)
    #[arg(long, global = true, env = "DEPOT_PROJECT")]
    pub project: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new depot project
    Init(InitArgs),

    /// Spare part management and stock changes
    #[command(subcommand)]
    Part(PartCommands),

    /// Stock movement history
    #[command(subcommand, visible_alias = "mov")]
    Movement(MovementCommands),

    /// Facility (site) management
    #[command(subcommand, visible_alias = "fac")]
    Facility(FacilityCommands),

    /// Machine management
    #[command(subcommand, visible_alias = "mch")]
    Machine(MachineCommands),

    /// Assembly management (machine sub-structures with parts lists)
    #[command(subcommand)]
    Asm(AsmCommands),

    /// Drawing hotspots linking an assembly to parts or sub-assemblies
    #[command(subcommand, visible_alias = "hot")]
    Hotspot(HotspotCommands),

    /// Supplier management
    #[command(subcommand)]
    Sup(SupCommands),

    /// Supplier quotations
    #[command(subcommand)]
    Quote(QuoteCommands),

    /// Purchase orders
    #[command(subcommand, visible_alias = "ord")]
    Order(OrderCommands),

    /// Inventory, reorder, usage, purchasing and BOM reports
    #[command(subcommand)]
    Report(ReportCommands),

    /// Export records as CSV
    #[command(subcommand)]
    Export(ExportCommands),

    /// Find where a record is used/referenced
    WhereUsed(WhereUsedArgs),

    /// Validate project files
    Validate(ValidateArgs),

    /// Show project status dashboard
    Status(StatusArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically detect based on context (pretty for show, tsv for list)
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
    /// Just IDs, one per line
    Id,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        // Catches duplicate short flags between global and subcommand options
        Cli::command().debug_assert();
    }
}
