//! `depot facility` command - Sites holding stock and machines

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{list_format, open_project, print_created, refresh_short_ids, register_short_id};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::analytics::inventory_summary;
use crate::core::entity::Entity;
use crate::core::loader::{load_all, load_entity, save_entity};
use crate::core::Config;
use crate::entities::{Facility, Machine, Part};

#[derive(Subcommand, Debug)]
pub enum FacilityCommands {
    /// Register a facility
    New(NewArgs),

    /// List facilities
    List(ListArgs),

    /// Show a facility with its stock and machines
    Show(ShowArgs),
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Facility name
    #[arg(long, short = 'n')]
    pub name: String,

    /// Short site code
    #[arg(long)]
    pub code: Option<String>,

    #[arg(long)]
    pub address: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Facility ID or short ID (@N)
    pub id: String,
}

pub fn run(cmd: FacilityCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        FacilityCommands::New(args) => run_new(args, global),
        FacilityCommands::List(args) => run_list(args, global),
        FacilityCommands::Show(args) => run_show(args, global),
    }
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();

    let mut facility = Facility::new(args.name, config.author());
    facility.code = args.code;
    facility.address = args.address;
    facility.notes = args.notes;

    let issues = facility.validate();
    if !issues.is_empty() {
        return Err(miette::miette!("Invalid facility: {}", issues.join("; ")));
    }

    let path = save_entity(&project, &facility)?;
    let short_id = register_short_id(&project, &facility.id);
    print_created("facility", &short_id, &path, facility.display_name());
    Ok(())
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();
    let mut facilities: Vec<Facility> = load_all(&project);
    facilities.sort_by(|a, b| a.name.cmp(&b.name));

    if args.count {
        println!("{}", facilities.len());
        return Ok(());
    }
    if facilities.is_empty() {
        if !global.quiet {
            println!("No facilities found.");
        }
        return Ok(());
    }

    let parts: Vec<Part> = load_all(&project);
    let machines: Vec<Machine> = load_all(&project);

    match list_format(global, &config) {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&facilities).into_diagnostic()?),
        OutputFormat::Yaml => print!("{}", serde_yml::to_string(&facilities).into_diagnostic()?),
        format => {
            let short_ids = refresh_short_ids(&project, facilities.iter().map(|f| f.id.to_string()));
            let summary = inventory_summary(&parts);

            const COLUMNS: &[ColumnDef] = &[
                ColumnDef::new("code", "CODE", 8),
                ColumnDef::new("name", "NAME", 28),
                ColumnDef::new("parts", "PARTS", 7),
                ColumnDef::new("machines", "MACHINES", 9),
                ColumnDef::new("value", "STOCK VALUE", 14),
            ];
            let rows = facilities.iter().map(|f| {
                let id = f.id.to_string();
                let part_count = parts.iter().filter(|p| p.facility.as_deref() == Some(&id)).count();
                let machine_count = machines
                    .iter()
                    .filter(|m| m.facility.as_deref() == Some(&id))
                    .count();
                let value = summary.value_by_facility.get(&id).copied().unwrap_or(0.0);
                TableRow::new(id.clone(), &short_ids)
                    .cell("code", CellValue::opt_text(f.code.as_deref()))
                    .cell("name", CellValue::Text(f.name.clone()))
                    .cell("parts", CellValue::Number(part_count as i64))
                    .cell("machines", CellValue::Number(machine_count as i64))
                    .cell("value", CellValue::Money(value, config.currency().to_string()))
            });
            TableFormatter::new(COLUMNS, "facility").output(rows, format);
        }
    }
    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();
    let (path, facility) = load_entity::<Facility>(&project, &args.id)?;
    let id = facility.id.to_string();

    match global.format {
        OutputFormat::Yaml => print!("{}", std::fs::read_to_string(&path).into_diagnostic()?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&facility).into_diagnostic()?),
        OutputFormat::Id => println!("{}", facility.id),
        _ => {
            let parts: Vec<Part> = load_all::<Part>(&project)
                .into_iter()
                .filter(|p| p.facility.as_deref() == Some(&id))
                .collect();
            let machines: Vec<Machine> = load_all::<Machine>(&project)
                .into_iter()
                .filter(|m| m.facility.as_deref() == Some(&id))
                .collect();
            let summary = inventory_summary(&parts);

            println!("{}", style("─".repeat(60)).dim());
            println!("{}: {}", style("ID").bold(), style(&id).cyan());
            println!("{}: {}", style("Name").bold(), style(&facility.name).yellow());
            if let Some(ref code) = facility.code {
                println!("{}: {}", style("Code").bold(), code);
            }
            if let Some(ref address) = facility.address {
                println!("{}: {}", style("Address").bold(), address);
            }
            println!("{}", style("─".repeat(60)).dim());
            println!();
            println!(
                "{}: {} parts, {} units, {}",
                style("Stock").bold(),
                summary.part_count,
                summary.total_units,
                config.money(summary.total_value)
            );
            println!("{}: {}", style("Needing reorder").bold(), summary.needing_reorder());

            if !machines.is_empty() {
                println!();
                println!("{} ({}):", style("Machines").bold(), machines.len());
                for m in &machines {
                    println!("  • {} [{}]", m.name, m.machine_status);
                }
            }
            if let Some(ref notes) = facility.notes {
                println!();
                println!("{}", style("Notes:").bold());
                println!("{}", notes);
            }
        }
    }
    Ok(())
}
