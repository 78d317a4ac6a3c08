//! `depot machine` command - Equipment maintained from stock

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::collections::HashMap;

use crate::cli::commands::where_used::collect_references;
use crate::cli::helpers::{
    confirm, forget_short_id, list_format, open_project, print_created, refresh_short_ids, register_short_id,
};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::bom::{rollup_cost, shortages, BomIndex};
use crate::core::entity::Entity;
use crate::core::loader::{load_all, load_entity, remove_entity, resolve_id, save_entity};
use crate::core::shortid::ShortIdIndex;
use crate::core::Config;
use crate::entities::machine::{Machine, MachineStatus};
use crate::entities::{Assembly, Facility, Hotspot, Part};

#[derive(Subcommand, Debug)]
pub enum MachineCommands {
    /// Register a machine
    New(NewArgs),

    /// List machines
    List(ListArgs),

    /// Show a machine with its assemblies and parts
    Show(IdArgs),

    /// Edit a machine in your editor
    Edit(IdArgs),

    /// Change the operating status
    Status(StatusArgs),

    /// Delete a machine
    Delete(DeleteArgs),
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Machine name
    #[arg(long, short = 'n')]
    pub name: String,

    #[arg(long)]
    pub model: Option<String>,

    #[arg(long)]
    pub manufacturer: Option<String>,

    #[arg(long)]
    pub serial: Option<String>,

    /// Facility (ID or @N)
    #[arg(long)]
    pub facility: Option<String>,

    #[arg(long, default_value = "operational")]
    pub status: MachineStatus,

    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by status
    #[arg(long, short = 's')]
    pub status: Option<MachineStatus>,

    /// Filter by facility (ID or @N)
    #[arg(long)]
    pub facility: Option<String>,

    /// Search in name, model and manufacturer
    #[arg(long)]
    pub search: Option<String>,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct IdArgs {
    /// Machine ID or short ID (@N)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct StatusArgs {
    /// Machine ID or short ID (@N)
    pub id: String,

    /// New status (operational, maintenance, down, retired)
    pub status: MachineStatus,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Machine ID or short ID (@N)
    pub id: String,

    /// Delete even if assemblies still belong to the machine
    #[arg(long)]
    pub force: bool,

    /// Don't ask for confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(cmd: MachineCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        MachineCommands::New(args) => run_new(args, global),
        MachineCommands::List(args) => run_list(args, global),
        MachineCommands::Show(args) => run_show(args, global),
        MachineCommands::Edit(args) => run_edit(args, global),
        MachineCommands::Status(args) => run_status(args, global),
        MachineCommands::Delete(args) => run_delete(args, global),
    }
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();

    let mut machine = Machine::new(args.name, config.author());
    machine.model = args.model;
    machine.manufacturer = args.manufacturer;
    machine.serial_number = args.serial;
    machine.facility = args
        .facility
        .as_deref()
        .map(|f| resolve_id::<Facility>(&project, f))
        .transpose()?;
    machine.machine_status = args.status;
    machine.notes = args.notes;

    let issues = machine.validate();
    if !issues.is_empty() {
        return Err(miette::miette!("Invalid machine: {}", issues.join("; ")));
    }

    let path = save_entity(&project, &machine)?;
    let short_id = register_short_id(&project, &machine.id);
    print_created("machine", &short_id, &path, &machine.name);
    Ok(())
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();
    let facility = args
        .facility
        .as_deref()
        .map(|f| resolve_id::<Facility>(&project, f))
        .transpose()?;

    let mut machines: Vec<Machine> = load_all::<Machine>(&project)
        .into_iter()
        .filter(|m| args.status.map_or(true, |s| m.machine_status == s))
        .filter(|m| facility.as_ref().map_or(true, |f| m.facility.as_ref() == Some(f)))
        .filter(|m| {
            args.search.as_ref().map_or(true, |search| {
                let needle = search.to_lowercase();
                [Some(&m.name), m.model.as_ref(), m.manufacturer.as_ref()]
                    .into_iter()
                    .flatten()
                    .any(|field| field.to_lowercase().contains(&needle))
            })
        })
        .collect();
    machines.sort_by(|a, b| a.name.cmp(&b.name));

    if args.count {
        println!("{}", machines.len());
        return Ok(());
    }
    if machines.is_empty() {
        if !global.quiet {
            println!("No machines found.");
        }
        return Ok(());
    }

    match list_format(global, &config) {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&machines).into_diagnostic()?),
        OutputFormat::Yaml => print!("{}", serde_yml::to_string(&machines).into_diagnostic()?),
        format => {
            let short_ids = refresh_short_ids(&project, machines.iter().map(|m| m.id.to_string()));
            let assemblies: Vec<Assembly> = load_all(&project);

            const COLUMNS: &[ColumnDef] = &[
                ColumnDef::new("name", "NAME", 28),
                ColumnDef::new("model", "MODEL", 16),
                ColumnDef::new("status", "STATUS", 13),
                ColumnDef::new("assemblies", "ASSEMBLIES", 11),
            ];
            let rows = machines.iter().map(|m| {
                let id = m.id.to_string();
                let asm_count = assemblies
                    .iter()
                    .filter(|a| a.machine.as_deref() == Some(&id))
                    .count();
                TableRow::new(id, &short_ids)
                    .cell("name", CellValue::Text(m.name.clone()))
                    .cell("model", CellValue::opt_text(m.model.as_deref()))
                    .cell("status", CellValue::State(m.machine_status.to_string()))
                    .cell("assemblies", CellValue::Number(asm_count as i64))
            });
            TableFormatter::new(COLUMNS, "machine").output(rows, format);
        }
    }
    Ok(())
}

fn run_show(args: IdArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();
    let (path, machine) = load_entity::<Machine>(&project, &args.id)?;

    match global.format {
        OutputFormat::Yaml => print!("{}", std::fs::read_to_string(&path).into_diagnostic()?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&machine).into_diagnostic()?),
        OutputFormat::Id => println!("{}", machine.id),
        _ => {
            let short_ids = ShortIdIndex::load(&project);
            println!("{}", style("─".repeat(60)).dim());
            println!("{}: {}", style("ID").bold(), style(&machine.id.to_string()).cyan());
            println!("{}: {}", style("Name").bold(), style(&machine.name).yellow());
            println!(
                "{}: {}",
                style("Status").bold(),
                CellValue::State(machine.machine_status.to_string()).format_tsv(0).trim_end()
            );
            for (label, value) in [
                ("Model", &machine.model),
                ("Manufacturer", &machine.manufacturer),
                ("Serial", &machine.serial_number),
            ] {
                if let Some(v) = value {
                    println!("{}: {}", style(label).bold(), v);
                }
            }
            if let Some(ref facility) = machine.facility {
                println!("{}: {}", style("Facility").bold(), short_ids.display(facility));
            }
            println!("{}", style("─".repeat(60)).dim());

            let assemblies: Vec<Assembly> = load_all(&project);
            let hotspots: Vec<Hotspot> = load_all(&project);
            let parts: Vec<Part> = load_all(&project);
            let index = BomIndex::new(&assemblies, &hotspots);
            let part_map: HashMap<String, &Part> = parts.iter().map(|p| (p.id.to_string(), p)).collect();

            let roots = index.roots_for_machine(&machine.id.to_string());
            if roots.is_empty() {
                println!();
                println!("{}", style("No assemblies recorded.").dim());
            }
            for root in roots {
                let root_id = root.id.to_string();
                println!();
                for node in index.walk(&root_id) {
                    let marker = if node.cycle { " (cycle)" } else { "" };
                    println!(
                        "{}{} {}{}",
                        "  ".repeat(node.depth),
                        style(short_ids.display(&node.assembly.id.to_string())).cyan(),
                        node.assembly.title,
                        style(marker).red()
                    );
                }
                let totals = index.flatten(&root_id);
                let (cost, _) = rollup_cost(&totals, &part_map);
                let short = shortages(&totals, &part_map);
                println!(
                    "  {} distinct parts, {} per set{}",
                    totals.len(),
                    config.money(cost),
                    if short.is_empty() {
                        String::new()
                    } else {
                        format!(", {} short", style(short.len()).red())
                    }
                );
            }

            if let Some(ref notes) = machine.notes {
                println!();
                println!("{}", style("Notes:").bold());
                println!("{}", notes);
            }
        }
    }
    Ok(())
}

fn run_edit(args: IdArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();
    let (path, _) = load_entity::<Machine>(&project, &args.id)?;
    println!("Opening {} in {}...", style(path.display()).cyan(), style(config.editor()).yellow());
    config.run_editor(&path).into_diagnostic()?;
    Ok(())
}

fn run_status(args: StatusArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let (_, mut machine) = load_entity::<Machine>(&project, &args.id)?;
    let before = machine.machine_status;

    if before == args.status {
        println!("{} is already {}", machine.name, before);
        return Ok(());
    }

    machine.machine_status = args.status;
    machine.entity_revision += 1;
    save_entity(&project, &machine)?;
    tracing::info!(machine = %machine.id, from = %before, to = %args.status, "machine status changed");

    println!(
        "{} {} {} → {}",
        style("✓").green(),
        style(&machine.name).cyan(),
        before,
        args.status
    );
    Ok(())
}

fn run_delete(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let (_, machine) = load_entity::<Machine>(&project, &args.id)?;
    let id = machine.id.to_string();

    let refs: Vec<_> = collect_references(&project, &id)
        .into_iter()
        .filter(|r| !r.is_history())
        .collect();
    if !refs.is_empty() && !args.force {
        for r in &refs {
            println!("  • {}", r);
        }
        return Err(miette::miette!(
            "Machine '{}' still has {} reference(s) (use --force to delete anyway)",
            machine.name,
            refs.len()
        ));
    }

    if !confirm(&format!("Delete machine {}?", machine.name), args.yes)? {
        println!("Cancelled.");
        return Ok(());
    }

    remove_entity(&project, &machine)?;
    forget_short_id(&project, &id);
    println!("{} Deleted machine {}", style("✓").green(), style(&machine.name).cyan());
    Ok(())
}
