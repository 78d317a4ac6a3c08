//! `depot hotspot` command - Drawing callouts on assemblies

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::collections::HashMap;

use crate::cli::helpers::{confirm, forget_short_id, list_format, open_project, print_created, refresh_short_ids, register_short_id};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::bom::BomIndex;
use crate::core::entity::Entity;
use crate::core::loader::{load_all, load_entity, remove_entity, resolve_id, save_entity};
use crate::core::Config;
use crate::entities::hotspot::{coordinate_in_range, HotspotTarget};
use crate::entities::{Assembly, Hotspot, Part};

#[derive(Subcommand, Debug)]
pub enum HotspotCommands {
    /// Place a hotspot on an assembly drawing
    New(NewArgs),

    /// List hotspots
    List(ListArgs),

    /// Reposition a hotspot
    Move(MoveArgs),

    /// Delete a hotspot
    Delete(DeleteArgs),
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Assembly whose drawing carries the hotspot (ID or @N)
    pub assembly: String,

    /// Horizontal position, percent of drawing width
    #[arg(long, short = 'x', allow_negative_numbers = true)]
    pub x: f64,

    /// Vertical position, percent of drawing height
    #[arg(long, short = 'y', allow_negative_numbers = true)]
    pub y: f64,

    /// Callout label (e.g. balloon number)
    #[arg(long, short = 'l', default_value = "")]
    pub label: String,

    /// Linked part (ID or @N)
    #[arg(long, conflicts_with = "subassembly", required_unless_present = "subassembly")]
    pub part: Option<String>,

    /// Linked sub-assembly (ID or @N)
    #[arg(long)]
    pub subassembly: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only hotspots on this assembly (ID or @N)
    #[arg(long, short = 'a')]
    pub assembly: Option<String>,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct MoveArgs {
    /// Hotspot ID or short ID (@N)
    pub id: String,

    #[arg(long, short = 'x', allow_negative_numbers = true)]
    pub x: f64,

    #[arg(long, short = 'y', allow_negative_numbers = true)]
    pub y: f64,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Hotspot ID or short ID (@N)
    pub id: String,

    /// Don't ask for confirmation
    #[arg(long)]
    pub yes: bool,
}

pub fn run(cmd: HotspotCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        HotspotCommands::New(args) => run_new(args, global),
        HotspotCommands::List(args) => run_list(args, global),
        HotspotCommands::Move(args) => run_move(args, global),
        HotspotCommands::Delete(args) => run_delete(args, global),
    }
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();

    for (axis, value) in [("x", args.x), ("y", args.y)] {
        if !coordinate_in_range(value) {
            return Err(miette::miette!("{} must be between 0 and 100 (got {})", axis, value));
        }
    }

    let (_, assembly) = load_entity::<Assembly>(&project, &args.assembly)?;
    let mut hotspot = Hotspot::new(assembly.id.to_string(), args.x, args.y, args.label, config.author());
    hotspot.part = args
        .part
        .as_deref()
        .map(|p| resolve_id::<Part>(&project, p))
        .transpose()?;
    hotspot.subassembly = args
        .subassembly
        .as_deref()
        .map(|a| resolve_id::<Assembly>(&project, a))
        .transpose()?;

    let issues = hotspot.validate();
    if !issues.is_empty() {
        return Err(miette::miette!("Invalid hotspot: {}", issues.join("; ")));
    }

    if hotspot.subassembly.is_some() {
        let assemblies: Vec<Assembly> = load_all(&project);
        let mut hotspots: Vec<Hotspot> = load_all(&project);
        hotspots.push(hotspot.clone());
        let index = BomIndex::new(&assemblies, &hotspots);
        if index.has_cycle(&hotspot.assembly) {
            return Err(miette::miette!(
                "Linking this sub-assembly would make '{}' contain itself",
                assembly.title
            ));
        }
    }

    if assembly.drawing.is_none() {
        tracing::warn!(assembly = %assembly.id, "assembly has no drawing yet");
    }

    let path = save_entity(&project, &hotspot)?;
    let short_id = register_short_id(&project, &hotspot.id);
    let detail = format!("{} at ({:.1}, {:.1})", assembly.title, hotspot.x, hotspot.y);
    print_created("hotspot", &short_id, &path, &detail);
    Ok(())
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();
    let assembly = args
        .assembly
        .as_deref()
        .map(|a| resolve_id::<Assembly>(&project, a))
        .transpose()?;

    let mut hotspots: Vec<Hotspot> = load_all::<Hotspot>(&project)
        .into_iter()
        .filter(|h| assembly.as_ref().map_or(true, |a| &h.assembly == a))
        .collect();
    hotspots.sort_by(|a, b| a.assembly.cmp(&b.assembly).then_with(|| a.label.cmp(&b.label)));

    if args.count {
        println!("{}", hotspots.len());
        return Ok(());
    }
    if hotspots.is_empty() {
        if !global.quiet {
            println!("No hotspots found.");
        }
        return Ok(());
    }

    match list_format(global, &config) {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&hotspots).into_diagnostic()?),
        OutputFormat::Yaml => print!("{}", serde_yml::to_string(&hotspots).into_diagnostic()?),
        format => {
            let short_ids = refresh_short_ids(&project, hotspots.iter().map(|h| h.id.to_string()));
            let part_numbers: HashMap<String, String> = load_all::<Part>(&project)
                .into_iter()
                .map(|p| (p.id.to_string(), p.part_number))
                .collect();
            let titles: HashMap<String, String> = load_all::<Assembly>(&project)
                .into_iter()
                .map(|a| (a.id.to_string(), a.title))
                .collect();

            const COLUMNS: &[ColumnDef] = &[
                ColumnDef::new("label", "LABEL", 8),
                ColumnDef::new("assembly", "ASSEMBLY", 24),
                ColumnDef::new("x", "X", 6),
                ColumnDef::new("y", "Y", 6),
                ColumnDef::new("target", "TARGET", 24),
            ];
            let rows = hotspots.iter().map(|h| {
                let target = match h.target() {
                    Some(HotspotTarget::Part(p)) => part_numbers.get(p).cloned().unwrap_or_else(|| p.to_string()),
                    Some(HotspotTarget::Assembly(a)) => {
                        format!("asm: {}", titles.get(a).cloned().unwrap_or_else(|| a.to_string()))
                    }
                    None => "-".to_string(),
                };
                let on = titles.get(&h.assembly).cloned().unwrap_or_else(|| h.assembly.clone());
                TableRow::new(h.id.to_string(), &short_ids)
                    .cell("label", CellValue::Text(h.label.clone()))
                    .cell("assembly", CellValue::Text(on))
                    .cell("x", CellValue::Float(h.x, 1))
                    .cell("y", CellValue::Float(h.y, 1))
                    .cell("target", CellValue::Text(target))
            });
            TableFormatter::new(COLUMNS, "hotspot").output(rows, format);
        }
    }
    Ok(())
}

fn run_move(args: MoveArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let (_, mut hotspot) = load_entity::<Hotspot>(&project, &args.id)?;

    hotspot.move_to(args.x, args.y).map_err(|e| miette::miette!("{}", e))?;
    save_entity(&project, &hotspot)?;
    println!(
        "{} Moved hotspot {} to ({:.1}, {:.1})",
        style("✓").green(),
        style(&hotspot.label).cyan(),
        hotspot.x,
        hotspot.y
    );
    Ok(())
}

fn run_delete(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let (_, hotspot) = load_entity::<Hotspot>(&project, &args.id)?;

    if !confirm(&format!("Delete hotspot '{}'?", hotspot.label), args.yes)? {
        println!("Cancelled.");
        return Ok(());
    }

    remove_entity(&project, &hotspot)?;
    forget_short_id(&project, &hotspot.id.to_string());
    println!("{} Deleted hotspot {}", style("✓").green(), style(&hotspot.label).cyan());
    Ok(())
}
