//! `depot asm` command - Assemblies, their parts lists and cost rollup

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::cli::commands::where_used::collect_references;
use crate::cli::helpers::{
    confirm, forget_short_id, list_format, open_project, print_created, refresh_short_ids, register_short_id,
    truncate_str,
};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::bom::{rollup_cost, shortages, BomIndex};
use crate::core::entity::Entity;
use crate::core::loader::{load_all, load_entity, remove_entity, resolve_id, save_entity};
use crate::core::project::Project;
use crate::core::shortid::ShortIdIndex;
use crate::core::Config;
use crate::entities::{Assembly, Hotspot, Machine, Part};

#[derive(Subcommand, Debug)]
pub enum AsmCommands {
    /// Create an assembly
    New(NewArgs),

    /// List assemblies
    List(ListArgs),

    /// Show an assembly with its parts list
    Show(IdArgs),

    /// Edit an assembly in your editor
    Edit(IdArgs),

    /// Add parts to an assembly's parts list
    #[command(name = "add")]
    AddPart(AddPartArgs),

    /// Remove parts from an assembly's parts list
    #[command(name = "rm")]
    RemovePart(RemovePartArgs),

    /// Show the flattened parts list including sub-assemblies
    Bom(SetArgs),

    /// Cost of one or more complete sets at current prices
    Cost(SetArgs),

    /// Delete an assembly
    Delete(DeleteArgs),
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Assembly title
    #[arg(long, short = 't')]
    pub title: String,

    /// Machine the assembly belongs to (ID or @N)
    #[arg(long, short = 'm')]
    pub machine: Option<String>,

    /// Parent assembly (ID or @N)
    #[arg(long)]
    pub parent: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// Path to the exploded-view drawing
    #[arg(long)]
    pub drawing: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only assemblies of this machine (ID or @N)
    #[arg(long, short = 'm')]
    pub machine: Option<String>,

    /// Only top-level assemblies
    #[arg(long)]
    pub top: bool,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct IdArgs {
    /// Assembly ID or short ID (@N)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct AddPartArgs {
    /// Assembly ID or short ID (@N)
    pub assembly: String,

    /// Parts as ID:QTY pairs (e.g. @3:2 or PART-xxx:4), quantity defaults to 1
    #[arg(required = true)]
    pub items: Vec<String>,

    /// Fitting notes for the added lines
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct RemovePartArgs {
    /// Assembly ID or short ID (@N)
    pub assembly: String,

    /// Parts to remove (ID or @N)
    #[arg(required = true)]
    pub parts: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Assembly ID or short ID (@N)
    pub id: String,

    /// Number of complete sets
    #[arg(long, default_value_t = 1)]
    pub qty: u32,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Assembly ID or short ID (@N)
    pub id: String,

    /// Delete even if sub-assemblies or hotspots reference it
    #[arg(long)]
    pub force: bool,

    /// Don't ask for confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

/// One line of a flattened parts list
#[derive(Debug, Serialize)]
struct BomRow {
    part: String,
    part_number: String,
    title: String,
    quantity: u32,
    on_hand: u32,
    unit_price: f64,
    line_cost: f64,
}

/// Parse an ID:QTY pair (e.g. "@3:2" or "PART-xxx:4"); quantity defaults to 1
fn parse_bom_item(input: &str) -> Result<(String, u32)> {
    if let Some((id, qty_str)) = input.rsplit_once(':') {
        if let Ok(qty) = qty_str.parse::<u32>() {
            if qty == 0 {
                return Err(miette::miette!("Quantity for '{}' must be greater than zero", id));
            }
            return Ok((id.to_string(), qty));
        }
    }
    Ok((input.to_string(), 1))
}

/// Run an assembly subcommand
pub fn run(cmd: AsmCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        AsmCommands::New(args) => run_new(args, global),
        AsmCommands::List(args) => run_list(args, global),
        AsmCommands::Show(args) => run_show(args, global),
        AsmCommands::Edit(args) => run_edit(args, global),
        AsmCommands::AddPart(args) => run_add_part(args, global),
        AsmCommands::RemovePart(args) => run_remove_part(args, global),
        AsmCommands::Bom(args) => run_bom(args, global),
        AsmCommands::Cost(args) => run_cost(args, global),
        AsmCommands::Delete(args) => run_delete(args, global),
    }
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();

    let mut assembly = Assembly::new(args.title, config.author());
    assembly.machine = args
        .machine
        .as_deref()
        .map(|m| resolve_id::<Machine>(&project, m))
        .transpose()?;
    if let Some(ref parent_ref) = args.parent {
        let (_, parent) = load_entity::<Assembly>(&project, parent_ref)?;
        // Sub-assemblies inherit the parent's machine unless given one
        if assembly.machine.is_none() {
            assembly.machine = parent.machine.clone();
        }
        assembly.parent = Some(parent.id.to_string());
    }
    assembly.description = args.description;
    assembly.drawing = args.drawing;

    let issues = assembly.validate();
    if !issues.is_empty() {
        return Err(miette::miette!("Invalid assembly: {}", issues.join("; ")));
    }

    let path = save_entity(&project, &assembly)?;
    let short_id = register_short_id(&project, &assembly.id);
    print_created("assembly", &short_id, &path, &assembly.title);
    Ok(())
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();
    let machine = args
        .machine
        .as_deref()
        .map(|m| resolve_id::<Machine>(&project, m))
        .transpose()?;

    let mut assemblies: Vec<Assembly> = load_all::<Assembly>(&project)
        .into_iter()
        .filter(|a| machine.as_ref().map_or(true, |m| a.machine.as_ref() == Some(m)))
        .filter(|a| !args.top || a.parent.is_none())
        .collect();
    assemblies.sort_by(|a, b| a.title.cmp(&b.title));

    if args.count {
        println!("{}", assemblies.len());
        return Ok(());
    }
    if assemblies.is_empty() {
        if !global.quiet {
            println!("No assemblies found.");
        }
        return Ok(());
    }

    match list_format(global, &config) {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&assemblies).into_diagnostic()?),
        OutputFormat::Yaml => print!("{}", serde_yml::to_string(&assemblies).into_diagnostic()?),
        format => {
            let short_ids = refresh_short_ids(&project, assemblies.iter().map(|a| a.id.to_string()));
            let machine_names: HashMap<String, String> = load_all::<Machine>(&project)
                .into_iter()
                .map(|m| (m.id.to_string(), m.name))
                .collect();

            const COLUMNS: &[ColumnDef] = &[
                ColumnDef::new("title", "TITLE", 28),
                ColumnDef::new("machine", "MACHINE", 20),
                ColumnDef::new("parent", "PARENT", 10),
                ColumnDef::new("lines", "LINES", 6),
            ];
            let rows = assemblies.iter().map(|a| {
                let machine = a
                    .machine
                    .as_ref()
                    .map(|m| machine_names.get(m).cloned().unwrap_or_else(|| m.clone()));
                let parent = a.parent.as_ref().map(|p| short_ids.display(p));
                TableRow::new(a.id.to_string(), &short_ids)
                    .cell("title", CellValue::Text(a.title.clone()))
                    .cell("machine", CellValue::opt_text(machine.as_deref()))
                    .cell("parent", CellValue::opt_text(parent.as_deref()))
                    .cell("lines", CellValue::Number(a.bom.len() as i64))
            });
            TableFormatter::new(COLUMNS, "assembly").output(rows, format);
        }
    }
    Ok(())
}

fn run_show(args: IdArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();
    let (path, assembly) = load_entity::<Assembly>(&project, &args.id)?;

    match global.format {
        OutputFormat::Yaml => print!("{}", std::fs::read_to_string(&path).into_diagnostic()?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&assembly).into_diagnostic()?),
        OutputFormat::Id => println!("{}", assembly.id),
        _ => {
            let short_ids = ShortIdIndex::load(&project);
            let parts: Vec<Part> = load_all(&project);
            let part_map: HashMap<String, &Part> = parts.iter().map(|p| (p.id.to_string(), p)).collect();
            let id = assembly.id.to_string();

            println!("{}", style("─".repeat(60)).dim());
            println!("{}: {}", style("ID").bold(), style(&id).cyan());
            println!("{}: {}", style("Title").bold(), style(&assembly.title).yellow());
            if let Some(ref machine) = assembly.machine {
                println!("{}: {}", style("Machine").bold(), short_ids.display(machine));
            }
            if let Some(ref parent) = assembly.parent {
                println!("{}: {}", style("Parent").bold(), short_ids.display(parent));
            }
            if let Some(ref drawing) = assembly.drawing {
                println!("{}: {}", style("Drawing").bold(), drawing);
            }
            println!("{}", style("─".repeat(60)).dim());

            println!();
            println!("{} ({} lines):", style("Parts").bold(), assembly.bom.len());
            for line in &assembly.bom {
                let (number, title, on_hand) = match part_map.get(&line.part) {
                    Some(p) => (p.part_number.as_str(), p.title.as_str(), Some(p.quantity)),
                    None => ("?", "(missing part)", None),
                };
                let stock = match on_hand {
                    Some(q) if q < line.quantity => style(format!("{} on hand", q)).red().to_string(),
                    Some(q) => style(format!("{} on hand", q)).dim().to_string(),
                    None => String::new(),
                };
                println!(
                    "  {:>4} × {:<16} {:<30} {}",
                    line.quantity,
                    number,
                    truncate_str(title, 30),
                    stock
                );
                if let Some(ref notes) = line.notes {
                    println!("         {}", style(notes).dim());
                }
            }

            let hotspots: Vec<Hotspot> = load_all::<Hotspot>(&project)
                .into_iter()
                .filter(|h| h.assembly == id)
                .collect();
            if !hotspots.is_empty() {
                println!();
                println!("{} ({}):", style("Hotspots").bold(), hotspots.len());
                for h in &hotspots {
                    let target = h.part.as_ref().or(h.subassembly.as_ref());
                    println!(
                        "  {:<6} ({:>5.1}, {:>5.1}) → {}",
                        h.label,
                        h.x,
                        h.y,
                        target.map_or_else(|| "-".to_string(), |t| short_ids.display(t))
                    );
                }
            }

            let assemblies: Vec<Assembly> = load_all(&project);
            let all_hotspots: Vec<Hotspot> = load_all(&project);
            let index = BomIndex::new(&assemblies, &all_hotspots);
            let children = index.children(&id);
            if !children.is_empty() {
                println!();
                println!("{} ({}):", style("Sub-assemblies").bold(), children.len());
                for child in children {
                    let title = index.get(child).map_or("(missing)", |a| a.title.as_str());
                    println!("  • {} {}", style(short_ids.display(child)).cyan(), title);
                }
            }
            let totals = index.flatten(&id);
            let (cost, _) = rollup_cost(&totals, &part_map);
            println!();
            println!("{}: {}", style("Set cost").bold(), config.money(cost));
        }
    }
    Ok(())
}

fn run_edit(args: IdArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();
    let (path, _) = load_entity::<Assembly>(&project, &args.id)?;
    println!("Opening {} in {}...", style(path.display()).cyan(), style(config.editor()).yellow());
    config.run_editor(&path).into_diagnostic()?;
    Ok(())
}

fn run_add_part(args: AddPartArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let (_, mut assembly) = load_entity::<Assembly>(&project, &args.assembly)?;

    let mut added = Vec::new();
    for item in &args.items {
        let (reference, qty) = parse_bom_item(item)?;
        let (_, part) = load_entity::<Part>(&project, &reference)?;
        assembly.add_part(part.id.to_string(), qty, args.notes.clone());
        added.push((part.part_number, qty));
    }

    save_entity(&project, &assembly)?;
    tracing::info!(assembly = %assembly.id, lines = added.len(), "parts added");
    for (number, qty) in added {
        println!(
            "{} Added {} × {} to {}",
            style("✓").green(),
            qty,
            style(number).cyan(),
            assembly.title
        );
    }
    Ok(())
}

fn run_remove_part(args: RemovePartArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let (_, mut assembly) = load_entity::<Assembly>(&project, &args.assembly)?;

    let mut removed = 0;
    for reference in &args.parts {
        let part_id = resolve_id::<Part>(&project, reference)?;
        if assembly.remove_part(&part_id) {
            removed += 1;
        } else {
            println!("{} {} is not on the parts list", style("!").yellow(), reference);
        }
    }

    if removed > 0 {
        save_entity(&project, &assembly)?;
        println!(
            "{} Removed {} line(s) from {}",
            style("✓").green(),
            removed,
            assembly.title
        );
    }
    Ok(())
}

/// Load the project structure and flatten one assembly for `sets` units
fn flattened_rows(project: &Project, assembly: &Assembly, sets: u32) -> (Vec<BomRow>, bool) {
    let assemblies: Vec<Assembly> = load_all(project);
    let hotspots: Vec<Hotspot> = load_all(project);
    let parts: Vec<Part> = load_all(project);
    let part_map: HashMap<String, &Part> = parts.iter().map(|p| (p.id.to_string(), p)).collect();

    let index = BomIndex::new(&assemblies, &hotspots);
    let id = assembly.id.to_string();
    let cycle = index.has_cycle(&id);

    let rows = index
        .flatten(&id)
        .into_iter()
        .map(|(part_id, qty)| {
            let quantity = qty.saturating_mul(sets);
            match part_map.get(&part_id) {
                Some(p) => BomRow {
                    part: part_id.clone(),
                    part_number: p.part_number.clone(),
                    title: p.title.clone(),
                    quantity,
                    on_hand: p.quantity,
                    unit_price: p.unit_price,
                    line_cost: p.unit_price * quantity as f64,
                },
                None => BomRow {
                    part: part_id.clone(),
                    part_number: "?".to_string(),
                    title: "(missing part)".to_string(),
                    quantity,
                    on_hand: 0,
                    unit_price: 0.0,
                    line_cost: 0.0,
                },
            }
        })
        .collect();
    (rows, cycle)
}

fn run_bom(args: SetArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();
    let (_, assembly) = load_entity::<Assembly>(&project, &args.id)?;
    let (rows, cycle) = flattened_rows(&project, &assembly, args.qty);

    if cycle {
        println!(
            "{} assembly structure loops back on itself; repeated branches are skipped",
            style("!").yellow()
        );
    }

    match list_format(global, &config) {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows).into_diagnostic()?),
        OutputFormat::Yaml => print!("{}", serde_yml::to_string(&rows).into_diagnostic()?),
        format => {
            let short_ids = refresh_short_ids(&project, rows.iter().map(|r| r.part.clone()));
            const COLUMNS: &[ColumnDef] = &[
                ColumnDef::new("number", "PART #", 16),
                ColumnDef::new("title", "TITLE", 30),
                ColumnDef::new("qty", "QTY", 6),
                ColumnDef::new("on_hand", "ON HAND", 8),
                ColumnDef::new("short", "SHORT", 6),
            ];
            let table_rows = rows.iter().map(|r| {
                let short = r.quantity.saturating_sub(r.on_hand);
                TableRow::new(r.part.clone(), &short_ids)
                    .cell("number", CellValue::Text(r.part_number.clone()))
                    .cell("title", CellValue::Text(r.title.clone()))
                    .cell("qty", CellValue::Number(r.quantity as i64))
                    .cell("on_hand", CellValue::Number(r.on_hand as i64))
                    .cell(
                        "short",
                        if short > 0 {
                            CellValue::Number(short as i64)
                        } else {
                            CellValue::Empty
                        },
                    )
            });
            TableFormatter::new(COLUMNS, "part").output(table_rows, format);
        }
    }
    Ok(())
}

fn run_cost(args: SetArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();
    let (_, assembly) = load_entity::<Assembly>(&project, &args.id)?;

    let assemblies: Vec<Assembly> = load_all(&project);
    let hotspots: Vec<Hotspot> = load_all(&project);
    let parts: Vec<Part> = load_all(&project);
    let part_map: HashMap<String, &Part> = parts.iter().map(|p| (p.id.to_string(), p)).collect();
    let index = BomIndex::new(&assemblies, &hotspots);

    let id = assembly.id.to_string();
    let totals: BTreeMap<String, u32> = index
        .flatten(&id)
        .into_iter()
        .map(|(part, qty)| (part, qty.saturating_mul(args.qty)))
        .collect();
    let (cost, missing) = rollup_cost(&totals, &part_map);
    let short = shortages(&totals, &part_map);

    if matches!(global.format, OutputFormat::Json) {
        let value = serde_json::json!({
            "assembly": id,
            "sets": args.qty,
            "cost": cost,
            "currency": config.currency(),
            "missing_parts": missing,
            "short_parts": short.iter().map(|(p, need, have)| serde_json::json!({
                "part": p, "needed": need, "on_hand": have,
            })).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&value).into_diagnostic()?);
        return Ok(());
    }

    println!(
        "{} × {}: {}",
        args.qty,
        style(&assembly.title).yellow(),
        style(config.money(cost)).bold()
    );
    if !missing.is_empty() {
        println!(
            "{} {} part(s) on the parts list no longer exist and count as zero",
            style("!").yellow(),
            missing.len()
        );
    }
    if short.is_empty() {
        println!("{} Stock covers {} set(s)", style("✓").green(), args.qty);
    } else {
        println!("{} Short of {} part(s):", style("✗").red(), short.len());
        for (part, needed, on_hand) in &short {
            println!(
                "  • {} need {}, have {}",
                part_map.get(part).map_or(part.as_str(), |p| p.part_number.as_str()),
                needed,
                on_hand
            );
        }
    }
    Ok(())
}

fn run_delete(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let (_, assembly) = load_entity::<Assembly>(&project, &args.id)?;
    let id = assembly.id.to_string();

    let refs: Vec<_> = collect_references(&project, &id)
        .into_iter()
        .filter(|r| !r.is_history())
        .collect();
    if !refs.is_empty() && !args.force {
        for r in &refs {
            println!("  • {}", r);
        }
        return Err(miette::miette!(
            "Assembly '{}' still has {} reference(s) (use --force to delete anyway)",
            assembly.title,
            refs.len()
        ));
    }

    if !confirm(&format!("Delete assembly {}?", assembly.title), args.yes)? {
        println!("Cancelled.");
        return Ok(());
    }

    remove_entity(&project, &assembly)?;
    forget_short_id(&project, &id);
    println!("{} Deleted assembly {}", style("✓").green(), style(&assembly.title).cyan());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bom_item() {
        assert_eq!(parse_bom_item("@3:2").unwrap(), ("@3".to_string(), 2));
        assert_eq!(parse_bom_item("PART-01ABC").unwrap(), ("PART-01ABC".to_string(), 1));
        assert_eq!(parse_bom_item("PART-01ABC:12").unwrap(), ("PART-01ABC".to_string(), 12));
        assert!(parse_bom_item("@1:0").is_err());
    }
}
