//! `depot part` command - Spare part management and stock changes

use clap::{Subcommand, ValueEnum};
use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::Path;

use crate::cli::commands::where_used::collect_references;
use crate::cli::helpers::{
    confirm, expand_reference, forget_short_id, list_format, open_project, opt_float, print_created,
    refresh_short_ids, register_short_id,
};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::entity::Entity;
use crate::core::inventory::{self, MovementContext};
use crate::core::loader::{load_all, load_entity, remove_entity, resolve_id, save_entity};
use crate::core::project::Project;
use crate::core::shortid::ShortIdIndex;
use crate::core::stock::{StockAssessment, StockStatus};
use crate::core::Config;
use crate::entities::facility::Facility;
use crate::entities::movement::Movement;
use crate::entities::part::{Part, PartCategory};
use crate::entities::supplier::Supplier;
use crate::yaml::parse_yaml_file;

#[derive(Subcommand, Debug)]
pub enum PartCommands {
    /// Register a new part
    New(NewArgs),

    /// List parts with stock status
    List(ListArgs),

    /// Show a part with its reorder analysis
    Show(ShowArgs),

    /// Edit a part in your editor
    Edit(ShowArgs),

    /// Update fields from the command line
    Set(SetArgs),

    /// Issue stock (outbound movement)
    Use(MoveArgs),

    /// Receive stock (inbound movement)
    Receive(MoveArgs),

    /// Correct the quantity to a physical count
    Adjust(AdjustArgs),

    /// Delete a part
    Delete(DeleteArgs),
}

/// Sort key for `part list`
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum SortField {
    Number,
    Title,
    Quantity,
    Status,
    Value,
    Cover,
    Created,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Internal part number
    #[arg(long, short = 'n')]
    pub number: String,

    /// Short description
    #[arg(long, short = 't')]
    pub title: String,

    #[arg(long, short = 'c', default_value = "other")]
    pub category: PartCategory,

    /// Units on hand
    #[arg(long, default_value_t = 0)]
    pub qty: u32,

    /// Minimum stock (critical at or below)
    #[arg(long, default_value_t = 0)]
    pub min: u32,

    /// Price per unit
    #[arg(long, default_value_t = 0.0)]
    pub price: f64,

    /// Average units used per week
    #[arg(long, default_value_t = 0.0)]
    pub weekly: f64,

    /// Average units used per month (used when weekly is 0)
    #[arg(long, default_value_t = 0.0)]
    pub monthly: f64,

    /// Replenishment lead time in weeks
    #[arg(long, default_value_t = 0.0)]
    pub lead: f64,

    /// Safety stock in units
    #[arg(long, default_value_t = 0.0)]
    pub safety: f64,

    /// Bin / shelf location
    #[arg(long, short = 'l')]
    pub location: Option<String>,

    /// Facility holding the stock (ID or @N)
    #[arg(long)]
    pub facility: Option<String>,

    /// Preferred supplier (ID or @N)
    #[arg(long)]
    pub supplier: Option<String>,

    /// Supplier's part number
    #[arg(long)]
    pub supplier_pn: Option<String>,

    /// Tags (repeatable or comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub tag: Vec<String>,

    /// Open in editor after creation
    #[arg(long, short = 'e')]
    pub edit: bool,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by stock status
    #[arg(long, short = 's')]
    pub status: Option<StockStatus>,

    /// Only parts that need reordering
    #[arg(long)]
    pub reorder: bool,

    /// Filter by category
    #[arg(long, short = 'c')]
    pub category: Option<PartCategory>,

    /// Filter by facility (ID or @N)
    #[arg(long)]
    pub facility: Option<String>,

    /// Filter by supplier (ID or @N)
    #[arg(long)]
    pub supplier: Option<String>,

    /// Filter by tag
    #[arg(long)]
    pub tag: Option<String>,

    /// Search in part number, title and description
    #[arg(long)]
    pub search: Option<String>,

    /// Sort by field
    #[arg(long, default_value = "number")]
    pub sort: SortField,

    /// Reverse sort order
    #[arg(long, short = 'r')]
    pub reverse: bool,

    /// Limit number of results
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Part ID or short ID (@N)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Part ID or short ID (@N)
    pub id: String,

    #[arg(long)]
    pub number: Option<String>,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub category: Option<PartCategory>,

    #[arg(long)]
    pub min: Option<u32>,

    #[arg(long)]
    pub price: Option<f64>,

    #[arg(long)]
    pub weekly: Option<f64>,

    #[arg(long)]
    pub monthly: Option<f64>,

    #[arg(long)]
    pub lead: Option<f64>,

    #[arg(long)]
    pub safety: Option<f64>,

    #[arg(long)]
    pub location: Option<String>,

    /// Facility (ID or @N)
    #[arg(long)]
    pub facility: Option<String>,

    /// Preferred supplier (ID or @N)
    #[arg(long)]
    pub supplier: Option<String>,

    #[arg(long)]
    pub supplier_pn: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct MoveArgs {
    /// Part ID or short ID (@N)
    pub id: String,

    /// Units to move
    pub quantity: u32,

    /// Why the stock moved
    #[arg(long)]
    pub reason: Option<String>,

    /// Related machine, order or work reference (ID or @N)
    #[arg(long)]
    pub reference: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct AdjustArgs {
    /// Part ID or short ID (@N)
    pub id: String,

    /// Counted quantity
    pub count: u32,

    #[arg(long)]
    pub reason: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Part ID or short ID (@N)
    pub id: String,

    /// Delete even if assemblies, orders or quotes reference the part
    #[arg(long)]
    pub force: bool,

    /// Don't ask for confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

/// A part with its derived stock metrics, for JSON/YAML output
#[derive(Serialize)]
struct PartWithStock<'a> {
    #[serde(flatten)]
    part: &'a Part,
    stock: StockAssessment,
}

/// Run a part subcommand
pub fn run(cmd: PartCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        PartCommands::New(args) => run_new(args, global),
        PartCommands::List(args) => run_list(args, global),
        PartCommands::Show(args) => run_show(args, global),
        PartCommands::Edit(args) => run_edit(args, global),
        PartCommands::Set(args) => run_set(args, global),
        PartCommands::Use(args) => run_move(args, global, Direction::Out),
        PartCommands::Receive(args) => run_move(args, global, Direction::In),
        PartCommands::Adjust(args) => run_adjust(args, global),
        PartCommands::Delete(args) => run_delete(args, global),
    }
}

fn resolve_opt<T: Entity>(project: &Project, reference: Option<&str>) -> Result<Option<String>> {
    reference.map(|r| resolve_id::<T>(project, r)).transpose()
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();

    let mut part = Part::new(args.number, args.title, config.author());
    part.category = args.category;
    part.quantity = args.qty;
    part.min_stock = args.min;
    part.unit_price = args.price;
    part.weekly_usage = args.weekly;
    part.monthly_usage = args.monthly;
    part.lead_time_weeks = args.lead;
    part.safety_stock = args.safety;
    part.location = args.location;
    part.facility = resolve_opt::<Facility>(&project, args.facility.as_deref())?;
    part.supplier = resolve_opt::<Supplier>(&project, args.supplier.as_deref())?;
    part.supplier_part_number = args.supplier_pn;
    part.tags = args.tag;

    let issues = part.validate();
    if !issues.is_empty() {
        return Err(miette::miette!("Invalid part: {}", issues.join("; ")));
    }

    let path = save_entity(&project, &part)?;
    let short_id = register_short_id(&project, &part.id);

    let assessment = part.assess();
    print_created(
        "part",
        &short_id,
        &path,
        &format!("{} {} ({})", part.part_number, part.title, assessment.status),
    );

    if args.edit {
        open_in_editor(&config, &path)?;
    }
    Ok(())
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();

    let facility = resolve_opt::<Facility>(&project, args.facility.as_deref())?;
    let supplier = resolve_opt::<Supplier>(&project, args.supplier.as_deref())?;

    let parts: Vec<Part> = load_all(&project);
    let mut rows: Vec<(Part, StockAssessment)> = parts
        .into_iter()
        .map(|p| {
            let a = p.assess();
            (p, a)
        })
        .filter(|(_, a)| args.status.map_or(true, |s| a.status == s))
        .filter(|(_, a)| !args.reorder || a.status.needs_reorder())
        .filter(|(p, _)| args.category.map_or(true, |c| p.category == c))
        .filter(|(p, _)| facility.as_ref().map_or(true, |f| p.facility.as_ref() == Some(f)))
        .filter(|(p, _)| supplier.as_ref().map_or(true, |s| p.supplier.as_ref() == Some(s)))
        .filter(|(p, _)| {
            args.tag
                .as_ref()
                .map_or(true, |t| p.tags.iter().any(|pt| pt.eq_ignore_ascii_case(t)))
        })
        .filter(|(p, _)| {
            args.search.as_ref().map_or(true, |search| {
                let needle = search.to_lowercase();
                p.part_number.to_lowercase().contains(&needle)
                    || p.title.to_lowercase().contains(&needle)
                    || p.description
                        .as_ref()
                        .map_or(false, |d| d.to_lowercase().contains(&needle))
            })
        })
        .collect();

    match args.sort {
        SortField::Number => rows.sort_by(|a, b| a.0.part_number.cmp(&b.0.part_number)),
        SortField::Title => rows.sort_by(|a, b| a.0.title.cmp(&b.0.title)),
        SortField::Quantity => rows.sort_by(|a, b| a.0.quantity.cmp(&b.0.quantity)),
        SortField::Status => rows.sort_by(|a, b| a.1.status.cmp(&b.1.status)),
        SortField::Value => rows.sort_by(|a, b| a.0.stock_value().total_cmp(&b.0.stock_value())),
        SortField::Cover => rows.sort_by(|a, b| {
            let ca = a.1.weeks_of_cover.unwrap_or(f64::INFINITY);
            let cb = b.1.weeks_of_cover.unwrap_or(f64::INFINITY);
            ca.total_cmp(&cb)
        }),
        SortField::Created => rows.sort_by(|a, b| a.0.created.cmp(&b.0.created)),
    }

    if args.reverse {
        rows.reverse();
    }
    if let Some(limit) = args.limit {
        rows.truncate(limit);
    }

    if args.count {
        println!("{}", rows.len());
        return Ok(());
    }
    if rows.is_empty() {
        if !global.quiet {
            println!("No parts found.");
        }
        return Ok(());
    }

    let short_ids = refresh_short_ids(&project, rows.iter().map(|(p, _)| p.id.to_string()));

    match list_format(global, &config) {
        OutputFormat::Json => {
            let out: Vec<PartWithStock> = rows
                .iter()
                .map(|(part, stock)| PartWithStock { part, stock: *stock })
                .collect();
            println!("{}", serde_json::to_string_pretty(&out).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            let out: Vec<PartWithStock> = rows
                .iter()
                .map(|(part, stock)| PartWithStock { part, stock: *stock })
                .collect();
            print!("{}", serde_yml::to_string(&out).into_diagnostic()?);
        }
        format => {
            const COLUMNS: &[ColumnDef] = &[
                ColumnDef::new("part_number", "NUMBER", 16),
                ColumnDef::new("title", "TITLE", 30),
                ColumnDef::new("qty", "QTY", 8),
                ColumnDef::new("min", "MIN", 6),
                ColumnDef::new("reorder_level", "REORDER", 8),
                ColumnDef::new("status", "STATUS", 16),
                ColumnDef::new("location", "LOCATION", 12),
            ];
            let table_rows = rows.iter().map(|(p, a)| {
                TableRow::new(p.id.to_string(), &short_ids)
                    .cell("part_number", CellValue::Text(p.part_number.clone()))
                    .cell("title", CellValue::Text(p.title.clone()))
                    .cell("qty", CellValue::Number(p.quantity as i64))
                    .cell("min", CellValue::Number(p.min_stock as i64))
                    .cell("reorder_level", CellValue::Number(a.reorder_level as i64))
                    .cell("status", CellValue::Stock(a.status))
                    .cell("location", CellValue::opt_text(p.location.as_deref()))
            });
            TableFormatter::new(COLUMNS, "part").output(table_rows, format);
        }
    }
    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();
    let (path, part) = load_entity::<Part>(&project, &args.id)?;
    let assessment = part.assess();

    match global.format {
        OutputFormat::Yaml => {
            let content = std::fs::read_to_string(&path).into_diagnostic()?;
            print!("{}", content);
        }
        OutputFormat::Json => {
            let out = PartWithStock {
                part: &part,
                stock: assessment,
            };
            println!("{}", serde_json::to_string_pretty(&out).into_diagnostic()?);
        }
        OutputFormat::Id => println!("{}", part.id),
        _ => {
            let short_ids = ShortIdIndex::load(&project);
            println!("{}", style("─".repeat(60)).dim());
            println!("{}: {}", style("ID").bold(), style(&part.id.to_string()).cyan());
            println!(
                "{}: {} {}",
                style("Part").bold(),
                style(&part.part_number).yellow(),
                part.title
            );
            println!("{}: {}", style("Category").bold(), part.category);
            if let Some(ref location) = part.location {
                println!("{}: {}", style("Location").bold(), location);
            }
            if let Some(ref facility) = part.facility {
                println!("{}: {}", style("Facility").bold(), short_ids.display(facility));
            }
            if let Some(ref supplier) = part.supplier {
                let pn = part
                    .supplier_part_number
                    .as_deref()
                    .map(|pn| format!(" ({})", pn))
                    .unwrap_or_default();
                println!("{}: {}{}", style("Supplier").bold(), short_ids.display(supplier), pn);
            }
            println!("{}", style("─".repeat(60)).dim());

            println!();
            println!("{}", style("Stock").bold());
            println!("  On hand:        {}", part.quantity);
            println!("  Minimum:        {}", part.min_stock);
            println!("  Unit price:     {}", config.money(part.unit_price));
            println!("  Stock value:    {}", config.money(part.stock_value()));
            println!(
                "  Usage/week:     {:.2}{}",
                assessment.effective_weekly_usage,
                if part.weekly_usage <= 0.0 && part.monthly_usage > 0.0 {
                    " (from monthly)"
                } else {
                    ""
                }
            );
            println!("  Lead time:      {} weeks", part.lead_time_weeks);
            println!("  Safety stock:   {}", part.safety_stock);
            println!("  Reorder level:  {}", assessment.reorder_level);
            println!("  Weeks of cover: {}", opt_float(assessment.weeks_of_cover, 1));
            println!(
                "  Status:         {}",
                CellValue::Stock(assessment.status).format_tsv(0).trim_end()
            );
            if assessment.suggested_order_qty > 0 {
                println!(
                    "  Suggested order: {} ({})",
                    style(assessment.suggested_order_qty).yellow(),
                    config.money(assessment.suggested_order_qty as f64 * part.unit_price)
                );
            }

            if let Some(ref desc) = part.description {
                if !desc.is_empty() {
                    println!();
                    println!("{}", style("Description:").bold());
                    println!("{}", desc);
                }
            }

            let part_id = part.id.to_string();
            let mut movements: Vec<Movement> = load_all::<Movement>(&project)
                .into_iter()
                .filter(|m| m.part == part_id)
                .collect();
            if !movements.is_empty() {
                movements.sort_by(|a, b| b.created.cmp(&a.created));
                println!();
                println!("{} ({} total):", style("Recent movements").bold(), movements.len());
                for m in movements.iter().take(5) {
                    println!(
                        "  {} {:<6} {:>6}  {} → {}  {}",
                        m.created.format("%Y-%m-%d"),
                        m.kind,
                        m.quantity,
                        m.quantity_before,
                        m.quantity_after,
                        style(m.reason.as_deref().unwrap_or("")).dim()
                    );
                }
            }

            if !part.tags.is_empty() {
                println!();
                println!("{}: {}", style("Tags").bold(), part.tags.join(", "));
            }

            println!("{}", style("─".repeat(60)).dim());
            println!(
                "{}: {} | {}: {} | {}: {}",
                style("Author").dim(),
                part.author,
                style("Created").dim(),
                part.created.format("%Y-%m-%d %H:%M"),
                style("Revision").dim(),
                part.entity_revision
            );
        }
    }
    Ok(())
}

fn open_in_editor(config: &Config, path: &Path) -> Result<()> {
    println!("Opening {} in {}...", style(path.display()).cyan(), style(config.editor()).yellow());
    config.run_editor(path).into_diagnostic()?;

    let edited: Part = parse_yaml_file(path)?;
    let issues = edited.validate();
    if !issues.is_empty() {
        println!("{} Saved with issues:", style("!").yellow());
        for issue in issues {
            println!("  • {}", issue);
        }
    }
    Ok(())
}

fn run_edit(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();
    let (path, _) = load_entity::<Part>(&project, &args.id)?;
    open_in_editor(&config, &path)
}

fn run_set(args: SetArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let (_, mut part) = load_entity::<Part>(&project, &args.id)?;
    let before = part.assess().status;

    if let Some(v) = args.number {
        part.part_number = v;
    }
    if let Some(v) = args.title {
        part.title = v;
    }
    if let Some(v) = args.description {
        part.description = Some(v);
    }
    if let Some(v) = args.category {
        part.category = v;
    }
    if let Some(v) = args.min {
        part.min_stock = v;
    }
    if let Some(v) = args.price {
        part.unit_price = v;
    }
    if let Some(v) = args.weekly {
        part.weekly_usage = v;
    }
    if let Some(v) = args.monthly {
        part.monthly_usage = v;
    }
    if let Some(v) = args.lead {
        part.lead_time_weeks = v;
    }
    if let Some(v) = args.safety {
        part.safety_stock = v;
    }
    if let Some(v) = args.location {
        part.location = Some(v);
    }
    if let Some(ref v) = args.facility {
        part.facility = Some(resolve_id::<Facility>(&project, v)?);
    }
    if let Some(ref v) = args.supplier {
        part.supplier = Some(resolve_id::<Supplier>(&project, v)?);
    }
    if let Some(v) = args.supplier_pn {
        part.supplier_part_number = Some(v);
    }

    let issues = part.validate();
    if !issues.is_empty() {
        return Err(miette::miette!("Invalid part: {}", issues.join("; ")));
    }

    part.touch();
    save_entity(&project, &part)?;

    let after = part.assess();
    println!(
        "{} Updated {} {}",
        style("✓").green(),
        style(&part.part_number).cyan(),
        part.title
    );
    if !global.quiet && after.status != before {
        println!("   Status: {} → {}", before, after.status);
    }
    Ok(())
}

#[derive(Clone, Copy)]
enum Direction {
    In,
    Out,
}

fn run_move(args: MoveArgs, global: &GlobalOpts, direction: Direction) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();
    let (_, mut part) = load_entity::<Part>(&project, &args.id)?;

    let ctx = MovementContext {
        reason: args.reason,
        reference: args.reference.map(|r| expand_reference(&project, &r)),
        author: config.author(),
    };

    let movement = match direction {
        Direction::Out => inventory::use_part(&mut part, args.quantity, ctx)?,
        Direction::In => inventory::receive_part(&mut part, args.quantity, ctx)?,
    };

    save_entity(&project, &part)?;
    save_entity(&project, &movement)?;

    let verb = match direction {
        Direction::Out => "Used",
        Direction::In => "Received",
    };
    report_movement(verb, &part, &movement, global);
    Ok(())
}

fn run_adjust(args: AdjustArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();
    let (_, mut part) = load_entity::<Part>(&project, &args.id)?;

    let ctx = MovementContext {
        reason: args.reason.or_else(|| Some("stock count".to_string())),
        reference: None,
        author: config.author(),
    };
    let movement = inventory::adjust_part(&mut part, args.count, ctx)?;

    save_entity(&project, &part)?;
    save_entity(&project, &movement)?;
    report_movement("Adjusted", &part, &movement, global);
    Ok(())
}

fn report_movement(verb: &str, part: &Part, movement: &Movement, global: &GlobalOpts) {
    println!(
        "{} {} {} × {} ({} → {})",
        style("✓").green(),
        verb,
        movement.quantity,
        style(&part.part_number).cyan(),
        movement.quantity_before,
        movement.quantity_after
    );

    let assessment = part.assess();
    if !global.quiet && assessment.status.needs_reorder() {
        println!(
            "   {} {} (reorder level {}, suggest ordering {})",
            style("!").yellow(),
            assessment.status,
            assessment.reorder_level,
            assessment.suggested_order_qty
        );
    }
}

fn run_delete(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let (_, part) = load_entity::<Part>(&project, &args.id)?;
    let part_id = part.id.to_string();

    let refs: Vec<_> = collect_references(&project, &part_id)
        .into_iter()
        .filter(|r| !r.is_history())
        .collect();
    if !refs.is_empty() && !args.force {
        println!("{} {} is referenced by:", style("!").yellow(), part.part_number);
        for r in &refs {
            println!("  • {}", r);
        }
        return Err(miette::miette!(
            "Refusing to delete a referenced part (use --force to delete anyway)"
        ));
    }

    if !confirm(&format!("Delete part {} ({})?", part.part_number, part.title), args.yes)? {
        println!("Cancelled.");
        return Ok(());
    }

    remove_entity(&project, &part)?;
    forget_short_id(&project, &part_id);

    println!("{} Deleted part {}", style("✓").green(), style(&part.part_number).cyan());
    Ok(())
}
