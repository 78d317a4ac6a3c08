//! `depot export` command - CSV exports for spreadsheets and ERP imports

use clap::Subcommand;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use crate::cli::helpers::open_project;
use crate::cli::GlobalOpts;
use crate::core::analytics::reorder_list;
use crate::core::loader::{load_all, resolve_id};
use crate::entities::{Movement, Part};

#[derive(Subcommand, Debug)]
pub enum ExportCommands {
    /// All parts with derived stock metrics
    Parts(ExportArgs),

    /// Parts needing reorder with suggested quantities
    Reorder(ExportArgs),

    /// Stock movement history
    Movements(MovementArgs),
}

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    /// Write to file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct MovementArgs {
    /// Only movements of this part (ID or @N)
    #[arg(long, short = 'p')]
    pub part: Option<String>,

    /// Write to file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(Serialize)]
struct PartRecord<'a> {
    id: String,
    part_number: &'a str,
    title: &'a str,
    category: String,
    quantity: u32,
    min_stock: u32,
    unit_price: f64,
    stock_value: f64,
    weekly_usage: f64,
    lead_time_weeks: f64,
    safety_stock: f64,
    reorder_level: u32,
    status: String,
    weeks_of_cover: Option<f64>,
    suggested_order_qty: u32,
    location: Option<&'a str>,
    facility: Option<&'a str>,
    supplier: Option<&'a str>,
    supplier_part_number: Option<&'a str>,
}

impl<'a> PartRecord<'a> {
    fn new(part: &'a Part) -> Self {
        let a = part.assess();
        Self {
            id: part.id.to_string(),
            part_number: &part.part_number,
            title: &part.title,
            category: part.category.to_string(),
            quantity: part.quantity,
            min_stock: part.min_stock,
            unit_price: part.unit_price,
            stock_value: part.stock_value(),
            weekly_usage: a.effective_weekly_usage,
            lead_time_weeks: part.lead_time_weeks,
            safety_stock: part.safety_stock,
            reorder_level: a.reorder_level,
            status: a.status.to_string(),
            weeks_of_cover: a.weeks_of_cover,
            suggested_order_qty: a.suggested_order_qty,
            location: part.location.as_deref(),
            facility: part.facility.as_deref(),
            supplier: part.supplier.as_deref(),
            supplier_part_number: part.supplier_part_number.as_deref(),
        }
    }
}

#[derive(Serialize)]
struct ReorderRecord<'a> {
    part_number: &'a str,
    title: &'a str,
    status: String,
    quantity: u32,
    reorder_level: u32,
    suggested_order_qty: u32,
    unit_price: f64,
    estimated_cost: f64,
    supplier: Option<&'a str>,
    supplier_part_number: Option<&'a str>,
}

#[derive(Serialize)]
struct MovementRecord<'a> {
    id: String,
    date: String,
    part: &'a str,
    part_number: &'a str,
    kind: String,
    quantity: u32,
    quantity_before: u32,
    quantity_after: u32,
    reason: Option<&'a str>,
    reference: Option<&'a str>,
    author: &'a str,
}

pub fn run(cmd: ExportCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ExportCommands::Parts(args) => run_parts(args, global),
        ExportCommands::Reorder(args) => run_reorder(args, global),
        ExportCommands::Movements(args) => run_movements(args, global),
    }
}

/// CSV writer over the output file or stdout
fn writer(output: &Option<PathBuf>) -> Result<csv::Writer<Box<dyn Write>>> {
    let sink: Box<dyn Write> = match output {
        Some(path) => Box::new(File::create(path).into_diagnostic()?),
        None => Box::new(std::io::stdout()),
    };
    Ok(csv::Writer::from_writer(sink))
}

fn finish(mut wtr: csv::Writer<Box<dyn Write>>, output: &Option<PathBuf>, rows: usize, global: &GlobalOpts) -> Result<()> {
    wtr.flush().into_diagnostic()?;
    if let Some(path) = output {
        tracing::info!(rows, path = %path.display(), "export written");
        if !global.quiet {
            eprintln!("Exported {} row(s) to {}", rows, path.display());
        }
    }
    Ok(())
}

fn run_parts(args: ExportArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let mut parts: Vec<Part> = load_all(&project);
    parts.sort_by(|a, b| a.part_number.cmp(&b.part_number));

    let mut wtr = writer(&args.output)?;
    for part in &parts {
        wtr.serialize(PartRecord::new(part)).into_diagnostic()?;
    }
    finish(wtr, &args.output, parts.len(), global)
}

fn run_reorder(args: ExportArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let parts: Vec<Part> = load_all(&project);
    let items = reorder_list(&parts);

    let mut wtr = writer(&args.output)?;
    for item in &items {
        wtr.serialize(ReorderRecord {
            part_number: &item.part.part_number,
            title: &item.part.title,
            status: item.assessment.status.to_string(),
            quantity: item.part.quantity,
            reorder_level: item.assessment.reorder_level,
            suggested_order_qty: item.assessment.suggested_order_qty,
            unit_price: item.part.unit_price,
            estimated_cost: item.suggested_cost(),
            supplier: item.part.supplier.as_deref(),
            supplier_part_number: item.part.supplier_part_number.as_deref(),
        })
        .into_diagnostic()?;
    }
    finish(wtr, &args.output, items.len(), global)
}

fn run_movements(args: MovementArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let part_filter = args
        .part
        .as_deref()
        .map(|p| resolve_id::<Part>(&project, p))
        .transpose()?;

    let mut movements: Vec<Movement> = load_all::<Movement>(&project)
        .into_iter()
        .filter(|m| part_filter.as_ref().map_or(true, |p| &m.part == p))
        .collect();
    movements.sort_by(|a, b| a.created.cmp(&b.created));

    let numbers: HashMap<String, String> = load_all::<Part>(&project)
        .into_iter()
        .map(|p| (p.id.to_string(), p.part_number))
        .collect();

    let mut wtr = writer(&args.output)?;
    for m in &movements {
        wtr.serialize(MovementRecord {
            id: m.id.to_string(),
            date: m.created.to_rfc3339(),
            part: &m.part,
            part_number: numbers.get(&m.part).map_or("", String::as_str),
            kind: m.kind.to_string(),
            quantity: m.quantity,
            quantity_before: m.quantity_before,
            quantity_after: m.quantity_after,
            reason: m.reason.as_deref(),
            reference: m.reference.as_deref(),
            author: &m.author,
        })
        .into_diagnostic()?;
    }
    finish(wtr, &args.output, movements.len(), global)
}
