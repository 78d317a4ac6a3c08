//! `depot movement` command - Stock movement history

use clap::Subcommand;
use miette::{IntoDiagnostic, Result};
use std::collections::HashMap;

use crate::cli::helpers::{expand_reference, list_format, open_project, refresh_short_ids};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::loader::{load_all, resolve_id};
use crate::core::Config;
use crate::entities::movement::{Movement, MovementKind};
use crate::entities::part::Part;

#[derive(Subcommand, Debug)]
pub enum MovementCommands {
    /// List stock movements, newest first
    List(ListArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only movements of this part (ID or @N)
    #[arg(long, short = 'p')]
    pub part: Option<String>,

    /// Only this kind (in, out, adjust)
    #[arg(long, short = 'k')]
    pub kind: Option<MovementKind>,

    /// Only movements linked to this machine/order reference
    #[arg(long)]
    pub reference: Option<String>,

    /// Only movements from the last N days
    #[arg(long)]
    pub days: Option<u32>,

    /// Limit number of results
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

pub fn run(cmd: MovementCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        MovementCommands::List(args) => run_list(args, global),
    }
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();

    let part_filter = args
        .part
        .as_deref()
        .map(|p| resolve_id::<Part>(&project, p))
        .transpose()?;
    let reference = args.reference.as_deref().map(|r| expand_reference(&project, r));
    let cutoff = args
        .days
        .map(|days| chrono::Utc::now() - chrono::Duration::days(days as i64));

    let mut movements: Vec<Movement> = load_all::<Movement>(&project)
        .into_iter()
        .filter(|m| part_filter.as_ref().map_or(true, |p| &m.part == p))
        .filter(|m| args.kind.map_or(true, |k| m.kind == k))
        .filter(|m| reference.as_ref().map_or(true, |r| m.reference.as_ref() == Some(r)))
        .filter(|m| cutoff.map_or(true, |c| m.created >= c))
        .collect();

    movements.sort_by(|a, b| b.created.cmp(&a.created));
    if let Some(limit) = args.limit {
        movements.truncate(limit);
    }

    if args.count {
        println!("{}", movements.len());
        return Ok(());
    }
    if movements.is_empty() {
        if !global.quiet {
            println!("No movements found.");
        }
        return Ok(());
    }

    match list_format(global, &config) {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&movements).into_diagnostic()?),
        OutputFormat::Yaml => print!("{}", serde_yml::to_string(&movements).into_diagnostic()?),
        format => {
            let part_numbers: HashMap<String, String> = load_all::<Part>(&project)
                .into_iter()
                .map(|p| (p.id.to_string(), p.part_number))
                .collect();
            let short_ids = refresh_short_ids(&project, movements.iter().map(|m| m.id.to_string()));

            const COLUMNS: &[ColumnDef] = &[
                ColumnDef::new("date", "DATE", 12),
                ColumnDef::new("part", "PART", 16),
                ColumnDef::new("kind", "KIND", 8),
                ColumnDef::new("qty", "QTY", 8),
                ColumnDef::new("change", "CHANGE", 14),
                ColumnDef::new("reason", "REASON", 28),
                ColumnDef::new("author", "AUTHOR", 14),
            ];
            let rows = movements.iter().map(|m| {
                let part = part_numbers.get(&m.part).cloned().unwrap_or_else(|| m.part.clone());
                TableRow::new(m.id.to_string(), &short_ids)
                    .cell("date", CellValue::Date(m.created))
                    .cell("part", CellValue::Text(part))
                    .cell("kind", CellValue::State(m.kind.to_string()))
                    .cell("qty", CellValue::Number(m.quantity as i64))
                    .cell(
                        "change",
                        CellValue::Text(format!("{} → {}", m.quantity_before, m.quantity_after)),
                    )
                    .cell("reason", CellValue::opt_text(m.reason.as_deref()))
                    .cell("author", CellValue::Text(m.author.clone()))
            });
            TableFormatter::new(COLUMNS, "movement").output(rows, format);
        }
    }
    Ok(())
}
