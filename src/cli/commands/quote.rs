//! `depot quote` command - Supplier price offers

use chrono::{NaiveDate, Utc};
use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::collections::HashMap;

use crate::cli::helpers::{
    list_format, open_project, opt_float, parse_date, print_created, refresh_short_ids, register_short_id,
};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::analytics::best_quotes;
use crate::core::entity::Entity;
use crate::core::loader::{load_all, load_entity, resolve_id, save_entity};
use crate::core::shortid::ShortIdIndex;
use crate::core::Config;
use crate::entities::quote::QuoteStatus;
use crate::entities::{Part, Quote, Supplier};

#[derive(Subcommand, Debug)]
pub enum QuoteCommands {
    /// Record a supplier quote
    New(NewArgs),

    /// List quotes
    List(ListArgs),

    /// Show a quote
    Show(IdArgs),

    /// Accept, reject or expire a quote
    Status(StatusArgs),

    /// Compare quotes for a part, cheapest first
    Compare(CompareArgs),
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Supplier (ID or @N)
    #[arg(long, short = 's')]
    pub supplier: String,

    /// Part (ID or @N)
    #[arg(long, short = 'p')]
    pub part: String,

    /// Quoted price per unit
    #[arg(long)]
    pub price: f64,

    /// Quantity the price applies to
    #[arg(long, default_value_t = 1)]
    pub qty: u32,

    /// Quoted lead time in weeks
    #[arg(long)]
    pub lead: Option<f64>,

    /// Last day the offer holds (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub valid_until: Option<NaiveDate>,

    /// Supplier's quote number
    #[arg(long)]
    pub reference: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only quotes for this part (ID or @N)
    #[arg(long, short = 'p')]
    pub part: Option<String>,

    /// Only quotes from this supplier (ID or @N)
    #[arg(long, short = 's')]
    pub supplier: Option<String>,

    /// Filter by status
    #[arg(long)]
    pub status: Option<QuoteStatus>,

    /// Only quotes usable today
    #[arg(long)]
    pub valid: bool,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct IdArgs {
    /// Quote ID or short ID (@N)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct StatusArgs {
    /// Quote ID or short ID (@N)
    pub id: String,

    /// New status (pending, accepted, rejected, expired)
    pub status: QuoteStatus,

    /// On accept, copy price and supplier onto the part
    #[arg(long)]
    pub apply: bool,
}

#[derive(clap::Args, Debug)]
pub struct CompareArgs {
    /// Part ID or short ID (@N)
    pub part: String,

    /// Include expired and rejected quotes
    #[arg(long)]
    pub all: bool,
}

pub fn run(cmd: QuoteCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        QuoteCommands::New(args) => run_new(args, global),
        QuoteCommands::List(args) => run_list(args, global),
        QuoteCommands::Show(args) => run_show(args, global),
        QuoteCommands::Status(args) => run_status(args, global),
        QuoteCommands::Compare(args) => run_compare(args, global),
    }
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();

    let supplier = resolve_id::<Supplier>(&project, &args.supplier)?;
    let (_, part) = load_entity::<Part>(&project, &args.part)?;

    let mut quote = Quote::new(supplier, part.id.to_string(), args.price, config.author());
    quote.quantity = args.qty;
    quote.lead_time_weeks = args.lead;
    quote.valid_until = args.valid_until;
    quote.reference = args.reference;
    quote.notes = args.notes;

    let issues = quote.validate();
    if !issues.is_empty() {
        return Err(miette::miette!("Invalid quote: {}", issues.join("; ")));
    }

    let path = save_entity(&project, &quote)?;
    let short_id = register_short_id(&project, &quote.id);
    let detail = format!("{} at {} / unit", part.part_number, config.money(quote.unit_price));
    print_created("quote", &short_id, &path, &detail);
    Ok(())
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();
    let today = Utc::now().date_naive();

    let part = args.part.as_deref().map(|p| resolve_id::<Part>(&project, p)).transpose()?;
    let supplier = args
        .supplier
        .as_deref()
        .map(|s| resolve_id::<Supplier>(&project, s))
        .transpose()?;

    let mut quotes: Vec<Quote> = load_all::<Quote>(&project)
        .into_iter()
        .filter(|q| part.as_ref().map_or(true, |p| &q.part == p))
        .filter(|q| supplier.as_ref().map_or(true, |s| &q.supplier == s))
        .filter(|q| args.status.map_or(true, |s| q.quote_status == s))
        .filter(|q| !args.valid || q.is_valid_on(today))
        .collect();
    quotes.sort_by(|a, b| b.created.cmp(&a.created));

    if args.count {
        println!("{}", quotes.len());
        return Ok(());
    }
    if quotes.is_empty() {
        if !global.quiet {
            println!("No quotes found.");
        }
        return Ok(());
    }

    match list_format(global, &config) {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&quotes).into_diagnostic()?),
        OutputFormat::Yaml => print!("{}", serde_yml::to_string(&quotes).into_diagnostic()?),
        format => {
            let short_ids = refresh_short_ids(&project, quotes.iter().map(|q| q.id.to_string()));
            let names = NameLookup::load(&project);

            const COLUMNS: &[ColumnDef] = &[
                ColumnDef::new("part", "PART", 16),
                ColumnDef::new("supplier", "SUPPLIER", 20),
                ColumnDef::new("price", "UNIT PRICE", 12),
                ColumnDef::new("qty", "QTY", 6),
                ColumnDef::new("lead", "LEAD (WK)", 10),
                ColumnDef::new("valid", "VALID UNTIL", 12),
                ColumnDef::new("status", "STATUS", 10),
            ];
            let rows = quotes.iter().map(|q| {
                TableRow::new(q.id.to_string(), &short_ids)
                    .cell("part", CellValue::Text(names.part(&q.part)))
                    .cell("supplier", CellValue::Text(names.supplier(&q.supplier)))
                    .cell("price", CellValue::Money(q.unit_price, config.currency().to_string()))
                    .cell("qty", CellValue::Number(q.quantity as i64))
                    .cell("lead", CellValue::Text(opt_float(q.lead_time_weeks, 1)))
                    .cell(
                        "valid",
                        CellValue::Text(q.valid_until.map_or_else(|| "-".to_string(), |d| d.to_string())),
                    )
                    .cell("status", CellValue::State(q.quote_status.to_string()))
            });
            TableFormatter::new(COLUMNS, "quote").output(rows, format);
        }
    }
    Ok(())
}

fn run_show(args: IdArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();
    let (path, quote) = load_entity::<Quote>(&project, &args.id)?;

    match global.format {
        OutputFormat::Yaml => print!("{}", std::fs::read_to_string(&path).into_diagnostic()?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&quote).into_diagnostic()?),
        OutputFormat::Id => println!("{}", quote.id),
        _ => {
            let names = NameLookup::load(&project);
            let short_ids = ShortIdIndex::load(&project);
            let today = Utc::now().date_naive();

            println!("{}", style("─".repeat(60)).dim());
            println!("{}: {}", style("ID").bold(), style(&quote.id.to_string()).cyan());
            println!(
                "{}: {} ({})",
                style("Part").bold(),
                style(names.part(&quote.part)).yellow(),
                short_ids.display(&quote.part)
            );
            println!(
                "{}: {} ({})",
                style("Supplier").bold(),
                names.supplier(&quote.supplier),
                short_ids.display(&quote.supplier)
            );
            println!(
                "{}: {} × {} = {}",
                style("Price").bold(),
                quote.quantity,
                config.money(quote.unit_price),
                config.money(quote.total_price())
            );
            if let Some(lead) = quote.lead_time_weeks {
                println!("{}: {} weeks", style("Lead time").bold(), lead);
            }
            if let Some(until) = quote.valid_until {
                let note = if quote.is_valid_on(today) {
                    style("").dim()
                } else {
                    style(" (lapsed)").red()
                };
                println!("{}: {}{}", style("Valid until").bold(), until, note);
            }
            println!("{}: {}", style("Status").bold(), quote.quote_status);
            if let Some(ref reference) = quote.reference {
                println!("{}: {}", style("Reference").bold(), reference);
            }
            println!("{}", style("─".repeat(60)).dim());
            if let Some(ref notes) = quote.notes {
                println!();
                println!("{}", notes);
            }
        }
    }
    Ok(())
}

fn run_status(args: StatusArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();
    let (_, mut quote) = load_entity::<Quote>(&project, &args.id)?;

    let before = quote.quote_status;
    quote.quote_status = args.status;
    quote.entity_revision += 1;
    save_entity(&project, &quote)?;
    tracing::info!(quote = %quote.id, from = %before, to = %args.status, "quote status changed");
    println!("{} Quote {} → {}", style("✓").green(), style(&quote.id.to_string()).cyan(), args.status);

    if args.apply {
        if args.status != QuoteStatus::Accepted {
            return Err(miette::miette!("--apply only works when accepting a quote"));
        }
        let (_, mut part) = load_entity::<Part>(&project, &quote.part)?;
        part.unit_price = quote.unit_price;
        part.supplier = Some(quote.supplier.clone());
        if let Some(lead) = quote.lead_time_weeks {
            part.lead_time_weeks = lead;
        }
        part.touch();
        save_entity(&project, &part)?;
        println!(
            "{} {} now priced at {}",
            style("✓").green(),
            style(&part.part_number).cyan(),
            config.money(part.unit_price)
        );
    }
    Ok(())
}

fn run_compare(args: CompareArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();
    let today = Utc::now().date_naive();
    let (_, part) = load_entity::<Part>(&project, &args.part)?;
    let part_id = part.id.to_string();

    let quotes: Vec<Quote> = load_all::<Quote>(&project)
        .into_iter()
        .filter(|q| q.part == part_id)
        .collect();
    let best_id = best_quotes(&quotes, today).get(&part_id).map(|q| q.id.to_string());

    let mut shown: Vec<&Quote> = quotes
        .iter()
        .filter(|q| args.all || q.is_valid_on(today))
        .collect();
    shown.sort_by(|a, b| a.unit_price.total_cmp(&b.unit_price));

    if matches!(global.format, OutputFormat::Json) {
        let value = serde_json::json!({
            "part": part_id,
            "current_price": part.unit_price,
            "best": best_id,
            "quotes": shown,
        });
        println!("{}", serde_json::to_string_pretty(&value).into_diagnostic()?);
        return Ok(());
    }

    println!(
        "{} {} (current price {})",
        style("Quotes for").bold(),
        style(&part.part_number).yellow(),
        config.money(part.unit_price)
    );
    if shown.is_empty() {
        println!("{}", style("No usable quotes.").dim());
        return Ok(());
    }

    let names = NameLookup::load(&project);
    let short_ids = ShortIdIndex::load(&project);
    for q in shown {
        let marker = if best_id.as_deref() == Some(q.id.to_string().as_str()) {
            style("★").green().to_string()
        } else {
            " ".to_string()
        };
        let delta = q.unit_price - part.unit_price;
        let delta = if part.unit_price > 0.0 {
            format!("{:+.1}%", delta / part.unit_price * 100.0)
        } else {
            "-".to_string()
        };
        println!(
            "{} {:<6} {:<24} {:>12} {:>8} lead {:>5}  {}",
            marker,
            short_ids.display(&q.id.to_string()),
            names.supplier(&q.supplier),
            config.money(q.unit_price),
            delta,
            opt_float(q.lead_time_weeks, 1),
            q.quote_status
        );
    }
    Ok(())
}

/// Display names for parts and suppliers referenced by quotes
struct NameLookup {
    parts: HashMap<String, String>,
    suppliers: HashMap<String, String>,
}

impl NameLookup {
    fn load(project: &crate::core::project::Project) -> Self {
        Self {
            parts: load_all::<Part>(project)
                .into_iter()
                .map(|p| (p.id.to_string(), p.part_number))
                .collect(),
            suppliers: load_all::<Supplier>(project)
                .into_iter()
                .map(|s| (s.id.to_string(), s.name))
                .collect(),
        }
    }

    fn part(&self, id: &str) -> String {
        self.parts.get(id).cloned().unwrap_or_else(|| id.to_string())
    }

    fn supplier(&self, id: &str) -> String {
        self.suppliers.get(id).cloned().unwrap_or_else(|| id.to_string())
    }
}
