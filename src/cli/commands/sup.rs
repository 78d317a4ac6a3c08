//! `depot sup` command - Supplier management

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{list_format, open_project, opt_float, print_created, refresh_short_ids, register_short_id};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::entity::Entity;
use crate::core::loader::{load_all, load_entity, save_entity};
use crate::core::Config;
use crate::entities::{Order, Part, Quote, Supplier};
use crate::yaml::parse_yaml_file;

#[derive(Subcommand, Debug)]
pub enum SupCommands {
    /// Register a supplier
    New(NewArgs),

    /// List suppliers
    List(ListArgs),

    /// Show a supplier with its parts, quotes and orders
    Show(IdArgs),

    /// Edit a supplier in your editor
    Edit(IdArgs),
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Supplier name
    #[arg(long, short = 'n')]
    pub name: String,

    /// Contact person
    #[arg(long)]
    pub contact: Option<String>,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub phone: Option<String>,

    #[arg(long)]
    pub website: Option<String>,

    /// Typical lead time in weeks
    #[arg(long)]
    pub lead: Option<f64>,

    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Search in name and contact
    #[arg(long)]
    pub search: Option<String>,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct IdArgs {
    /// Supplier ID or short ID (@N)
    pub id: String,
}

pub fn run(cmd: SupCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        SupCommands::New(args) => run_new(args, global),
        SupCommands::List(args) => run_list(args, global),
        SupCommands::Show(args) => run_show(args, global),
        SupCommands::Edit(args) => run_edit(args, global),
    }
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();

    let existing: Vec<Supplier> = load_all(&project);
    if let Some(dup) = existing.iter().find(|s| s.name.eq_ignore_ascii_case(&args.name)) {
        return Err(miette::miette!("Supplier '{}' already exists ({})", dup.name, dup.id));
    }

    let mut supplier = Supplier::new(args.name, config.author());
    supplier.contact = args.contact;
    supplier.email = args.email;
    supplier.phone = args.phone;
    supplier.website = args.website;
    supplier.lead_time_weeks = args.lead;
    supplier.notes = args.notes;

    let issues = supplier.validate();
    if !issues.is_empty() {
        return Err(miette::miette!("Invalid supplier: {}", issues.join("; ")));
    }

    let path = save_entity(&project, &supplier)?;
    let short_id = register_short_id(&project, &supplier.id);
    print_created("supplier", &short_id, &path, &supplier.name);
    Ok(())
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();

    let mut suppliers: Vec<Supplier> = load_all::<Supplier>(&project)
        .into_iter()
        .filter(|s| {
            args.search.as_ref().map_or(true, |search| {
                let needle = search.to_lowercase();
                s.name.to_lowercase().contains(&needle)
                    || s.contact.as_ref().is_some_and(|c| c.to_lowercase().contains(&needle))
            })
        })
        .collect();
    suppliers.sort_by(|a, b| a.name.cmp(&b.name));

    if args.count {
        println!("{}", suppliers.len());
        return Ok(());
    }
    if suppliers.is_empty() {
        if !global.quiet {
            println!("No suppliers found.");
        }
        return Ok(());
    }

    match list_format(global, &config) {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&suppliers).into_diagnostic()?),
        OutputFormat::Yaml => print!("{}", serde_yml::to_string(&suppliers).into_diagnostic()?),
        format => {
            let short_ids = refresh_short_ids(&project, suppliers.iter().map(|s| s.id.to_string()));
            let parts: Vec<Part> = load_all(&project);

            const COLUMNS: &[ColumnDef] = &[
                ColumnDef::new("name", "NAME", 28),
                ColumnDef::new("contact", "CONTACT", 20),
                ColumnDef::new("lead", "LEAD (WK)", 10),
                ColumnDef::new("parts", "PARTS", 6),
            ];
            let rows = suppliers.iter().map(|s| {
                let id = s.id.to_string();
                let part_count = parts.iter().filter(|p| p.supplier.as_deref() == Some(&id)).count();
                TableRow::new(id, &short_ids)
                    .cell("name", CellValue::Text(s.name.clone()))
                    .cell("contact", CellValue::opt_text(s.contact.as_deref()))
                    .cell("lead", CellValue::Text(opt_float(s.lead_time_weeks, 1)))
                    .cell("parts", CellValue::Number(part_count as i64))
            });
            TableFormatter::new(COLUMNS, "supplier").output(rows, format);
        }
    }
    Ok(())
}

fn run_show(args: IdArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();
    let (path, supplier) = load_entity::<Supplier>(&project, &args.id)?;
    let id = supplier.id.to_string();

    match global.format {
        OutputFormat::Yaml => print!("{}", std::fs::read_to_string(&path).into_diagnostic()?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&supplier).into_diagnostic()?),
        OutputFormat::Id => println!("{}", supplier.id),
        _ => {
            println!("{}", style("─".repeat(60)).dim());
            println!("{}: {}", style("ID").bold(), style(&id).cyan());
            println!("{}: {}", style("Name").bold(), style(&supplier.name).yellow());
            for (label, value) in [
                ("Contact", &supplier.contact),
                ("Email", &supplier.email),
                ("Phone", &supplier.phone),
                ("Website", &supplier.website),
            ] {
                if let Some(v) = value {
                    println!("{}: {}", style(label).bold(), v);
                }
            }
            if let Some(lead) = supplier.lead_time_weeks {
                println!("{}: {} weeks", style("Lead time").bold(), lead);
            }
            println!("{}", style("─".repeat(60)).dim());

            let parts: Vec<Part> = load_all::<Part>(&project)
                .into_iter()
                .filter(|p| p.supplier.as_deref() == Some(&id))
                .collect();
            if !parts.is_empty() {
                println!();
                println!("{} ({}):", style("Parts supplied").bold(), parts.len());
                for p in &parts {
                    let supplier_pn = p
                        .supplier_part_number
                        .as_deref()
                        .map(|pn| format!(" [{}]", pn))
                        .unwrap_or_default();
                    println!("  • {} {}{}", style(&p.part_number).cyan(), p.title, supplier_pn);
                }
            }

            let quotes: Vec<Quote> = load_all::<Quote>(&project)
                .into_iter()
                .filter(|q| q.supplier == id)
                .collect();
            if !quotes.is_empty() {
                println!();
                println!("{}: {}", style("Quotes").bold(), quotes.len());
            }

            let orders: Vec<Order> = load_all::<Order>(&project)
                .into_iter()
                .filter(|o| o.supplier == id)
                .collect();
            if !orders.is_empty() {
                let open: Vec<&Order> = orders.iter().filter(|o| o.order_status.is_open()).collect();
                let outstanding: f64 = open.iter().map(|o| o.outstanding_value()).sum();
                println!(
                    "{}: {} ({} open, {} outstanding)",
                    style("Orders").bold(),
                    orders.len(),
                    open.len(),
                    config.money(outstanding)
                );
            }

            if let Some(ref notes) = supplier.notes {
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
    let (path, _) = load_entity::<Supplier>(&project, &args.id)?;

    println!("Opening {} in {}...", style(path.display()).cyan(), style(config.editor()).yellow());
    config.run_editor(&path).into_diagnostic()?;

    let supplier: Supplier = parse_yaml_file(&path)?;
    let issues = supplier.validate();
    if !issues.is_empty() {
        for issue in &issues {
            println!("  {} {}", style("!").yellow(), issue);
        }
    }
    Ok(())
}
