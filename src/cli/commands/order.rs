//! `depot order` command - Purchase orders and goods receipt

use chrono::Utc;
use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::collections::HashMap;

use crate::cli::helpers::{
    confirm, list_format, open_project, print_created, refresh_short_ids, register_short_id, truncate_str,
};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::analytics::{best_quotes, reorder_list};
use crate::core::inventory::{self, MovementContext};
use crate::core::loader::{load_all, load_entity, resolve_id, save_entity};
use crate::core::shortid::ShortIdIndex;
use crate::core::Config;
use crate::entities::order::OrderStatus;
use crate::entities::{Facility, Movement, Order, Part, Quote, Supplier};

#[derive(Subcommand, Debug)]
pub enum OrderCommands {
    /// Start a draft purchase order
    New(NewArgs),

    /// Add a part to a draft order
    AddLine(AddLineArgs),

    /// List orders
    List(ListArgs),

    /// Show an order with its lines
    Show(IdArgs),

    /// Place a draft order with the supplier
    Submit(IdArgs),

    /// Book goods received against an order
    Receive(ReceiveArgs),

    /// Cancel a draft or placed order
    Cancel(CancelArgs),

    /// Draft an order for a supplier from parts needing reorder
    FromReorder(FromReorderArgs),
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Supplier (ID or @N)
    #[arg(long, short = 's')]
    pub supplier: String,

    /// Receiving facility (ID or @N)
    #[arg(long)]
    pub facility: Option<String>,

    /// Supplier-facing PO reference
    #[arg(long)]
    pub reference: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct AddLineArgs {
    /// Order ID or short ID (@N)
    pub order: String,

    /// Part (ID or @N)
    pub part: String,

    /// Units to order
    pub quantity: u32,

    /// Price per unit (defaults to the best valid quote, then the part's price)
    #[arg(long)]
    pub price: Option<f64>,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by status
    #[arg(long, short = 's')]
    pub status: Option<OrderStatus>,

    /// Only orders still expecting goods
    #[arg(long)]
    pub open: bool,

    /// Only orders from this supplier (ID or @N)
    #[arg(long)]
    pub supplier: Option<String>,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct IdArgs {
    /// Order ID or short ID (@N)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct ReceiveArgs {
    /// Order ID or short ID (@N)
    pub id: String,

    /// Line number to receive (1-based); all outstanding lines when omitted
    #[arg(long, short = 'l')]
    pub line: Option<usize>,

    /// Units received on the line (defaults to everything outstanding)
    #[arg(long, requires = "line")]
    pub qty: Option<u32>,
}

#[derive(clap::Args, Debug)]
pub struct CancelArgs {
    /// Order ID or short ID (@N)
    pub id: String,

    /// Don't ask for confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(clap::Args, Debug)]
pub struct FromReorderArgs {
    /// Supplier (ID or @N)
    #[arg(long, short = 's')]
    pub supplier: String,

    /// Receiving facility (ID or @N)
    #[arg(long)]
    pub facility: Option<String>,

    /// Show what would be ordered without saving
    #[arg(long)]
    pub dry_run: bool,
}

pub fn run(cmd: OrderCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        OrderCommands::New(args) => run_new(args, global),
        OrderCommands::AddLine(args) => run_add_line(args, global),
        OrderCommands::List(args) => run_list(args, global),
        OrderCommands::Show(args) => run_show(args, global),
        OrderCommands::Submit(args) => run_submit(args, global),
        OrderCommands::Receive(args) => run_receive(args, global),
        OrderCommands::Cancel(args) => run_cancel(args, global),
        OrderCommands::FromReorder(args) => run_from_reorder(args, global),
    }
}

/// Price for a new line: best valid quote from this supplier, else the part's price
fn line_price(part: &Part, supplier: &str, quotes: &[Quote]) -> f64 {
    let today = Utc::now().date_naive();
    let from_supplier: Vec<Quote> = quotes
        .iter()
        .filter(|q| q.supplier == supplier)
        .cloned()
        .collect();
    best_quotes(&from_supplier, today)
        .get(&part.id.to_string())
        .map_or(part.unit_price, |q| q.unit_price)
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();

    let supplier = resolve_id::<Supplier>(&project, &args.supplier)?;
    let mut order = Order::new(supplier, config.author());
    order.facility = args
        .facility
        .as_deref()
        .map(|f| resolve_id::<Facility>(&project, f))
        .transpose()?;
    order.reference = args.reference;
    order.notes = args.notes;

    let path = save_entity(&project, &order)?;
    let short_id = register_short_id(&project, &order.id);
    print_created("order", &short_id, &path, "Add lines with `depot order add-line`");
    Ok(())
}

fn run_add_line(args: AddLineArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();
    let (_, mut order) = load_entity::<Order>(&project, &args.order)?;
    let (_, part) = load_entity::<Part>(&project, &args.part)?;

    let price = match args.price {
        Some(p) => p,
        None => line_price(&part, &order.supplier, &load_all::<Quote>(&project)),
    };
    if price < 0.0 {
        return Err(miette::miette!("Price cannot be negative"));
    }

    order.add_line(part.id.to_string(), args.quantity, price)?;
    save_entity(&project, &order)?;
    println!(
        "{} Added {} × {} at {} (order total {})",
        style("✓").green(),
        args.quantity,
        style(&part.part_number).cyan(),
        config.money(price),
        config.money(order.total())
    );
    Ok(())
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();
    let supplier = args
        .supplier
        .as_deref()
        .map(|s| resolve_id::<Supplier>(&project, s))
        .transpose()?;

    let mut orders: Vec<Order> = load_all::<Order>(&project)
        .into_iter()
        .filter(|o| args.status.map_or(true, |s| o.order_status == s))
        .filter(|o| !args.open || o.order_status.is_open())
        .filter(|o| supplier.as_ref().map_or(true, |s| &o.supplier == s))
        .collect();
    orders.sort_by(|a, b| b.created.cmp(&a.created));

    if args.count {
        println!("{}", orders.len());
        return Ok(());
    }
    if orders.is_empty() {
        if !global.quiet {
            println!("No orders found.");
        }
        return Ok(());
    }

    match list_format(global, &config) {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&orders).into_diagnostic()?),
        OutputFormat::Yaml => print!("{}", serde_yml::to_string(&orders).into_diagnostic()?),
        format => {
            let short_ids = refresh_short_ids(&project, orders.iter().map(|o| o.id.to_string()));
            let suppliers: HashMap<String, String> = load_all::<Supplier>(&project)
                .into_iter()
                .map(|s| (s.id.to_string(), s.name))
                .collect();

            const COLUMNS: &[ColumnDef] = &[
                ColumnDef::new("date", "CREATED", 12),
                ColumnDef::new("supplier", "SUPPLIER", 22),
                ColumnDef::new("reference", "REFERENCE", 14),
                ColumnDef::new("lines", "LINES", 6),
                ColumnDef::new("total", "TOTAL", 12),
                ColumnDef::new("status", "STATUS", 19),
            ];
            let rows = orders.iter().map(|o| {
                let supplier = suppliers.get(&o.supplier).cloned().unwrap_or_else(|| o.supplier.clone());
                TableRow::new(o.id.to_string(), &short_ids)
                    .cell("date", CellValue::Date(o.created))
                    .cell("supplier", CellValue::Text(supplier))
                    .cell("reference", CellValue::opt_text(o.reference.as_deref()))
                    .cell("lines", CellValue::Number(o.lines.len() as i64))
                    .cell("total", CellValue::Money(o.total(), config.currency().to_string()))
                    .cell("status", CellValue::State(o.order_status.to_string()))
            });
            TableFormatter::new(COLUMNS, "order").output(rows, format);
        }
    }
    Ok(())
}

fn run_show(args: IdArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();
    let (path, order) = load_entity::<Order>(&project, &args.id)?;

    match global.format {
        OutputFormat::Yaml => print!("{}", std::fs::read_to_string(&path).into_diagnostic()?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&order).into_diagnostic()?),
        OutputFormat::Id => println!("{}", order.id),
        _ => {
            let short_ids = ShortIdIndex::load(&project);
            let parts: HashMap<String, Part> = load_all::<Part>(&project)
                .into_iter()
                .map(|p| (p.id.to_string(), p))
                .collect();
            let supplier = load_entity::<Supplier>(&project, &order.supplier)
                .map(|(_, s)| s.name)
                .unwrap_or_else(|_| order.supplier.clone());

            println!("{}", style("─".repeat(60)).dim());
            println!("{}: {}", style("ID").bold(), style(&order.id.to_string()).cyan());
            println!("{}: {}", style("Supplier").bold(), style(supplier).yellow());
            println!("{}: {}", style("Status").bold(), order.order_status);
            if let Some(ref reference) = order.reference {
                println!("{}: {}", style("Reference").bold(), reference);
            }
            if let Some(ref facility) = order.facility {
                println!("{}: {}", style("Deliver to").bold(), short_ids.display(facility));
            }
            if let Some(at) = order.ordered_at {
                println!("{}: {}", style("Ordered").bold(), at.format("%Y-%m-%d"));
            }
            if let Some(at) = order.received_at {
                println!("{}: {}", style("Received").bold(), at.format("%Y-%m-%d"));
            }
            println!("{}", style("─".repeat(60)).dim());

            println!();
            if order.lines.is_empty() {
                println!("{}", style("No lines yet.").dim());
            }
            for (i, line) in order.lines.iter().enumerate() {
                let (number, title) = parts
                    .get(&line.part)
                    .map_or(("?", "(missing part)"), |p| (p.part_number.as_str(), p.title.as_str()));
                let progress = if line.outstanding() == 0 && line.received > 0 {
                    style(format!("{}/{}", line.received, line.quantity)).green()
                } else {
                    style(format!("{}/{}", line.received, line.quantity)).dim()
                };
                println!(
                    "  {:>2}. {:<16} {:<28} {:>6} × {:>10}  {}",
                    i + 1,
                    number,
                    truncate_str(title, 28),
                    line.quantity,
                    config.money(line.unit_price),
                    progress
                );
            }
            println!();
            println!("{}: {}", style("Total").bold(), config.money(order.total()));
            if order.order_status.is_open() {
                println!("{}: {}", style("Outstanding").bold(), config.money(order.outstanding_value()));
            }
            if let Some(ref notes) = order.notes {
                println!();
                println!("{}", notes);
            }
        }
    }
    Ok(())
}

fn run_submit(args: IdArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();
    let (_, mut order) = load_entity::<Order>(&project, &args.id)?;

    order.submit(Utc::now())?;
    save_entity(&project, &order)?;
    tracing::info!(order = %order.id, total = order.total(), "order submitted");
    println!(
        "{} Order {} placed ({} lines, {})",
        style("✓").green(),
        style(&order.id.to_string()).cyan(),
        order.lines.len(),
        config.money(order.total())
    );
    Ok(())
}

fn run_receive(args: ReceiveArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();
    let (_, mut order) = load_entity::<Order>(&project, &args.id)?;

    let line = match args.line {
        Some(n) if n == 0 || n > order.lines.len() => {
            return Err(miette::miette!("Order has no line {} (it has {})", n, order.lines.len()));
        }
        Some(n) => Some(n - 1),
        None => None,
    };

    let receipts = order.receive(line, args.qty, Utc::now())?;
    let order_id = order.id.to_string();

    // Apply every receipt in memory first so a bad part leaves nothing half-written
    let mut touched: Vec<Part> = Vec::new();
    let mut movements: Vec<Movement> = Vec::new();
    for receipt in &receipts {
        let idx = match touched.iter().position(|p| p.id.to_string() == receipt.part) {
            Some(idx) => idx,
            None => {
                let (_, part) = load_entity::<Part>(&project, &receipt.part)?;
                touched.push(part);
                touched.len() - 1
            }
        };
        let ctx = MovementContext {
            reason: Some(format!("received on order line {}", receipt.line + 1)),
            reference: Some(order_id.clone()),
            author: config.author(),
        };
        movements.push(inventory::receive_part(&mut touched[idx], receipt.quantity, ctx)?);
    }

    for part in &touched {
        save_entity(&project, part)?;
    }
    for movement in &movements {
        save_entity(&project, movement)?;
    }
    save_entity(&project, &order)?;

    for (receipt, movement) in receipts.iter().zip(&movements) {
        let number = touched
            .iter()
            .find(|p| p.id.to_string() == receipt.part)
            .map_or(receipt.part.as_str(), |p| p.part_number.as_str());
        println!(
            "{} Received {} × {} ({} → {})",
            style("✓").green(),
            receipt.quantity,
            style(number).cyan(),
            movement.quantity_before,
            movement.quantity_after
        );
    }
    println!("Order is now {}", style(order.order_status).bold());
    Ok(())
}

fn run_cancel(args: CancelArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let (_, mut order) = load_entity::<Order>(&project, &args.id)?;

    if !confirm(&format!("Cancel order {}?", order.id), args.yes)? {
        println!("Kept.");
        return Ok(());
    }

    order.cancel()?;
    save_entity(&project, &order)?;
    tracing::info!(order = %order.id, "order cancelled");
    println!("{} Order {} cancelled", style("✓").green(), style(&order.id.to_string()).cyan());
    Ok(())
}

fn run_from_reorder(args: FromReorderArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();
    let supplier = resolve_id::<Supplier>(&project, &args.supplier)?;
    let facility = args
        .facility
        .as_deref()
        .map(|f| resolve_id::<Facility>(&project, f))
        .transpose()?;

    let parts: Vec<Part> = load_all(&project);
    let quotes: Vec<Quote> = load_all(&project);
    let open_orders: Vec<Order> = load_all::<Order>(&project)
        .into_iter()
        .filter(|o| o.order_status.is_open() || o.order_status == OrderStatus::Draft)
        .collect();

    let mut order = Order::new(supplier.clone(), config.author());
    order.facility = facility;
    let mut skipped = 0;

    for item in reorder_list(&parts) {
        if item.part.supplier.as_deref() != Some(supplier.as_str()) {
            continue;
        }
        if facility_mismatch(item.part, order.facility.as_deref()) {
            continue;
        }
        let part_id = item.part.id.to_string();
        let on_order: u32 = open_orders
            .iter()
            .flat_map(|o| o.lines.iter())
            .filter(|l| l.part == part_id)
            .map(|l| l.outstanding())
            .sum();
        let qty = item.assessment.suggested_order_qty.saturating_sub(on_order);
        if qty == 0 {
            skipped += 1;
            continue;
        }
        let price = line_price(item.part, &supplier, &quotes);
        order.add_line(part_id, qty, price)?;
    }

    if order.lines.is_empty() {
        println!("Nothing to reorder from this supplier.");
        if skipped > 0 {
            println!("{} part(s) are already covered by open orders.", skipped);
        }
        return Ok(());
    }

    let numbers: HashMap<String, &str> = parts
        .iter()
        .map(|p| (p.id.to_string(), p.part_number.as_str()))
        .collect();
    for line in &order.lines {
        println!(
            "  {:<16} {:>6} × {}",
            numbers.get(&line.part).copied().unwrap_or(line.part.as_str()),
            line.quantity,
            config.money(line.unit_price)
        );
    }
    if skipped > 0 {
        println!("  ({} part(s) skipped, already on order)", skipped);
    }

    if args.dry_run {
        println!("Total {} (dry run, nothing saved)", config.money(order.total()));
        return Ok(());
    }

    let path = save_entity(&project, &order)?;
    let short_id = register_short_id(&project, &order.id);
    let detail = format!("{} lines, {}", order.lines.len(), config.money(order.total()));
    print_created("order", &short_id, &path, &detail);
    Ok(())
}

/// Part stocked at another facility than the order delivers to
fn facility_mismatch(part: &Part, facility: Option<&str>) -> bool {
    match (facility, part.facility.as_deref()) {
        (Some(wanted), Some(actual)) => wanted != actual,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_price_prefers_supplier_quote() {
        let mut part = Part::new("B-6204".into(), "Bearing".into(), "test".into());
        part.unit_price = 8.0;
        let pid = part.id.to_string();

        let cheaper = Quote::new("SUP-A".into(), pid.clone(), 6.5, "test".into());
        let other = Quote::new("SUP-B".into(), pid, 5.0, "test".into());
        let quotes = vec![cheaper, other];

        assert_eq!(line_price(&part, "SUP-A", &quotes), 6.5);
        assert_eq!(line_price(&part, "SUP-C", &quotes), 8.0);
    }

    #[test]
    fn test_facility_mismatch() {
        let mut part = Part::new("X".into(), "X".into(), "test".into());
        assert!(!facility_mismatch(&part, Some("FAC-1")));
        part.facility = Some("FAC-2".into());
        assert!(facility_mismatch(&part, Some("FAC-1")));
        assert!(!facility_mismatch(&part, Some("FAC-2")));
        assert!(!facility_mismatch(&part, None));
    }
}
