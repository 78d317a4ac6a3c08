//! `depot status` command - Inventory and purchasing dashboard

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::open_project;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::analytics::{inventory_summary, order_summary, reorder_list, InventorySummary, OrderSummary};
use crate::core::loader::load_all;
use crate::core::stock::StockStatus;
use crate::core::Config;
use crate::entities::{Assembly, Facility, Machine, Order, Part, Supplier};

#[derive(clap::Args, Debug)]
pub struct StatusArgs {
    /// Number of reorder items to list
    #[arg(long, short = 'n', default_value_t = 5)]
    pub top: usize,
}

#[derive(serde::Serialize)]
struct RecordCounts {
    parts: usize,
    facilities: usize,
    machines: usize,
    assemblies: usize,
    suppliers: usize,
    orders: usize,
}

#[derive(serde::Serialize)]
struct LongLead {
    id: String,
    name: String,
    lead_time_weeks: f64,
}

pub fn run(args: StatusArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();

    let parts: Vec<Part> = load_all(&project);
    let orders: Vec<Order> = load_all(&project);
    let suppliers: Vec<Supplier> = load_all(&project);

    let counts = RecordCounts {
        parts: parts.len(),
        facilities: load_all::<Facility>(&project).len(),
        machines: load_all::<Machine>(&project).len(),
        assemblies: load_all::<Assembly>(&project).len(),
        suppliers: suppliers.len(),
        orders: orders.len(),
    };
    let inventory = inventory_summary(&parts);
    let purchasing = order_summary(&orders);
    let reorder = reorder_list(&parts);
    let long_lead = long_lead_suppliers(&suppliers, config.long_lead_weeks());

    if matches!(global.format, OutputFormat::Json) {
        let top: Vec<serde_json::Value> = reorder
            .iter()
            .take(args.top)
            .map(|item| {
                serde_json::json!({
                    "id": item.part.id.to_string(),
                    "part_number": item.part.part_number,
                    "status": item.assessment.status,
                    "quantity": item.part.quantity,
                    "suggested_order_qty": item.assessment.suggested_order_qty,
                })
            })
            .collect();
        let status = serde_json::json!({
            "records": counts,
            "inventory": inventory,
            "orders": purchasing,
            "reorder": top,
            "long_lead_suppliers": long_lead,
        });
        println!("{}", serde_json::to_string_pretty(&status).into_diagnostic()?);
        return Ok(());
    }

    let width = 68;
    println!("{}", style("Depot Status").bold().underlined());
    println!("{}", "═".repeat(width));
    println!();

    print_two_columns(
        "STOCK",
        &format_inventory(&inventory, &config),
        "PURCHASING",
        &format_orders(&purchasing, &config),
    );
    println!();

    let reorder_lines: Vec<String> = if reorder.is_empty() {
        vec![format!("{} nothing to reorder", style("✓").green())]
    } else {
        reorder
            .iter()
            .take(args.top)
            .map(|item| {
                format!(
                    "{:<16} {:<15} have {:>5}  order {:>5}",
                    item.part.part_number,
                    item.assessment.status.to_string(),
                    item.part.quantity,
                    item.assessment.suggested_order_qty
                )
            })
            .collect()
    };
    print_section("REORDER", &reorder_lines);
    if reorder.len() > args.top {
        println!("  {}", style(format!("... and {} more", reorder.len() - args.top)).dim());
    }
    println!();

    print_two_columns(
        "RECORDS",
        &[
            format!("Parts:       {}", counts.parts),
            format!("Facilities:  {}", counts.facilities),
            format!("Machines:    {}", counts.machines),
            format!("Assemblies:  {}", counts.assemblies),
            format!("Suppliers:   {}", counts.suppliers),
        ],
        "SUPPLY RISK",
        &format_long_lead(&long_lead, config.long_lead_weeks()),
    );

    println!();
    println!("{}", "═".repeat(width));
    let health = stock_health(&inventory);
    let health_style = match health {
        "Healthy" => style(health).green().bold(),
        "Warning" => style(health).yellow().bold(),
        _ => style(health).red().bold(),
    };
    println!("Stock Health: {}", health_style);

    Ok(())
}

/// Suppliers whose quoted lead time meets the threshold, longest first
fn long_lead_suppliers(suppliers: &[Supplier], threshold: f64) -> Vec<LongLead> {
    let mut flagged: Vec<LongLead> = suppliers
        .iter()
        .filter_map(|s| {
            s.lead_time_weeks
                .filter(|&weeks| weeks >= threshold)
                .map(|weeks| LongLead {
                    id: s.id.to_string(),
                    name: s.name.clone(),
                    lead_time_weeks: weeks,
                })
        })
        .collect();
    flagged.sort_by(|a, b| b.lead_time_weeks.total_cmp(&a.lead_time_weeks));
    flagged
}

fn format_inventory(summary: &InventorySummary, config: &Config) -> Vec<String> {
    if summary.part_count == 0 {
        return vec![style("No parts").dim().to_string()];
    }
    vec![
        format!("Parts: {}  Units: {}", summary.part_count, summary.total_units),
        format!("Value: {}", config.money(summary.total_value)),
        format!("{} {}", style("Healthy:").green(), summary.count(StockStatus::Healthy)),
        format!(
            "{} {}",
            style("Reorder:").yellow(),
            summary.count(StockStatus::ReorderNeeded)
        ),
        format!("{} {}", style("Critical:").red(), summary.count(StockStatus::Critical)),
        format!(
            "{} {}",
            style("Out:").red().bold(),
            summary.count(StockStatus::OutOfStock)
        ),
    ]
}

fn format_orders(summary: &OrderSummary, config: &Config) -> Vec<String> {
    let mut lines = vec![
        format!("Draft: {}  Open: {}", summary.draft, summary.open),
        format!("Outstanding: {}", config.money(summary.open_value)),
        format!("Received: {}", summary.received),
        format!("Spend: {}", config.money(summary.received_spend)),
    ];
    if let Some(days) = summary.avg_lead_days {
        lines.push(format!("Avg lead: {:.1} days", days));
    }
    lines
}

fn format_long_lead(flagged: &[LongLead], threshold: f64) -> Vec<String> {
    if flagged.is_empty() {
        return vec![format!("No supplier ≥ {} weeks", threshold)];
    }
    flagged
        .iter()
        .take(5)
        .map(|s| format!("{} ({} wk)", truncate(&s.name, 20), s.lead_time_weeks))
        .collect()
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

fn print_two_columns(title1: &str, lines1: &[String], title2: &str, lines2: &[String]) {
    let col_width = 32;

    println!("{:<col_width$} {}", style(title1).bold(), style(title2).bold());
    println!("{:-<col_width$} {:-<col_width$}", "", "");

    let max_lines = lines1.len().max(lines2.len());
    for i in 0..max_lines {
        let l1 = lines1.get(i).map(|s| s.as_str()).unwrap_or("");
        let l2 = lines2.get(i).map(|s| s.as_str()).unwrap_or("");
        println!("  {:<30} {}", l1, l2);
    }
}

fn print_section(title: &str, lines: &[String]) {
    println!("{}", style(title).bold());
    println!("{:-<64}", "");
    for line in lines {
        println!("  {}", line);
    }
}

/// Overall verdict from stock status counts
fn stock_health(summary: &InventorySummary) -> &'static str {
    if summary.count(StockStatus::OutOfStock) > 0 || summary.count(StockStatus::Critical) > 0 {
        "Critical"
    } else if summary.count(StockStatus::ReorderNeeded) > 0 {
        "Warning"
    } else {
        "Healthy"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn supplier(name: &str, lead: Option<f64>) -> Supplier {
        let mut s = Supplier::new(name.to_string(), "test".to_string());
        s.lead_time_weeks = lead;
        s
    }

    #[test]
    fn test_long_lead_filters_and_sorts() {
        let suppliers = vec![
            supplier("Quick", Some(1.0)),
            supplier("Slow", Some(10.0)),
            supplier("Unknown", None),
            supplier("Edge", Some(6.0)),
        ];
        let flagged = long_lead_suppliers(&suppliers, 6.0);
        let names: Vec<&str> = flagged.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Slow", "Edge"]);
    }

    #[test]
    fn test_stock_health() {
        let mut summary = InventorySummary::default();
        assert_eq!(stock_health(&summary), "Healthy");
        summary.by_status.insert(StockStatus::ReorderNeeded, 2);
        assert_eq!(stock_health(&summary), "Warning");
        summary.by_status.insert(StockStatus::OutOfStock, 1);
        assert_eq!(stock_health(&summary), "Critical");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 20), "short");
        assert_eq!(truncate("a very long supplier name", 10), "a very ...");
    }
}
