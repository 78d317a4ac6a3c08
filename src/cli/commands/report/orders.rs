//! Purchasing report: order counts, spend and supplier lead times

use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::open_project;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::analytics::order_summary;
use crate::core::loader::load_all;
use crate::core::Config;
use crate::entities::Order;

use super::{write_output, Names};

#[derive(clap::Args, Debug)]
pub struct OrdersArgs {
    /// Output to file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

pub fn run(args: OrdersArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();
    let orders: Vec<Order> = load_all(&project);
    let summary = order_summary(&orders);

    if matches!(global.format, OutputFormat::Json) {
        let json = serde_json::to_string_pretty(&summary).into_diagnostic()?;
        return write_output(&format!("{}\n", json), args.output);
    }

    let names = Names::load(&project);
    let mut output = String::new();
    output.push_str("# Purchasing Report\n\n");
    output.push_str(&format!("- **Draft:** {}\n", summary.draft));
    output.push_str(&format!(
        "- **Open:** {} ({} outstanding)\n",
        summary.open,
        config.money(summary.open_value)
    ));
    output.push_str(&format!("- **Received:** {}\n", summary.received));
    output.push_str(&format!("- **Cancelled:** {}\n", summary.cancelled));
    output.push_str(&format!("- **Received spend:** {}\n", config.money(summary.received_spend)));
    if let Some(days) = summary.avg_lead_days {
        output.push_str(&format!("- **Average lead time:** {:.1} days\n", days));
    }

    let open: Vec<&Order> = orders.iter().filter(|o| o.order_status.is_open()).collect();
    if !open.is_empty() {
        output.push_str("\n## Open Orders\n\n");
        let mut builder = Builder::default();
        builder.push_record(["Order", "Supplier", "Ordered", "Lines", "Outstanding"]);
        for order in open {
            builder.push_record([
                order.reference.clone().unwrap_or_else(|| order.id.to_string()),
                names.supplier(&order.supplier),
                order
                    .ordered_at
                    .map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d").to_string()),
                order.lines.len().to_string(),
                config.money(order.outstanding_value()),
            ]);
        }
        output.push_str(&builder.build().with(Style::markdown()).to_string());
        output.push('\n');
    }

    if !summary.spend_by_supplier.is_empty() {
        output.push_str("\n## Spend by Supplier\n\n");
        let mut builder = Builder::default();
        builder.push_record(["Supplier", "Spend", "Share"]);
        let mut spend: Vec<(&String, &f64)> = summary.spend_by_supplier.iter().collect();
        spend.sort_by(|a, b| b.1.total_cmp(a.1));
        for (supplier, value) in spend {
            let share = if summary.received_spend > 0.0 {
                format!("{:.0}%", value / summary.received_spend * 100.0)
            } else {
                "-".to_string()
            };
            builder.push_record([names.supplier(supplier), config.money(*value), share]);
        }
        output.push_str(&builder.build().with(Style::markdown()).to_string());
        output.push('\n');
    }

    write_output(&output, args.output)
}
