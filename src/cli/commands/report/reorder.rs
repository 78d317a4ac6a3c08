//! Reorder report: parts needing restock, most urgent first

use miette::{IntoDiagnostic, Result};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{open_project, opt_float};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::analytics::reorder_list;
use crate::core::loader::{load_all, resolve_id};
use crate::core::Config;
use crate::entities::{Facility, Part};

use super::{write_output, Names};

#[derive(clap::Args, Debug)]
pub struct ReorderArgs {
    /// Only parts at this facility (ID or @N)
    #[arg(long)]
    pub facility: Option<String>,

    /// Group lines by preferred supplier
    #[arg(long)]
    pub by_supplier: bool,

    /// Output to file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

pub fn run(args: ReorderArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();
    let facility = args
        .facility
        .as_deref()
        .map(|f| resolve_id::<Facility>(&project, f))
        .transpose()?;

    let parts: Vec<Part> = load_all::<Part>(&project)
        .into_iter()
        .filter(|p| facility.as_ref().map_or(true, |f| p.facility.as_ref() == Some(f)))
        .collect();
    let items = reorder_list(&parts);

    if matches!(global.format, OutputFormat::Json) {
        let rows: Vec<serde_json::Value> = items
            .iter()
            .map(|item| {
                serde_json::json!({
                    "part": item.part.id.to_string(),
                    "part_number": item.part.part_number,
                    "quantity": item.part.quantity,
                    "supplier": item.part.supplier,
                    "assessment": item.assessment,
                    "suggested_cost": item.suggested_cost(),
                })
            })
            .collect();
        let json = serde_json::to_string_pretty(&rows).into_diagnostic()?;
        return write_output(&format!("{}\n", json), args.output);
    }

    let names = Names::load(&project);
    let mut output = String::new();
    output.push_str("# Reorder Report\n\n");

    if items.is_empty() {
        output.push_str("All parts are above their reorder level.\n");
        return write_output(&output, args.output);
    }

    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (i, item) in items.iter().enumerate() {
        let key = if args.by_supplier {
            item.part
                .supplier
                .as_deref()
                .map_or_else(|| "No supplier".to_string(), |s| names.supplier(s))
        } else {
            String::new()
        };
        groups.entry(key).or_default().push(i);
    }

    let mut grand_total = 0.0;
    for (supplier, indices) in &groups {
        if args.by_supplier {
            output.push_str(&format!("## {}\n\n", supplier));
        }
        let mut builder = Builder::default();
        builder.push_record([
            "Part #", "Title", "Status", "On Hand", "Reorder At", "Cover (wk)", "Order Qty", "Est. Cost",
        ]);
        let mut subtotal = 0.0;
        for &i in indices {
            let item = &items[i];
            let a = &item.assessment;
            subtotal += item.suggested_cost();
            builder.push_record([
                item.part.part_number.clone(),
                item.part.title.clone(),
                a.status.to_string(),
                item.part.quantity.to_string(),
                a.reorder_level.to_string(),
                opt_float(a.weeks_of_cover, 1),
                a.suggested_order_qty.to_string(),
                config.money(item.suggested_cost()),
            ]);
        }
        output.push_str(&builder.build().with(Style::markdown()).to_string());
        output.push_str("\n\n");
        if args.by_supplier {
            output.push_str(&format!("Subtotal: {}\n\n", config.money(subtotal)));
        }
        grand_total += subtotal;
    }

    output.push_str("## Summary\n\n");
    output.push_str(&format!("- **Parts to reorder:** {}\n", items.len()));
    output.push_str(&format!("- **Estimated cost:** {}\n", config.money(grand_total)));
    let no_supplier = items.iter().filter(|i| i.part.supplier.is_none()).count();
    if no_supplier > 0 {
        output.push_str(&format!("- **Without a supplier:** {}\n", no_supplier));
    }

    write_output(&output, args.output)
}
