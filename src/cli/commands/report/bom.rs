//! Bill of materials report for an assembly or a whole machine

use miette::{IntoDiagnostic, Result};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::open_project;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::bom::{rollup_cost, shortages, BomIndex};
use crate::core::identity::EntityPrefix;
use crate::core::loader::{load_all, load_entity};
use crate::core::shortid::ShortIdIndex;
use crate::core::Config;
use crate::entities::{Assembly, Hotspot, Machine, Part};

use super::{write_output, Names};

#[derive(clap::Args, Debug)]
pub struct BomArgs {
    /// Assembly or machine ID (or @N)
    pub id: String,

    /// Number of complete sets
    #[arg(long, default_value_t = 1)]
    pub qty: u32,

    /// Output to file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

pub fn run(args: BomArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load();
    let short_ids = ShortIdIndex::load(&project);
    let resolved = short_ids.resolve(&args.id).unwrap_or_else(|| args.id.clone());

    let assemblies: Vec<Assembly> = load_all(&project);
    let hotspots: Vec<Hotspot> = load_all(&project);
    let parts: Vec<Part> = load_all(&project);
    let part_map: HashMap<String, &Part> = parts.iter().map(|p| (p.id.to_string(), p)).collect();
    let index = BomIndex::new(&assemblies, &hotspots);

    // A machine's parts list is the sum of its top-level assemblies
    let (heading, roots): (String, Vec<String>) = match EntityPrefix::from_id_str(&resolved) {
        Some(EntityPrefix::Mch) => {
            let (_, machine) = load_entity::<Machine>(&project, &resolved)?;
            let roots = index
                .roots_for_machine(&machine.id.to_string())
                .iter()
                .map(|a| a.id.to_string())
                .collect();
            (format!("Machine {}", machine.name), roots)
        }
        _ => {
            let (_, assembly) = load_entity::<Assembly>(&project, &resolved)?;
            (format!("Assembly {}", assembly.title), vec![assembly.id.to_string()])
        }
    };

    let mut totals: BTreeMap<String, u32> = BTreeMap::new();
    let mut cycles = Vec::new();
    for root in &roots {
        if index.has_cycle(root) {
            cycles.push(root.clone());
        }
        for (part, qty) in index.flatten(root) {
            let entry = totals.entry(part).or_insert(0);
            *entry = entry.saturating_add(qty.saturating_mul(args.qty));
        }
    }
    let (cost, missing) = rollup_cost(&totals, &part_map);
    let short = shortages(&totals, &part_map);

    if matches!(global.format, OutputFormat::Json) {
        let value = serde_json::json!({
            "target": resolved,
            "sets": args.qty,
            "parts": totals,
            "cost": cost,
            "missing_parts": missing,
            "cycles": cycles,
            "shortages": short.iter().map(|(p, need, have)| serde_json::json!({
                "part": p, "needed": need, "on_hand": have,
            })).collect::<Vec<_>>(),
        });
        let json = serde_json::to_string_pretty(&value).into_diagnostic()?;
        return write_output(&format!("{}\n", json), args.output);
    }

    let names = Names::load(&project);
    let mut output = String::new();
    output.push_str(&format!("# Bill of Materials: {}\n\n", heading));
    output.push_str(&format!("Sets: {}\n\n", args.qty));

    if !roots.is_empty() {
        output.push_str("```\n");
        for root in &roots {
            for node in index.walk(root) {
                output.push_str(&format!(
                    "{}{} {}{}\n",
                    "  ".repeat(node.depth),
                    short_ids.display(&node.assembly.id.to_string()),
                    node.assembly.title,
                    if node.cycle { " (cycle, not expanded)" } else { "" }
                ));
            }
        }
        output.push_str("```\n\n");
    }

    let mut builder = Builder::default();
    builder.push_record(["Part #", "Title", "Qty", "On Hand", "Unit Price", "Line Cost"]);
    for (part_id, qty) in &totals {
        let (title, on_hand, price) = part_map.get(part_id).map_or(
            ("(missing part)".to_string(), 0, 0.0),
            |p| (p.title.clone(), p.quantity, p.unit_price),
        );
        builder.push_record([
            names.part(part_id),
            title,
            qty.to_string(),
            on_hand.to_string(),
            config.money(price),
            config.money(price * *qty as f64),
        ]);
    }
    output.push_str(&builder.build().with(Style::markdown()).to_string());

    output.push_str("\n\n## Summary\n\n");
    output.push_str(&format!("- **Distinct parts:** {}\n", totals.len()));
    output.push_str(&format!("- **Total cost:** {}\n", config.money(cost)));
    output.push_str(&format!("- **Short parts:** {}\n", short.len()));
    for (part, needed, on_hand) in &short {
        output.push_str(&format!("  - {}: need {}, have {}\n", names.part(part), needed, on_hand));
    }
    if !missing.is_empty() {
        output.push_str(&format!("- **Missing part records:** {}\n", missing.len()));
    }
    if !cycles.is_empty() {
        output.push_str("- **Warning:** the assembly structure contains a cycle\n");
    }

    write_output(&output, args.output)
}
