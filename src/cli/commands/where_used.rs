//! `depot where-used` command - Find where a record is referenced

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::helpers::{expand_reference, format_short_id_str, open_project};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::bom::structure_usages;
use crate::core::identity::EntityPrefix;
use crate::core::loader::load_all;
use crate::core::project::Project;
use crate::core::shortid::ShortIdIndex;
use crate::core::Config;
use crate::entities::{Assembly, Hotspot, Machine, Movement, Order, Part, Quote};

#[derive(clap::Args, Debug)]
pub struct WhereUsedArgs {
    /// Record ID or short ID (@N) to search for
    pub id: String,

    /// Leave out stock movement history
    #[arg(long)]
    pub no_history: bool,
}

/// One record that refers to the searched record
#[derive(Debug, Clone, Serialize)]
pub struct Reference {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub relationship: String,
}

impl Reference {
    fn new(id: String, relationship: String) -> Self {
        let kind = EntityPrefix::from_id_str(&id).map_or("record", |p| p.label());
        Self { id, kind, relationship }
    }

    /// Movement history rather than a live link
    pub fn is_history(&self) -> bool {
        self.id.starts_with("MOV-")
    }
}

impl std::fmt::Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}: {}", self.kind, self.id, self.relationship)
    }
}

/// Every record in the project that references `target`
pub fn collect_references(project: &Project, target: &str) -> Vec<Reference> {
    let assemblies: Vec<Assembly> = load_all(project);
    let hotspots: Vec<Hotspot> = load_all(project);

    let mut refs: Vec<Reference> = structure_usages(target, &assemblies, &hotspots)
        .into_iter()
        .map(|u| Reference::new(u.id, u.relationship))
        .collect();

    for part in load_all::<Part>(project) {
        if part.facility.as_deref() == Some(target) {
            refs.push(Reference::new(part.id.to_string(), format!("stocked part {}", part.part_number)));
        }
        if part.supplier.as_deref() == Some(target) {
            refs.push(Reference::new(part.id.to_string(), format!("preferred supplier of {}", part.part_number)));
        }
    }

    for machine in load_all::<Machine>(project) {
        if machine.facility.as_deref() == Some(target) {
            refs.push(Reference::new(machine.id.to_string(), format!("machine '{}' installed here", machine.name)));
        }
    }

    for quote in load_all::<Quote>(project) {
        if quote.part == target || quote.supplier == target {
            refs.push(Reference::new(
                quote.id.to_string(),
                format!("quote at {:.2}/unit ({})", quote.unit_price, quote.quote_status),
            ));
        }
    }

    for order in load_all::<Order>(project) {
        for (idx, line) in order.lines.iter().enumerate().filter(|(_, l)| l.part == target) {
            refs.push(Reference::new(
                order.id.to_string(),
                format!("order line {} (qty {}, {})", idx, line.quantity, order.order_status),
            ));
        }
        if order.supplier == target || order.facility.as_deref() == Some(target) {
            refs.push(Reference::new(order.id.to_string(), format!("purchase order ({})", order.order_status)));
        }
    }

    for movement in load_all::<Movement>(project) {
        if movement.part == target || movement.reference.as_deref() == Some(target) {
            refs.push(Reference::new(
                movement.id.to_string(),
                format!(
                    "{} {} on {}",
                    movement.kind,
                    movement.quantity,
                    movement.created.format("%Y-%m-%d")
                ),
            ));
        }
    }

    refs
}

pub fn run(args: WhereUsedArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let resolved_id = expand_reference(&project, &args.id);

    let Some(prefix) = EntityPrefix::from_id_str(&resolved_id) else {
        return Err(miette::miette!(
            "'{}' is not a record ID (expected e.g. PART-..., ASM-... or @N)",
            args.id
        ));
    };

    let mut refs = collect_references(&project, &resolved_id);
    if args.no_history {
        refs.retain(|r| !r.is_history());
    }

    let format = match global.format {
        OutputFormat::Auto => crate::cli::helpers::list_format(global, &Config::load()),
        f => f,
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&refs).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&refs).into_diagnostic()?);
        }
        OutputFormat::Id => {
            for r in &refs {
                println!("{}", r.id);
            }
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(std::io::stdout());
            wtr.write_record(["ref_id", "ref_type", "relationship"]).into_diagnostic()?;
            for r in &refs {
                wtr.write_record([r.id.as_str(), r.kind, r.relationship.as_str()])
                    .into_diagnostic()?;
            }
            wtr.flush().into_diagnostic()?;
        }
        _ => {
            if !global.quiet {
                println!(
                    "{} {} {}",
                    style("References to").bold(),
                    prefix.label(),
                    style(&resolved_id).cyan()
                );
                println!();
            }
            if refs.is_empty() {
                println!("{}", style("No references found.").yellow());
                return Ok(());
            }

            let short_ids = ShortIdIndex::load(&project);
            println!(
                "{:<16} {:<10} {}",
                style("REF").bold(),
                style("TYPE").bold(),
                style("RELATIONSHIP").bold()
            );
            println!("{}", "-".repeat(70));
            for r in &refs {
                let short = short_ids
                    .get_short_id(&r.id)
                    .map(|n| format!("@{}", n))
                    .unwrap_or_else(|| format_short_id_str(&r.id));
                println!("{:<16} {:<10} {}", style(short).cyan(), r.kind, r.relationship);
            }
            println!();
            println!("{} reference(s) found.", style(refs.len()).cyan());
        }
    }

    Ok(())
}
