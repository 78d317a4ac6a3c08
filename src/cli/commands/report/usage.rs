//! Usage report: recorded consumption against planned usage rates

use chrono::{Duration, Utc};
use miette::{IntoDiagnostic, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::open_project;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::analytics::usage_since;
use crate::core::loader::load_all;
use crate::core::stock::effective_weekly_usage;
use crate::entities::{Movement, Part};

use super::write_output;

#[derive(clap::Args, Debug)]
pub struct UsageArgs {
    /// Window in days
    #[arg(long, short = 'd', default_value_t = 90)]
    pub days: u32,

    /// Show only the top N parts
    #[arg(long, short = 'n')]
    pub top: Option<usize>,

    /// Output to file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

pub fn run(args: UsageArgs, global: &GlobalOpts) -> Result<()> {
    if args.days == 0 {
        return Err(miette::miette!("--days must be at least 1"));
    }
    let project = open_project(global)?;
    let since = Utc::now() - Duration::days(args.days as i64);

    let movements: Vec<Movement> = load_all(&project);
    let mut rows = usage_since(&movements, since);
    if let Some(top) = args.top {
        rows.truncate(top);
    }

    if matches!(global.format, OutputFormat::Json) {
        let json = serde_json::to_string_pretty(&rows).into_diagnostic()?;
        return write_output(&format!("{}\n", json), args.output);
    }

    let parts: HashMap<String, Part> = load_all::<Part>(&project)
        .into_iter()
        .map(|p| (p.id.to_string(), p))
        .collect();

    let mut output = String::new();
    output.push_str(&format!("# Usage Report (last {} days)\n\n", args.days));

    if rows.is_empty() {
        output.push_str("No stock movements in this window.\n");
        return write_output(&output, args.output);
    }

    let mut builder = Builder::default();
    builder.push_record(["Part #", "Issued", "Received", "Issues", "Actual /wk", "Planned /wk", "Drift"]);
    let mut drifting = 0;
    for row in &rows {
        let actual = row.weekly_rate(args.days);
        let (number, planned) = match parts.get(&row.part) {
            Some(p) => (
                p.part_number.clone(),
                Some(effective_weekly_usage(p.weekly_usage, p.monthly_usage)),
            ),
            None => (row.part.clone(), None),
        };
        let drift = match planned {
            Some(planned) if planned > 0.0 => {
                let pct = (actual - planned) / planned * 100.0;
                if pct.abs() >= 25.0 {
                    drifting += 1;
                }
                format!("{:+.0}%", pct)
            }
            _ => "-".to_string(),
        };
        builder.push_record([
            number,
            row.units_out.to_string(),
            row.units_in.to_string(),
            row.issues.to_string(),
            format!("{:.2}", actual),
            planned.map_or_else(|| "-".to_string(), |p| format!("{:.2}", p)),
            drift,
        ]);
    }
    output.push_str(&builder.build().with(Style::markdown()).to_string());

    output.push_str("\n\n## Summary\n\n");
    let issued: u64 = rows.iter().map(|r| r.units_out).sum();
    output.push_str(&format!("- **Parts moved:** {}\n", rows.len()));
    output.push_str(&format!("- **Units issued:** {}\n", issued));
    output.push_str(&format!(
        "- **Parts drifting ±25% from plan:** {}\n",
        drifting
    ));

    write_output(&output, args.output)
}
