//! `depot validate` command - Check records for parse errors, bad values and broken links

use console::style;
use miette::Result;
use std::collections::HashSet;
use std::path::PathBuf;

use crate::cli::helpers::open_project;
use crate::cli::GlobalOpts;
use crate::core::bom::BomIndex;
use crate::core::entity::Entity;
use crate::core::loader::scan;
use crate::core::project::RECORD_SUFFIX;
use crate::core::EntityPrefix;
use crate::entities::{Assembly, Facility, Hotspot, Machine, Movement, Order, Part, Quote, Supplier};
use crate::yaml::YamlError;

#[derive(clap::Args, Debug)]
pub struct ValidateArgs {
    /// Only check this record type (e.g. part, asm, ord)
    #[arg(long, short = 't')]
    pub entity_type: Option<EntityPrefix>,

    /// Strict mode - warnings become errors
    #[arg(long)]
    pub strict: bool,

    /// Show summary only, don't show individual problems
    #[arg(long)]
    pub summary: bool,
}

/// Validation statistics
#[derive(Default)]
struct ValidationStats {
    files_checked: usize,
    files_passed: usize,
    files_failed: usize,
    total_errors: usize,
    total_warnings: usize,
}

type Scanned<T> = Vec<(PathBuf, std::result::Result<T, YamlError>)>;

/// An outgoing link from a record: field name, expected type, target ID
type Link = (String, EntityPrefix, String);

struct Checker<'a> {
    args: &'a ValidateArgs,
    known: HashSet<String>,
    stats: ValidationStats,
}

impl Checker<'_> {
    fn wants(&self, prefix: EntityPrefix) -> bool {
        self.args.entity_type.map_or(true, |t| t == prefix)
    }

    /// Check every scanned record of one type, returning those that parsed
    fn check<T: Entity>(&mut self, scanned: Scanned<T>, links: impl Fn(&T) -> Vec<Link>) -> Vec<T> {
        let wanted = self.wants(T::PREFIX);
        let mut parsed_ok = Vec::new();

        for (path, parsed) in scanned {
            let entity = match parsed {
                Ok(entity) => entity,
                Err(e) => {
                    if wanted {
                        self.stats.files_checked += 1;
                        self.stats.files_failed += 1;
                        self.stats.total_errors += 1;
                        if !self.args.summary {
                            println!("{} {}", style("✗").red(), path.display());
                            println!("{:?}", miette::Report::new(e));
                        }
                    }
                    continue;
                }
            };
            if !wanted {
                parsed_ok.push(entity);
                continue;
            }
            self.stats.files_checked += 1;

            let mut errors = entity.validate();
            let mut warnings = Vec::new();

            let id = entity.id().to_string();
            let expected_name = format!("{}{}", id, RECORD_SUFFIX);
            if path.file_name().map_or(true, |n| n.to_string_lossy() != expected_name) {
                warnings.push(format!("file name does not match id {}", id));
            }

            for (field, prefix, target) in links(&entity) {
                if EntityPrefix::from_id_str(&target) != Some(prefix) {
                    errors.push(format!("{} should reference a {} record (got '{}')", field, prefix, target));
                } else if !self.known.contains(&target) {
                    errors.push(format!("{} points at missing record {}", field, target));
                }
            }

            let failed = !errors.is_empty() || (self.args.strict && !warnings.is_empty());
            self.stats.total_errors += errors.len();
            self.stats.total_warnings += warnings.len();
            if failed {
                self.stats.files_failed += 1;
            } else {
                self.stats.files_passed += 1;
            }

            if !self.args.summary && (!errors.is_empty() || !warnings.is_empty()) {
                let marker = if failed { style("✗").red() } else { style("!").yellow() };
                println!("{} {}", marker, path.display());
                for e in &errors {
                    println!("    {}", style(e).red());
                }
                for w in &warnings {
                    println!("    {}", style(w).yellow());
                }
            }
            parsed_ok.push(entity);
        }
        parsed_ok
    }
}

fn ok_ids<T: Entity>(scanned: &Scanned<T>) -> impl Iterator<Item = String> + '_ {
    scanned
        .iter()
        .filter_map(|(_, parsed)| parsed.as_ref().ok())
        .map(|e| e.id().to_string())
}

fn link(field: &str, prefix: EntityPrefix, target: &str) -> Link {
    (field.to_string(), prefix, target.to_string())
}

fn opt_link(field: &str, prefix: EntityPrefix, target: &Option<String>) -> Option<Link> {
    target.as_deref().map(|t| link(field, prefix, t))
}

pub fn run(args: ValidateArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;

    let parts: Scanned<Part> = scan(&project);
    let movements: Scanned<Movement> = scan(&project);
    let facilities: Scanned<Facility> = scan(&project);
    let machines: Scanned<Machine> = scan(&project);
    let assemblies: Scanned<Assembly> = scan(&project);
    let hotspots: Scanned<Hotspot> = scan(&project);
    let suppliers: Scanned<Supplier> = scan(&project);
    let quotes: Scanned<Quote> = scan(&project);
    let orders: Scanned<Order> = scan(&project);

    let known: HashSet<String> = ok_ids(&parts)
        .chain(ok_ids(&movements))
        .chain(ok_ids(&facilities))
        .chain(ok_ids(&machines))
        .chain(ok_ids(&assemblies))
        .chain(ok_ids(&hotspots))
        .chain(ok_ids(&suppliers))
        .chain(ok_ids(&quotes))
        .chain(ok_ids(&orders))
        .collect();

    if !global.quiet {
        println!("{} Validating project records...\n", style("→").blue());
    }

    let mut checker = Checker {
        args: &args,
        known,
        stats: ValidationStats::default(),
    };

    use EntityPrefix as P;
    checker.check(parts, |p: &Part| {
        [opt_link("facility", P::Fac, &p.facility), opt_link("supplier", P::Sup, &p.supplier)]
            .into_iter()
            .flatten()
            .collect()
    });
    checker.check(movements, |m: &Movement| vec![link("part", P::Part, &m.part)]);
    checker.check(facilities, |_: &Facility| Vec::new());
    checker.check(machines, |m: &Machine| {
        opt_link("facility", P::Fac, &m.facility).into_iter().collect()
    });
    let asm_values = checker.check(assemblies, |a: &Assembly| {
        let mut links: Vec<Link> = [opt_link("machine", P::Mch, &a.machine), opt_link("parent", P::Asm, &a.parent)]
            .into_iter()
            .flatten()
            .collect();
        for (i, line) in a.bom.iter().enumerate() {
            links.push(link(&format!("bom[{}].part", i), P::Part, &line.part));
        }
        links
    });
    let hot_values = checker.check(hotspots, |h: &Hotspot| {
        let mut links = vec![link("assembly", P::Asm, &h.assembly)];
        links.extend(opt_link("part", P::Part, &h.part));
        links.extend(opt_link("subassembly", P::Asm, &h.subassembly));
        links
    });
    checker.check(suppliers, |_: &Supplier| Vec::new());
    checker.check(quotes, |q: &Quote| {
        vec![link("supplier", P::Sup, &q.supplier), link("part", P::Part, &q.part)]
    });
    checker.check(orders, |o: &Order| {
        let mut links = vec![link("supplier", P::Sup, &o.supplier)];
        links.extend(opt_link("facility", P::Fac, &o.facility));
        for (i, line) in o.lines.iter().enumerate() {
            links.push(link(&format!("lines[{}].part", i), P::Part, &line.part));
        }
        links
    });

    let mut stats = checker.stats;

    // Structure loops span several files, so they are reported on their own
    if args.entity_type.map_or(true, |t| t == P::Asm || t == P::Hot) {
        let index = BomIndex::new(&asm_values, &hot_values);
        for asm in &asm_values {
            if index.has_cycle(&asm.id.to_string()) {
                stats.total_errors += 1;
                if !args.summary {
                    println!(
                        "{} assembly {} ('{}') contains itself through its sub-assemblies",
                        style("✗").red(),
                        asm.id,
                        asm.title
                    );
                }
            }
        }
    }

    println!();
    println!("{}", style("─".repeat(60)).dim());
    println!("{}", style("Validation Summary").bold());
    println!("{}", style("─".repeat(60)).dim());
    println!("  Files checked:  {}", style(stats.files_checked).cyan());
    println!("  Files passed:   {}", style(stats.files_passed).green());
    println!("  Files failed:   {}", style(stats.files_failed).red());
    println!("  Total errors:   {}", style(stats.total_errors).red());
    if stats.total_warnings > 0 {
        println!("  Total warnings: {}", style(stats.total_warnings).yellow());
    }
    println!();

    if stats.total_errors > 0 || stats.files_failed > 0 {
        Err(miette::miette!(
            "Validation failed: {} error(s) in {} file(s)",
            stats.total_errors,
            stats.files_failed
        ))
    } else {
        println!("{} All records passed validation!", style("✓").green().bold());
        Ok(())
    }
}
