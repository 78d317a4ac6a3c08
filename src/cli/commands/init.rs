//! `depot init` command - Initialize a new depot project

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::Path;

use crate::cli::GlobalOpts;
use crate::core::identity::EntityPrefix;
use crate::core::project::{Project, ProjectError, PROJECT_DIR};

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: std::path::PathBuf,

    /// Reinitialize even if .depot/ already exists (records are kept)
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs, global: &GlobalOpts) -> Result<()> {
    let path = if args.path.as_os_str() == "." {
        std::env::current_dir().into_diagnostic()?
    } else {
        args.path.clone()
    };

    if !path.exists() {
        std::fs::create_dir_all(&path).into_diagnostic()?;
        if !global.quiet {
            println!(
                "{} Created directory {}",
                style("✓").green(),
                style(path.display()).cyan()
            );
        }
    }

    let project = if args.force {
        Project::init_force(&path)
    } else {
        Project::init(&path)
    };

    match project {
        Ok(project) => {
            tracing::info!(root = %project.root().display(), "initialized project");
            println!(
                "{} Initialized depot project at {}",
                style("✓").green(),
                style(project.root().display()).cyan()
            );
            if global.quiet {
                return Ok(());
            }
            println!();
            println!("Created project structure:");
            print_structure(project.root());
            println!();
            println!("Next steps:");
            println!("  {} Register a spare part", style("depot part new").yellow());
            println!("  {} See what needs ordering", style("depot report reorder").yellow());
            println!("  {} Validate project files", style("depot validate").yellow());
            Ok(())
        }
        Err(ProjectError::AlreadyExists(path)) => {
            println!(
                "{} depot project already exists at {}",
                style("!").yellow(),
                style(path.display()).cyan()
            );
            println!();
            println!("Use {} to reinitialize", style("depot init --force").yellow());
            Ok(())
        }
        Err(e) => Err(miette::miette!("{}", e)),
    }
}

fn print_structure(root: &Path) {
    let config = format!("{}/config.yaml", PROJECT_DIR);
    println!("  📄 {}", style(config).dim());

    for prefix in EntityPrefix::all() {
        let dir = Project::entity_directory(*prefix);
        if root.join(dir).is_dir() {
            println!("  📁 {}", style(format!("{}/", dir)).dim());
        }
    }
}
