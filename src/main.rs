use clap::Parser;
use depot::cli::{Cli, Commands};
use miette::Result;

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;

    depot::core::logging::init(global.verbose, global.quiet);
    tracing::debug!(format = ?global.format, project = ?global.project, "starting");

    match cli.command {
        Commands::Init(args) => depot::cli::commands::init::run(args, &global),
        Commands::Part(cmd) => depot::cli::commands::part::run(cmd, &global),
        Commands::Movement(cmd) => depot::cli::commands::movement::run(cmd, &global),
        Commands::Facility(cmd) => depot::cli::commands::facility::run(cmd, &global),
        Commands::Machine(cmd) => depot::cli::commands::machine::run(cmd, &global),
        Commands::Asm(cmd) => depot::cli::commands::asm::run(cmd, &global),
        Commands::Hotspot(cmd) => depot::cli::commands::hotspot::run(cmd, &global),
        Commands::Sup(cmd) => depot::cli::commands::sup::run(cmd, &global),
        Commands::Quote(cmd) => depot::cli::commands::quote::run(cmd, &global),
        Commands::Order(cmd) => depot::cli::commands::order::run(cmd, &global),
        Commands::Report(cmd) => depot::cli::commands::report::run(cmd, &global),
        Commands::Export(cmd) => depot::cli::commands::export::run(cmd, &global),
        Commands::WhereUsed(args) => depot::cli::commands::where_used::run(args, &global),
        Commands::Validate(args) => depot::cli::commands::validate::run(args, &global),
        Commands::Status(args) => depot::cli::commands::status::run(args, &global),
        Commands::Completions(args) => depot::cli::commands::completions::run(args),
    }
}
