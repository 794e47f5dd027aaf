use clap::Parser;
use miette::Result;
use tsrc::cli::{Cli, Commands};
use tsrc::core::logging;

fn main() -> Result<()> {
    // Install miette's fancy error handler for beautiful diagnostics
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
    logging::init(cli.global.verbose);

    match cli.command {
        Commands::Init(args) => tsrc::cli::commands::init::run(args),
        Commands::Source(args) => tsrc::cli::commands::source::run(args, &cli.global),
        Commands::Order(args) => tsrc::cli::commands::order::run(args, &cli.global),
        Commands::Vendor(cmd) => tsrc::cli::commands::vendor::run(cmd, &cli.global),
        Commands::Customs(args) => tsrc::cli::commands::customs::run(args, &cli.global),
        Commands::Completions(args) => tsrc::cli::commands::completions::run(args),
    }
}
