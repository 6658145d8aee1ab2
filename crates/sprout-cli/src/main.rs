//! sprout CLI entry point.

use clap::Parser;
use miette::Result;
use sprout_cli::{cli, commands, error, logger, ui};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    logger::init_logger(args.verbose, args.quiet, args.no_color);
    ui::init_colors(args.no_color);

    let result = match args.command {
        cli::Command::Build(build_args) => commands::build_execute(build_args).await,
        cli::Command::Routes(routes_args) => commands::routes_execute(routes_args).await,
    };

    // Render through miette so library diagnostics keep their codes and help
    result.map_err(error::cli_error_to_miette)
}
