//! Command-line interface definition.
//!
//! - `sprout build` - compile the app into client, server and service worker bundles
//! - `sprout routes` - print the route table the build would use

mod commands;
mod tests;

use clap::Parser;

pub use commands::{BuildArgs, Command, ProjectArgs, RoutesArgs};

/// sprout - build server-rendered apps from a route tree
#[derive(Parser, Debug)]
#[command(
    name = "sprout",
    version,
    about = "Build server-rendered apps from a route tree",
    long_about = "sprout turns a directory of route files into a client bundle, a server\n\
                  bundle, an optional service worker and a build.json manifest tying them\n\
                  together. Bundling is delegated to the project's rollup or webpack."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}
