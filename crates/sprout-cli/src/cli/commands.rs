use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Available sprout subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the app for production
    ///
    /// Compiles the client (and optionally a legacy client), then the server,
    /// then the service worker, and writes build.json describing the output.
    Build(BuildArgs),

    /// Print the route table
    ///
    /// Scans the routes directory exactly as a build would and lists pages and
    /// server routes in matching order.
    Routes(RoutesArgs),
}

/// Options shared by every command that reads a project.
#[derive(Args, Debug, Clone, Default)]
pub struct ProjectArgs {
    /// Project root (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Config file (defaults to sprout.toml in the project root, if present)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Application source directory
    #[arg(long, value_name = "DIR")]
    pub src: Option<PathBuf>,

    /// Routes directory
    #[arg(long, value_name = "DIR")]
    pub routes: Option<PathBuf>,

    /// Page component extensions, space or comma separated
    ///
    /// Examples:
    ///   sprout build --ext ".svelte .svx"
    #[arg(long, value_name = "EXTS")]
    pub ext: Option<String>,
}

/// Arguments for the build command
#[derive(Args, Debug, Clone, Default)]
pub struct BuildArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Framework output directory for generated modules
    #[arg(long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Static files directory
    #[arg(long = "static", value_name = "DIR")]
    pub static_dir: Option<PathBuf>,

    /// Build destination
    #[arg(short, long, value_name = "DIR")]
    pub dest: Option<PathBuf>,

    /// Bundler to use (detected from rollup.config.js / webpack.config.js when omitted)
    #[arg(short, long, value_parser = ["rollup", "webpack"])]
    pub bundler: Option<String>,

    /// Also build a nomodule client for older browsers (rollup only)
    #[arg(long)]
    pub legacy: bool,

    /// Disable server-side rendering and emit a static index.html
    #[arg(long)]
    pub no_ssr: bool,

    /// Use hash-based client routing
    #[arg(long)]
    pub hashbang: bool,

    /// URL prefix the app is served under
    #[arg(long, value_name = "PATH")]
    pub basepath: Option<String>,

    /// HTML template file, relative to the source directory
    #[arg(long, value_name = "FILE")]
    pub template_file: Option<String>,
}

/// Arguments for the routes command
#[derive(Args, Debug, Clone, Default)]
pub struct RoutesArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Print the route table as JSON
    #[arg(long)]
    pub json: bool,
}
