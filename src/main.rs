//! CountyMap - US county and state choropleth maps from the command line
//!
//! Loads a region catalog, replays coloring scripts against it and exports
//! the colored map, its key or the selected regions' metadata.

use clap::{Parser, Subcommand};
use countymap::cli::{
    ConfigArgs, ExitCode, ExportArgs, LegendArgs, LookupArgs, RegionsArgs, SessionArgs,
};
use countymap::constants::APP_BINARY_NAME;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// CountyMap - color US counties and states, then export the map
#[derive(Parser, Debug)]
#[command(name = APP_BINARY_NAME, author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the regions or region groups of a map catalog
    Regions(RegionsArgs),
    /// Replay an action script and print the map state
    Session(SessionArgs),
    /// Show the map key produced by an action script
    Legend(LegendArgs),
    /// Export the map as an image or the selection as JSON
    Export(ExportArgs),
    /// Look up knowledge-base metadata for a region
    Lookup(LookupArgs),
    /// Manage configuration
    Config(ConfigArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so JSON output on stdout stays clean
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = match &cli.command {
        Command::Regions(args) => args.execute(),
        Command::Session(args) => args.execute(),
        Command::Legend(args) => args.execute(),
        Command::Export(args) => args.execute(),
        Command::Lookup(args) => args.execute(),
        Command::Config(args) => args.execute(),
    };

    match result {
        Ok(()) => ExitCode::Success.into(),
        Err(err) => {
            eprintln!("Error: {err}");
            err.exit_code().into()
        }
    }
}
