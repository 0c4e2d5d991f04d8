//! Command-line interface for the hygiene map.
//!
//! `hygiene-map render` loads establishment listings onto an in-memory map
//! and prints the resulting style document as JSON. Options come from CLI
//! flags, configuration files, or `HYGIENE_CMDS_RENDER_*` environment
//! variables.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod error;
mod render;

pub use error::CliError;

use render::{RenderArgs, run_render};

const ARG_DATASET: &str = "dataset";
const ARG_DATASET_SCHEMA: &str = "dataset-schema";
const ARG_NEARBY_URL: &str = "nearby-url";
const ARG_NEARBY_SCHEMA: &str = "nearby-schema";
const ARG_LONGITUDE: &str = "longitude";
const ARG_LATITUDE: &str = "latitude";
const ARG_SEARCH_CENTRE: &str = "search-centre";
const ARG_TIMEOUT_SECS: &str = "timeout-secs";
const ENV_LONGITUDE: &str = "HYGIENE_CMDS_RENDER_LONGITUDE";
const ENV_LATITUDE: &str = "HYGIENE_CMDS_RENDER_LATITUDE";

/// Run the hygiene map CLI with the current process arguments and
/// environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Render(args) => run_render(*args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "hygiene-map",
    about = "Plot food hygiene establishments as map markers",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load listings and print the map style with its marker layers.
    Render(Box<RenderArgs>),
}

#[cfg(test)]
mod tests;
