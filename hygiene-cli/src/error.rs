//! Error types emitted by the hygiene map CLI.
//!
//! Load failures are not errors here: a failed search is logged by the
//! manager and the remaining searches still run. Only configuration and
//! output problems stop the command.

use std::sync::Arc;

use hygiene_data::SourceBuildError;
use thiserror::Error;

/// Errors emitted by the hygiene map CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// One half of a coordinate pair was supplied without the other.
    #[error("missing {field} (set --{field} or {env}) to pair with --{paired}")]
    MissingArgument {
        /// Missing option.
        field: &'static str,
        /// Environment variable that can supply it.
        env: &'static str,
        /// Option that was supplied.
        paired: &'static str,
    },
    /// The dataset location or nearby URL is invalid, or the HTTP client
    /// could not be built.
    #[error("failed to set up establishment source: {0}")]
    BuildSource(#[from] SourceBuildError),
    /// The async runtime could not be started.
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
    /// Serialising the map style failed.
    #[error("failed to serialise map style: {0}")]
    SerialiseStyle(#[source] serde_json::Error),
    /// Writing the map style failed.
    #[error("failed to write map style: {0}")]
    WriteStyle(#[source] std::io::Error),
}
