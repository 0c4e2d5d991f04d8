//! Render command implementation for the hygiene map CLI.
//!
//! The command drives the same pipeline the browser map runs: register the
//! marker image, load the dataset, then run any requested nearby searches.
//! The resulting map is printed as a style document.

use std::io::Write;
use std::time::Duration;

use clap::Parser;
use geo::Coord;
use hygiene_core::{MapConfig, MapStyle, SchemaVariant};
use hygiene_data::{
    DataSourceManager, DatasetLocation, EstablishmentSource, HttpEstablishmentSource,
    HttpEstablishmentSourceConfig, LoadOutcome,
};
use log::{info, warn};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_DATASET, ARG_DATASET_SCHEMA, ARG_LATITUDE, ARG_LONGITUDE, ARG_NEARBY_SCHEMA, ARG_NEARBY_URL,
    ARG_SEARCH_CENTRE, ARG_TIMEOUT_SECS, CliError, ENV_LATITUDE, ENV_LONGITUDE,
};

/// CLI arguments for the `render` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "render",
    long_about = "Load establishment listings onto an in-memory map and print \
                 the resulting style document. The dataset is loaded first, \
                 then any nearby searches run concurrently. Failed loads are \
                 logged and leave the map unchanged.",
    about = "Render establishment markers as a map style"
)]
#[ortho_config(prefix = "HYGIENE")]
pub(crate) struct RenderArgs {
    /// URL or local path of the static establishment dataset.
    #[arg(long = ARG_DATASET, value_name = "url-or-path")]
    #[serde(default)]
    pub(crate) dataset: Option<String>,
    /// Schema of the dataset ("open-data" or "ratings-api").
    #[arg(long = ARG_DATASET_SCHEMA, value_name = "schema")]
    #[serde(default)]
    pub(crate) dataset_schema: Option<SchemaVariant>,
    /// Query-by-coordinate endpoint for nearby searches.
    #[arg(long = ARG_NEARBY_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) nearby_url: Option<String>,
    /// Schema of nearby-search responses.
    #[arg(long = ARG_NEARBY_SCHEMA, value_name = "schema")]
    #[serde(default)]
    pub(crate) nearby_schema: Option<SchemaVariant>,
    /// Longitude of a nearby search.
    #[arg(long = ARG_LONGITUDE, value_name = "degrees", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) longitude: Option<f64>,
    /// Latitude of a nearby search.
    #[arg(long = ARG_LATITUDE, value_name = "degrees", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) latitude: Option<f64>,
    /// Also search around the map's starting centre.
    #[arg(
        long = ARG_SEARCH_CENTRE,
        value_name = "bool",
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    #[serde(default)]
    pub(crate) search_centre: Option<bool>,
    /// Abandon requests after this many seconds.
    #[arg(long = ARG_TIMEOUT_SECS, value_name = "seconds")]
    #[serde(default)]
    pub(crate) timeout_secs: Option<u64>,
}

impl RenderArgs {
    pub(crate) fn into_config(self) -> Result<RenderConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        RenderConfig::try_from(merged)
    }
}

/// Resolved `render` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RenderConfig {
    /// Establishment source settings.
    pub(crate) source: HttpEstablishmentSourceConfig,
    /// Coordinate of an explicit nearby search.
    pub(crate) nearby: Option<Coord<f64>>,
    /// Whether to search around the map centre.
    pub(crate) search_centre: bool,
}

impl TryFrom<RenderArgs> for RenderConfig {
    type Error = CliError;

    fn try_from(args: RenderArgs) -> Result<Self, Self::Error> {
        let defaults = HttpEstablishmentSourceConfig::default();
        let mut source =
            HttpEstablishmentSourceConfig::new(args.nearby_url.unwrap_or(defaults.nearby_url))
                .with_nearby_schema(args.nearby_schema.unwrap_or(defaults.nearby_schema));
        if let Some(dataset) = args.dataset {
            let location: DatasetLocation = dataset.parse()?;
            let schema = args.dataset_schema.unwrap_or(defaults.dataset_schema);
            source = source.with_dataset(location, schema);
        }
        if let Some(secs) = args.timeout_secs {
            source = source.with_timeout(Duration::from_secs(secs));
        }

        let nearby = match (args.longitude, args.latitude) {
            (Some(x), Some(y)) => Some(Coord { x, y }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(CliError::MissingArgument {
                    field: ARG_LATITUDE,
                    env: ENV_LATITUDE,
                    paired: ARG_LONGITUDE,
                });
            }
            (None, Some(_)) => {
                return Err(CliError::MissingArgument {
                    field: ARG_LONGITUDE,
                    env: ENV_LONGITUDE,
                    paired: ARG_LATITUDE,
                });
            }
        };

        Ok(Self {
            source,
            nearby,
            search_centre: args.search_centre.unwrap_or(false),
        })
    }
}

pub(super) fn run_render(args: RenderArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_render_with(args, &mut stdout)
}

pub(super) fn run_render_with(args: RenderArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    render_config(&config, writer)
}

/// Render a resolved configuration into `writer`.
pub(crate) fn render_config(config: &RenderConfig, writer: &mut dyn Write) -> Result<(), CliError> {
    let source = HttpEstablishmentSource::with_config(config.source.clone())?;
    let style = render_with_source(source, config)?;
    write_style(writer, &style)
}

/// Run the map-load pipeline and any requested searches against `source`.
pub(crate) fn render_with_source<S: EstablishmentSource>(
    source: S,
    config: &RenderConfig,
) -> Result<MapStyle, CliError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    let manager = DataSourceManager::new(source, MapStyle::new(MapConfig::default()));

    let outcomes = runtime.block_on(async {
        let mut outcomes: Vec<LoadOutcome> = manager.on_map_load().await.into_iter().collect();
        let nearby = config.nearby.map(|coord| manager.search_nearby(coord));
        let centre = config.search_centre.then(|| manager.search_nearby_centre());
        let (nearby, centre) = tokio::join!(optional(nearby), optional(centre));
        outcomes.extend(nearby);
        outcomes.extend(centre);
        outcomes
    });

    let rendered = outcomes.iter().filter(|outcome| outcome.is_rendered()).count();
    if rendered < outcomes.len() {
        warn!("{} of {} loads failed", outcomes.len() - rendered, outcomes.len());
    }
    info!("rendered {rendered} marker layers");
    Ok(manager.into_map())
}

async fn optional<F: Future>(future: Option<F>) -> Option<F::Output> {
    match future {
        Some(future) => Some(future.await),
        None => None,
    }
}

fn write_style(writer: &mut dyn Write, style: &MapStyle) -> Result<(), CliError> {
    let payload = style.to_json_pretty().map_err(CliError::SerialiseStyle)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteStyle)?;
    writer.write_all(b"\n").map_err(CliError::WriteStyle)?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<RenderConfig, CliError> {
    let merged = RenderArgs::merge_from_layers(layers).map_err(CliError::from)?;
    RenderConfig::try_from(merged)
}
