//! Loading establishment listings onto a map.
//!
//! [`DataSourceManager`] ties an [`EstablishmentSource`] to a [`MapSink`].
//! Every load runs the same pipeline: reserve a fresh source name, fetch the
//! listing, parse it, extract point features, then register a GeoJSON source
//! and a marker layer under the reserved name. Failures end the load with a
//! single error log entry and are reported back as a [`LoadOutcome`]; they
//! never propagate, are never retried and never block later loads.
//!
//! # Concurrency
//!
//! All operations take `&self`, so several loads may be in flight on one
//! manager. Names are reserved when an operation is called, before its
//! future first suspends, so concurrent loads never share a name whatever
//! order their responses arrive in. The map sits behind a [`Mutex`] that is
//! only ever locked for synchronous updates.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use geo::Coord;
use hygiene_core::{
    FeatureCollection, LayerListener, MARKER_IMAGE_NAME, MARKER_IMAGE_URL, MapSink,
    SourceNameSequence, SymbolLayer, XmlDocument, XmlError, extract_features,
};
use log::{debug, error, info};
use thiserror::Error;

use crate::source::{EstablishmentQuery, EstablishmentSource, FetchError};

/// Why a load produced no layer.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The listing could not be fetched.
    #[error("request failed: {0}")]
    RequestFailed(#[from] FetchError),
    /// The listing was not well-formed XML.
    #[error("failed to parse listing: {0}")]
    ParseFailed(#[from] XmlError),
}

/// Terminal state of one load.
#[derive(Debug)]
pub enum LoadOutcome {
    /// A source and marker layer were added.
    Rendered {
        /// Name shared by the new source and layer.
        source: String,
        /// Number of markers in the layer.
        features: usize,
    },
    /// Nothing was added to the map.
    Failed {
        /// Name reserved for the load. It is never reused.
        source: String,
        /// What went wrong.
        error: LoadError,
    },
}

impl LoadOutcome {
    /// Name reserved for the load, whether or not it rendered.
    #[must_use]
    pub fn source_name(&self) -> &str {
        match self {
            Self::Rendered { source, .. } | Self::Failed { source, .. } => source,
        }
    }

    /// Whether a layer was added.
    #[must_use]
    pub const fn is_rendered(&self) -> bool {
        matches!(self, Self::Rendered { .. })
    }

    /// The failure, if the load did not render.
    #[must_use]
    pub const fn error(&self) -> Option<&LoadError> {
        match self {
            Self::Rendered { .. } => None,
            Self::Failed { error, .. } => Some(error),
        }
    }
}

/// Fetches listings and renders them as uniquely named marker layers.
///
/// # Examples
///
/// ```
/// use geo::Coord;
/// use hygiene_core::{MapConfig, MapStyle, SchemaVariant};
/// use hygiene_data::DataSourceManager;
/// use hygiene_data::test_support::StubEstablishmentSource;
///
/// # tokio::runtime::Builder::new_current_thread().build()?.block_on(async {
/// let source = StubEstablishmentSource::with_xml(
///     "<establishments><establishment><BusinessName>Cafe</BusinessName>\
///      <geocode><longitude>-0.7</longitude><latitude>53.1</latitude></geocode>\
///      </establishment></establishments>",
///     SchemaVariant::RatingsApi,
/// );
/// let manager = DataSourceManager::new(source, MapStyle::new(MapConfig::default()));
///
/// let outcome = manager.search_nearby(Coord { x: -0.7, y: 53.1 }).await;
/// assert!(outcome.is_rendered());
/// assert_eq!(outcome.source_name(), "points0");
/// # });
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug)]
pub struct DataSourceManager<S, M> {
    source: S,
    map: Mutex<M>,
    names: SourceNameSequence,
    interactions: bool,
}

impl<S, M> DataSourceManager<S, M>
where
    S: EstablishmentSource,
    M: MapSink,
{
    /// Manager loading from `source` onto `map`, with click and hover
    /// interactions enabled.
    #[must_use]
    pub fn new(source: S, map: M) -> Self {
        Self {
            source,
            map: Mutex::new(map),
            names: SourceNameSequence::default(),
            interactions: true,
        }
    }

    /// Use `names` instead of the default `points` sequence.
    #[must_use]
    pub fn with_names(mut self, names: SourceNameSequence) -> Self {
        self.names = names;
        self
    }

    /// Stop attaching popup and cursor listeners to new layers.
    #[must_use]
    pub const fn without_interactions(mut self) -> Self {
        self.interactions = false;
        self
    }

    /// Register the marker image, then load the dataset if the source has
    /// one. Returns the dataset outcome, or `None` when there is no dataset.
    pub async fn on_map_load(&self) -> Option<LoadOutcome> {
        self.lock_map().add_image(MARKER_IMAGE_NAME, MARKER_IMAGE_URL);
        if !self.source.has_dataset() {
            debug!("no dataset configured; skipping initial load");
            return None;
        }
        Some(self.load_dataset().await)
    }

    /// Load the configured static dataset.
    pub fn load_dataset(&self) -> impl Future<Output = LoadOutcome> + '_ {
        self.start(EstablishmentQuery::Dataset)
    }

    /// Load establishments near `coord` (`x` = longitude, `y` = latitude).
    ///
    /// The source name is reserved immediately, before the returned future
    /// is first polled.
    pub fn search_nearby(&self, coord: Coord<f64>) -> impl Future<Output = LoadOutcome> + '_ {
        self.start(EstablishmentQuery::Nearby(coord))
    }

    /// Load establishments near the map's current centre.
    pub fn search_nearby_centre(&self) -> impl Future<Output = LoadOutcome> + '_ {
        let centre = self.lock_map().centre();
        self.search_nearby(centre)
    }

    /// Run `f` against the map.
    pub fn with_map<R>(&self, f: impl FnOnce(&M) -> R) -> R {
        f(&self.lock_map())
    }

    /// Consume the manager, returning the map.
    pub fn into_map(self) -> M {
        self.map.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn start(&self, query: EstablishmentQuery) -> impl Future<Output = LoadOutcome> + '_ {
        let name = self.names.next_name();
        debug!("reserved source {name} for {query}");
        self.load(name, query)
    }

    async fn load(&self, name: String, query: EstablishmentQuery) -> LoadOutcome {
        match self.fetch_features(&query).await {
            Ok(features) => {
                let count = features.len();
                self.render(&name, features);
                info!("rendered {count} establishments from {query} as {name}");
                LoadOutcome::Rendered {
                    source: name,
                    features: count,
                }
            }
            Err(err) => {
                error!("failed to load {query} into {name}: {err}");
                LoadOutcome::Failed {
                    source: name,
                    error: err,
                }
            }
        }
    }

    async fn fetch_features(&self, query: &EstablishmentQuery) -> Result<FeatureCollection, LoadError> {
        let payload = self.source.fetch(query).await?;
        let document = XmlDocument::parse(&payload.xml)?;
        Ok(extract_features(&document, &payload.schema.tag_names()))
    }

    fn render(&self, name: &str, features: FeatureCollection) {
        let mut map = self.lock_map();
        map.add_source(name, features);
        map.add_layer(SymbolLayer::markers(name));
        if self.interactions {
            for listener in LayerListener::marker_interactions(name) {
                map.add_listener(listener);
            }
        }
    }

    fn lock_map(&self) -> MutexGuard<'_, M> {
        self.map.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
