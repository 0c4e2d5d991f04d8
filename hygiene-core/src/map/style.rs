use geo::Coord;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::{LayerListener, ListenerAction, MapConfig, MapSink, PointerEvent, Popup, SymbolLayer};
use crate::feature::FeatureCollection;

/// Style specification version written to the document.
const STYLE_VERSION: u8 = 8;

/// In-memory map that records every effect as a style document.
///
/// Sources and layers keep insertion order, matching the draw order a
/// renderer would use. The document also tracks the viewport centre and the
/// cursor so pointer interactions can be replayed.
///
/// # Examples
///
/// ```
/// use geo::Coord;
/// use hygiene_core::{FeatureCollection, MapConfig, MapSink, MapStyle, PointFeature, SymbolLayer};
///
/// let mut map = MapStyle::new(MapConfig::default());
/// let data = FeatureCollection::new(vec![PointFeature::new(Coord { x: 1.0, y: 2.0 }, "Deli")]);
/// map.add_source("points0", data);
/// map.add_layer(SymbolLayer::markers("points0"));
///
/// assert_eq!(map.source_names().collect::<Vec<_>>(), ["points0"]);
/// let json = map.to_json_pretty()?;
/// assert!(json.contains("\"points0\""));
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapStyle {
    version: u8,
    #[serde(flatten)]
    config: MapConfig,
    #[serde(serialize_with = "ordered_map")]
    images: Vec<(String, String)>,
    #[serde(serialize_with = "ordered_map")]
    sources: Vec<(String, GeoJsonSource)>,
    layers: Vec<SymbolLayer>,
    listeners: Vec<LayerListener>,
    #[serde(skip)]
    cursor: Option<String>,
}

/// A `geojson` source entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "geojson")]
struct GeoJsonSource {
    data: FeatureCollection,
}

impl MapStyle {
    /// Empty style for the given viewport.
    #[must_use]
    pub const fn new(config: MapConfig) -> Self {
        Self {
            version: STYLE_VERSION,
            config,
            images: Vec::new(),
            sources: Vec::new(),
            layers: Vec::new(),
            listeners: Vec::new(),
            cursor: None,
        }
    }

    /// Viewport configuration, including the current centre.
    #[must_use]
    pub const fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Move the viewport, as a user panning the map would.
    pub const fn pan_to(&mut self, centre: Coord<f64>) {
        self.config.centre = centre;
    }

    /// URL registered for image `name`.
    #[must_use]
    pub fn image(&self, name: &str) -> Option<&str> {
        self.images
            .iter()
            .find(|(image, _)| image == name)
            .map(|(_, url)| url.as_str())
    }

    /// Data registered under source `name`.
    #[must_use]
    pub fn source(&self, name: &str) -> Option<&FeatureCollection> {
        self.sources
            .iter()
            .find(|(source, _)| source == name)
            .map(|(_, entry)| &entry.data)
    }

    /// Source names in registration order.
    pub fn source_names(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|(name, _)| name.as_str())
    }

    /// Layers in draw order.
    #[must_use]
    pub fn layers(&self) -> &[SymbolLayer] {
        &self.layers
    }

    /// Every listener attached so far.
    #[must_use]
    pub fn listeners(&self) -> &[LayerListener] {
        &self.listeners
    }

    /// Cursor set by the most recent hover listener, if any.
    #[must_use]
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    /// Replay a click at `at` on feature `index` of `layer`.
    ///
    /// Returns the popup a `ShowPopup` listener would open, or `None` when
    /// the layer has no such listener or no such feature.
    #[must_use]
    pub fn click(&self, layer: &str, index: usize, at: Coord<f64>) -> Option<Popup> {
        let wants_popup = self.listeners_for(layer, PointerEvent::Click)
            .any(|action| *action == ListenerAction::ShowPopup);
        if !wants_popup {
            return None;
        }
        let source = &self.layers.iter().find(|candidate| candidate.id == layer)?.source;
        let feature = self.source(source)?.get(index)?;
        Some(Popup::for_click(feature, at))
    }

    /// Replay a hover event on `layer`, applying any cursor listeners.
    pub fn hover(&mut self, layer: &str, event: PointerEvent) {
        let mut cursor = self.cursor.clone();
        for action in self.listeners_for(layer, event) {
            match action {
                ListenerAction::SetCursor { cursor: next } => cursor = Some(next.clone()),
                ListenerAction::ResetCursor => cursor = None,
                ListenerAction::ShowPopup => {}
            }
        }
        self.cursor = cursor;
    }

    /// Render the document as indented JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    fn listeners_for<'a>(
        &'a self,
        layer: &'a str,
        event: PointerEvent,
    ) -> impl Iterator<Item = &'a ListenerAction> + 'a {
        self.listeners
            .iter()
            .filter(move |listener| listener.layer == layer && listener.event == event)
            .map(|listener| &listener.action)
    }
}

impl MapSink for MapStyle {
    fn add_image(&mut self, name: &str, url: &str) {
        self.images.push((name.to_owned(), url.to_owned()));
    }

    fn add_source(&mut self, name: &str, data: FeatureCollection) {
        self.sources.push((name.to_owned(), GeoJsonSource { data }));
    }

    fn add_layer(&mut self, layer: SymbolLayer) {
        self.layers.push(layer);
    }

    fn add_listener(&mut self, listener: LayerListener) {
        self.listeners.push(listener);
    }

    fn centre(&self) -> Coord<f64> {
        self.config.centre
    }
}

/// Write `(key, value)` pairs as a JSON object without reordering keys.
fn ordered_map<S, V>(entries: &[(String, V)], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    V: Serialize,
{
    let mut map = serializer.serialize_map(Some(entries.len()))?;
    for (key, value) in entries {
        map.serialize_entry(key, value)?;
    }
    map.end()
}
