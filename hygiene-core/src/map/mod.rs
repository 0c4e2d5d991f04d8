//! Map renderer capability and the layer specifications handed to it.
//!
//! The renderer is an external collaborator. [`MapSink`] captures the small
//! imperative surface this system needs (images, sources, layers, listeners
//! and the current viewport centre) so the loading pipeline can run against
//! any implementation. [`MapStyle`] is the in-process implementation: it
//! records every effect as a Mapbox-style JSON document.

mod popup;
mod style;

use geo::Coord;
use serde::{Deserialize, Serialize, Serializer};

use crate::feature::FeatureCollection;

pub use popup::Popup;
pub use style::MapStyle;

/// Name under which the marker icon is registered.
pub const MARKER_IMAGE_NAME: &str = "custom-marker";

/// Location of the marker icon.
pub const MARKER_IMAGE_URL: &str = "https://docs.mapbox.com/mapbox-gl-js/assets/custom_marker.png";

/// Fonts used for marker labels, in fallback order.
const LABEL_FONTS: [&str; 2] = ["Open Sans Semibold", "Arial Unicode MS Bold"];

/// Feature property displayed as the marker label and popup content.
const TITLE_PROPERTY: &str = "title";

/// Capability through which the loading pipeline mutates map state.
///
/// All methods are synchronous effects. Implementations only ever receive
/// additions; nothing is removed or replaced.
pub trait MapSink {
    /// Register an icon image under `name`.
    fn add_image(&mut self, name: &str, url: &str);

    /// Register a GeoJSON source.
    fn add_source(&mut self, name: &str, data: FeatureCollection);

    /// Add a symbol layer drawing from a previously added source.
    fn add_layer(&mut self, layer: SymbolLayer);

    /// Attach a pointer listener scoped to one layer.
    fn add_listener(&mut self, listener: LayerListener);

    /// Current viewport centre.
    fn centre(&self) -> Coord<f64>;
}

/// Initial map viewport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    /// Identifier of the element hosting the map.
    pub container: String,
    /// Starting centre, written under the renderer's `center` key.
    #[serde(rename = "center", with = "lon_lat")]
    pub centre: Coord<f64>,
    /// Starting zoom level.
    pub zoom: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            container: "map".to_owned(),
            centre: Coord {
                x: -0.7014,
                y: 53.15791,
            },
            zoom: 15.0,
        }
    }
}

impl MapConfig {
    /// Set the starting centre.
    #[must_use]
    pub const fn with_centre(mut self, centre: Coord<f64>) -> Self {
        self.centre = centre;
        self
    }

    /// Set the starting zoom.
    #[must_use]
    pub const fn with_zoom(mut self, zoom: f64) -> Self {
        self.zoom = zoom;
        self
    }
}

/// A symbol layer drawing markers for one source.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "symbol")]
pub struct SymbolLayer {
    /// Layer identifier.
    pub id: String,
    /// Source the layer draws from.
    pub source: String,
    /// Layout properties.
    pub layout: SymbolLayout,
}

impl SymbolLayer {
    /// Marker layer for `source`, sharing its name: the marker icon with the
    /// feature title drawn beneath it.
    ///
    /// # Examples
    ///
    /// ```
    /// use hygiene_core::SymbolLayer;
    ///
    /// let layer = SymbolLayer::markers("points0");
    /// let json = serde_json::to_value(&layer)?;
    /// assert_eq!(json["type"], "symbol");
    /// assert_eq!(json["layout"]["text-field"], serde_json::json!(["get", "title"]));
    /// # Ok::<(), serde_json::Error>(())
    /// ```
    #[must_use]
    pub fn markers(source: &str) -> Self {
        Self {
            id: source.to_owned(),
            source: source.to_owned(),
            layout: SymbolLayout {
                icon_image: MARKER_IMAGE_NAME.to_owned(),
                text_field: PropertyLookup(TITLE_PROPERTY.to_owned()),
                text_font: LABEL_FONTS.iter().map(|font| (*font).to_owned()).collect(),
                text_offset: [0.0, 1.25],
                text_anchor: TextAnchor::Top,
            },
        }
    }
}

/// Layout block of a [`SymbolLayer`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SymbolLayout {
    /// Registered image drawn at each point.
    pub icon_image: String,
    /// Feature property rendered as the label.
    pub text_field: PropertyLookup,
    /// Label font stack.
    pub text_font: Vec<String>,
    /// Label offset from the point, in ems.
    pub text_offset: [f64; 2],
    /// Which part of the label sits at the offset position.
    pub text_anchor: TextAnchor,
}

/// A `["get", property]` style expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyLookup(pub String);

impl Serialize for PropertyLookup {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ("get", &self.0).serialize(serializer)
    }
}

/// Label anchor positions used by this system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAnchor {
    /// The top of the label sits at the anchor point.
    Top,
}

/// Pointer events a layer listener reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerEvent {
    /// A click on a feature.
    Click,
    /// The pointer entered a feature.
    MouseEnter,
    /// The pointer left a feature.
    MouseLeave,
}

/// What a listener does when its event fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum ListenerAction {
    /// Open a popup showing the clicked feature's title.
    ShowPopup,
    /// Change the canvas cursor.
    SetCursor {
        /// CSS cursor keyword.
        cursor: String,
    },
    /// Restore the default cursor.
    ResetCursor,
}

/// A pointer listener scoped to one layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerListener {
    /// Triggering event.
    pub event: PointerEvent,
    /// Layer the listener is scoped to.
    pub layer: String,
    /// Effect of the listener.
    #[serde(flatten)]
    pub action: ListenerAction,
}

impl LayerListener {
    /// The interaction set attached to every marker layer: click opens a
    /// popup, hovering switches to a pointer cursor.
    #[must_use]
    pub fn marker_interactions(layer: &str) -> [Self; 3] {
        [
            Self {
                event: PointerEvent::Click,
                layer: layer.to_owned(),
                action: ListenerAction::ShowPopup,
            },
            Self {
                event: PointerEvent::MouseEnter,
                layer: layer.to_owned(),
                action: ListenerAction::SetCursor {
                    cursor: "pointer".to_owned(),
                },
            },
            Self {
                event: PointerEvent::MouseLeave,
                layer: layer.to_owned(),
                action: ListenerAction::ResetCursor,
            },
        ]
    }
}

/// Serialise a coordinate as a `[longitude, latitude]` pair.
mod lon_lat {
    use geo::Coord;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub(super) fn serialize<S: Serializer>(coord: &Coord<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        [coord.x, coord.y].serialize(serializer)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Coord<f64>, D::Error> {
        let [x, y] = <[f64; 2]>::deserialize(deserializer)?;
        Ok(Coord { x, y })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn marker_layer_matches_renderer_layout() {
        let value = serde_json::to_value(SymbolLayer::markers("points3")).expect("layer should serialise");

        assert_eq!(
            value,
            json!({
                "type": "symbol",
                "id": "points3",
                "source": "points3",
                "layout": {
                    "icon-image": "custom-marker",
                    "text-field": ["get", "title"],
                    "text-font": ["Open Sans Semibold", "Arial Unicode MS Bold"],
                    "text-offset": [0.0, 1.25],
                    "text-anchor": "top"
                }
            })
        );
    }

    #[rstest]
    fn marker_interactions_are_scoped_to_layer() {
        let listeners = LayerListener::marker_interactions("points1");

        assert!(listeners.iter().all(|listener| listener.layer == "points1"));
        let events: Vec<PointerEvent> = listeners.iter().map(|listener| listener.event).collect();
        assert_eq!(
            events,
            [PointerEvent::Click, PointerEvent::MouseEnter, PointerEvent::MouseLeave]
        );
    }

    #[rstest]
    fn listener_serialises_flat() {
        let [_, enter, _] = LayerListener::marker_interactions("points0");

        let value = serde_json::to_value(&enter).expect("listener should serialise");

        assert_eq!(
            value,
            json!({ "event": "mouseenter", "layer": "points0", "action": "set-cursor", "cursor": "pointer" })
        );
    }

    #[rstest]
    fn default_config_centres_on_lincoln() {
        let config = MapConfig::default();
        let value = serde_json::to_value(&config).expect("config should serialise");

        assert_eq!(value, json!({ "container": "map", "center": [-0.7014, 53.15791], "zoom": 15.0 }));
    }

    #[rstest]
    fn builders_override_viewport_and_round_trip() {
        let config = MapConfig::default()
            .with_centre(Coord { x: 179.5, y: -12.25 })
            .with_zoom(9.5);
        let value = serde_json::to_value(&config).expect("config should serialise");

        assert_eq!(value.get("center"), Some(&json!([179.5, -12.25])));
        assert_eq!(value.get("centre"), None);
        let parsed: MapConfig = serde_json::from_value(value).expect("config should parse");
        assert_eq!(parsed, config);
    }
}
