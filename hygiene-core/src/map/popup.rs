use geo::Coord;
use serde::Serialize;

use crate::feature::PointFeature;

/// A popup anchored at a marker, showing its title.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Popup {
    /// Anchor position, possibly shifted into the clicked world copy.
    #[serde(with = "super::lon_lat")]
    pub location: Coord<f64>,
    /// Text shown in the popup.
    pub content: String,
}

impl Popup {
    /// Popup for a click at `click` on `feature`.
    ///
    /// When the map is zoomed out far enough to show several copies of the
    /// world, the feature's longitude is moved onto the copy that was
    /// clicked.
    ///
    /// # Examples
    ///
    /// ```
    /// use geo::Coord;
    /// use hygiene_core::{PointFeature, Popup};
    ///
    /// let feature = PointFeature::new(Coord { x: 170.0, y: 10.0 }, "Harbour Cafe");
    /// let popup = Popup::for_click(&feature, Coord { x: -185.0, y: 10.0 });
    /// assert_eq!(popup.location, Coord { x: -190.0, y: 10.0 });
    /// assert_eq!(popup.content, "Harbour Cafe");
    /// ```
    #[must_use]
    pub fn for_click(feature: &PointFeature, click: Coord<f64>) -> Self {
        let location = feature.location();
        Self {
            location: Coord {
                x: wrap_towards(location.x, click.x),
                y: location.y,
            },
            content: feature.title().to_owned(),
        }
    }
}

/// Shift `longitude` by whole turns until it lies within 180° of `reference`.
#[expect(
    clippy::float_arithmetic,
    reason = "longitude wrapping is inherently floating-point"
)]
fn wrap_towards(longitude: f64, reference: f64) -> f64 {
    let delta = reference - longitude;
    if !delta.is_finite() || delta.abs() <= 180.0 {
        return longitude;
    }
    let turns = ((delta.abs() - 180.0) / 360.0).ceil();
    longitude + delta.signum() * turns * 360.0
}
