//! GeoJSON point features handed to the map renderer.
//!
//! Coordinates are WGS84 with `x = longitude` and `y = latitude`, and are
//! always serialised longitude first.

use geo::Coord;
use serde::{Deserialize, Serialize};

/// A titled marker position.
///
/// # Examples
///
/// ```
/// use geo::Coord;
/// use hygiene_core::PointFeature;
///
/// let feature = PointFeature::new(Coord { x: -0.7014, y: 53.15791 }, "Fish & Chips Shop");
/// let json = serde_json::to_value(&feature)?;
/// assert_eq!(json["geometry"]["coordinates"][0], -0.7014);
/// assert_eq!(json["properties"]["title"], "Fish & Chips Shop");
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "GeoJsonFeature", from = "GeoJsonFeature")]
pub struct PointFeature {
    location: Coord<f64>,
    title: String,
}

impl PointFeature {
    /// Construct a feature at `location` labelled `title`.
    #[must_use]
    pub fn new(location: Coord<f64>, title: impl Into<String>) -> Self {
        Self {
            location,
            title: title.into(),
        }
    }

    /// Marker position.
    #[must_use]
    pub const fn location(&self) -> Coord<f64> {
        self.location
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.location.x
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.location.y
    }

    /// Display title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "type")]
enum GeoJsonFeature {
    Feature {
        geometry: GeoJsonGeometry,
        properties: FeatureProperties,
    },
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "type")]
enum GeoJsonGeometry {
    Point { coordinates: [f64; 2] },
}

#[derive(Serialize, Deserialize)]
struct FeatureProperties {
    title: String,
}

impl From<PointFeature> for GeoJsonFeature {
    fn from(feature: PointFeature) -> Self {
        Self::Feature {
            geometry: GeoJsonGeometry::Point {
                coordinates: [feature.location.x, feature.location.y],
            },
            properties: FeatureProperties {
                title: feature.title,
            },
        }
    }
}

impl From<GeoJsonFeature> for PointFeature {
    fn from(feature: GeoJsonFeature) -> Self {
        let GeoJsonFeature::Feature {
            geometry: GeoJsonGeometry::Point {
                coordinates: [x, y],
            },
            properties,
        } = feature;
        Self::new(Coord { x, y }, properties.title)
    }
}

/// Ordered point features, serialised as a GeoJSON `FeatureCollection`.
///
/// Order follows the source document; duplicates are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "type", rename = "FeatureCollection")]
pub struct FeatureCollection {
    features: Vec<PointFeature>,
}

impl FeatureCollection {
    /// Wrap `features` without reordering them.
    #[must_use]
    pub const fn new(features: Vec<PointFeature>) -> Self {
        Self { features }
    }

    /// Features in order.
    #[must_use]
    pub fn features(&self) -> &[PointFeature] {
        &self.features
    }

    /// Feature at `index`, if present.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&PointFeature> {
        self.features.get(index)
    }

    /// Number of features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the collection holds no features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Iterate over features in order.
    pub fn iter(&self) -> std::slice::Iter<'_, PointFeature> {
        self.features.iter()
    }
}

impl FromIterator<PointFeature> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = PointFeature>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl IntoIterator for FeatureCollection {
    type Item = PointFeature;
    type IntoIter = std::vec::IntoIter<PointFeature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}

impl<'a> IntoIterator for &'a FeatureCollection {
    type Item = &'a PointFeature;
    type IntoIter = std::slice::Iter<'a, PointFeature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}
