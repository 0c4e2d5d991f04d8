//! Turn establishment listings into point features.
//!
//! Listings come in two schema variants that differ only in tag-name casing,
//! so extraction is driven by a [`TagNames`] value rather than hard-coded
//! names. Records whose geocoding is missing or ambiguous are skipped
//! quietly: they are a filter condition, not an error. Coordinate text is
//! read by its leading number, so trailing junk does not drop a record.

use std::fmt;
use std::str::FromStr;

use geo::Coord;
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::feature::{FeatureCollection, PointFeature};
use crate::xml::{XmlDocument, XmlElement};

/// Element names used to locate establishment data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagNames {
    /// Element wrapping one establishment.
    pub record: String,
    /// Element holding the business name.
    pub name: String,
    /// Element wrapping the coordinate pair.
    pub geocode: String,
    /// Longitude element inside the geocode.
    pub longitude: String,
    /// Latitude element inside the geocode.
    pub latitude: String,
}

impl TagNames {
    /// Build a custom tag set.
    #[must_use]
    pub fn new(
        record: impl Into<String>,
        name: impl Into<String>,
        geocode: impl Into<String>,
        longitude: impl Into<String>,
        latitude: impl Into<String>,
    ) -> Self {
        Self {
            record: record.into(),
            name: name.into(),
            geocode: geocode.into(),
            longitude: longitude.into(),
            latitude: latitude.into(),
        }
    }
}

/// Request headers demanded by the ratings API.
const RATINGS_API_HEADERS: &[(&str, &str)] = &[("x-api-version", "2"), ("accept", "application/xml")];

/// The two observed establishment-listing schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchemaVariant {
    /// Open-data bulk files (`EstablishmentDetail`, `Geocode`, `Longitude`).
    #[default]
    OpenData,
    /// Query-by-coordinate API (`establishment`, `geocode`, `longitude`).
    RatingsApi,
}

impl SchemaVariant {
    /// Tag names for this variant.
    #[must_use]
    pub fn tag_names(self) -> TagNames {
        match self {
            Self::OpenData => {
                TagNames::new("EstablishmentDetail", "BusinessName", "Geocode", "Longitude", "Latitude")
            }
            Self::RatingsApi => {
                TagNames::new("establishment", "BusinessName", "geocode", "longitude", "latitude")
            }
        }
    }

    /// Headers a request for this variant must carry.
    ///
    /// Open-data files are served as static content and take no headers.
    #[must_use]
    pub const fn request_headers(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::OpenData => &[],
            Self::RatingsApi => RATINGS_API_HEADERS,
        }
    }

    /// Stable identifier used in configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenData => "open-data",
            Self::RatingsApi => "ratings-api",
        }
    }
}

impl fmt::Display for SchemaVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a schema identifier is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown schema variant {0:?} (expected \"open-data\" or \"ratings-api\")")]
pub struct UnknownSchemaError(pub String);

impl FromStr for SchemaVariant {
    type Err = UnknownSchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open-data" => Ok(Self::OpenData),
            "ratings-api" => Ok(Self::RatingsApi),
            other => Err(UnknownSchemaError(other.to_owned())),
        }
    }
}

/// Fields read from one establishment element.
#[derive(Debug, Clone, PartialEq)]
pub struct EstablishmentRecord {
    /// Business name, absent when the record has no name element.
    pub business_name: Option<String>,
    /// Coordinate, present only for unambiguous, numeric geocoding.
    pub geocode: Option<Coord<f64>>,
}

impl EstablishmentRecord {
    /// Read a record from its element.
    #[must_use]
    pub fn from_element(element: &XmlElement, tags: &TagNames) -> Self {
        let business_name = element
            .first_descendant_named(&tags.name)
            .map(XmlElement::text_content);
        let geocode = single(element.descendants_named(&tags.geocode))
            .and_then(|geocode| read_coordinate(geocode, tags));
        Self {
            business_name,
            geocode,
        }
    }

    /// Convert into a feature, or `None` when the record has no usable
    /// geocode. A missing name becomes an empty title.
    #[must_use]
    pub fn into_feature(self) -> Option<PointFeature> {
        let location = self.geocode?;
        let title = self.business_name.unwrap_or_else(|| {
            debug!("establishment at {location:?} has no business name");
            String::new()
        });
        Some(PointFeature::new(location, title))
    }
}

/// Extract one feature per well-geocoded record, in document order.
///
/// # Examples
///
/// ```
/// use hygiene_core::{SchemaVariant, XmlDocument, extract_features};
///
/// let doc = XmlDocument::parse(
///     "<establishments><establishment><BusinessName>Cafe</BusinessName>\
///      <geocode><latitude>51.5</latitude><longitude>-0.1</longitude></geocode>\
///      </establishment></establishments>",
/// )?;
/// let features = extract_features(&doc, &SchemaVariant::RatingsApi.tag_names());
/// let only = &features.features()[0];
/// assert_eq!((only.longitude(), only.latitude()), (-0.1, 51.5));
/// # Ok::<(), hygiene_core::XmlError>(())
/// ```
#[must_use]
pub fn extract_features(document: &XmlDocument, tags: &TagNames) -> FeatureCollection {
    document
        .elements_named(&tags.record)
        .filter_map(|element| EstablishmentRecord::from_element(element, tags).into_feature())
        .collect()
}

fn read_coordinate(geocode: &XmlElement, tags: &TagNames) -> Option<Coord<f64>> {
    let longitude = single(geocode.descendants_named(&tags.longitude))?;
    let latitude = single(geocode.descendants_named(&tags.latitude))?;
    Some(Coord {
        x: parse_degrees(longitude)?,
        y: parse_degrees(latitude)?,
    })
}

fn parse_degrees(element: &XmlElement) -> Option<f64> {
    let text = element.text_content();
    let value = leading_number(&text).filter(|v| v.is_finite());
    if value.is_none() {
        debug!("skipping non-numeric <{}> value {text:?}", element.name());
    }
    value
}

/// The longest decimal number at the start of `text`, after leading
/// whitespace. Trailing characters are ignored, so `"-0.70140W"` reads as
/// `-0.7014`. `None` when no digits lead the text.
fn leading_number(text: &str) -> Option<f64> {
    let trimmed = text.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let whole = digits_from(bytes, end);
    end += whole;
    let mut fraction = 0;
    if bytes.get(end) == Some(&b'.') {
        fraction = digits_from(bytes, end + 1);
        if whole + fraction > 0 {
            end += 1 + fraction;
        }
    }
    if whole + fraction == 0 {
        return None;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exponent = end + 1;
        if matches!(bytes.get(exponent), Some(b'+' | b'-')) {
            exponent += 1;
        }
        let exponent_digits = digits_from(bytes, exponent);
        if exponent_digits > 0 {
            end = exponent + exponent_digits;
        }
    }
    trimmed.get(..end)?.parse().ok()
}

fn digits_from(bytes: &[u8], start: usize) -> usize {
    bytes
        .iter()
        .skip(start)
        .take_while(|byte| byte.is_ascii_digit())
        .count()
}

/// The only item of `iter`, or `None` for zero or several items.
fn single<'a>(mut iter: impl Iterator<Item = &'a XmlElement>) -> Option<&'a XmlElement> {
    let first = iter.next()?;
    iter.next().is_none().then_some(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    fn open_data(records: &str) -> XmlDocument {
        XmlDocument::parse(&format!(
            "<FHRSEstablishment><EstablishmentCollection>{records}</EstablishmentCollection></FHRSEstablishment>"
        ))
        .expect("fixture should parse")
    }

    fn record(name: &str, geocode: &str) -> String {
        format!("<EstablishmentDetail><BusinessName>{name}</BusinessName>{geocode}</EstablishmentDetail>")
    }

    #[fixture]
    fn tags() -> TagNames {
        SchemaVariant::OpenData.tag_names()
    }

    #[rstest]
    fn extracts_single_record(tags: TagNames) {
        let doc = open_data(&record(
            "Fish &amp; Chips Shop",
            "<Geocode><Longitude>-0.70140</Longitude><Latitude>53.15791</Latitude></Geocode>",
        ));

        let features = extract_features(&doc, &tags);

        assert_eq!(
            features.features(),
            [PointFeature::new(Coord { x: -0.7014, y: 53.15791 }, "Fish & Chips Shop")]
        );
    }

    #[rstest]
    #[case::no_geocode("")]
    #[case::two_geocodes(
        "<Geocode><Longitude>1</Longitude><Latitude>2</Latitude></Geocode>\
         <Geocode><Longitude>3</Longitude><Latitude>4</Latitude></Geocode>"
    )]
    #[case::missing_longitude("<Geocode><Latitude>2</Latitude></Geocode>")]
    #[case::missing_latitude("<Geocode><Longitude>1</Longitude></Geocode>")]
    #[case::two_longitudes(
        "<Geocode><Longitude>1</Longitude><Longitude>5</Longitude><Latitude>2</Latitude></Geocode>"
    )]
    #[case::empty_geocode("<Geocode/>")]
    #[case::non_numeric("<Geocode><Longitude>east</Longitude><Latitude>2</Latitude></Geocode>")]
    #[case::empty_value("<Geocode><Longitude></Longitude><Latitude>2</Latitude></Geocode>")]
    #[case::lone_sign("<Geocode><Longitude>-</Longitude><Latitude>2</Latitude></Geocode>")]
    #[case::overflow("<Geocode><Longitude>1e400</Longitude><Latitude>2</Latitude></Geocode>")]
    fn skips_badly_geocoded_records(tags: TagNames, #[case] geocode: &str) {
        let doc = open_data(&record("Somewhere", geocode));

        assert!(extract_features(&doc, &tags).is_empty());
    }

    #[rstest]
    fn coordinates_are_longitude_first_regardless_of_child_order(tags: TagNames) {
        let doc = open_data(&record(
            "Swapped",
            "<Geocode><Latitude>53.1</Latitude><Longitude>-0.7</Longitude></Geocode>",
        ));

        let features = extract_features(&doc, &tags);
        let feature = features.get(0).expect("one feature");

        assert_eq!(feature.longitude(), -0.7);
        assert_eq!(feature.latitude(), 53.1);
    }

    #[rstest]
    fn accepts_out_of_range_coordinates(tags: TagNames) {
        let doc = open_data(&record(
            "Far away",
            "<Geocode><Longitude>200.5</Longitude><Latitude>-95</Latitude></Geocode>",
        ));

        let features = extract_features(&doc, &tags);

        assert_eq!(features.get(0).map(PointFeature::location), Some(Coord { x: 200.5, y: -95.0 }));
    }

    #[rstest]
    fn trims_whitespace_around_numbers(tags: TagNames) {
        let doc = open_data(&record(
            "Padded",
            "<Geocode><Longitude>\n  -1.5 \n</Longitude><Latitude> 52 </Latitude></Geocode>",
        ));

        assert_eq!(extract_features(&doc, &tags).len(), 1);
    }

    #[rstest]
    fn reads_numeric_prefix_and_ignores_trailing_text(tags: TagNames) {
        let doc = open_data(&record(
            "Suffixed",
            "<Geocode><Longitude>-0.70140W</Longitude><Latitude> 53.1abc</Latitude></Geocode>",
        ));

        let features = extract_features(&doc, &tags);

        assert_eq!(features.get(0).map(PointFeature::location), Some(Coord { x: -0.7014, y: 53.1 }));
    }

    #[rstest]
    #[case("12", Some(12.0))]
    #[case("  -0.5e2km", Some(-50.0))]
    #[case("+.25", Some(0.25))]
    #[case("7.", Some(7.0))]
    #[case("3e", Some(3.0))]
    #[case("1.5e+x", Some(1.5))]
    #[case("1.2.3", Some(1.2))]
    #[case(".", None)]
    #[case("-.", None)]
    #[case("N51", None)]
    #[case("", None)]
    fn leading_number_takes_longest_prefix(#[case] text: &str, #[case] expected: Option<f64>) {
        assert_eq!(leading_number(text), expected);
    }

    #[rstest]
    fn missing_name_becomes_empty_title(tags: TagNames) {
        let doc = open_data(
            "<EstablishmentDetail><Geocode><Longitude>1</Longitude><Latitude>2</Latitude></Geocode></EstablishmentDetail>",
        );

        let features = extract_features(&doc, &tags);

        assert_eq!(features.get(0).map(PointFeature::title), Some(""));
    }

    #[rstest]
    fn uses_first_name_element(tags: TagNames) {
        let doc = open_data(
            "<EstablishmentDetail><BusinessName>First</BusinessName><BusinessName>Second</BusinessName>\
             <Geocode><Longitude>1</Longitude><Latitude>2</Latitude></Geocode></EstablishmentDetail>",
        );

        let features = extract_features(&doc, &tags);

        assert_eq!(features.get(0).map(PointFeature::title), Some("First"));
    }

    #[rstest]
    fn keeps_document_order_and_duplicates(tags: TagNames) {
        let geocode = "<Geocode><Longitude>1</Longitude><Latitude>2</Latitude></Geocode>";
        let doc = open_data(&[
            record("B", geocode),
            record("A", ""),
            record("C", geocode),
            record("B", geocode),
        ]
        .concat());

        let titles: Vec<String> = extract_features(&doc, &tags)
            .into_iter()
            .map(|feature| feature.title().to_owned())
            .collect();

        assert_eq!(titles, ["B", "C", "B"]);
    }

    #[rstest]
    fn variant_tags_do_not_match_other_variant() {
        let doc = open_data(&record(
            "Case sensitive",
            "<Geocode><Longitude>1</Longitude><Latitude>2</Latitude></Geocode>",
        ));

        assert!(extract_features(&doc, &SchemaVariant::RatingsApi.tag_names()).is_empty());
    }

    #[rstest]
    fn custom_tag_names_drive_extraction() {
        let doc = XmlDocument::parse(
            "<list><shop><title>Deli</title><pos><lon>4</lon><lat>5</lat></pos></shop></list>",
        )
        .expect("fixture should parse");
        let tags = TagNames::new("shop", "title", "pos", "lon", "lat");

        let features = extract_features(&doc, &tags);

        assert_eq!(features.features(), [PointFeature::new(Coord { x: 4.0, y: 5.0 }, "Deli")]);
    }

    #[rstest]
    #[case("open-data", SchemaVariant::OpenData)]
    #[case("ratings-api", SchemaVariant::RatingsApi)]
    fn schema_variant_round_trips_through_str(#[case] raw: &str, #[case] variant: SchemaVariant) {
        assert_eq!(raw.parse::<SchemaVariant>(), Ok(variant));
        assert_eq!(variant.to_string(), raw);
    }

    #[rstest]
    fn unknown_schema_is_rejected() {
        let err = "xml".parse::<SchemaVariant>().expect_err("should fail");
        assert_eq!(err, UnknownSchemaError("xml".to_owned()));
    }

    #[rstest]
    fn only_ratings_api_needs_headers() {
        assert!(SchemaVariant::OpenData.request_headers().is_empty());
        assert_eq!(
            SchemaVariant::RatingsApi.request_headers(),
            [("x-api-version", "2"), ("accept", "application/xml")]
        );
    }
}
