#![expect(
    clippy::expect_used,
    reason = "integration tests use expect for readable failures"
)]

//! Property-based tests for feature extraction.
//!
//! Documents are generated from a list of records, each of which is either
//! well geocoded or broken in one of the ways a real listing can be. The
//! expected output is computed from the generated list and compared against
//! what the extractor produces.
//!
//! # Invariants tested
//!
//! - **Filtering:** one feature per well-geocoded record, none for the rest.
//! - **Order:** features follow document order.
//! - **Coordinate order:** longitude first, latitude second.
//! - **Determinism:** extracting twice yields byte-identical JSON.

use geo::Coord;
use hygiene_core::{FeatureCollection, PointFeature, SchemaVariant, XmlDocument, extract_features};
use proptest::prelude::*;

/// How a generated record is geocoded.
#[derive(Debug, Clone)]
enum Geocode {
    Valid { longitude: f64, latitude: f64 },
    Missing,
    Duplicated { longitude: f64, latitude: f64 },
    NoLeadingNumber(String),
    Suffixed { longitude: f64, latitude: f64, suffix: String },
}

#[derive(Debug, Clone)]
struct GeneratedRecord {
    name: String,
    geocode: Geocode,
}

impl GeneratedRecord {
    fn expected(&self) -> Option<PointFeature> {
        match self.geocode {
            Geocode::Valid { longitude, latitude }
            | Geocode::Suffixed {
                longitude,
                latitude,
                ..
            } => Some(PointFeature::new(
                Coord {
                    x: longitude,
                    y: latitude,
                },
                self.name.clone(),
            )),
            _ => None,
        }
    }

    fn to_xml(&self, variant: SchemaVariant) -> String {
        let tags = variant.tag_names();
        let geocode = |longitude: &str, latitude: &str| {
            format!(
                "<{g}><{lon}>{longitude}</{lon}><{lat}>{latitude}</{lat}></{g}>",
                g = tags.geocode,
                lon = tags.longitude,
                lat = tags.latitude,
            )
        };
        let body = match &self.geocode {
            Geocode::Valid { longitude, latitude } => {
                geocode(&longitude.to_string(), &latitude.to_string())
            }
            Geocode::Missing => String::new(),
            Geocode::Duplicated { longitude, latitude } => {
                let one = geocode(&longitude.to_string(), &latitude.to_string());
                format!("{one}{one}")
            }
            Geocode::NoLeadingNumber(text) => geocode(&escape(text), "51.0"),
            Geocode::Suffixed {
                longitude,
                latitude,
                suffix,
            } => geocode(&format!("{longitude}{suffix}"), &format!(" {latitude}{suffix}")),
        };
        format!(
            "<{r}><{n}>{name}</{n}>{body}</{r}>",
            r = tags.record,
            n = tags.name,
            name = escape(&self.name),
        )
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\'', "&apos;")
}

fn document(records: &[GeneratedRecord], variant: SchemaVariant) -> String {
    let body: String = records.iter().map(|record| record.to_xml(variant)).collect();
    format!("<?xml version=\"1.0\"?><Listing><Records>{body}</Records></Listing>")
}

fn geocode_strategy() -> impl Strategy<Value = Geocode> {
    let degrees = (-180.0_f64..180.0, -90.0_f64..90.0);
    prop_oneof![
        4 => degrees.clone().prop_map(|(longitude, latitude)| Geocode::Valid { longitude, latitude }),
        1 => Just(Geocode::Missing),
        1 => degrees.clone().prop_map(|(longitude, latitude)| Geocode::Duplicated { longitude, latitude }),
        1 => "[a-zA-Z ]{0,6}[a-zA-Z]".prop_map(Geocode::NoLeadingNumber),
        1 => (degrees, "[a-zA-Z]{1,4}").prop_map(|((longitude, latitude), suffix)| {
            Geocode::Suffixed { longitude, latitude, suffix }
        }),
    ]
}

fn record_strategy() -> impl Strategy<Value = GeneratedRecord> {
    ("[A-Za-z0-9&' ]{1,20}", geocode_strategy())
        .prop_map(|(name, geocode)| GeneratedRecord { name, geocode })
}

fn variant_strategy() -> impl Strategy<Value = SchemaVariant> {
    prop_oneof![Just(SchemaVariant::OpenData), Just(SchemaVariant::RatingsApi)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Property: the output is exactly the well-geocoded records, in order.
    #[test]
    fn extracts_exactly_the_well_geocoded_records(
        records in prop::collection::vec(record_strategy(), 0..12),
        variant in variant_strategy(),
    ) {
        let xml = document(&records, variant);
        let parsed = XmlDocument::parse(&xml).expect("generated XML is well formed");

        let features = extract_features(&parsed, &variant.tag_names());

        let expected: FeatureCollection = records.iter().filter_map(GeneratedRecord::expected).collect();
        prop_assert!(features.len() <= records.len());
        prop_assert_eq!(features, expected);
    }

    /// Property: extraction is deterministic down to the serialised bytes.
    #[test]
    fn extraction_is_deterministic(
        records in prop::collection::vec(record_strategy(), 0..8),
        variant in variant_strategy(),
    ) {
        let xml = document(&records, variant);
        let parsed = XmlDocument::parse(&xml).expect("generated XML is well formed");
        let tags = variant.tag_names();

        let first = serde_json::to_string(&extract_features(&parsed, &tags)).expect("serialises");
        let second = serde_json::to_string(&extract_features(&parsed, &tags)).expect("serialises");

        prop_assert_eq!(first, second);
    }

    /// Property: serialised coordinates are `[longitude, latitude]`.
    #[test]
    fn coordinates_serialise_longitude_first(
        longitude in -180.0_f64..180.0,
        latitude in -90.0_f64..90.0,
    ) {
        let record = GeneratedRecord {
            name: "Cafe".to_owned(),
            geocode: Geocode::Valid { longitude, latitude },
        };
        let xml = document(&[record], SchemaVariant::OpenData);
        let parsed = XmlDocument::parse(&xml).expect("generated XML is well formed");

        let features = extract_features(&parsed, &SchemaVariant::OpenData.tag_names());
        let value = serde_json::to_value(&features).expect("serialises");

        prop_assert_eq!(&value["features"][0]["geometry"]["coordinates"], &serde_json::json!([longitude, latitude]));
    }
}
