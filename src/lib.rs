//! Facade crate for the hygiene map.
//!
//! This crate re-exports the core extraction and map types, and exposes the
//! data-loading layer behind the `data` feature.

#![forbid(unsafe_code)]

pub use hygiene_core::{
    FeatureCollection, MapConfig, MapSink, MapStyle, PointFeature, SchemaVariant,
    SourceNameSequence, TagNames, XmlDocument, XmlError, extract_features,
};

#[cfg(feature = "data")]
pub use hygiene_data::{
    DataSourceManager, EstablishmentSource, HttpEstablishmentSource, HttpEstablishmentSourceConfig,
    LoadError, LoadOutcome,
};
