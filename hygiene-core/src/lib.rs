//! Core domain types for the hygiene map.
//!
//! Establishment listings arrive as XML. This crate turns them into GeoJSON
//! point features and describes the effects a map renderer must apply to
//! display them. Nothing here performs I/O; fetching lives in
//! `hygiene-data`.
//!
//! # Examples
//!
//! ```
//! use hygiene_core::{SchemaVariant, XmlDocument, extract_features};
//!
//! let xml = r#"
//! <FHRSEstablishment>
//!   <EstablishmentCollection>
//!     <EstablishmentDetail>
//!       <BusinessName>Fish &amp; Chips Shop</BusinessName>
//!       <Geocode>
//!         <Longitude>-0.70140</Longitude>
//!         <Latitude>53.15791</Latitude>
//!       </Geocode>
//!     </EstablishmentDetail>
//!   </EstablishmentCollection>
//! </FHRSEstablishment>"#;
//!
//! let document = XmlDocument::parse(xml)?;
//! let features = extract_features(&document, &SchemaVariant::OpenData.tag_names());
//! assert_eq!(features.len(), 1);
//! # Ok::<(), hygiene_core::XmlError>(())
//! ```

#![forbid(unsafe_code)]

pub mod extract;
pub mod feature;
pub mod map;
pub mod naming;
pub mod xml;

pub use extract::{EstablishmentRecord, SchemaVariant, TagNames, UnknownSchemaError, extract_features};
pub use feature::{FeatureCollection, PointFeature};
pub use map::{
    LayerListener, ListenerAction, MARKER_IMAGE_NAME, MARKER_IMAGE_URL, MapConfig, MapSink,
    MapStyle, PointerEvent, Popup, SymbolLayer, SymbolLayout,
};
pub use naming::SourceNameSequence;
pub use xml::{XmlDocument, XmlElement, XmlError, XmlNode};
