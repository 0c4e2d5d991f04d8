//! Data access for the hygiene map.
//!
//! Responsibilities:
//! - Fetch establishment listings over HTTP or from local files.
//! - Drive the load pipeline that turns a listing into a marker layer.
//!
//! Boundaries:
//! - Do not encode extraction or layer rules (live in `hygiene-core`).
//! - Keep blocking I/O off async executors; file reads go to the blocking
//!   pool.
//!
//! Invariants:
//! - Every load gets a fresh source name, reserved before it suspends.
//! - Failed loads leave the map untouched and never propagate errors.

#![forbid(unsafe_code)]

pub mod manager;
pub mod source;

#[doc(hidden)]
pub mod test_support;

pub use manager::{DataSourceManager, LoadError, LoadOutcome};
pub use source::{
    DatasetLocation, EstablishmentPayload, EstablishmentQuery, EstablishmentSource, FetchError,
    HttpEstablishmentSource, HttpEstablishmentSourceConfig, SourceBuildError,
};
