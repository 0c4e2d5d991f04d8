//! Where establishment listings come from.
//!
//! An [`EstablishmentSource`] answers an [`EstablishmentQuery`] with raw XML
//! and the schema that XML follows. [`HttpEstablishmentSource`] is the
//! production implementation; it reads the static dataset from a URL or a
//! local file and sends nearby searches to a query-by-coordinate endpoint.

mod error;
mod http;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use camino::Utf8PathBuf;
use geo::Coord;
use hygiene_core::SchemaVariant;
use url::Url;

pub use error::{FetchError, SourceBuildError};
pub use http::{
    DEFAULT_NEARBY_URL, DEFAULT_USER_AGENT, HttpEstablishmentSource, HttpEstablishmentSourceConfig,
};

/// What to fetch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EstablishmentQuery {
    /// The configured static dataset.
    Dataset,
    /// Establishments near a coordinate (`x` = longitude, `y` = latitude).
    Nearby(Coord<f64>),
}

impl fmt::Display for EstablishmentQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dataset => f.write_str("dataset"),
            Self::Nearby(coord) => write!(f, "nearby search at ({}, {})", coord.x, coord.y),
        }
    }
}

/// A fetched listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EstablishmentPayload {
    /// Response body.
    pub xml: String,
    /// Schema the body follows.
    pub schema: SchemaVariant,
}

impl EstablishmentPayload {
    /// Pair a body with its schema.
    #[must_use]
    pub fn new(xml: impl Into<String>, schema: SchemaVariant) -> Self {
        Self {
            xml: xml.into(),
            schema,
        }
    }
}

/// Asynchronous provider of establishment listings.
#[async_trait]
pub trait EstablishmentSource: Send + Sync {
    /// Fetch the listing answering `query`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when the listing cannot be retrieved.
    async fn fetch(&self, query: &EstablishmentQuery) -> Result<EstablishmentPayload, FetchError>;

    /// Whether [`EstablishmentQuery::Dataset`] can be answered.
    fn has_dataset(&self) -> bool {
        true
    }
}

/// Location of the static dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetLocation {
    /// Fetched over HTTP(S).
    Url(Url),
    /// Read from the local filesystem.
    File(Utf8PathBuf),
}

impl FromStr for DatasetLocation {
    type Err = SourceBuildError;

    /// `http://` and `https://` inputs are URLs; anything else is a path.
    ///
    /// # Examples
    ///
    /// ```
    /// use hygiene_data::source::DatasetLocation;
    ///
    /// let remote: DatasetLocation = "https://example.com/FHRS.xml".parse()?;
    /// assert!(matches!(remote, DatasetLocation::Url(_)));
    ///
    /// let local: DatasetLocation = "data/FHRS.xml".parse()?;
    /// assert!(matches!(local, DatasetLocation::File(_)));
    /// # Ok::<(), hygiene_data::source::SourceBuildError>(())
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with("http://") || s.starts_with("https://") {
            Url::parse(s)
                .map(Self::Url)
                .map_err(|source| SourceBuildError::InvalidUrl {
                    url: s.to_owned(),
                    source,
                })
        } else {
            Ok(Self::File(Utf8PathBuf::from(s)))
        }
    }
}

impl fmt::Display for DatasetLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => fmt::Display::fmt(url, f),
            Self::File(path) => fmt::Display::fmt(path, f),
        }
    }
}
