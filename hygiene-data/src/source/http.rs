//! HTTP and file-backed establishment source.
//!
//! Nearby searches are sent as `GET {nearby_url}?longitude=<x>&latitude=<y>`.
//! Requests carry the headers their schema requires (the ratings API wants
//! `x-api-version: 2` and `Accept: application/xml`; static open-data files
//! want none).
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use geo::Coord;
//! use hygiene_data::source::{
//!     EstablishmentQuery, EstablishmentSource, HttpEstablishmentSource,
//!     HttpEstablishmentSourceConfig,
//! };
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HttpEstablishmentSourceConfig::new("https://api.ratings.food.gov.uk/Establishments")
//!     .with_timeout(Duration::from_secs(20))
//!     .with_user_agent("my-app/1.0");
//! let source = HttpEstablishmentSource::with_config(config)?;
//!
//! let payload = source
//!     .fetch(&EstablishmentQuery::Nearby(Coord { x: -0.7014, y: 53.15791 }))
//!     .await?;
//! println!("{} bytes of {}", payload.xml.len(), payload.schema);
//! # Ok(())
//! # }
//! ```

use std::io::{self, Read};
use std::time::Duration;

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use geo::Coord;
use hygiene_core::SchemaVariant;
use log::debug;
use reqwest::Client;
use url::Url;

use super::{
    DatasetLocation, EstablishmentPayload, EstablishmentQuery, EstablishmentSource, FetchError,
    SourceBuildError,
};

/// Query-by-coordinate endpoint of the public ratings API.
pub const DEFAULT_NEARBY_URL: &str = "https://api.ratings.food.gov.uk/Establishments";

/// Default user agent for outgoing requests.
pub const DEFAULT_USER_AGENT: &str = "hygiene-map/0.1";

/// Configuration for [`HttpEstablishmentSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpEstablishmentSourceConfig {
    /// Static dataset, if any.
    pub dataset: Option<DatasetLocation>,
    /// Schema of the static dataset.
    pub dataset_schema: SchemaVariant,
    /// Query-by-coordinate endpoint.
    pub nearby_url: String,
    /// Schema of nearby-search responses.
    pub nearby_schema: SchemaVariant,
    /// Whole-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for HttpEstablishmentSourceConfig {
    fn default() -> Self {
        Self {
            dataset: None,
            dataset_schema: SchemaVariant::OpenData,
            nearby_url: DEFAULT_NEARBY_URL.to_owned(),
            nearby_schema: SchemaVariant::RatingsApi,
            timeout: None,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl HttpEstablishmentSourceConfig {
    /// Configuration for the given nearby-search endpoint.
    #[must_use]
    pub fn new(nearby_url: impl Into<String>) -> Self {
        Self {
            nearby_url: nearby_url.into(),
            ..Self::default()
        }
    }

    /// Set the static dataset and its schema.
    #[must_use]
    pub fn with_dataset(mut self, dataset: DatasetLocation, schema: SchemaVariant) -> Self {
        self.dataset = Some(dataset);
        self.dataset_schema = schema;
        self
    }

    /// Set the schema of nearby-search responses.
    #[must_use]
    pub const fn with_nearby_schema(mut self, schema: SchemaVariant) -> Self {
        self.nearby_schema = schema;
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Establishment source backed by `reqwest` and the local filesystem.
#[derive(Debug)]
pub struct HttpEstablishmentSource {
    client: Client,
    nearby_url: Url,
    config: HttpEstablishmentSourceConfig,
}

impl HttpEstablishmentSource {
    /// Source using the public ratings API and no dataset.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new() -> Result<Self, SourceBuildError> {
        Self::with_config(HttpEstablishmentSourceConfig::default())
    }

    /// Source with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the nearby URL is invalid or the HTTP client
    /// fails to build.
    pub fn with_config(config: HttpEstablishmentSourceConfig) -> Result<Self, SourceBuildError> {
        let nearby_url =
            Url::parse(&config.nearby_url).map_err(|source| SourceBuildError::InvalidUrl {
                url: config.nearby_url.clone(),
                source,
            })?;
        let mut builder = Client::builder().user_agent(&config.user_agent);
        if let Some(timeout) = config.timeout {
            builder = builder.connect_timeout(timeout).timeout(timeout);
        }
        let client = builder.build().map_err(SourceBuildError::HttpClient)?;
        Ok(Self {
            client,
            nearby_url,
            config,
        })
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &HttpEstablishmentSourceConfig {
        &self.config
    }

    /// URL of a nearby search around `coord`.
    fn nearby_request_url(&self, coord: Coord<f64>) -> Url {
        let mut url = self.nearby_url.clone();
        url.query_pairs_mut()
            .append_pair("longitude", &coord.x.to_string())
            .append_pair("latitude", &coord.y.to_string());
        url
    }

    async fn fetch_url(&self, url: Url, schema: SchemaVariant) -> Result<String, FetchError> {
        debug!("requesting {url} as {schema}");
        let mut request = self.client.get(url.clone());
        for &(name, value) in schema.request_headers() {
            request = request.header(name, value);
        }

        let response = request
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, &url))?
            .error_for_status()
            .map_err(|err| self.convert_reqwest_error(&err, &url))?;

        response.text().await.map_err(|err| FetchError::Body {
            url: url.to_string(),
            message: err.to_string(),
        })
    }

    fn convert_reqwest_error(&self, error: &reqwest::Error, url: &Url) -> FetchError {
        if error.is_timeout()
            && let Some(timeout) = self.config.timeout
        {
            return FetchError::Timeout {
                url: url.to_string(),
                timeout,
            };
        }

        if let Some(status) = error.status() {
            return FetchError::Http {
                url: url.to_string(),
                status: status.as_u16(),
                message: error.to_string(),
            };
        }

        FetchError::Network {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

#[async_trait]
impl EstablishmentSource for HttpEstablishmentSource {
    async fn fetch(&self, query: &EstablishmentQuery) -> Result<EstablishmentPayload, FetchError> {
        match query {
            EstablishmentQuery::Nearby(coord) => {
                let schema = self.config.nearby_schema;
                let xml = self.fetch_url(self.nearby_request_url(*coord), schema).await?;
                Ok(EstablishmentPayload::new(xml, schema))
            }
            EstablishmentQuery::Dataset => {
                let schema = self.config.dataset_schema;
                let xml = match &self.config.dataset {
                    None => return Err(FetchError::NoDataset),
                    Some(DatasetLocation::Url(url)) => self.fetch_url(url.clone(), schema).await?,
                    Some(DatasetLocation::File(path)) => read_dataset_file(path.clone()).await?,
                };
                Ok(EstablishmentPayload::new(xml, schema))
            }
        }
    }

    fn has_dataset(&self) -> bool {
        self.config.dataset.is_some()
    }
}

/// Read a dataset file on the blocking pool.
async fn read_dataset_file(path: Utf8PathBuf) -> Result<String, FetchError> {
    let task_path = path.clone();
    tokio::task::spawn_blocking(move || read_to_string(&task_path))
        .await
        .map_err(io::Error::other)
        .and_then(std::convert::identity)
        .map_err(|err| FetchError::ReadFile {
            path,
            message: err.to_string(),
        })
}

fn read_to_string(path: &Utf8Path) -> io::Result<String> {
    let mut file = fs_utf8::File::open_ambient(path, ambient_authority())?;
    let mut text = String::new();
    file.read_to_string(&mut text)?;
    Ok(text)
}
