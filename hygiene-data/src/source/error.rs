use std::time::Duration;

use camino::Utf8PathBuf;
use thiserror::Error;

/// Why a listing could not be retrieved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The server answered with a non-success status.
    #[error("request to {url} failed with status {status}: {message}")]
    Http {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Description of the failure.
        message: String,
    },
    /// The request never produced a response.
    #[error("request to {url} failed: {message}")]
    Network {
        /// Requested URL.
        url: String,
        /// Description of the failure.
        message: String,
    },
    /// The configured timeout elapsed.
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout {
        /// Requested URL.
        url: String,
        /// Configured timeout.
        timeout: Duration,
    },
    /// The response body could not be read as text.
    #[error("failed to read response body from {url}: {message}")]
    Body {
        /// Requested URL.
        url: String,
        /// Description of the failure.
        message: String,
    },
    /// A local dataset file could not be read.
    #[error("failed to read dataset file {path}: {message}")]
    ReadFile {
        /// File that was read.
        path: Utf8PathBuf,
        /// Description of the failure.
        message: String,
    },
    /// A dataset load was requested but no dataset is configured.
    #[error("no dataset is configured")]
    NoDataset,
}

/// Why an HTTP source could not be constructed.
#[derive(Debug, Error)]
pub enum SourceBuildError {
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    /// A configured URL is not valid.
    #[error("invalid URL {url:?}: {source}")]
    InvalidUrl {
        /// Rejected input.
        url: String,
        /// Parse failure.
        #[source]
        source: url::ParseError,
    },
}
