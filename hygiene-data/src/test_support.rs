//! Test utilities for establishment sources.
//!
//! This module provides [`StubEstablishmentSource`], a deterministic test
//! double for [`EstablishmentSource`] that returns a pre-configured response
//! without touching the network or the filesystem.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use hygiene_core::SchemaVariant;

use crate::source::{EstablishmentPayload, EstablishmentQuery, EstablishmentSource, FetchError};

/// Stub `EstablishmentSource` for testing.
///
/// Every query receives the same response. Queries are recorded so tests
/// can check what was asked for.
///
/// # Example
///
/// ```
/// use hygiene_core::SchemaVariant;
/// use hygiene_data::source::{EstablishmentQuery, EstablishmentSource, FetchError};
/// use hygiene_data::test_support::StubEstablishmentSource;
///
/// # tokio::runtime::Builder::new_current_thread().build()?.block_on(async {
/// let source = StubEstablishmentSource::with_error(FetchError::NoDataset);
///
/// let result = source.fetch(&EstablishmentQuery::Dataset).await;
/// assert_eq!(result, Err(FetchError::NoDataset));
/// assert_eq!(source.queries(), [EstablishmentQuery::Dataset]);
/// # });
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug)]
pub struct StubEstablishmentSource {
    response: StubResponse,
    has_dataset: bool,
    queries: Mutex<Vec<EstablishmentQuery>>,
}

#[derive(Debug, Clone)]
enum StubResponse {
    Payload(EstablishmentPayload),
    Error(FetchError),
}

impl StubEstablishmentSource {
    /// Create a source answering every query with `xml` in `schema`.
    #[must_use]
    pub fn with_xml(xml: impl Into<String>, schema: SchemaVariant) -> Self {
        Self::with_response(StubResponse::Payload(EstablishmentPayload::new(xml, schema)))
    }

    /// Create a source failing every query with `error`.
    #[must_use]
    pub fn with_error(error: FetchError) -> Self {
        Self::with_response(StubResponse::Error(error))
    }

    /// Report that no dataset is configured.
    #[must_use]
    pub const fn without_dataset(mut self) -> Self {
        self.has_dataset = false;
        self
    }

    /// Queries received so far, in call order.
    #[must_use]
    pub fn queries(&self) -> Vec<EstablishmentQuery> {
        self.queries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    const fn with_response(response: StubResponse) -> Self {
        Self {
            response,
            has_dataset: true,
            queries: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl EstablishmentSource for StubEstablishmentSource {
    async fn fetch(&self, query: &EstablishmentQuery) -> Result<EstablishmentPayload, FetchError> {
        self.queries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(*query);
        match &self.response {
            StubResponse::Payload(payload) => Ok(payload.clone()),
            StubResponse::Error(error) => Err(error.clone()),
        }
    }

    fn has_dataset(&self) -> bool {
        self.has_dataset
    }
}
