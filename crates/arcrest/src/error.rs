use arcrest_core::endpoint::EndpointError;
use arcrest_core::error::{CatalogError, FailureKind, FetchError};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Invalid endpoint: {0}")]
    Endpoint(#[from] EndpointError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Request failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Missing configuration: {0}")]
    Config(String),
}

impl Error {
    /// Failure class, `None` for local configuration problems
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            Error::Endpoint(_) => Some(FailureKind::EndpointInvalid),
            Error::Catalog(err) => Some(err.kind()),
            Error::Fetch(err) => Some(err.kind()),
            Error::Config(_) => None,
        }
    }
}
