use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Why a catalog fetch produced no catalog.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The remote store could not be reached or refused the request.
    #[error("Catalog unreachable: {0}")]
    Unreachable(#[from] BridgeError),

    /// The store answered but holds no catalog.
    #[error("Error : {0}")]
    Empty(String),

    /// The document exists but is not shaped like a catalog.
    #[error("Malformed catalog: {0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, FetchError>;
