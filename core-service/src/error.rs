use core_catalog::CatalogError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

impl CoreError {
    /// HTTP status a transport should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            CoreError::Catalog(err) => err.status_code(),
            CoreError::Runtime(_) => 500,
        }
    }

    /// The catalog error behind this one, if any.
    pub fn as_catalog(&self) -> Option<&CatalogError> {
        match self {
            CoreError::Catalog(err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
