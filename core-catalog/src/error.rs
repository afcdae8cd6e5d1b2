use crate::models::AlbumId;
use thiserror::Error;

/// Why a lookup produced nothing.
///
/// Bad ids, bad criteria keys and empty result sets share the `NotFound`
/// kind; the reason keeps the messages apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotFoundReason {
    /// No album with this id
    Id(AlbumId),
    /// Criteria contained a name outside the recognized set
    InvalidCriteria { names: Vec<String> },
    /// Criteria were valid but matched nothing; holds the rendered criteria
    NoMatches(String),
}

impl std::fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotFoundReason::Id(id) => write!(f, "There is no album with id {}", id),
            NotFoundReason::InvalidCriteria { names } => {
                write!(f, "Invalid search criteria: {}", names.join(", "))
            }
            NotFoundReason::NoMatches(criteria) => {
                write!(f, "No albums found for criteria: {}", criteria)
            }
        }
    }
}

/// Error classification used by transports to pick a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    EanExists,
    VersionInvalid,
    VersionOutdated,
    InvalidInput,
    Infrastructure,
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("{0}")]
    NotFound(NotFoundReason),

    #[error("An album with EAN {ean} already exists")]
    EanExists { ean: String },

    #[error("Invalid version {version}, expected a quoted number such as \"0\"")]
    VersionInvalid { version: String },

    #[error("Version {version} is outdated")]
    VersionOutdated { version: i64 },

    #[error("Invalid input: {field} - {message}")]
    InvalidInput { field: String, message: String },
}

impl CatalogError {
    pub fn not_found(id: AlbumId) -> Self {
        CatalogError::NotFound(NotFoundReason::Id(id))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::Database(_) | CatalogError::Migration(_) => ErrorKind::Infrastructure,
            CatalogError::NotFound(_) => ErrorKind::NotFound,
            CatalogError::EanExists { .. } => ErrorKind::EanExists,
            CatalogError::VersionInvalid { .. } => ErrorKind::VersionInvalid,
            CatalogError::VersionOutdated { .. } => ErrorKind::VersionOutdated,
            CatalogError::InvalidInput { .. } => ErrorKind::InvalidInput,
        }
    }

    /// HTTP status a transport should answer with.
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::NotFound => 404,
            ErrorKind::EanExists => 422,
            ErrorKind::VersionInvalid | ErrorKind::VersionOutdated => 412,
            ErrorKind::InvalidInput => 400,
            ErrorKind::Infrastructure => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
