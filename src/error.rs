use thiserror::Error;

/// Every way a query can fail, from decoding the raw parameter to running it.
///
/// All variants except [`GumshoeError::Storage`] and [`GumshoeError::Config`]
/// are raised before the store is touched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GumshoeError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("Missing collection name.")]
    MissingCollectionName,
    #[error("Not allowed. This is a restricted collection.")]
    RestrictedCollection,
    #[error("Missing suspect name.")]
    MissingSuspectName,
    #[error("Distinct field missing.")]
    DistinctFieldMissing,
    #[error("Error parsing filter: {0}")]
    FilterParse(String),
    #[error("Error parsing projection: {0}")]
    ProjectionParse(String),
    #[error("Limit needs to be a number")]
    InvalidLimit,
    #[error("Invalid sort filter JSON: {0}")]
    InvalidSortJson(String),
    #[error("Unsupported query")]
    UnsupportedQuery,
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Config error: {0}")]
    Config(String),
}

/// Coarse classification used by the HTTP layer to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    BadRequest,
    Internal,
}

impl GumshoeError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Storage(_) | Self::Config(_) => ErrorClass::Internal,
            _ => ErrorClass::BadRequest,
        }
    }
}

pub type Result<T> = std::result::Result<T, GumshoeError>;

// Helper conversions
impl From<rusqlite::Error> for GumshoeError {
    fn from(e: rusqlite::Error) -> Self { Self::Storage(e.to_string()) }
}

impl From<config::ConfigError> for GumshoeError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}
