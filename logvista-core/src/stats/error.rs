use crate::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid time range '{0}'")]
    InvalidRange(String),

    #[error("unsupported query kind '{0}'")]
    UnsupportedKind(String),

    #[error("invalid {name} '{value}'")]
    InvalidParameter { name: &'static str, value: String },

    #[error("missing required parameter {0}")]
    MissingParameter(&'static str),

    #[error("unknown site '{0}'")]
    UnknownSite(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl QueryError {
    /// Rejections caused by the request itself rather than by the backend.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, QueryError::Store(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, QueryError::UnknownSite(_))
    }
}
