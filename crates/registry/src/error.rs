//! Service-level error taxonomy.
//!
//! Store failures are classified once, here; managers add the entity context.
//! The transport maps these kinds onto wire status codes without inspecting
//! messages.

use thiserror::Error;

use atlas_model::page::PageError;
use atlas_store::StoreError;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("invalid {field}: {message}")]
    InvalidArgument { field: String, message: String },

    #[error("{what} not found")]
    NotFound { what: String },

    #[error("{what} already exists")]
    AlreadyExists { what: String },

    #[error("{0}")]
    FailedPrecondition(String),

    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl RegistryError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(what: impl std::fmt::Display) -> Self {
        Self::NotFound {
            what: what.to_string(),
        }
    }

    pub fn already_exists(what: impl std::fmt::Display) -> Self {
        Self::AlreadyExists {
            what: what.to_string(),
        }
    }

    /// The field named in an InvalidArgument, for field-level error details.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::InvalidArgument { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl From<StoreError> for RegistryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::not_found("row"),
            StoreError::AlreadyExists { constraint } => Self::AlreadyExists {
                what: format!("row ({constraint})"),
            },
            // A missing parent on write is a caller-visible absence, not an
            // integrity surprise.
            StoreError::ForeignKey { constraint } => Self::NotFound {
                what: format!("referenced row ({constraint})"),
            },
            StoreError::CheckViolation { constraint } => Self::InvalidArgument {
                field: constraint,
                message: "value violates a range constraint".to_string(),
            },
            StoreError::Timeout => Self::Unavailable("database timed out".to_string()),
            StoreError::Connection(msg) => Self::Unavailable(msg),
            StoreError::Decode(msg) => Self::Internal(format!("corrupt row: {msg}")),
            StoreError::Migration(msg) => Self::Internal(msg),
            StoreError::Database(e) => Self::Internal(e.to_string()),
        }
    }
}

impl From<PageError> for RegistryError {
    fn from(err: PageError) -> Self {
        match err {
            PageError::SizeOutOfRange(_) => Self::invalid("page_size", err.to_string()),
            PageError::MalformedToken => Self::invalid("page_token", err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_kinds_map_onto_taxonomy() {
        let err: RegistryError = StoreError::AlreadyExists {
            constraint: "markets_venue_symbol_key".to_string(),
        }
        .into();
        assert!(matches!(err, RegistryError::AlreadyExists { .. }));

        let err: RegistryError = StoreError::ForeignKey {
            constraint: "deployments_asset_id_fkey".to_string(),
        }
        .into();
        assert!(matches!(err, RegistryError::NotFound { .. }));

        let err: RegistryError = StoreError::Timeout.into();
        assert!(matches!(err, RegistryError::Unavailable(_)));
    }

    #[test]
    fn page_errors_are_invalid_argument() {
        let err: RegistryError = PageError::MalformedToken.into();
        assert_eq!(err.field(), Some("page_token"));
        let err: RegistryError = PageError::SizeOutOfRange(0).into();
        assert_eq!(err.field(), Some("page_size"));
    }
}
