//! Error types for the durable store.
//!
//! Postgres failures are classified into distinct kinds so callers can map
//! them onto the service-level taxonomy without string matching: unique
//! violations, missing parents, check violations, and timeouts each get
//! their own variant.

use thiserror::Error;

// Postgres SQLSTATE codes the classifier cares about.
const SQLSTATE_UNIQUE_VIOLATION: &str = "23505";
const SQLSTATE_FOREIGN_KEY_VIOLATION: &str = "23503";
const SQLSTATE_CHECK_VIOLATION: &str = "23514";
const SQLSTATE_QUERY_CANCELED: &str = "57014";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("row not found")]
    NotFound,

    #[error("unique constraint violated: {constraint}")]
    AlreadyExists { constraint: String },

    #[error("referenced row missing: {constraint}")]
    ForeignKey { constraint: String },

    #[error("check constraint violated: {constraint}")]
    CheckViolation { constraint: String },

    #[error("database operation timed out")]
    Timeout,

    #[error("stored row failed to decode: {0}")]
    Decode(String),

    #[error("database connection failed: {0}")]
    Connection(String),

    #[error("database migration failed: {0}")]
    Migration(String),

    #[error("database query failed: {0}")]
    Database(sqlx::Error),
}

impl StoreError {
    /// Helper for row-mapping code that parses enum columns.
    pub fn decode(err: impl std::fmt::Display) -> Self {
        Self::Decode(err.to_string())
    }

    /// Transient errors are worth retrying; constraint and decode errors are
    /// permanent.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout | Self::Connection(_))
    }

    pub fn log_level(&self) -> tracing::Level {
        use tracing::Level;
        match self {
            Self::NotFound | Self::AlreadyExists { .. } => Level::DEBUG,
            Self::ForeignKey { .. } | Self::CheckViolation { .. } => Level::DEBUG,
            Self::Timeout => Level::WARN,
            Self::Decode(_) => Level::ERROR,
            Self::Connection(_) | Self::Migration(_) => Level::ERROR,
            Self::Database(_) => Level::ERROR,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => return Self::NotFound,
            sqlx::Error::PoolTimedOut => return Self::Timeout,
            sqlx::Error::Database(db) => {
                let constraint = || {
                    db.constraint()
                        .map(str::to_string)
                        .unwrap_or_else(|| "unknown".to_string())
                };
                match db.code().as_deref() {
                    Some(SQLSTATE_UNIQUE_VIOLATION) => {
                        return Self::AlreadyExists {
                            constraint: constraint(),
                        }
                    }
                    Some(SQLSTATE_FOREIGN_KEY_VIOLATION) => {
                        return Self::ForeignKey {
                            constraint: constraint(),
                        }
                    }
                    Some(SQLSTATE_CHECK_VIOLATION) => {
                        return Self::CheckViolation {
                            constraint: constraint(),
                        }
                    }
                    Some(SQLSTATE_QUERY_CANCELED) => return Self::Timeout,
                    _ => {}
                }
            }
            _ => {}
        }
        Self::Database(err)
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_not_found_classifies() {
        let err: StoreError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[test]
    fn pool_timeout_classifies() {
        let err: StoreError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, StoreError::Timeout));
        assert!(err.is_retryable());
    }

    #[test]
    fn constraint_errors_are_permanent() {
        let err = StoreError::AlreadyExists {
            constraint: "deployments_chain_id_address_key".to_string(),
        };
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("deployments_chain_id_address_key"));
    }
}
