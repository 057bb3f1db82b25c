//! Error envelope for the HTTP surface.
//!
//! The registry's taxonomy is mapped onto status codes here and nowhere
//! else; the body always carries a stable machine code, the human message,
//! and field-level details when the error names a field.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use atlas_registry::RegistryError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("missing or invalid api key")]
    Unauthenticated,
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<FieldDetail>,
}

#[derive(Debug, Serialize)]
pub struct FieldDetail {
    pub field: String,
    pub message: String,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Registry(err) => match err {
                RegistryError::InvalidArgument { .. } => {
                    (StatusCode::BAD_REQUEST, "invalid_argument")
                }
                RegistryError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
                RegistryError::AlreadyExists { .. } => (StatusCode::CONFLICT, "already_exists"),
                RegistryError::FailedPrecondition(_) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "failed_precondition")
                }
                RegistryError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "unavailable"),
                RegistryError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            },
            Self::Unauthenticated => (StatusCode::UNAUTHORIZED, "unauthenticated"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Internal details stay in the log, not on the wire.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("internal error: {self}");
            "internal error".to_string()
        } else {
            self.to_string()
        };

        let details = match &self {
            Self::Registry(err) => err
                .field()
                .map(|field| {
                    vec![FieldDetail {
                        field: field.to_string(),
                        message: message.clone(),
                    }]
                })
                .unwrap_or_default(),
            _ => Vec::new(),
        };

        (
            status,
            Json(ErrorBody {
                code,
                message,
                details,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_status_codes() {
        let cases = [
            (
                ApiError::from(RegistryError::invalid("symbol", "empty")),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from(RegistryError::not_found("asset x")),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::from(RegistryError::already_exists("deployment y")),
                StatusCode::CONFLICT,
            ),
            (
                ApiError::from(RegistryError::FailedPrecondition("cycle".to_string())),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ApiError::from(RegistryError::Unavailable("db down".to_string())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                ApiError::from(RegistryError::Internal("bug".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (ApiError::Unauthenticated, StatusCode::UNAUTHORIZED),
        ];
        for (err, expected) in cases {
            assert_eq!(err.status_and_code().0, expected, "{err}");
        }
    }

    #[test]
    fn invalid_argument_carries_field_detail() {
        let err = ApiError::from(RegistryError::invalid("decimals", "out of range"));
        let (status, code) = err.status_and_code();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code, "invalid_argument");
    }
}
