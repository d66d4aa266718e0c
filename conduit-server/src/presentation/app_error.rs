use std::collections::BTreeMap;

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

use crate::domain::error::DomainError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    InvalidBody(#[from] JsonRejection),

    #[error("unauthorized")]
    Unauthorized,

    #[error("If-Match header is required")]
    PreconditionRequired,

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

pub(crate) type AppResult<T> = Result<T, AppError>;

/// RealWorld error envelope: `{"errors": {"<field>": ["<message>", ...]}}`.
#[derive(Debug, Serialize)]
pub(crate) struct ErrorBody {
    pub(crate) errors: BTreeMap<String, Vec<String>>,
}

impl ErrorBody {
    pub(crate) fn message(msg: impl Into<String>) -> Self {
        Self {
            errors: BTreeMap::from([("body".to_string(), vec![msg.into()])]),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Domain(err) => match err {
                DomainError::Auth(err) => {
                    debug!(cause = ?err.cause(), "request unauthorized");
                    (StatusCode::UNAUTHORIZED, ErrorBody::message(err.to_string()))
                }
                DomainError::NotFound(err) => {
                    (StatusCode::NOT_FOUND, ErrorBody::message(err.to_string()))
                }
                DomainError::Validation(errs) => {
                    debug!(count = errs.len(), "request failed validation");
                    let mut errors: BTreeMap<String, Vec<String>> = BTreeMap::new();
                    for err in errs.iter() {
                        errors
                            .entry(err.field.to_string())
                            .or_default()
                            .push(err.message());
                    }
                    (StatusCode::UNPROCESSABLE_ENTITY, ErrorBody { errors })
                }
                DomainError::ConcurrentModification(err) => {
                    debug!(user_id = %err.user_id, "precondition failed");
                    (
                        StatusCode::PRECONDITION_FAILED,
                        ErrorBody::message("resource has been modified since it was last read"),
                    )
                }
                DomainError::Unexpected(err) => {
                    error!("unexpected error: {err:#}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ErrorBody::message("internal error"),
                    )
                }
            },
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorBody::message(msg)),
            AppError::InvalidBody(rejection) => {
                (rejection.status(), ErrorBody::message(rejection.body_text()))
            }
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, ErrorBody::message("unauthorized")),
            AppError::PreconditionRequired => (
                StatusCode::PRECONDITION_REQUIRED,
                ErrorBody::message("If-Match header is required"),
            ),
            AppError::Internal(err) => {
                error!("internal error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::message("internal error"),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
