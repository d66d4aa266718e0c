use axum::extract::FromRequest;

use super::app_error::AppError;

/// `axum::Json` whose rejections render as the `{"errors": ...}` envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub(crate) struct JsonBody<T>(pub(crate) T);
