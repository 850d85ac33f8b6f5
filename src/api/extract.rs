//! Request extractors shared by the handlers.

use axum::extract::FromRequest;

use super::error::ApiError;

/// `Json` body extractor that rejects with `ApiError`
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
