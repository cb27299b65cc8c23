//! HTTP error mapping
//!
//! Domain errors cross the boundary as a status code plus the serialized
//! error under an `error` key, so polling clients can branch on
//! `error.type` without parsing messages.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use slotwise_domain::SlotwiseError;

/// Wraps the domain error so `?` works inside handlers.
#[derive(Debug)]
pub struct ApiError(pub SlotwiseError);

impl From<SlotwiseError> for ApiError {
    fn from(err: SlotwiseError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            SlotwiseError::NoParticipants
            | SlotwiseError::TooManyParticipants(_)
            | SlotwiseError::InvalidDuration(_)
            | SlotwiseError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            SlotwiseError::Auth(_) => StatusCode::UNAUTHORIZED,
            SlotwiseError::NotInvited(_) | SlotwiseError::NotJoined(_) => StatusCode::FORBIDDEN,
            SlotwiseError::NotFound(_) => StatusCode::NOT_FOUND,
            SlotwiseError::AlreadyResponded(_) | SlotwiseError::SuggestionFinalized(_) => {
                StatusCode::CONFLICT
            }
            SlotwiseError::QuotaExhausted(_) => StatusCode::TOO_MANY_REQUESTS,
            SlotwiseError::AllProvidersFailed => StatusCode::BAD_GATEWAY,
            SlotwiseError::Network(_)
            | SlotwiseError::Storage(_)
            | SlotwiseError::Config(_)
            | SlotwiseError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, status = status.as_u16(), "request failed");
        } else {
            tracing::debug!(error = %self.0, status = status.as_u16(), "request rejected");
        }
        (status, Json(json!({ "error": self.0 }))).into_response()
    }
}
