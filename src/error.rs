use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::period::PeriodError;

/// Failures surfaced by a [`SubscriptionStore`](crate::subscriptions::SubscriptionStore).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("call cancelled")]
    Cancelled,
    #[error("call deadline exceeded")]
    DeadlineExceeded,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by HTTP handlers.
///
/// Only validation and not-found errors reveal their cause to the client. The
/// full error text travels to the request logger as an [`ErrorDetail`]
/// response extension.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    /// Request that could not be decoded at all.
    #[error("{message}: {detail}")]
    Malformed {
        message: &'static str,
        detail: String,
    },
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{message}: {source}")]
    Internal {
        message: &'static str,
        #[source]
        source: StoreError,
    },
    #[error("request aborted: {0}")]
    Unavailable(StoreError),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    /// Maps a store failure, using `message` as the client-facing text for
    /// backend errors.
    pub fn from_store(err: StoreError, message: &'static str) -> Self {
        match err {
            StoreError::NotFound => ApiError::NotFound("subscription not found"),
            StoreError::Cancelled | StoreError::DeadlineExceeded => ApiError::Unavailable(err),
            StoreError::Database(_) => ApiError::Internal {
                message,
                source: err,
            },
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Malformed { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn client_message(&self) -> String {
        match self {
            ApiError::Validation(message) => message.clone(),
            ApiError::Malformed { message, .. } => (*message).to_string(),
            ApiError::NotFound(message) => (*message).to_string(),
            ApiError::Internal { message, .. } => (*message).to_string(),
            ApiError::Unavailable(_) => "request could not be completed in time".to_string(),
        }
    }
}

impl From<PeriodError> for ApiError {
    fn from(err: PeriodError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

/// Underlying cause of a non-2xx response, read back by the request logger.
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.client_message() }));
        let mut response = (status, body).into_response();
        response
            .extensions_mut()
            .insert(ErrorDetail(self.to_string()));
        response
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_errors_hide_their_cause() {
        let err = ApiError::from_store(
            StoreError::Database(sqlx::Error::PoolTimedOut),
            "unable to persist subscription",
        );
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.client_message(), "unable to persist subscription");
        assert!(err.to_string().contains("pool timed out"));
    }

    #[test]
    fn missing_rows_become_not_found() {
        let err = ApiError::from_store(StoreError::NotFound, "unused");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.client_message(), "subscription not found");
    }

    #[test]
    fn aborted_calls_are_unavailable() {
        let err = ApiError::from_store(StoreError::DeadlineExceeded, "unused");
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn malformed_requests_keep_detail_out_of_the_body() {
        let err = ApiError::Malformed {
            message: "invalid body",
            detail: "expected value at line 1 column 1".into(),
        };
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.client_message(), "invalid body");
        assert_eq!(
            err.to_string(),
            "invalid body: expected value at line 1 column 1"
        );
    }

    #[test]
    fn response_carries_error_detail() {
        let response = ApiError::validation("price must be non-negative").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let detail = response.extensions().get::<ErrorDetail>().unwrap();
        assert_eq!(detail.0, "price must be non-negative");
    }
}
