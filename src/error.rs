//! Error handling.

use axum::{
    extract::rejection::JsonRejection,
    http::header,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::error::Error;
use thiserror::Error;
use tracing::{event, Level};

/// Data service error type
///
/// This type encapsulates the various errors that may occur.
/// Each variant may result in a different API error response.
#[derive(Debug, Error)]
pub enum DataServiceError {
    /// Neither a literal query nor a named dataset was supplied
    #[error("query parameter is required")]
    MissingQuerySelector,

    /// Both a literal query and a named dataset were supplied
    #[error("query and dataset parameters are mutually exclusive")]
    ConflictingQuerySelector,

    /// Requested dataset name does not match any named query template
    #[error("unknown dataset {dataset}")]
    UnknownDataset { dataset: String },

    /// Date range parameter that does not parse as an ISO 8601 date
    #[error("invalid date {value}")]
    InvalidDate { value: String },

    /// Error deserialising a comment request body
    #[error("request data is not valid")]
    CommentJsonRejection(#[from] JsonRejection),

    /// Error validating a comment request body
    #[error("request data is not valid")]
    CommentValidation(#[from] validator::ValidationErrors),

    /// Query succeeded but returned no rows
    #[error("query returned no data")]
    EmptyResult,

    /// Cannot reach the warehouse
    #[error("error connecting to the warehouse")]
    WarehouseConnection(#[source] reqwest::Error),

    /// Warehouse refused to establish a session
    #[error("warehouse rejected the session request: {message}")]
    WarehouseSession { message: String },

    /// Error sending a statement to the warehouse
    #[error("error executing warehouse query")]
    QueryRequest(#[source] reqwest::Error),

    /// Warehouse accepted the session but refused the statement
    #[error("warehouse rejected the query: {message}")]
    QueryRejected { message: String },

    /// Error decoding a warehouse result set
    #[error("failed to decode warehouse result set")]
    ResultParse(#[from] serde_json::Error),

    /// Cannot reach the document store
    #[error("error connecting to the document store")]
    StoreConnection(#[source] reqwest::Error),

    /// Document store refused the comment write
    #[error("document store rejected the comment: {message}")]
    StoreInsert { message: String },

    /// Error formatting the server-assigned comment timestamp
    #[error("failed to format comment timestamp")]
    TimestampFormat(#[from] time::error::Format),

    /// Invalid backend endpoint URL
    #[error("invalid backend URL")]
    BackendUrl(#[from] url::ParseError),
}

impl IntoResponse for DataServiceError {
    /// Convert from a `DataServiceError` into an [axum::response::Response].
    fn into_response(self) -> Response {
        ErrorResponse::from(self).into_response()
    }
}

/// Body of error response
///
/// Implements serde (de)serialise.
#[derive(Deserialize, Serialize)]
struct ErrorBody {
    /// Main error message
    message: String,

    /// Optional list of causes
    #[serde(skip_serializing_if = "Option::is_none")]
    caused_by: Option<Vec<String>>,
}

impl ErrorBody {
    /// Return a new ErrorBody
    ///
    /// # Arguments
    ///
    /// * `error`: The error that occurred
    fn new<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        let message = error.to_string();
        let mut caused_by = None;
        let mut current = error.source();
        while let Some(source) = current {
            let mut causes: Vec<String> = caused_by.unwrap_or_default();
            causes.push(source.to_string());
            caused_by = Some(causes);
            current = source.source();
        }
        // Remove duplicate entries.
        if let Some(caused_by) = caused_by.as_mut() {
            caused_by.dedup()
        }
        ErrorBody { message, caused_by }
    }
}

/// A response to send in error cases
///
/// Implements serde (de)serialise.
#[derive(Deserialize, Serialize)]
struct ErrorResponse {
    /// HTTP status of the response
    #[serde(skip)]
    status: StatusCode,

    /// Response body
    error: ErrorBody,
}

impl ErrorResponse {
    /// Return a new ErrorResponse
    ///
    /// # Arguments
    ///
    /// * `status`: HTTP status of the response
    /// * `error`: The error that occurred. This will be formatted into a suitable `ErrorBody`
    fn new<E>(status: StatusCode, error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        ErrorResponse {
            status,
            error: ErrorBody::new(error),
        }
    }

    /// Return a 400 bad request ErrorResponse
    fn bad_request<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    /// Return a 404 not found ErrorResponse
    fn not_found<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::NOT_FOUND, error)
    }

    /// Return a 500 internal server error ErrorResponse
    fn internal_server_error<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error)
    }
}

impl From<DataServiceError> for ErrorResponse {
    /// Convert from a `DataServiceError` into an `ErrorResponse`.
    fn from(error: DataServiceError) -> Self {
        let response = match &error {
            // Bad request
            DataServiceError::MissingQuerySelector
            | DataServiceError::ConflictingQuerySelector
            | DataServiceError::UnknownDataset { dataset: _ }
            | DataServiceError::InvalidDate { value: _ }
            | DataServiceError::CommentJsonRejection(_)
            | DataServiceError::CommentValidation(_) => Self::bad_request(&error),

            // Not found
            DataServiceError::EmptyResult => Self::not_found(&error),

            // Internal server error
            DataServiceError::WarehouseConnection(_)
            | DataServiceError::WarehouseSession { message: _ }
            | DataServiceError::QueryRequest(_)
            | DataServiceError::QueryRejected { message: _ }
            | DataServiceError::ResultParse(_)
            | DataServiceError::StoreConnection(_)
            | DataServiceError::StoreInsert { message: _ }
            | DataServiceError::TimestampFormat(_)
            | DataServiceError::BackendUrl(_) => Self::internal_server_error(&error),
        };

        // Log server errors.
        if response.status.is_server_error() {
            event!(Level::ERROR, "{}", error.to_string());
            let mut current = error.source();
            while let Some(source) = current {
                event!(Level::ERROR, "Caused by: {}", source.to_string());
                current = source.source();
            }
        }

        response
    }
}

impl IntoResponse for ErrorResponse {
    /// Convert from an `ErrorResponse` into an `axum::response::Response`.
    ///
    /// Renders the response as JSON.
    fn into_response(self) -> Response {
        let json_body = serde_json::to_string_pretty(&self);
        match json_body {
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to serialise error response: {}", err),
            )
                .into_response(),
            Ok(json_body) => (
                self.status,
                [(&header::CONTENT_TYPE, mime::APPLICATION_JSON.to_string())],
                json_body,
            )
                .into_response(),
        }
    }
}
