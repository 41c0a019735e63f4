//! HTTP request handlers for the biodiversity API.

pub mod health;
pub mod report;
pub mod summary;

use axum::{
    http::{header, StatusCode},
    response::Response,
};
use eco_protocol::ApiError;
use occurrence_data::DatasetError;

/// Build a JSON error response.
pub(crate) fn error_response(status: StatusCode, body: ApiError) -> Response {
    let json = serde_json::to_string(&body).unwrap_or_default();
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(json.into())
        .unwrap()
}

/// Map a dataset error onto the endpoint's error-status conventions:
/// missing file → 404, missing columns → 400, anything else → 500.
pub(crate) fn dataset_error_response(err: DatasetError, context: &str) -> Response {
    let status =
        StatusCode::from_u16(err.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = match &err {
        DatasetError::NotFound | DatasetError::MissingColumns(_) => ApiError::new(err.to_string()),
        DatasetError::Io(_) => ApiError::internal_error(context, err.to_string()),
    };
    error_response(status, body)
}
