use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use super::PRISM_STATUS_HEADER;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("query failed: {0}")]
    QueryFailed(String),

    #[error("index unavailable: {0}")]
    IndexUnavailable(String),
}

#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, prism_status) = match &self {
            GatewayError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            GatewayError::QueryFailed(_) => (StatusCode::INTERNAL_SERVER_ERROR, "query_error"),
            GatewayError::IndexUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "index_unavailable")
            }
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            PRISM_STATUS_HEADER,
            HeaderValue::from_str(prism_status).unwrap_or(HeaderValue::from_static("error")),
        );

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: status.as_u16(),
        });

        (status, headers, body).into_response()
    }
}
