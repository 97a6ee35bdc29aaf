use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid payload")]
    InvalidPayload,
    #[error("Invalid query")]
    InvalidQuery,
    #[error("No price data yet")]
    NoData,
    #[error("Not found")]
    NotFound,
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Sheet request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Sheet responded with status {0}")]
    UpstreamStatus(StatusCode),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::InvalidPayload | Error::InvalidQuery => StatusCode::BAD_REQUEST,
            Error::NoData | Error::NotFound => StatusCode::NOT_FOUND,
            Error::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Error::Http(_) | Error::UpstreamStatus(_) | Error::Json(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();

        // Upstream and internal failures all look the same to clients.
        let message = if status.is_server_error() {
            error!(error = %self, details = ?self, "request failed");
            "Server error".to_string()
        } else {
            self.to_string()
        };

        let body = Json(serde_json::json!({ "error": message }));

        (status, body).into_response()
    }
}
