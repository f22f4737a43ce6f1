use poem::{error::ResponseError, http::StatusCode, web::Json, IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad or missing input.
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    /// A codec, the extractor or the filesystem failed while serving a request.
    #[error("{context}: {message}")]
    Upstream {
        context: &'static str,
        message: String,
    },
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        warn!("bad request: {}", msg);
        ApiError::BadRequest(msg)
    }

    pub fn upstream(context: &'static str, err: impl Into<anyhow::Error>) -> Self {
        // alternate form keeps the whole cause chain
        let message = format!("{:#}", err.into());
        error!("{}: {}", context, message);
        ApiError::Upstream { context, message }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        error!("{}", msg);
        ApiError::Internal(msg)
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::InvalidName(name) => {
                warn!("rejected file name {:?}", name);
                ApiError::BadRequest("Invalid filename".to_string())
            }
            StoreError::NotFound(_) => ApiError::NotFound("File not found".to_string()),
            StoreError::Io(e) => ApiError::internal(e.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    detail: String,
}

impl ResponseError for ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream { .. } | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn as_response(&self) -> Response {
        let mut resp = Json(ErrorBody {
            success: false,
            detail: self.to_string(),
        })
        .into_response();
        resp.set_status(self.status());
        resp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn renders_json_body_with_status() {
        let err = ApiError::upstream(
            "Error generating QR code",
            anyhow::anyhow!("data too long").context("cannot encode 9000 bytes"),
        );
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let resp = err.as_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = resp.into_body().into_json().await.unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(
            body["detail"],
            "Error generating QR code: cannot encode 9000 bytes: data too long"
        );
    }

    #[test]
    fn store_errors_map_to_client_statuses() {
        let invalid: ApiError = StoreError::InvalidName("../x".into()).into();
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        let missing: ApiError = StoreError::NotFound("x".into()).into();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(missing.to_string(), "File not found");

        let io: ApiError = StoreError::Io(std::io::Error::other("disk full")).into();
        assert_eq!(io.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
