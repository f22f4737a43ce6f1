use std::time::SystemTime;

use poem::{
    handler,
    http::header,
    web::{Data, Json, Path},
    Body, Response,
};
use serde::Serialize;
use tracing::info;

use crate::{api::AppState, error::ApiError};

#[handler]
pub async fn download(
    Path(filename): Path<String>,
    state: Data<&AppState>,
) -> Result<Response, ApiError> {
    let (file, len) = state.store.open_file(&filename).await?;
    info!(filename = %filename, bytes = len, "serving artifact");

    Ok(Response::builder()
        .content_type("application/octet-stream")
        .header(header::CONTENT_DISPOSITION, content_disposition(&filename))
        .body(Body::from_async_read(file)))
}

fn content_disposition(filename: &str) -> String {
    let escaped = filename.replace('\\', "\\\\").replace('"', "\\\"");
    format!("attachment; filename=\"{escaped}\"")
}

#[derive(Serialize)]
pub struct CleanupResp {
    success: bool,
    deleted_files: usize,
}

#[handler]
pub async fn cleanup(state: Data<&AppState>) -> Result<Json<CleanupResp>, ApiError> {
    let deleted_files = state
        .store
        .purge_older_than(state.max_file_age, SystemTime::now())
        .await
        .map_err(|e| ApiError::upstream("Error cleaning up files", e))?;

    info!(deleted_files, "cleanup finished");
    Ok(Json(CleanupResp {
        success: true,
        deleted_files,
    }))
}
