use poem::{
    handler,
    web::{Data, Json},
};
use serde::Serialize;
use tracing::info;

use crate::{
    api::{
        params::{resize_params::ImageResizeParams, FormData},
        AppState, ArtifactResp,
    },
    core::algorithm,
    error::ApiError,
    store::FileStore,
};

const ERR_CONTEXT: &str = "Error resizing image";

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    width: u32,
    height: u32,
}

#[derive(Serialize)]
pub struct ResizeResp {
    #[serde(flatten)]
    artifact: ArtifactResp,
    original_size: Size,
    new_size: Size,
}

#[handler]
pub async fn resize(
    form: FormData,
    state: Data<&AppState>,
) -> Result<Json<ResizeResp>, ApiError> {
    let params = ImageResizeParams::from_form(form)?;
    info!(
        file_name = ?params.file_name,
        bytes = params.blob.len(),
        width = params.width,
        height = params.height,
        mode = ?params.mode,
        "resizing upload"
    );

    let (resized, original) = tokio::task::spawn_blocking(move || handle(&params))
        .await
        .map_err(|e| ApiError::upstream(ERR_CONTEXT, e))?
        .map_err(|e| ApiError::upstream(ERR_CONTEXT, e))?;

    let filename = FileStore::unique_name("resized", "png");
    let new_size = Size {
        width: resized.width,
        height: resized.height,
    };
    state
        .store
        .put(&filename, resized.png)
        .await
        .map_err(|e| ApiError::upstream(ERR_CONTEXT, e))?;

    Ok(Json(ResizeResp {
        artifact: ArtifactResp::new(filename),
        original_size: original,
        new_size,
    }))
}

fn handle(params: &ImageResizeParams) -> anyhow::Result<(algorithm::Resized, Size)> {
    let src_image = algorithm::decode(&params.blob)?;
    let resized = algorithm::resize(&src_image, (params.width, params.height), params.mode)?;

    // reported from a separate read of the upload, not from `src_image`
    let (width, height) = algorithm::probe_dimensions(&params.blob)?;

    Ok((resized, Size { width, height }))
}
