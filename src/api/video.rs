use poem::{
    handler,
    web::{Data, Json},
};
use serde::Serialize;
use serde_json::Number;
use tracing::info;

use crate::{
    api::{
        params::{
            video_params::{VideoDownloadParams, VideoInfoParams},
            FormData,
        },
        AppState, ArtifactResp,
    },
    core::video::{select_formats, FormatSummary},
    error::ApiError,
    store::FileStore,
};

#[derive(Serialize)]
pub struct VideoInfoResp {
    success: bool,
    title: Option<String>,
    duration: Option<Number>,
    thumbnail: Option<String>,
    formats: Vec<FormatSummary>,
}

#[handler]
pub async fn info(
    form: FormData,
    state: Data<&AppState>,
) -> Result<Json<VideoInfoResp>, ApiError> {
    let params = VideoInfoParams::from_form(&form)?;

    let meta = state
        .extractor
        .info(&params.url)
        .await
        .map_err(|e| ApiError::upstream("Error getting video info", e))?;

    let formats = select_formats(&meta.formats);
    info!(url = %params.url, formats = formats.len(), "video info fetched");

    Ok(Json(VideoInfoResp {
        success: true,
        title: meta.title,
        duration: meta.duration,
        thumbnail: meta.thumbnail,
        formats,
    }))
}

#[handler]
pub async fn download(
    form: FormData,
    state: Data<&AppState>,
) -> Result<Json<ArtifactResp>, ApiError> {
    const ERR_CONTEXT: &str = "Error downloading video";

    let params = VideoDownloadParams::from_form(&form)?;

    let stem = FileStore::unique_stem("download");
    let output_stem = state.store.root().join(&stem);

    info!(url = %params.url, selection = ?params.selection, stem = %stem, "downloading video");
    state
        .extractor
        .download(&params.url, &params.selection, &output_stem)
        .await
        .map_err(|e| ApiError::upstream(ERR_CONTEXT, e))?;

    // the extractor picks the extension
    let found = state
        .store
        .find_by_stem(&stem)
        .await
        .map_err(|e| ApiError::upstream(ERR_CONTEXT, e))?;
    let Some(filename) = found else {
        return Err(ApiError::internal("Download failed"));
    };

    info!(filename = %filename, "video downloaded");
    Ok(Json(ArtifactResp::new(filename)))
}
