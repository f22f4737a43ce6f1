use bytes::Bytes;
use poem::{
    handler,
    web::{Data, Json},
};
use tracing::info;

use crate::{
    api::{
        params::{qr_params::QrParams, FormData},
        AppState, ArtifactResp,
    },
    core::qr,
    error::ApiError,
    store::FileStore,
};

const ERR_CONTEXT: &str = "Error generating QR code";

#[handler]
pub async fn generate(
    form: FormData,
    state: Data<&AppState>,
) -> Result<Json<ArtifactResp>, ApiError> {
    let params = QrParams::from_form(&form)?;

    let png = tokio::task::spawn_blocking(move || {
        qr::render_png(&params.text, params.size, params.border)
    })
    .await
    .map_err(|e| ApiError::upstream(ERR_CONTEXT, e))?
    .map_err(|e| ApiError::upstream(ERR_CONTEXT, e))?;

    let filename = FileStore::unique_name("qr", "png");
    state
        .store
        .put(&filename, Bytes::from(png))
        .await
        .map_err(|e| ApiError::upstream(ERR_CONTEXT, e))?;

    info!(filename = %filename, "qr code generated");
    Ok(Json(ArtifactResp::new(filename)))
}
