use std::{sync::Arc, time::Duration};

use poem::{
    delete,
    endpoint::StaticFilesEndpoint,
    get, handler,
    middleware::{CatchPanic, Cors, Tracing},
    post,
    web::Json,
    Endpoint, EndpointExt, Route,
};
use serde::Serialize;

use crate::{
    core::video::VideoExtractor,
    store::{FileStore, STATIC_PREFIX},
};

pub mod coin;
pub mod files;
pub mod params;
pub mod qr;
pub mod resize;
pub mod video;

/// Shared by every handler through `Data<&AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub store: FileStore,
    pub extractor: Arc<dyn VideoExtractor>,
    pub max_file_age: Duration,
}

/// Reply for handlers that produce one artifact.
#[derive(Serialize)]
pub struct ArtifactResp {
    success: bool,
    filename: String,
    url: String,
}

impl ArtifactResp {
    pub fn new(filename: String) -> Self {
        Self {
            success: true,
            url: FileStore::url_for(&filename),
            filename,
        }
    }
}

#[derive(Serialize)]
struct IndexResp {
    message: &'static str,
}

#[handler]
fn index() -> Json<IndexResp> {
    Json(IndexResp {
        message: "Simple Tools API is running!",
    })
}

pub fn build_app(state: AppState, cors_origins: &[String]) -> impl Endpoint {
    // empty method and header lists allow all
    let mut cors = Cors::new().allow_credentials(true);
    for origin in cors_origins {
        cors = cors.allow_origin(origin.as_str());
    }

    let static_files = StaticFilesEndpoint::new(state.store.root().to_path_buf());

    Route::new()
        .at("/", get(index))
        .at("/api/qr-generate", post(qr::generate))
        .at("/api/image-resize", post(resize::resize))
        .at("/api/youtube-info", post(video::info))
        .at("/api/youtube-download", post(video::download))
        .at("/api/coin-flip", post(coin::flip))
        .at("/api/download/:filename", get(files::download))
        .at("/api/cleanup", delete(files::cleanup))
        .nest(STATIC_PREFIX, static_files)
        .with(cors)
        .with(Tracing)
        .with(CatchPanic::new())
        .data(state)
}
