use url::Url;

use crate::{core::video::FormatSelection, error::ApiError};

use super::FormData;

pub struct VideoInfoParams {
    pub url: String,
}

pub struct VideoDownloadParams {
    pub url: String,
    pub selection: FormatSelection,
}

impl VideoInfoParams {
    pub fn from_form(form: &FormData) -> Result<VideoInfoParams, ApiError> {
        Ok(VideoInfoParams {
            url: video_url(form)?,
        })
    }
}

impl VideoDownloadParams {
    pub fn from_form(form: &FormData) -> Result<VideoDownloadParams, ApiError> {
        let url = video_url(form)?;
        let format_id = form.required("format_id")?.trim().to_string();

        // audio-only ignores the requested format
        let selection = if form.flag("audio_only", false)? {
            FormatSelection::BestAudioMp3
        } else {
            FormatSelection::Exact(format_id)
        };

        Ok(VideoDownloadParams { url, selection })
    }
}

fn video_url(form: &FormData) -> Result<String, ApiError> {
    let raw = form.required("url")?.trim();
    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(raw.to_string()),
        _ => Err(ApiError::bad_request("Invalid video URL")),
    }
}
