use std::{ffi::OsString, path::Path, process::Stdio};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Number;
use tokio::process::Command;
use tracing::{debug, error};

pub const MAX_FORMATS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatSelection {
    /// A format id as listed by [`VideoExtractor::info`].
    Exact(String),
    /// Best audio stream, transcoded to mp3 at 192 kbps.
    BestAudioMp3,
}

/// Subset of the extractor's metadata dump.
#[derive(Deserialize, Debug, Default)]
pub struct VideoInfo {
    pub title: Option<String>,
    pub duration: Option<Number>,
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub formats: Vec<RawFormat>,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct RawFormat {
    pub format_id: Option<String>,
    pub ext: Option<String>,
    pub format_note: Option<String>,
    pub filesize: Option<Number>,
    pub vcodec: Option<String>,
    pub acodec: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct FormatSummary {
    pub format_id: Option<String>,
    pub ext: Option<String>,
    pub quality: String,
    pub filesize: Option<Number>,
    pub vcodec: Option<String>,
    pub acodec: Option<String>,
}

impl RawFormat {
    fn has_stream(&self) -> bool {
        fn present(codec: &Option<String>) -> bool {
            codec.as_deref().is_some_and(|c| !c.is_empty() && c != "none")
        }
        present(&self.vcodec) || present(&self.acodec)
    }
}

impl From<&RawFormat> for FormatSummary {
    fn from(f: &RawFormat) -> Self {
        FormatSummary {
            format_id: f.format_id.clone(),
            ext: f.ext.clone(),
            quality: f
                .format_note
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
            filesize: f.filesize.clone(),
            vcodec: f.vcodec.clone(),
            acodec: f.acodec.clone(),
        }
    }
}

/// Keeps formats carrying a video or audio stream, in extractor order, at most
/// [`MAX_FORMATS`].
pub fn select_formats(formats: &[RawFormat]) -> Vec<FormatSummary> {
    formats
        .iter()
        .filter(|f| f.has_stream())
        .take(MAX_FORMATS)
        .map(FormatSummary::from)
        .collect()
}

#[async_trait]
pub trait VideoExtractor: Send + Sync {
    /// Fetches metadata without downloading anything.
    async fn info(&self, url: &str) -> Result<VideoInfo>;

    /// Downloads to `<output_stem>.<ext>`, the extension is chosen by the
    /// extractor.
    async fn download(
        &self,
        url: &str,
        selection: &FormatSelection,
        output_stem: &Path,
    ) -> Result<()>;
}

/// Drives the `yt-dlp` command line tool.
pub struct YtDlp {
    program: String,
}

impl YtDlp {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn run(&self, args: Vec<OsString>) -> Result<Vec<u8>> {
        debug!(program = %self.program, ?args, "running extractor");

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("failed to start {}", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!(status = %output.status, stderr = %stderr.trim(), "extractor failed");
            anyhow::bail!("{}", failure_message(&stderr, &output.status.to_string()));
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl VideoExtractor for YtDlp {
    async fn info(&self, url: &str) -> Result<VideoInfo> {
        let stdout = self.run(info_args(url)).await?;
        let info = serde_json::from_slice::<VideoInfo>(&stdout)
            .context("extractor returned unreadable metadata")?;
        Ok(info)
    }

    async fn download(
        &self,
        url: &str,
        selection: &FormatSelection,
        output_stem: &Path,
    ) -> Result<()> {
        self.run(download_args(url, selection, output_stem)).await?;
        Ok(())
    }
}

fn info_args(url: &str) -> Vec<OsString> {
    ["--dump-single-json", "--no-download", "--quiet", "--no-warnings", "--", url]
        .into_iter()
        .map(OsString::from)
        .collect()
}

fn download_args(url: &str, selection: &FormatSelection, output_stem: &Path) -> Vec<OsString> {
    let mut template = output_stem.as_os_str().to_owned();
    template.push(".%(ext)s");

    let mut args: Vec<OsString> = vec!["--format".into()];
    match selection {
        FormatSelection::Exact(id) => args.push(id.into()),
        FormatSelection::BestAudioMp3 => {
            args.push("bestaudio/best".into());
            args.extend(
                ["--extract-audio", "--audio-format", "mp3", "--audio-quality", "192K"]
                    .into_iter()
                    .map(OsString::from),
            );
        }
    }
    args.push("--output".into());
    args.push(template);
    args.extend(
        ["--quiet", "--no-warnings", "--no-progress", "--", url]
            .into_iter()
            .map(OsString::from),
    );
    args
}

// Prefer the last "ERROR:" line, which is what yt-dlp prints on failure.
fn failure_message(stderr: &str, status: &str) -> String {
    let lines: Vec<&str> = stderr.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    lines
        .iter()
        .rev()
        .find(|l| l.starts_with("ERROR:"))
        .or_else(|| lines.last())
        .map(|l| l.to_string())
        .unwrap_or_else(|| format!("extractor exited with {status}"))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn format(id: &str, vcodec: Option<&str>, acodec: Option<&str>) -> RawFormat {
        RawFormat {
            format_id: Some(id.to_string()),
            ext: Some("mp4".to_string()),
            vcodec: vcodec.map(ToString::to_string),
            acodec: acodec.map(ToString::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn drops_formats_without_streams() {
        let formats = vec![
            format("sb0", Some("none"), Some("none")),
            format("140", Some("none"), Some("mp4a.40.2")),
            format("137", Some("avc1"), Some("none")),
            format("mhtml", None, None),
            format("18", Some("avc1"), Some("mp4a")),
        ];

        let ids: Vec<_> = select_formats(&formats)
            .into_iter()
            .map(|f| f.format_id.unwrap())
            .collect();
        assert_eq!(ids, vec!["140", "137", "18"]);
    }

    #[test]
    fn keeps_first_ten_in_order() {
        let formats: Vec<_> = (0..25)
            .map(|i| {
                if i % 3 == 0 {
                    format(&i.to_string(), Some("none"), Some("none"))
                } else {
                    format(&i.to_string(), Some("vp9"), None)
                }
            })
            .collect();

        let selected = select_formats(&formats);
        assert_eq!(selected.len(), MAX_FORMATS);
        let ids: Vec<_> = selected.iter().map(|f| f.format_id.clone().unwrap()).collect();
        assert_eq!(
            ids,
            vec!["1", "2", "4", "5", "7", "8", "10", "11", "13", "14"]
        );
    }

    #[test]
    fn quality_defaults_to_unknown() {
        let mut f = format("22", Some("avc1"), Some("mp4a"));
        assert_eq!(FormatSummary::from(&f).quality, "Unknown");
        f.format_note = Some("720p".to_string());
        assert_eq!(FormatSummary::from(&f).quality, "720p");
    }

    #[test]
    fn parses_metadata_dump() {
        let json = r#"{
            "title": "Example",
            "duration": 212.5,
            "thumbnail": null,
            "formats": [
                {"format_id": "18", "ext": "mp4", "format_note": "360p",
                 "filesize": 1048576, "vcodec": "avc1.42001E", "acodec": "mp4a.40.2",
                 "width": 640}
            ],
            "uploader": "someone"
        }"#;
        let info: VideoInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.title.as_deref(), Some("Example"));
        assert_eq!(info.duration.unwrap().as_f64(), Some(212.5));
        assert!(info.thumbnail.is_none());

        let summary = &select_formats(&info.formats)[0];
        assert_eq!(summary.filesize.as_ref().and_then(Number::as_u64), Some(1048576));
        assert_eq!(summary.quality, "360p");

        let bare: VideoInfo = serde_json::from_str(r#"{"title": "playlist"}"#).unwrap();
        assert!(bare.formats.is_empty());
    }

    #[test]
    fn download_args_for_exact_format() {
        let stem = PathBuf::from("temp/download_abc");
        let args = download_args(
            "https://youtu.be/x",
            &FormatSelection::Exact("22".to_string()),
            &stem,
        );
        let args: Vec<_> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();

        assert_eq!(&args[..2], ["--format", "22"]);
        assert!(args.windows(2).any(|w| w == ["--output", "temp/download_abc.%(ext)s"]));
        assert!(!args.contains(&"--extract-audio".to_string()));
        assert_eq!(args[args.len() - 2..], ["--", "https://youtu.be/x"]);
    }

    #[test]
    fn download_args_for_audio() {
        let args = download_args(
            "https://youtu.be/x",
            &FormatSelection::BestAudioMp3,
            Path::new("download_abc"),
        );
        let args: Vec<_> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();

        assert_eq!(&args[..2], ["--format", "bestaudio/best"]);
        assert!(args.windows(2).any(|w| w == ["--audio-format", "mp3"]));
        assert!(args.windows(2).any(|w| w == ["--audio-quality", "192K"]));
        assert!(args.contains(&"--extract-audio".to_string()));
    }

    #[test]
    fn info_args_stop_option_parsing() {
        let args = info_args("-x");
        assert_eq!(args.last().unwrap(), "-x");
        assert_eq!(args[args.len() - 2], "--");
    }

    #[test]
    fn failure_message_prefers_error_line() {
        let stderr = "WARNING: something\nERROR: [youtube] abc: Video unavailable\n\n";
        assert_eq!(
            failure_message(stderr, "exit status: 1"),
            "ERROR: [youtube] abc: Video unavailable"
        );
        assert_eq!(failure_message("", "exit status: 2"), "extractor exited with exit status: 2");
    }

    #[tokio::test]
    async fn missing_binary_is_an_error() {
        let extractor = YtDlp::new("definitely-not-a-real-extractor-binary");
        let err = extractor.info("https://example.com").await.unwrap_err();
        assert!(err.to_string().contains("failed to start"));
    }
}
