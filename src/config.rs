use std::{env, path::PathBuf, str::FromStr, time::Duration};

use anyhow::{Context, Result};

pub const DEFAULT_ORIGINS: [&str; 2] = ["http://localhost:3000", "http://127.0.0.1:3000"];

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub production: bool,
    pub temp_dir: PathBuf,
    pub max_file_age: Duration,

    // 0 disables the background sweep
    pub cleanup_interval: Duration,
    pub yt_dlp_path: String,
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Config> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let cors_origins = match lookup("CORS_ORIGINS") {
            Some(v) => v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
                .collect(),
            None => DEFAULT_ORIGINS.iter().map(ToString::to_string).collect(),
        };

        Ok(Config {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", 8000)?,
            production: lookup("ENVIRONMENT").as_deref() == Some("production"),
            temp_dir: PathBuf::from(lookup("TEMP_DIR").unwrap_or_else(|| "temp".to_string())),
            max_file_age: Duration::from_secs(parse_or(&lookup, "MAX_FILE_AGE_SECS", 3600)?),
            cleanup_interval: Duration::from_secs(parse_or(
                &lookup,
                "CLEANUP_INTERVAL_SECS",
                600,
            )?),
            yt_dlp_path: lookup("YT_DLP_PATH").unwrap_or_else(|| "yt-dlp".to_string()),
            cors_origins,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn environment_name(&self) -> &'static str {
        if self.production {
            "Production"
        } else {
            "Development"
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(v) => v
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: {v:?}")),
        None => Ok(default),
    }
}
