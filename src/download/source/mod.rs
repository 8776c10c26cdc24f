//! Extraction backend abstraction.
//!
//! Provides the `MediaSource` trait the retrieval pipeline drives, plus the
//! request/response types passed across it. The production backend is
//! `YtDlpSource`; tests substitute scripted sources.

pub mod ytdlp;

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::core::config::CookieSource;
use crate::core::error::AppResult;

pub use ytdlp::YtDlpSource;

/// Per-attempt settings derived from the process configuration.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Directory the extractor writes into
    pub output_dir: PathBuf,
    /// Optional cookie file or raw Cookie header
    pub cookies: Option<CookieSource>,
    /// Optional outbound proxy URL
    pub proxy: Option<String>,
    /// Optional Accept-Language header override
    pub accept_language: Option<String>,
    /// User agent for the primary attempt
    pub desktop_user_agent: String,
    /// User agent for the fallback attempt
    pub mobile_user_agent: String,
    /// Referer header sent with every attempt
    pub referer: String,
    /// Upload ceiling in MiB
    pub max_file_size_mb: u64,
}

impl FetchSettings {
    /// Size ceiling in bytes.
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }
}

/// Which browser the extractor pretends to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientProfile {
    Desktop,
    Mobile,
}

/// One extraction attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub profile: ClientProfile,
    pub user_agent: String,
    /// Extra HTTP headers as `(name, value)` pairs, in send order
    pub headers: Vec<(String, String)>,
    pub output_dir: PathBuf,
    pub cookies: Option<CookieSource>,
    pub proxy: Option<String>,
}

impl FetchRequest {
    /// Builds an attempt for `url` with the given client profile.
    pub fn new(url: &str, profile: ClientProfile, settings: &FetchSettings) -> Self {
        let user_agent = match profile {
            ClientProfile::Desktop => settings.desktop_user_agent.clone(),
            ClientProfile::Mobile => settings.mobile_user_agent.clone(),
        };

        let mut headers = vec![("Referer".to_string(), settings.referer.clone())];
        if let Some(lang) = &settings.accept_language {
            headers.push(("Accept-Language".to_string(), lang.clone()));
        }

        Self {
            url: url.to_string(),
            profile,
            user_agent,
            headers,
            output_dir: settings.output_dir.clone(),
            cookies: settings.cookies.clone(),
            proxy: settings.proxy.clone(),
        }
    }

    /// Redirects the attempt's output into `dir`.
    pub fn in_dir(mut self, dir: &Path) -> Self {
        self.output_dir = dir.to_path_buf();
        self
    }
}

/// What the extractor reports after a successful download.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaInfo {
    pub title: Option<String>,
    pub uploader: Option<String>,
    pub ext: Option<String>,
    /// Final path as reported by the extractor, if any
    pub filename: Option<PathBuf>,
}

/// Trait for extraction backends.
///
/// `fetch` downloads the media for one attempt into `request.output_dir`.
/// On failure the error carries the backend's raw failure text
/// (see [`AppError::failure_text`](crate::core::error::AppError::failure_text)).
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Human-readable name of this source (e.g., "yt-dlp")
    fn name(&self) -> &str;

    /// Run one extraction + download attempt.
    async fn fetch(&self, request: &FetchRequest) -> AppResult<MediaInfo>;
}
