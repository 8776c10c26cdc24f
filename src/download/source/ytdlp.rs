//! YtDlpSource: the extraction backend, powered by the yt-dlp binary.
//!
//! One `fetch` call is one yt-dlp invocation. The info JSON is printed on
//! stdout (`--dump-json --no-simulate`) while the download proceeds, and
//! stderr `ERROR:` lines become the raw failure text.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

use crate::core::config::CookieSource;
use crate::core::error::{AppError, AppResult};
use crate::core::utils::truncate_chars;
use crate::download::source::{FetchRequest, MediaInfo, MediaSource};

/// Format selector: best combined video+audio, single-file fallback
const FORMAT_SELECTOR: &str = "bestvideo+bestaudio/best";

/// Output template relative to the download directory. Titles are capped at
/// 150 bytes to stay under filesystem name limits.
const OUTPUT_TEMPLATE: &str = "%(title).150B.%(ext)s";

/// Subset of the yt-dlp info JSON we read.
#[derive(Debug, Deserialize)]
struct InfoJson {
    title: Option<String>,
    uploader: Option<String>,
    ext: Option<String>,
    filename: Option<String>,
    #[serde(rename = "_filename")]
    legacy_filename: Option<String>,
}

impl From<InfoJson> for MediaInfo {
    fn from(info: InfoJson) -> Self {
        MediaInfo {
            title: info.title,
            uploader: info.uploader,
            ext: info.ext,
            filename: info.filename.or(info.legacy_filename).map(PathBuf::from),
        }
    }
}

/// Download source backed by the yt-dlp executable.
pub struct YtDlpSource {
    bin: String,
    socket_timeout: Duration,
}

impl YtDlpSource {
    pub fn new(bin: impl Into<String>, socket_timeout: Duration) -> Self {
        Self {
            bin: bin.into(),
            socket_timeout,
        }
    }

    /// Full argument list for one attempt.
    pub fn build_args(&self, request: &FetchRequest) -> Vec<String> {
        let output = output_template(&request.output_dir);

        let mut args: Vec<String> = vec![
            "--no-playlist".into(),
            "-f".into(),
            FORMAT_SELECTOR.into(),
            "--merge-output-format".into(),
            "mp4".into(),
            "-o".into(),
            output,
            "--user-agent".into(),
            request.user_agent.clone(),
        ];

        for (name, value) in &request.headers {
            args.push("--add-header".into());
            args.push(format!("{}:{}", name, value));
        }

        match &request.cookies {
            Some(CookieSource::File(path)) => {
                args.push("--cookies".into());
                args.push(path.display().to_string());
            }
            Some(CookieSource::Header(header)) => {
                args.push("--add-header".into());
                args.push(format!("Cookie:{}", header));
            }
            None => {}
        }

        if let Some(proxy) = &request.proxy {
            args.push("--proxy".into());
            args.push(proxy.clone());
        }

        args.extend([
            "--socket-timeout".into(),
            self.socket_timeout.as_secs().to_string(),
            "--dump-json".into(),
            "--no-simulate".into(),
            "--no-warnings".into(),
            request.url.clone(),
        ]);

        args
    }

    /// Reports the installed yt-dlp version.
    pub async fn version(&self) -> AppResult<String> {
        let output = Command::new(&self.bin)
            .arg("--version")
            .output()
            .await
            .map_err(|e| AppError::Extraction(format!("Failed to start {}: {}", self.bin, e)))?;

        if !output.status.success() {
            return Err(AppError::Extraction(format!(
                "{} --version exited with {}",
                self.bin, output.status
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl MediaSource for YtDlpSource {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn fetch(&self, request: &FetchRequest) -> AppResult<MediaInfo> {
        tokio::fs::create_dir_all(&request.output_dir).await?;

        let args = self.build_args(request);
        log::info!("yt-dlp {:?} attempt for {}", request.profile, request.url);
        log::debug!("yt-dlp args: {:?}", args);

        let output = Command::new(&self.bin)
            .args(&args)
            .output()
            .await
            .map_err(|e| AppError::Extraction(format!("Failed to start {}: {}", self.bin, e)))?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            let raw = error_text(&stderr, output.status.code());
            log::warn!("yt-dlp failed for {}: {}", request.url, raw);
            return Err(AppError::Extraction(raw));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_info(&stdout)
    }
}

fn output_template(dir: &Path) -> String {
    dir.join(OUTPUT_TEMPLATE).display().to_string()
}

/// Takes the last JSON object line from stdout.
fn parse_info(stdout: &str) -> AppResult<MediaInfo> {
    let line = stdout
        .lines()
        .map(str::trim)
        .rfind(|line| line.starts_with('{'))
        .ok_or_else(|| AppError::Extraction("yt-dlp printed no video information".to_string()))?;

    let info: InfoJson = serde_json::from_str(line)?;
    Ok(info.into())
}

/// Raw failure text from yt-dlp's stderr: the `ERROR:` lines when present,
/// otherwise the tail of stderr, otherwise the exit status.
fn error_text(stderr: &str, code: Option<i32>) -> String {
    let errors: Vec<String> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("ERROR:"))
        .map(strip_media_prefix)
        .collect();

    if !errors.is_empty() {
        return errors.join("\n");
    }

    let trimmed = stderr.trim();
    if !trimmed.is_empty() {
        let tail: Vec<&str> = trimmed.lines().rev().take(5).collect();
        return truncate_chars(&tail.into_iter().rev().collect::<Vec<_>>().join("\n"), 1000);
    }

    match code {
        Some(code) => format!("yt-dlp exited with code {}", code),
        None => "yt-dlp was terminated by a signal".to_string(),
    }
}

/// `ERROR: [TikTok] 7301404123: message` becomes `ERROR: message`. Numeric
/// media ids would otherwise feed status-code lookalikes to the classifier.
fn strip_media_prefix(line: &str) -> String {
    let Some(rest) = line.strip_prefix("ERROR:").map(str::trim_start) else {
        return line.to_string();
    };
    let Some((_, message)) = rest.strip_prefix('[').and_then(|r| r.split_once("] ")) else {
        return line.to_string();
    };

    match message.split_once(": ") {
        Some((id, detail)) if !id.is_empty() && !id.contains(char::is_whitespace) => format!("ERROR: {}", detail),
        _ => format!("ERROR: {}", message),
    }
}
