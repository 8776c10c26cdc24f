//! Retrieval pipeline for a single TikTok URL.
//!
//! primary attempt (desktop UA) → one fallback attempt (mobile UA, stripped
//! query) → resolve the output path → existence + size checks.
//!
//! Every retrieval writes into its own scratch directory under the download
//! directory, so concurrent retrievals of the same video never share a path.
//! The directory is owned by a [`TempMedia`] guard from the moment the
//! artifact path is known and is removed on every exit path, including early
//! returns and unwinding. Partial downloads and unmerged streams go with it.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use crate::core::error::AppResult;
use crate::download::classify::{classify_failure, FetchFailure};
use crate::download::links::fallback_url;
use crate::download::source::{ClientProfile, FetchRequest, FetchSettings, MediaInfo, MediaSource};

/// Failure text when the extractor reports success but no file exists
pub const MISSING_FILE_TEXT: &str = "Downloaded file was not created";

/// Outcome of one retrieval.
#[derive(Debug)]
pub enum RetrievalOutcome {
    /// The video is on disk and within the size ceiling
    Success(DownloadedVideo),
    /// The video exceeded the ceiling and has already been deleted
    TooLarge { size: u64 },
    /// Both attempts failed, or the artifact was unusable
    Failed(FetchFailure),
}

/// Exclusive owner of a temporary media file and, when it has one, the
/// scratch directory it was downloaded into.
///
/// `remove` is idempotent; dropping an unremoved guard deletes the file and
/// the directory synchronously.
#[derive(Debug)]
pub struct TempMedia {
    path: PathBuf,
    scratch: Option<TempDir>,
    armed: bool,
}

impl TempMedia {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            scratch: None,
            armed: true,
        }
    }

    /// Guard for a file inside `scratch`; the whole directory is removed with it.
    pub fn in_scratch(path: impl Into<PathBuf>, scratch: TempDir) -> Self {
        Self {
            path: path.into(),
            scratch: Some(scratch),
            armed: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Deletes the file and its scratch directory. Anything already gone
    /// counts as removed.
    pub async fn remove(&mut self) -> io::Result<()> {
        if self.armed {
            match tokio::fs::remove_file(&self.path).await {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
            self.armed = false;
        }
        if let Some(scratch) = self.scratch.take() {
            remove_scratch(scratch).await?;
        }
        Ok(())
    }

    /// Moves the file into `dest_dir` and gives up ownership of it.
    pub async fn persist(mut self, dest_dir: &Path) -> io::Result<PathBuf> {
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "media path has no file name"))?;
        tokio::fs::create_dir_all(dest_dir).await?;
        let dest = dest_dir.join(file_name);

        if tokio::fs::rename(&self.path, &dest).await.is_err() {
            // rename fails across filesystems
            tokio::fs::copy(&self.path, &dest).await?;
            tokio::fs::remove_file(&self.path).await?;
        }
        self.armed = false;
        if let Some(scratch) = self.scratch.take() {
            remove_scratch(scratch).await?;
        }
        Ok(dest)
    }
}

impl Drop for TempMedia {
    fn drop(&mut self) {
        if self.armed {
            if let Err(e) = std::fs::remove_file(&self.path) {
                if e.kind() != io::ErrorKind::NotFound {
                    log::warn!("Failed to remove temporary file {}: {}", self.path.display(), e);
                }
            }
        }
    }
}

/// A successfully downloaded video, ready for delivery.
#[derive(Debug)]
pub struct DownloadedVideo {
    pub file: TempMedia,
    pub title: Option<String>,
    pub uploader: Option<String>,
    pub size: u64,
}

impl DownloadedVideo {
    /// Opens the file for upload.
    pub async fn open(&self) -> AppResult<tokio::fs::File> {
        Ok(tokio::fs::File::open(self.file.path()).await?)
    }

    /// File name shown to the recipient.
    pub fn file_name(&self) -> String {
        self.file
            .path()
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video.mp4".to_string())
    }

    /// Deletes the file; safe to call more than once.
    pub async fn cleanup(&mut self) -> io::Result<()> {
        self.file.remove().await
    }

    /// Keeps the file by moving it into `dest_dir`.
    pub async fn persist(self, dest_dir: &Path) -> io::Result<PathBuf> {
        self.file.persist(dest_dir).await
    }
}

/// Drives a [`MediaSource`] through the primary and fallback attempts.
pub struct RetrievalPipeline {
    source: Arc<dyn MediaSource>,
    settings: FetchSettings,
}

impl RetrievalPipeline {
    pub fn new(source: Arc<dyn MediaSource>, settings: FetchSettings) -> Self {
        Self { source, settings }
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    /// Retrieves one normalised URL.
    pub async fn retrieve(&self, url: &str) -> RetrievalOutcome {
        let scratch = match self.scratch_dir().await {
            Ok(dir) => dir,
            Err(e) => {
                log::error!(
                    "Cannot create a working directory in {}: {}",
                    self.settings.output_dir.display(),
                    e
                );
                return RetrievalOutcome::Failed(classify_failure(&e.to_string()));
            }
        };

        let primary = FetchRequest::new(url, ClientProfile::Desktop, &self.settings).in_dir(scratch.path());

        let info = match self.source.fetch(&primary).await {
            Ok(info) => info,
            Err(first) => {
                log::warn!(
                    "Primary {} attempt failed for {}: {}",
                    self.source.name(),
                    url,
                    first.failure_text()
                );

                let fallback =
                    FetchRequest::new(&fallback_url(url), ClientProfile::Mobile, &self.settings).in_dir(scratch.path());
                match self.source.fetch(&fallback).await {
                    Ok(info) => info,
                    Err(second) => {
                        let raw = second.failure_text();
                        log::error!("Download error for {}: {}", url, raw);
                        discard_scratch(scratch).await;
                        return RetrievalOutcome::Failed(classify_failure(&raw));
                    }
                }
            }
        };

        self.check_artifact(url, info, scratch).await
    }

    /// Fresh directory for one retrieval, inside the download directory.
    async fn scratch_dir(&self) -> io::Result<TempDir> {
        tokio::fs::create_dir_all(&self.settings.output_dir).await?;
        tempfile::Builder::new()
            .prefix("fetch-")
            .tempdir_in(&self.settings.output_dir)
    }

    async fn check_artifact(&self, url: &str, info: MediaInfo, scratch: TempDir) -> RetrievalOutcome {
        let path = resolve_output_path(&info, scratch.path());
        let mut file = TempMedia::in_scratch(path, scratch);

        let size = match tokio::fs::metadata(file.path()).await {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::error!("Download error for {}: {} ({})", url, MISSING_FILE_TEXT, file.path().display());
                discard(file).await;
                return RetrievalOutcome::Failed(classify_failure(MISSING_FILE_TEXT));
            }
            Err(e) => {
                log::error!("Download error for {}: cannot stat {}: {}", url, file.path().display(), e);
                discard(file).await;
                return RetrievalOutcome::Failed(classify_failure(&e.to_string()));
            }
        };

        if size > self.settings.max_file_size_bytes() {
            log::warn!(
                "Video {} is {} bytes, over the {} MiB ceiling",
                url,
                size,
                self.settings.max_file_size_mb
            );
            discard(file).await;
            return RetrievalOutcome::TooLarge { size };
        }

        log::info!("Downloaded {} to {} ({} bytes)", url, file.path().display(), size);
        RetrievalOutcome::Success(DownloadedVideo {
            file,
            title: info.title,
            uploader: info.uploader,
            size,
        })
    }
}

async fn remove_scratch(scratch: TempDir) -> io::Result<()> {
    match tokio::fs::remove_dir_all(scratch.path()).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

async fn discard_scratch(scratch: TempDir) {
    let dir = scratch.path().to_path_buf();
    if let Err(e) = remove_scratch(scratch).await {
        log::warn!("Failed to remove working directory {}: {}", dir.display(), e);
    }
}

async fn discard(mut file: TempMedia) {
    if let Err(e) = file.remove().await {
        log::warn!("Failed to remove {}: {}", file.path().display(), e);
    }
}

/// Final path of a downloaded video: the extractor's reported filename, or
/// `<dir>/<title>.<ext>` when none was reported, always with `.mp4`.
pub fn resolve_output_path(info: &MediaInfo, dir: &Path) -> PathBuf {
    let reported = match &info.filename {
        Some(filename) => filename.clone(),
        None => {
            let title = info.title.as_deref().unwrap_or("video").replace(['/', '\\'], "_");
            let ext = info.ext.as_deref().unwrap_or("mp4");
            dir.join(format!("{}.{}", title, ext))
        }
    };
    reported.with_extension("mp4")
}
