//! Scripted extraction backend

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::time::Instant;

use tokgrab::core::error::{AppError, AppResult};
use tokgrab::download::source::{FetchRequest, MediaInfo, MediaSource};

/// One scripted attempt outcome
#[derive(Debug, Clone)]
pub enum Scripted {
    /// Writes `<title>.mp4` of `size` bytes and reports it as `<title>.webm`,
    /// the way yt-dlp reports the pre-merge name
    Download {
        title: String,
        uploader: Option<String>,
        size: u64,
    },
    /// Writes and reports `<title>.webm`, a single stream yt-dlp did not
    /// remux into MP4
    Unmerged { title: String, size: u64 },
    /// Leaves `<title>.mp4.part` behind, then fails with the given raw text
    Partial { title: String, raw: String },
    /// Reports success without writing anything
    NoFile { title: String },
    /// Fails with the given raw error text
    Fail(String),
}

impl Scripted {
    pub fn download(title: &str, size: u64) -> Self {
        Scripted::Download {
            title: title.to_string(),
            uploader: None,
            size,
        }
    }

    pub fn fail(raw: &str) -> Self {
        Scripted::Fail(raw.to_string())
    }
}

/// A recorded `fetch` call
#[derive(Debug, Clone)]
pub struct Call {
    pub at: Instant,
    pub request: FetchRequest,
}

#[derive(Default)]
pub struct MockSource {
    script: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<Call>>,
}

impl MockSource {
    pub fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl MediaSource for MockSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(&self, request: &FetchRequest) -> AppResult<MediaInfo> {
        self.calls.lock().unwrap().push(Call {
            at: Instant::now(),
            request: request.clone(),
        });
        let next = self.script.lock().unwrap().pop_front();

        match next {
            Some(Scripted::Download { title, uploader, size }) => {
                let actual = request.output_dir.join(format!("{}.mp4", title));
                let file = std::fs::File::create(&actual)?;
                file.set_len(size)?;

                Ok(MediaInfo {
                    title: Some(title.clone()),
                    uploader,
                    ext: Some("webm".to_string()),
                    filename: Some(request.output_dir.join(format!("{}.webm", title))),
                })
            }
            Some(Scripted::Unmerged { title, size }) => {
                let actual = request.output_dir.join(format!("{}.webm", title));
                std::fs::File::create(&actual)?.set_len(size)?;

                Ok(MediaInfo {
                    title: Some(title),
                    uploader: None,
                    ext: Some("webm".to_string()),
                    filename: Some(actual),
                })
            }
            Some(Scripted::Partial { title, raw }) => {
                std::fs::write(request.output_dir.join(format!("{}.mp4.part", title)), b"partial")?;
                Err(AppError::Extraction(raw))
            }
            Some(Scripted::NoFile { title }) => Ok(MediaInfo {
                title: Some(title),
                ext: Some("mp4".to_string()),
                ..Default::default()
            }),
            Some(Scripted::Fail(raw)) => Err(AppError::Extraction(raw)),
            None => Err(AppError::Extraction("mock script exhausted".to_string())),
        }
    }
}
