//! Download subsystem: link extraction, the yt-dlp backend, failure
//! classification and the retrieval pipeline.

pub mod classify;
pub mod links;
pub mod pipeline;
pub mod source;

pub use classify::{classify_failure, FetchFailure};
pub use links::extract_video_urls;
pub use pipeline::{DownloadedVideo, RetrievalOutcome, RetrievalPipeline, TempMedia};
pub use source::{FetchSettings, MediaSource, YtDlpSource};
