//! Test doubles for the extraction backend and the Telegram side
//!
//! `MockSource` plays back scripted yt-dlp outcomes and writes real files into
//! the requested directory; `RecordingDelivery` records every outbound call.

pub mod mock_source;
pub mod recording_delivery;

pub use mock_source::{MockSource, Scripted};
pub use recording_delivery::{Event, RecordingDelivery};

use std::path::Path;
use tokgrab::download::FetchSettings;

/// Fetch settings pointing at `dir`, with a 50 MiB ceiling.
pub fn test_settings(dir: &Path) -> FetchSettings {
    FetchSettings {
        output_dir: dir.to_path_buf(),
        cookies: None,
        proxy: None,
        accept_language: None,
        desktop_user_agent: "DesktopAgent/1.0".to_string(),
        mobile_user_agent: "MobileAgent/1.0".to_string(),
        referer: "https://www.tiktok.com/".to_string(),
        max_file_size_mb: 50,
    }
}

/// Number of entries left in `dir`, scratch directories included.
pub fn files_in(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}
