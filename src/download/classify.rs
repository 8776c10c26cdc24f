//! Maps raw extraction failures to user-facing categories.
//!
//! Classification is a pure substring match over the failure text, so it can
//! be exercised without touching the network.

use crate::core::utils::truncate_chars;

/// Longest raw error excerpt echoed back to the user
pub const MAX_ECHOED_ERROR_CHARS: usize = 300;

/// Why a video could not be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// Removed or never existed
    NotFound,
    /// Private or login-gated
    AccessRestricted,
    /// Network timeout or reset
    Timeout,
    /// Blocked in the server's region
    GeoRestricted,
    /// Throttled by the platform
    RateLimited,
    /// Anything else; holds the raw failure text
    Unclassified(String),
}

/// Ordered rules, first match wins. Matched against the lowercased text.
const RULES: &[(&[&str], FetchFailure)] = &[
    (&["410", "404", "not found"], FetchFailure::NotFound),
    (
        &["private", "login required", "authentication", "403"],
        FetchFailure::AccessRestricted,
    ),
    (&["timed out", "timeout", "connection reset"], FetchFailure::Timeout),
    (&["geo", "blocked", "forbidden"], FetchFailure::GeoRestricted),
    (&["429", "too many requests", "rate limit"], FetchFailure::RateLimited),
];

/// Classifies a raw failure description.
///
/// # Example
///
/// ```
/// use tokgrab::download::classify::{classify_failure, FetchFailure};
///
/// assert_eq!(classify_failure("HTTP Error 404: Not Found"), FetchFailure::NotFound);
/// assert_eq!(classify_failure("Connection timed out"), FetchFailure::Timeout);
/// ```
pub fn classify_failure(raw: &str) -> FetchFailure {
    let lower = raw.to_lowercase();

    RULES
        .iter()
        .find(|(signals, _)| signals.iter().any(|s| lower.contains(s)))
        .map(|(_, failure)| failure.clone())
        .unwrap_or_else(|| FetchFailure::Unclassified(raw.to_string()))
}

impl FetchFailure {
    /// Short category label for logs
    pub fn label(&self) -> &'static str {
        match self {
            FetchFailure::NotFound => "not_found",
            FetchFailure::AccessRestricted => "access_restricted",
            FetchFailure::Timeout => "timeout",
            FetchFailure::GeoRestricted => "geo_restricted",
            FetchFailure::RateLimited => "rate_limited",
            FetchFailure::Unclassified(_) => "unclassified",
        }
    }

    /// The single reply sent to the user for this failure.
    pub fn user_message(&self, url: &str) -> String {
        match self {
            FetchFailure::NotFound => format!(
                "❌ This video ({}) is no longer available. It may have been removed or the link is broken.",
                url
            ),
            FetchFailure::AccessRestricted => format!(
                "🔒 Couldn't access {}: the video is private or requires login.\n\
                 The bot owner can configure TikTok cookies (COOKIES_FILE or COOKIES) to fetch it.",
                url
            ),
            FetchFailure::Timeout => format!(
                "⏱ Downloading {} timed out. Please try again in a moment; \
                 if it keeps happening the bot may need a proxy (PROXY_URL).",
                url
            ),
            FetchFailure::GeoRestricted => format!(
                "🌍 {} is not available in the bot's region. A proxy from another region (PROXY_URL) may help.",
                url
            ),
            FetchFailure::RateLimited => format!(
                "🐢 TikTok is limiting requests right now. Please wait a few minutes before trying {} again.",
                url
            ),
            FetchFailure::Unclassified(raw) => format!(
                "Oops! Couldn't download that video ({}). Error: {}\nTry another URL?",
                url,
                truncate_chars(raw, MAX_ECHOED_ERROR_CHARS)
            ),
        }
    }
}
