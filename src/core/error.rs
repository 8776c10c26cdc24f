use thiserror::Error;

/// Centralized error type for the bot
///
/// Library code returns `AppResult`; the binary edge converts into `anyhow`.
///
/// # Example
///
/// ```no_run
/// use tokgrab::core::error::AppError;
///
/// fn report(err: AppError) {
///     eprintln!("Error: {}", err);
/// }
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// Telegram API errors
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// yt-dlp printed something we could not parse
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    /// The external extractor reported a failure; holds its raw error text
    #[error("Extraction failed: {0}")]
    Extraction(String),

    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Raw failure description used for classification.
    ///
    /// Extraction failures yield the extractor's own text without the display
    /// prefix; everything else yields its display form.
    pub fn failure_text(&self) -> String {
        match self {
            AppError::Extraction(raw) => raw.clone(),
            AppError::Io(e) => e.to_string(),
            other => other.to_string(),
        }
    }
}

impl From<String> for AppError {
    fn from(err: String) -> Self {
        AppError::Extraction(err)
    }
}

impl From<&str> for AppError {
    fn from(err: &str) -> Self {
        AppError::Extraction(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_text_strips_prefix_for_extraction() {
        let err = AppError::Extraction("ERROR: [TikTok] 123: Video not available".into());
        assert_eq!(err.failure_text(), "ERROR: [TikTok] 123: Video not available");
        assert!(err.to_string().starts_with("Extraction failed:"));
    }

    #[test]
    fn test_failure_text_for_io() {
        let err = AppError::from(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"));
        assert_eq!(err.failure_text(), "denied");
    }

    #[test]
    fn test_from_str() {
        let err: AppError = "boom".into();
        assert!(matches!(err, AppError::Extraction(_)));
    }
}
