//! Logging initialization and startup diagnostics
//!
//! This module provides:
//! - Logger initialization (console + appended log file)
//! - A startup summary of the effective configuration

use anyhow::Result;
use simplelog::*;
use std::fs::OpenOptions;

use crate::core::config::{BotConfig, CookieSource};
use crate::core::utils::mask_proxy_password;

/// Initialize logger for both console and file output
///
/// The file is opened in append mode so restarts keep earlier history.
///
/// # Arguments
/// * `log_file_path` - Path to the log file
pub fn init_logger(log_file_path: &str) -> Result<()> {
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)
        .map_err(|e| anyhow::anyhow!("Failed to open log file {}: {}", log_file_path, e))?;

    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Info,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(LevelFilter::Info, Config::default(), log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Logs the effective configuration at startup.
///
/// Secrets never reach the log: the token is not printed, proxy passwords
/// are masked and raw cookie headers are reduced to their length.
pub fn log_startup_configuration(config: &BotConfig) {
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("Configuration");
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("Update delivery: {}", config.delivery_mode());
    log::info!("Download dir: {}", config.download_dir.display());
    log::info!("Delay between downloads: {}s", config.download_delay.as_secs());
    log::info!("Max file size: {} MiB", config.max_file_size_mb);
    log::info!("yt-dlp binary: {}", config.ytdl_bin);

    match &config.cookies {
        Some(CookieSource::File(path)) => {
            if path.exists() {
                log::info!("✅ COOKIES_FILE: {}", path.display());
            } else {
                log::error!("❌ COOKIES_FILE: {} (FILE NOT FOUND!)", path.display());
                log::error!("   Current directory: {:?}", std::env::current_dir());
                log::error!("   Private or login-gated videos will fail until this is fixed");
            }
        }
        Some(CookieSource::Header(header)) => {
            log::info!("✅ COOKIES: raw header ({} chars)", header.len());
        }
        None => log::info!("Cookies: not configured"),
    }

    match &config.proxy {
        Some(proxy) => log::info!("Proxy: {}", mask_proxy_password(proxy)),
        None => log::info!("Proxy: direct connection"),
    }

    if let Some(lang) = &config.accept_language {
        log::info!("Accept-Language: {}", lang);
    }
    if let Some(api) = &config.bot_api_url {
        log::info!("Bot API server: {}", api);
    }
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::NamedTempFile;

    #[test]
    fn test_init_logger_opens_existing_file() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_str().unwrap();

        // A logger may already be installed by another test; both outcomes are fine,
        // but the file must never be truncated.
        std::fs::write(path, "previous run\n").unwrap();
        let _ = init_logger(path);

        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.starts_with("previous run"));
    }

    #[test]
    fn test_init_logger_rejects_missing_directory() {
        let result = init_logger("/nonexistent-dir-for-tokgrab/bot.log");
        assert!(result.is_err());
    }
}
