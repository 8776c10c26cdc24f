//! Process configuration
//!
//! Everything is read once at startup into a [`BotConfig`] value owned by
//! `main` and passed to the selected subcommand; the pipeline gets its own
//! [`FetchSettings`](crate::download::FetchSettings) copy. Nothing here is a
//! global: tests build configs from a plain map through
//! [`BotConfig::from_lookup`].

use secrecy::SecretString;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

use crate::core::error::{AppError, AppResult};
use crate::download::source::FetchSettings;

/// Log file used when LOG_FILE_PATH is not set
pub const DEFAULT_LOG_FILE: &str = "bot.log";

/// Download folder used when DOWNLOAD_DIR is not set (relative to the working directory)
pub const DEFAULT_DOWNLOAD_DIR: &str = "downloads";

/// Webhook listen port used when PORT is not set
pub const DEFAULT_PORT: u16 = 5000;

/// Seconds to wait after each processed URL
pub const DEFAULT_DOWNLOAD_DELAY_SECS: u64 = 2;

/// Telegram Bot API upload ceiling for bots, in MiB
pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 50;

/// yt-dlp socket timeout in seconds
pub const DEFAULT_SOCKET_TIMEOUT_SECS: u64 = 30;

/// Path appended to WEBHOOK_URL; the HTTP server mounts the update route here
pub const WEBHOOK_PATH: &str = "/webhook";

/// Desktop browser user agent for the primary attempt
pub const DESKTOP_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Mobile user agent for the fallback attempt (overridable via MOBILE_USER_AGENT)
pub const DEFAULT_MOBILE_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1";

/// Referer sent with every extraction attempt
pub const TIKTOK_REFERER: &str = "https://www.tiktok.com/";

/// Where yt-dlp gets its cookies from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieSource {
    /// Netscape-format cookies file (COOKIES_FILE)
    File(PathBuf),
    /// Raw `Cookie` header value (COOKIES)
    Header(String),
}

/// How the bot receives updates from Telegram
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Telegram posts updates to `url`; an HTTP server listens on `port`
    Webhook { url: Url, port: u16 },
    /// The bot polls getUpdates
    Polling,
}

impl fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryMode::Webhook { url, port } => write!(f, "webhook ({} on port {})", url, port),
            DeliveryMode::Polling => write!(f, "long polling"),
        }
    }
}

/// Bot configuration, constructed once at process start
#[derive(Debug)]
pub struct BotConfig {
    /// BOT_TOKEN or TELOXIDE_TOKEN; only the bot itself needs it
    bot_token: Option<SecretString>,
    /// Full webhook endpoint (WEBHOOK_URL + `/webhook`); None selects polling
    pub webhook_url: Option<Url>,
    /// PORT, webhook mode only
    pub port: u16,
    /// DOWNLOAD_DELAY_SECS
    pub download_delay: Duration,
    /// DOWNLOAD_DIR
    pub download_dir: PathBuf,
    /// MAX_FILE_SIZE_MB
    pub max_file_size_mb: u64,
    /// COOKIES_FILE takes priority over COOKIES
    pub cookies: Option<CookieSource>,
    /// PROXY_URL
    pub proxy: Option<String>,
    /// ACCEPT_LANGUAGE
    pub accept_language: Option<String>,
    /// MOBILE_USER_AGENT
    pub mobile_user_agent: String,
    /// YTDL_BIN
    pub ytdl_bin: String,
    /// YTDL_SOCKET_TIMEOUT_SECS
    pub socket_timeout: Duration,
    /// BOT_API_URL, for a self-hosted Bot API server
    pub bot_api_url: Option<Url>,
}

impl BotConfig {
    /// Reads the configuration from process environment variables.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Blank values count as unset. Malformed numbers fall back to their
    /// defaults with a warning; a malformed URL is an error. A missing token
    /// is reported by [`BotConfig::bot_token`], so offline commands work
    /// without one.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| non_empty(lookup(key));

        let token = get("BOT_TOKEN").or_else(|| get("TELOXIDE_TOKEN"));

        let webhook_url = get("WEBHOOK_URL")
            .map(|base| webhook_endpoint(&base))
            .transpose()?;

        let bot_api_url = get("BOT_API_URL")
            .map(|raw| Url::parse(&raw).map_err(|e| AppError::Config(format!("Invalid BOT_API_URL: {}", e))))
            .transpose()?;

        let cookies = match (get("COOKIES_FILE"), get("COOKIES")) {
            (Some(path), _) => Some(CookieSource::File(PathBuf::from(shellexpand::tilde(&path).as_ref()))),
            (None, Some(header)) => Some(CookieSource::Header(header)),
            (None, None) => None,
        };

        Ok(Self {
            bot_token: token.map(SecretString::from),
            webhook_url,
            port: parse_or(get("PORT"), "PORT", DEFAULT_PORT),
            download_delay: Duration::from_secs(parse_or(
                get("DOWNLOAD_DELAY_SECS"),
                "DOWNLOAD_DELAY_SECS",
                DEFAULT_DOWNLOAD_DELAY_SECS,
            )),
            download_dir: get("DOWNLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DOWNLOAD_DIR)),
            max_file_size_mb: parse_or(get("MAX_FILE_SIZE_MB"), "MAX_FILE_SIZE_MB", DEFAULT_MAX_FILE_SIZE_MB),
            cookies,
            proxy: get("PROXY_URL"),
            accept_language: get("ACCEPT_LANGUAGE"),
            mobile_user_agent: get("MOBILE_USER_AGENT").unwrap_or_else(|| DEFAULT_MOBILE_USER_AGENT.to_string()),
            ytdl_bin: get("YTDL_BIN").unwrap_or_else(|| "yt-dlp".to_string()),
            socket_timeout: Duration::from_secs(parse_or(
                get("YTDL_SOCKET_TIMEOUT_SECS"),
                "YTDL_SOCKET_TIMEOUT_SECS",
                DEFAULT_SOCKET_TIMEOUT_SECS,
            )),
            bot_api_url,
        })
    }

    /// The bot credential.
    pub fn bot_token(&self) -> AppResult<&SecretString> {
        self.bot_token
            .as_ref()
            .ok_or_else(|| AppError::Config("BOT_TOKEN environment variable not set".to_string()))
    }

    /// Push mode when a webhook URL is configured, pull mode otherwise.
    pub fn delivery_mode(&self) -> DeliveryMode {
        match &self.webhook_url {
            Some(url) => DeliveryMode::Webhook {
                url: url.clone(),
                port: self.port,
            },
            None => DeliveryMode::Polling,
        }
    }

    /// Settings the retrieval pipeline needs for every attempt.
    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            output_dir: self.download_dir.clone(),
            cookies: self.cookies.clone(),
            proxy: self.proxy.clone(),
            accept_language: self.accept_language.clone(),
            desktop_user_agent: DESKTOP_USER_AGENT.to_string(),
            mobile_user_agent: self.mobile_user_agent.clone(),
            referer: TIKTOK_REFERER.to_string(),
            max_file_size_mb: self.max_file_size_mb,
        }
    }
}

/// Log file path, read before anything else so config warnings are captured.
pub fn log_file_path() -> String {
    non_empty(env::var("LOG_FILE_PATH").ok()).unwrap_or_else(|| DEFAULT_LOG_FILE.to_string())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> T
where
    T: FromStr + fmt::Display,
{
    match raw {
        Some(value) => value.parse().unwrap_or_else(|_| {
            log::warn!("Invalid {} value '{}', using default {}", key, value, default);
            default
        }),
        None => default,
    }
}

fn webhook_endpoint(base: &str) -> AppResult<Url> {
    let joined = format!("{}{}", base.trim_end_matches('/'), WEBHOOK_PATH);
    Url::parse(&joined).map_err(|e| AppError::Config(format!("Invalid WEBHOOK_URL '{}': {}", base, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppResult<BotConfig> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        BotConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("BOT_TOKEN", "123:abc")]).unwrap();

        assert_eq!(config.bot_token().unwrap().expose_secret(), "123:abc");
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.download_delay, Duration::from_secs(2));
        assert_eq!(config.download_dir, PathBuf::from("downloads"));
        assert_eq!(config.max_file_size_mb, 50);
        assert_eq!(config.cookies, None);
        assert_eq!(config.proxy, None);
        assert_eq!(config.mobile_user_agent, DEFAULT_MOBILE_USER_AGENT);
        assert_eq!(config.ytdl_bin, "yt-dlp");
        assert_eq!(config.delivery_mode(), DeliveryMode::Polling);
    }

    #[test]
    fn test_missing_token_is_an_error() {
        let config = config_from(&[("PORT", "8080")]).unwrap();
        assert!(matches!(config.bot_token(), Err(AppError::Config(_))));

        let config = config_from(&[("BOT_TOKEN", "   ")]).unwrap();
        assert!(matches!(config.bot_token(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_teloxide_token_fallback() {
        let config = config_from(&[("TELOXIDE_TOKEN", "42:xyz")]).unwrap();
        assert_eq!(config.bot_token().unwrap().expose_secret(), "42:xyz");
    }

    #[test]
    fn test_webhook_mode_appends_path() {
        let config = config_from(&[
            ("BOT_TOKEN", "t"),
            ("WEBHOOK_URL", "https://bot.example.com/"),
            ("PORT", "8443"),
        ])
        .unwrap();

        match config.delivery_mode() {
            DeliveryMode::Webhook { url, port } => {
                assert_eq!(url.as_str(), "https://bot.example.com/webhook");
                assert_eq!(port, 8443);
            }
            DeliveryMode::Polling => panic!("expected webhook mode"),
        }
    }

    #[test]
    fn test_invalid_webhook_url_is_an_error() {
        let err = config_from(&[("BOT_TOKEN", "t"), ("WEBHOOK_URL", "not a url")]).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_blank_webhook_url_selects_polling() {
        let config = config_from(&[("BOT_TOKEN", "t"), ("WEBHOOK_URL", "  ")]).unwrap();
        assert_eq!(config.delivery_mode(), DeliveryMode::Polling);
    }

    #[test]
    fn test_invalid_numbers_fall_back_to_defaults() {
        let config = config_from(&[
            ("BOT_TOKEN", "t"),
            ("PORT", "eighty"),
            ("DOWNLOAD_DELAY_SECS", "-1"),
            ("MAX_FILE_SIZE_MB", "lots"),
        ])
        .unwrap();

        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.download_delay, Duration::from_secs(DEFAULT_DOWNLOAD_DELAY_SECS));
        assert_eq!(config.max_file_size_mb, DEFAULT_MAX_FILE_SIZE_MB);
    }

    #[test]
    fn test_cookies_file_wins_over_header() {
        let config = config_from(&[
            ("BOT_TOKEN", "t"),
            ("COOKIES_FILE", "/etc/cookies.txt"),
            ("COOKIES", "sessionid=abc"),
        ])
        .unwrap();
        assert_eq!(config.cookies, Some(CookieSource::File(PathBuf::from("/etc/cookies.txt"))));

        let config = config_from(&[("BOT_TOKEN", "t"), ("COOKIES", "sessionid=abc")]).unwrap();
        assert_eq!(config.cookies, Some(CookieSource::Header("sessionid=abc".to_string())));
    }

    #[test]
    fn test_fetch_settings_carry_overrides() {
        let config = config_from(&[
            ("BOT_TOKEN", "t"),
            ("PROXY_URL", "socks5://127.0.0.1:1080"),
            ("ACCEPT_LANGUAGE", "de-DE"),
            ("MOBILE_USER_AGENT", "TestPhone/1.0"),
            ("DOWNLOAD_DIR", "/tmp/tok"),
        ])
        .unwrap();
        let settings = config.fetch_settings();

        assert_eq!(settings.output_dir, PathBuf::from("/tmp/tok"));
        assert_eq!(settings.proxy.as_deref(), Some("socks5://127.0.0.1:1080"));
        assert_eq!(settings.accept_language.as_deref(), Some("de-DE"));
        assert_eq!(settings.mobile_user_agent, "TestPhone/1.0");
        assert_eq!(settings.desktop_user_agent, DESKTOP_USER_AGENT);
        assert_eq!(settings.referer, TIKTOK_REFERER);
        assert_eq!(settings.max_file_size_mb, 50);
    }
}
