//! TikTok link extraction and normalisation

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Canonical and short-link TikTok URLs. Stops at whitespace; trailing
/// punctuation is trimmed afterwards.
#[allow(clippy::expect_used)]
static TIKTOK_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)https?://(?:www\.|m\.|vm\.|vt\.)?tiktok\.com/\S+").expect("Failed to compile TikTok URL regex")
});

/// Characters that end a sentence rather than a URL
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '}', '>', '"', '\''];

/// Hosts served by the main site; short-link hosts redirect here.
const PRIMARY_HOSTS: &[&str] = &["tiktok.com", "www.tiktok.com", "m.tiktok.com"];

/// Share/tracking parameters that never affect which video is served
const TRACKING_PARAMS: &[&str] = &[
    "_r",
    "_t",
    "_d",
    "checksum",
    "is_copy_url",
    "is_from_webapp",
    "sec_uid",
    "sender_device",
    "sender_web_id",
    "share_app_id",
    "share_item_id",
    "share_link_id",
    "social_sharing",
    "source",
    "timestamp",
    "tt_from",
    "u_code",
    "user_id",
    "web_id",
];

/// Returns every TikTok URL in `text`, normalised, in order of appearance.
///
/// Duplicates are kept so that N pasted links produce N results.
///
/// # Example
///
/// ```
/// use tokgrab::download::links::extract_video_urls;
///
/// let urls = extract_video_urls("look https://vm.tiktok.com/ZMabc/ and https://www.tiktok.com/@a/video/1?_t=x!");
/// assert_eq!(urls, vec!["https://vm.tiktok.com/ZMabc/", "https://www.tiktok.com/@a/video/1"]);
/// ```
pub fn extract_video_urls(text: &str) -> Vec<String> {
    TIKTOK_URL_RE
        .find_iter(text)
        .map(|m| m.as_str().trim_end_matches(TRAILING_PUNCTUATION))
        .map(normalize_url)
        .collect()
}

/// Strips known tracking query parameters from a TikTok URL.
///
/// URLs of other domains and unparsable input are returned unchanged, as are
/// TikTok URLs that carry no tracking parameters.
pub fn normalize_url(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };
    if !is_tiktok_host(&parsed) {
        return url.to_string();
    }

    let pairs: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();
    let kept: Vec<&(String, String)> = pairs.iter().filter(|(key, _)| !is_tracking_param(key)).collect();
    if kept.len() == pairs.len() {
        return url.to_string();
    }

    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(kept);
    }
    parsed.to_string()
}

/// Whether `url` points at the main site rather than a short-link host.
pub fn is_primary_domain(url: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
        .is_some_and(|host| PRIMARY_HOSTS.contains(&host.as_str()))
}

/// URL variant for the fallback attempt: primary-domain URLs lose their
/// whole query string and fragment; anything else is returned as is.
pub fn fallback_url(url: &str) -> String {
    if !is_primary_domain(url) {
        return url.to_string();
    }
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_query(None);
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => url.to_string(),
    }
}

fn is_tiktok_host(url: &Url) -> bool {
    url.host_str()
        .map(str::to_ascii_lowercase)
        .is_some_and(|host| host == "tiktok.com" || host.ends_with(".tiktok.com"))
}

fn is_tracking_param(key: &str) -> bool {
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key)
}
