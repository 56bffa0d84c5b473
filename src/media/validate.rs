use super::types::MediaKind;
use anyhow::{Context, Result};
use regex::Regex;

const PHOTO_MARKER: &str = "/photo/";
const SHORT_LINK_HOST: &str = "vm.tiktok.com";

/// Checks candidate strings against the accepted post URL shape.
pub struct UrlValidator {
    pattern: Regex,
}

impl UrlValidator {
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .with_context(|| format!("Invalid URL validation pattern {}", pattern))?;
        Ok(Self { pattern })
    }

    pub fn validate(&self, url: Option<&str>) -> bool {
        match url {
            Some(url) if !url.is_empty() => self.pattern.is_match(url),
            _ => false,
        }
    }
}

/// Photo posts carry a `/photo/` path segment, everything else is a video.
pub fn classify(url: &str) -> MediaKind {
    let path = match url::Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.to_string(),
    };

    if path.contains(PHOTO_MARKER) {
        MediaKind::Photo
    } else {
        MediaKind::Video
    }
}

pub fn is_short_link(url: &str) -> bool {
    url::Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(|host| host == SHORT_LINK_HOST))
        .unwrap_or(false)
}
