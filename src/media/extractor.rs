//! Reads the post record TikTok embeds in its post pages.
//!
//! The page carries a `<script id="__UNIVERSAL_DATA_FOR_REHYDRATION__">`
//! element whose JSON holds the item under
//! `__DEFAULT_SCOPE__ / webapp.video-detail / itemInfo / itemStruct`.

use super::types::{MediaDescriptor, MediaKind};
use crate::error::ExtractionError;
use chrono::{DateTime, Utc};
use scraper::{Html, Selector};
use serde_json::Value;

pub const DATA_ELEMENT_ID: &str = "__UNIVERSAL_DATA_FOR_REHYDRATION__";

const ITEM_PATH: [&str; 4] = [
    "__DEFAULT_SCOPE__",
    "webapp.video-detail",
    "itemInfo",
    "itemStruct",
];

const BITRATE_PLAY_URL: &str = "/bitrateInfo/0/PlayAddr/UrlList/0";

pub fn extract_descriptor(html: &str) -> Result<MediaDescriptor, ExtractionError> {
    let raw = embedded_json(html)?;
    let root: Value = serde_json::from_str(&raw)?;

    let mut item = &root;
    for key in ITEM_PATH {
        item = present(item.get(key)).ok_or(ExtractionError::ShapeMismatch(key))?;
    }

    let author = present(item.get("author")).ok_or(ExtractionError::MissingFields("author"))?;
    let video = present(item.get("video")).ok_or(ExtractionError::MissingFields("video"))?;

    let play_url = play_url(video).ok_or(ExtractionError::NoUrl)?;

    let author_handle = non_empty_str(author.get("uniqueId"))
        .ok_or(ExtractionError::MissingFields("author.uniqueId"))?;
    let post_id = id_string(item.get("id")).ok_or(ExtractionError::MissingFields("id"))?;
    let created_at =
        timestamp(item.get("createTime")).ok_or(ExtractionError::MissingFields("createTime"))?;

    Ok(MediaDescriptor {
        kind: MediaKind::Video,
        author_handle,
        post_id,
        created_at,
        media_urls: vec![play_url],
        caption: non_empty_str(item.get("desc")),
    })
}

fn embedded_json(html: &str) -> Result<String, ExtractionError> {
    let selector = Selector::parse(&format!("script#{}", DATA_ELEMENT_ID))
        .map_err(|_| ExtractionError::NotFound)?;
    let document = Html::parse_document(html);

    let text: String = document
        .select(&selector)
        .next()
        .ok_or(ExtractionError::NotFound)?
        .text()
        .collect();

    let text = text.trim();
    if text.is_empty() {
        return Err(ExtractionError::NotFound);
    }
    Ok(text.to_string())
}

/// Highest listed bitrate variant first, then the plain `playAddr` field.
fn play_url(video: &Value) -> Option<String> {
    non_empty_str(video.pointer(BITRATE_PLAY_URL))
        .or_else(|| non_empty_str(video.get("playAddr")))
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

pub(super) fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Ids show up both as JSON strings and as numbers.
pub(super) fn id_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Number(n) => Some(n.to_string()),
        other => non_empty_str(Some(other)),
    }
}

/// Seconds since the epoch, only if the calendar can represent them.
pub(super) fn timestamp(value: Option<&Value>) -> Option<i64> {
    let seconds = match value? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    DateTime::<Utc>::from_timestamp(seconds, 0).map(|_| seconds)
}
