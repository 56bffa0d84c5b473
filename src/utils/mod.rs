use crate::media::MediaDescriptor;
use chrono::{DateTime, Local, TimeZone, Utc};
use tracing::warn;

/// `DDMMYYYY` for a Unix timestamp in the given zone. Out-of-range
/// timestamps fall back to the epoch date.
pub fn format_date<Tz: TimeZone>(timestamp: i64, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let moment: DateTime<Utc> = DateTime::from_timestamp(timestamp, 0).unwrap_or_else(|| {
        warn!("Timestamp {} is out of range, using the epoch date", timestamp);
        DateTime::default()
    });
    moment.with_timezone(tz).format("%d%m%Y").to_string()
}

pub fn format_date_local(timestamp: i64) -> String {
    format_date(timestamp, &Local)
}

/// Keeps a value from the post metadata usable as part of a single file
/// name: anything outside `[A-Za-z0-9._-]` becomes `_`, and so does `..`.
pub fn filename_part(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    cleaned.replace("..", "_")
}

fn stem(descriptor: &MediaDescriptor, date: &str) -> String {
    format!(
        "{}_{}_{}_{}",
        filename_part(&descriptor.author_handle),
        descriptor.kind.label(),
        date,
        filename_part(&descriptor.post_id)
    )
}

/// `{author}_video_{DDMMYYYY}_{id}.mp4`
pub fn video_filename(descriptor: &MediaDescriptor, date: &str) -> String {
    format!("{}.mp4", stem(descriptor, date))
}

/// `{author}_image_{DDMMYYYY}_{id}_{index}.jpg`, `index` counting from 1
pub fn image_filename(descriptor: &MediaDescriptor, date: &str, index: usize) -> String {
    format!("{}_{}.jpg", stem(descriptor, date), index)
}
