#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Photo,
}

impl MediaKind {
    pub fn label(&self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Photo => "image",
        }
    }
}

/// Normalized description of one post, produced by either extraction path
/// and consumed once by the downloader.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaDescriptor {
    pub kind: MediaKind,
    pub author_handle: String,
    pub post_id: String,
    /// Unix timestamp in seconds
    pub created_at: i64,
    /// Never empty. Exactly one entry for videos.
    pub media_urls: Vec<String>,
    #[allow(dead_code)]
    pub caption: Option<String>,
}
