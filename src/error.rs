//! Error taxonomy for the extraction and download pipeline

use std::path::PathBuf;
use thiserror::Error;

/// A batch entry that cannot be processed at all.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("batch entry is not a string: {0}")]
    NotAString(String),

    #[error("not a TikTok post URL: {0}")]
    Malformed(String),
}

/// The embedded page JSON could not be turned into a descriptor.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("embedded data element not found or empty")]
    NotFound,

    #[error("embedded data is not valid JSON: {0}")]
    ParseFailure(#[from] serde_json::Error),

    #[error("embedded data has no `{0}` key")]
    ShapeMismatch(&'static str),

    #[error("item record is missing `{0}`")]
    MissingFields(&'static str),

    #[error("no playable video URL in item record")]
    NoUrl,
}

/// Why the post page itself could not be turned into a descriptor.
#[derive(Debug, Error)]
pub enum PageError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

/// The fallback API could not produce a descriptor.
#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("fallback API request failed: {0}")]
    ApiFailure(#[from] TransportError),

    #[error("fallback API returned malformed JSON: {0}")]
    InvalidResponse(#[from] serde_json::Error),

    #[error("fallback API reported status {0:?}")]
    BadStatus(Option<String>),

    #[error("fallback API result is missing `{0}`")]
    MissingFields(&'static str),

    #[error("fallback API returned unsupported post type {0:?}")]
    UnsupportedType(Option<String>),

    #[error("fallback API returned no video play address")]
    MissingVideoUrl,

    #[error("fallback API returned no images")]
    MissingImages,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("invalid request URL {0}")]
    InvalidUrl(String),
}

#[derive(Debug, Error)]
#[error("storage failure at {}: {source}", .path.display())]
pub struct StorageError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

impl StorageError {
    pub fn new(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("descriptor carries no media URL")]
    NoMedia,

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("image {index} failed: {source}")]
    Image {
        index: usize,
        #[source]
        source: Box<DownloadError>,
    },
}

/// Everything that can end a single URL's processing.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Resolver(#[from] ResolverError),

    #[error(transparent)]
    Download(#[from] DownloadError),
}
