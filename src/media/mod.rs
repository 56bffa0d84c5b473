mod downloader;
mod extractor;
mod fallback;
mod storage;
mod types;
mod validate;

pub use downloader::MediaDownloader;
pub use extractor::extract_descriptor;
pub use fallback::FallbackResolver;
pub use storage::{FsStorage, Storage};
pub use types::{MediaDescriptor, MediaKind};
pub use validate::{classify, is_short_link, UrlValidator};
