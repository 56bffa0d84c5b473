use super::storage::Storage;
use super::types::{MediaDescriptor, MediaKind};
use crate::error::DownloadError;
use crate::session::Fetcher;
use crate::utils::{format_date_local, image_filename, video_filename};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Fetches the media a descriptor points at and writes it to disk.
pub struct MediaDownloader {
    fetcher: Arc<dyn Fetcher>,
    storage: Arc<dyn Storage>,
    video_dir: PathBuf,
    image_dir: PathBuf,
    user_agent: String,
}

impl MediaDownloader {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        storage: Arc<dyn Storage>,
        video_dir: impl Into<PathBuf>,
        image_dir: impl Into<PathBuf>,
        user_agent: &str,
    ) -> Self {
        Self {
            fetcher,
            storage,
            video_dir: video_dir.into(),
            image_dir: image_dir.into(),
            user_agent: user_agent.to_string(),
        }
    }

    /// Returns the written paths in media order. `post_url` is sent as the
    /// referer.
    pub async fn download(
        &self,
        descriptor: &MediaDescriptor,
        post_url: &str,
    ) -> Result<Vec<PathBuf>, DownloadError> {
        let date = format_date_local(descriptor.created_at);

        match descriptor.kind {
            MediaKind::Video => {
                let media_url = descriptor.media_urls.first().ok_or(DownloadError::NoMedia)?;
                let path = self
                    .video_dir
                    .join(video_filename(descriptor, &date));

                info!(
                    "Downloading video {} by {}",
                    descriptor.post_id, descriptor.author_handle
                );
                self.save(media_url, post_url, &self.video_dir, &path).await?;
                Ok(vec![path])
            }
            MediaKind::Photo => {
                if descriptor.media_urls.is_empty() {
                    return Err(DownloadError::NoMedia);
                }

                info!(
                    "Downloading {} images of post {} by {}",
                    descriptor.media_urls.len(),
                    descriptor.post_id,
                    descriptor.author_handle
                );

                let mut written = Vec::with_capacity(descriptor.media_urls.len());
                for (i, media_url) in descriptor.media_urls.iter().enumerate() {
                    let index = i + 1;
                    let path = self
                        .image_dir
                        .join(image_filename(descriptor, &date, index));

                    self.save(media_url, post_url, &self.image_dir, &path)
                        .await
                        .map_err(|e| DownloadError::Image {
                            index,
                            source: Box::new(e),
                        })?;
                    written.push(path);
                }
                Ok(written)
            }
        }
    }

    async fn save(
        &self,
        media_url: &str,
        post_url: &str,
        dir: &Path,
        path: &Path,
    ) -> Result<(), DownloadError> {
        debug!("Downloading {} to {}", media_url, path.display());

        let data = self
            .fetcher
            .fetch(
                media_url,
                &[("User-Agent", self.user_agent.as_str()), ("Referer", post_url)],
            )
            .await?;

        self.storage.ensure(dir).await?;
        self.storage.write(path, &data).await?;

        info!("Saved {} ({} bytes)", path.display(), data.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeFetcher, MemoryStorage};

    const POST: &str = "https://www.tiktok.com/@alice/video/42";

    fn setup() -> (Arc<FakeFetcher>, Arc<MemoryStorage>, MediaDownloader) {
        let fetcher = Arc::new(FakeFetcher::new());
        let storage = Arc::new(MemoryStorage::new());
        let downloader = MediaDownloader::new(
            fetcher.clone(),
            storage.clone(),
            "out/videos",
            "out/images",
            "desktop-agent",
        );
        (fetcher, storage, downloader)
    }

    fn descriptor(kind: MediaKind, urls: &[&str]) -> MediaDescriptor {
        MediaDescriptor {
            kind,
            author_handle: "alice".to_string(),
            post_id: "42".to_string(),
            created_at: 1700000000,
            media_urls: urls.iter().map(|u| u.to_string()).collect(),
            caption: None,
        }
    }

    #[tokio::test]
    async fn test_video_download() {
        let (fetcher, storage, downloader) = setup();
        fetcher.respond("https://cdn.example/v.mp4", b"video".to_vec());

        let paths = downloader
            .download(&descriptor(MediaKind::Video, &["https://cdn.example/v.mp4"]), POST)
            .await
            .unwrap();

        let expected = PathBuf::from("out/videos").join(format!(
            "alice_video_{}_42.mp4",
            format_date_local(1700000000)
        ));
        assert_eq!(paths, vec![expected.clone()]);
        assert!(storage.has_dir(Path::new("out/videos")));
        assert_eq!(storage.files().get(&expected).map(Vec::as_slice), Some(&b"video"[..]));

        let requests = fetcher.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].header("Referer"), Some(POST));
        assert_eq!(requests[0].header("User-Agent"), Some("desktop-agent"));
    }

    #[tokio::test]
    async fn test_photo_download_writes_every_image_in_order() {
        let (fetcher, storage, downloader) = setup();
        for n in 1..=3 {
            fetcher.respond(&format!("https://cdn.example/{}.jpg", n), vec![n as u8]);
        }

        let paths = downloader
            .download(
                &descriptor(
                    MediaKind::Photo,
                    &[
                        "https://cdn.example/1.jpg",
                        "https://cdn.example/2.jpg",
                        "https://cdn.example/3.jpg",
                    ],
                ),
                POST,
            )
            .await
            .unwrap();

        let date = format_date_local(1700000000);
        let expected: Vec<PathBuf> = (1..=3)
            .map(|n| PathBuf::from("out/images").join(format!("alice_image_{}_42_{}.jpg", date, n)))
            .collect();
        assert_eq!(paths, expected);

        let files = storage.files();
        assert_eq!(files.len(), 3);
        for (n, path) in expected.iter().enumerate() {
            assert_eq!(files[path], vec![(n + 1) as u8]);
        }
    }

    #[tokio::test]
    async fn test_photo_failure_stops_remaining_images() {
        let (fetcher, storage, downloader) = setup();
        fetcher.respond("https://cdn.example/1.jpg", vec![1]);
        fetcher.fail("https://cdn.example/2.jpg", 403);
        fetcher.respond("https://cdn.example/3.jpg", vec![3]);

        let result = downloader
            .download(
                &descriptor(
                    MediaKind::Photo,
                    &[
                        "https://cdn.example/1.jpg",
                        "https://cdn.example/2.jpg",
                        "https://cdn.example/3.jpg",
                    ],
                ),
                POST,
            )
            .await;

        assert!(matches!(result, Err(DownloadError::Image { index: 2, .. })));

        let files = storage.files();
        assert_eq!(files.len(), 1);
        let name = files.keys().next().unwrap().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.ends_with("_42_1.jpg"));
        assert_eq!(fetcher.requests_to("https://cdn.example/3.jpg"), 0);
    }

    #[tokio::test]
    async fn test_video_fetch_failure_writes_nothing() {
        let (_fetcher, storage, downloader) = setup();
        let result = downloader
            .download(&descriptor(MediaKind::Video, &["https://cdn.example/gone.mp4"]), POST)
            .await;

        assert!(matches!(result, Err(DownloadError::Transport(_))));
        assert!(storage.files().is_empty());
    }

    #[tokio::test]
    async fn test_empty_descriptor() {
        let (_fetcher, _storage, downloader) = setup();
        let result = downloader.download(&descriptor(MediaKind::Photo, &[]), POST).await;
        assert!(matches!(result, Err(DownloadError::NoMedia)));
    }

    #[tokio::test]
    async fn test_hostile_author_stays_in_image_dir() {
        let (fetcher, storage, downloader) = setup();
        fetcher.respond("https://cdn.example/1.jpg", vec![1]);

        let mut hostile = descriptor(MediaKind::Photo, &["https://cdn.example/1.jpg"]);
        hostile.author_handle = "../../../../tmp/pwned".to_string();

        let paths = downloader.download(&hostile, POST).await.unwrap();

        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].parent(), Some(Path::new("out/images")));
        assert!(storage.files().contains_key(&paths[0]));
    }
}
