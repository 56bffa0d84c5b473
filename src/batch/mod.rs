use crate::config::{Config, UrlEntry};
use crate::error::{PageError, ProcessError, ValidationError};
use crate::media::{
    classify, extract_descriptor, is_short_link, FallbackResolver, MediaDescriptor, MediaDownloader,
    MediaKind, Storage, UrlValidator,
};
use crate::session::Fetcher;
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How processing of one batch entry ended.
#[derive(Debug)]
pub enum Outcome {
    Downloaded(Vec<PathBuf>),
    Skipped(ProcessError),
}

#[derive(Debug)]
pub struct BatchReport {
    pub outcomes: Vec<(String, Outcome)>,
}

impl BatchReport {
    pub fn downloaded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, Outcome::Downloaded(_)))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.downloaded()
    }
}

/// Runs every batch entry through validation, extraction and download, one
/// entry at a time.
pub struct Orchestrator {
    fetcher: Arc<dyn Fetcher>,
    validator: UrlValidator,
    fallback: FallbackResolver,
    downloader: MediaDownloader,
    desktop_user_agent: String,
    delay: Duration,
}

impl Orchestrator {
    pub fn new(
        config: &Config,
        fetcher: Arc<dyn Fetcher>,
        storage: Arc<dyn Storage>,
    ) -> Result<Self> {
        let validator = UrlValidator::new(&config.url_pattern)?;
        let fallback = FallbackResolver::new(
            fetcher.clone(),
            &config.fallback_api_base,
            config.default_query.clone(),
            &config.mobile_user_agent,
        );
        let downloader = MediaDownloader::new(
            fetcher.clone(),
            storage,
            config.video_dir.clone(),
            config.image_dir.clone(),
            &config.desktop_user_agent,
        );

        Ok(Self {
            fetcher,
            validator,
            fallback,
            downloader,
            desktop_user_agent: config.desktop_user_agent.clone(),
            delay: config.request_delay(),
        })
    }

    pub async fn run(&self, batch: &[UrlEntry]) -> BatchReport {
        info!("Processing {} URLs", batch.len());
        let mut outcomes = Vec::with_capacity(batch.len());

        for (i, entry) in batch.iter().enumerate() {
            if i > 0 && !self.delay.is_zero() {
                debug!("Waiting {:?} before next URL", self.delay);
                tokio::time::sleep(self.delay).await;
            }

            let outcome = match self.process(entry).await {
                Ok(paths) => {
                    info!(url = %entry, files = paths.len(), "Downloaded");
                    Outcome::Downloaded(paths)
                }
                Err(e) => {
                    warn!(url = %entry, reason = %e, "Skipped");
                    Outcome::Skipped(e)
                }
            };
            outcomes.push((entry.to_string(), outcome));
        }

        let report = BatchReport { outcomes };
        info!(
            downloaded = report.downloaded(),
            skipped = report.skipped(),
            "Batch finished"
        );
        report
    }

    async fn process(&self, entry: &UrlEntry) -> Result<Vec<PathBuf>, ProcessError> {
        let url = entry
            .as_str()
            .ok_or_else(|| ValidationError::NotAString(entry.to_string()))?;
        if !self.validator.validate(Some(url)) {
            return Err(ValidationError::Malformed(url.to_string()).into());
        }

        let target = self.expand_short_link(url).await;
        let descriptor = self.describe(url, &target).await?;
        Ok(self.downloader.download(&descriptor, url).await?)
    }

    /// Short links hide the post path, so follow them before classifying.
    async fn expand_short_link(&self, url: &str) -> String {
        if !is_short_link(url) {
            return url.to_string();
        }

        match self
            .fetcher
            .resolve_redirect(url, &[("User-Agent", self.desktop_user_agent.as_str())])
            .await
        {
            Ok(resolved) => {
                debug!("Resolved {} to {}", url, resolved);
                resolved
            }
            Err(e) => {
                warn!("Failed to resolve short link {}: {}", url, e);
                url.to_string()
            }
        }
    }

    async fn describe(&self, url: &str, target: &str) -> Result<MediaDescriptor, ProcessError> {
        match classify(target) {
            MediaKind::Photo => {
                debug!("{} is a photo post, using fallback API", target);
                Ok(self.fallback.resolve(target).await?)
            }
            MediaKind::Video => match self.extract_from_page(target).await {
                Ok(descriptor) => Ok(descriptor),
                Err(reason) => {
                    info!(
                        url = %url,
                        reason = %reason,
                        "Page extraction failed, trying fallback API"
                    );
                    Ok(self.fallback.resolve(target).await?)
                }
            },
        }
    }

    async fn extract_from_page(&self, url: &str) -> Result<MediaDescriptor, PageError> {
        let body = self
            .fetcher
            .fetch(url, &[("User-Agent", self.desktop_user_agent.as_str())])
            .await?;
        let html = String::from_utf8_lossy(&body);
        Ok(extract_descriptor(&html)?)
    }
}
