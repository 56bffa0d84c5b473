use super::extractor::{id_string, timestamp};
use super::types::{MediaDescriptor, MediaKind};
use crate::error::{ResolverError, TransportError};
use crate::session::Fetcher;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

const SUCCESS_STATUS: &str = "success";

/// Which entry of `result.video.playAddr` is downloaded. The helper API
/// lists its candidates best first.
pub const PLAY_ADDR_INDEX: usize = 0;

#[derive(Debug, Deserialize)]
struct ApiResponse {
    status: Option<String>,
    result: Option<ApiResult>,
}

#[derive(Debug, Deserialize)]
struct ApiResult {
    #[serde(rename = "type")]
    kind: Option<String>,
    id: Option<Value>,
    #[serde(rename = "createTime")]
    create_time: Option<Value>,
    desc: Option<String>,
    author: Option<ApiAuthor>,
    video: Option<ApiVideo>,
    images: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ApiAuthor {
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiVideo {
    #[serde(rename = "playAddr")]
    play_addr: Option<Vec<String>>,
}

/// Resolves posts through the remote helper API.
pub struct FallbackResolver {
    fetcher: Arc<dyn Fetcher>,
    api_base: String,
    default_query: BTreeMap<String, String>,
    user_agent: String,
}

impl FallbackResolver {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        api_base: &str,
        default_query: BTreeMap<String, String>,
        user_agent: &str,
    ) -> Self {
        Self {
            fetcher,
            api_base: api_base.to_string(),
            default_query,
            user_agent: user_agent.to_string(),
        }
    }

    fn request_url(&self, post_url: &str) -> Result<String, TransportError> {
        let params = self
            .default_query
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .chain(std::iter::once(("url", post_url)));

        url::Url::parse_with_params(&self.api_base, params)
            .map(|u| u.to_string())
            .map_err(|_| TransportError::InvalidUrl(self.api_base.clone()))
    }

    pub async fn resolve(&self, post_url: &str) -> Result<MediaDescriptor, ResolverError> {
        info!("Resolving {} through fallback API", post_url);

        let request_url = self.request_url(post_url)?;
        let body = self
            .fetcher
            .fetch(&request_url, &[("User-Agent", self.user_agent.as_str())])
            .await?;

        let response: ApiResponse = serde_json::from_slice(&body)?;
        debug!("Fallback API status: {:?}", response.status);

        normalize(response)
    }
}

fn normalize(response: ApiResponse) -> Result<MediaDescriptor, ResolverError> {
    if response.status.as_deref() != Some(SUCCESS_STATUS) {
        return Err(ResolverError::BadStatus(response.status));
    }
    let result = response
        .result
        .ok_or(ResolverError::MissingFields("result"))?;

    let (kind, media_urls) = match result.kind.as_deref() {
        Some("video") => {
            let url = result
                .video
                .and_then(|video| video.play_addr)
                .and_then(|mut candidates| {
                    if candidates.len() > PLAY_ADDR_INDEX {
                        Some(candidates.swap_remove(PLAY_ADDR_INDEX))
                    } else {
                        None
                    }
                })
                .filter(|url| !url.is_empty())
                .ok_or(ResolverError::MissingVideoUrl)?;
            (MediaKind::Video, vec![url])
        }
        Some("image") => {
            let images = result
                .images
                .filter(|images| !images.is_empty())
                .ok_or(ResolverError::MissingImages)?;
            (MediaKind::Photo, images)
        }
        _ => return Err(ResolverError::UnsupportedType(result.kind.clone())),
    };

    let author_handle = result
        .author
        .and_then(|author| author.username)
        .filter(|name| !name.is_empty())
        .ok_or(ResolverError::MissingFields("author.username"))?;
    let post_id = id_string(result.id.as_ref()).ok_or(ResolverError::MissingFields("id"))?;
    let created_at = timestamp(result.create_time.as_ref())
        .ok_or(ResolverError::MissingFields("createTime"))?;

    Ok(MediaDescriptor {
        kind,
        author_handle,
        post_id,
        created_at,
        media_urls,
        caption: result.desc.filter(|d| !d.is_empty()),
    })
}
