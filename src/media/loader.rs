use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use tracing::info;

use super::MediaItem;
use crate::error::{EngineError, EngineResult};

pub fn load_media_file(path: impl AsRef<Path>) -> EngineResult<MediaItem> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)?;
    let media = MediaItem::from_json(&json)?;
    info!(
        "Loaded media from {}: {} segments, {} reference points",
        path.display(),
        media.segments.len(),
        media.reference.len()
    );
    Ok(media)
}

/// Fetches a media item over HTTP. The body is the same JSON shape as the
/// file format.
#[derive(Clone)]
pub struct HttpMediaLoader {
    client: Client,
}

impl HttpMediaLoader {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
        }
    }

    pub async fn fetch(&self, url: &str) -> EngineResult<MediaItem> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let media: MediaItem = response.json().await?;
        info!(
            "Fetched media from {}: {} segments, {} reference points",
            url,
            media.segments.len(),
            media.reference.len()
        );
        Ok(media)
    }
}

impl Default for HttpMediaLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Loads from a URL when `source` looks like one, otherwise from disk.
pub async fn load_media(source: &str) -> EngineResult<MediaItem> {
    if source.starts_with("http://") || source.starts_with("https://") {
        HttpMediaLoader::new().fetch(source).await
    } else if source.is_empty() {
        Err(EngineError::Config("empty media source".to_string()))
    } else {
        load_media_file(source)
    }
}
