//! Remote media probing
//!
//! Validation needs three facts about a media URL: its byte size, its
//! pixel dimensions (images), and its dimensions plus duration
//! (videos). `HttpProber` fetches them over HTTP; `ProbeCache` wraps
//! any prober and memoizes results so a URL shared by several selected
//! platforms is fetched at most once per validation run.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, OnceCell};
use tracing::debug;

use crate::error::ProbeError;

/// Pixel dimensions of a probed image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageProbe {
    pub width: u32,
    pub height: u32,
}

impl ImageProbe {
    /// width / height, the ratio platform rules constrain.
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

/// Dimensions and duration of a probed video.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoProbe {
    pub width: u32,
    pub height: u32,
    pub duration_secs: f64,
}

/// Source of facts about remote media. The validation engine only
/// talks to this trait; tests substitute a stub.
#[async_trait]
pub trait MediaProber: Send + Sync {
    /// Byte size of the resource, from a HEAD request.
    async fn probe_size(&self, url: &str) -> Result<u64, ProbeError>;

    /// Pixel dimensions of an image resource.
    async fn probe_image(&self, url: &str) -> Result<ImageProbe, ProbeError>;

    /// Dimensions and duration of a video resource.
    async fn probe_video(&self, url: &str) -> Result<VideoProbe, ProbeError>;
}

/// Prober backed by plain HTTP requests.
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    pub fn new(timeout_secs: u64) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ProbeError::Unreachable(e.to_string()))?;
        Ok(Self { client })
    }

    async fn fetch_body(&self, url: &str) -> Result<Vec<u8>, ProbeError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProbeError::Unreachable(format!("{}: {}", url, e)))?;
        if !response.status().is_success() {
            return Err(ProbeError::Unreachable(format!(
                "{}: HTTP {}",
                url,
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProbeError::Unreachable(format!("{}: {}", url, e)))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl MediaProber for HttpProber {
    async fn probe_size(&self, url: &str) -> Result<u64, ProbeError> {
        debug!(url = %url, "probing media size");
        let response = self
            .client
            .head(url)
            .send()
            .await
            .map_err(|e| ProbeError::Unreachable(format!("{}: {}", url, e)))?;
        if !response.status().is_success() {
            return Err(ProbeError::Unreachable(format!(
                "{}: HTTP {}",
                url,
                response.status()
            )));
        }
        // The Content-Length header must be read directly: a HEAD
        // response has no body, so reqwest's body size hint is 0.
        response
            .headers()
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u64>().ok())
            .ok_or_else(|| {
                ProbeError::Unreachable(format!("{}: no Content-Length header", url))
            })
    }

    async fn probe_image(&self, url: &str) -> Result<ImageProbe, ProbeError> {
        debug!(url = %url, "probing image dimensions");
        let body = self.fetch_body(url).await?;
        let size = imagesize::blob_size(&body)
            .map_err(|e| ProbeError::UnsupportedImage(format!("{}: {}", url, e)))?;
        Ok(ImageProbe {
            width: size.width as u32,
            height: size.height as u32,
        })
    }

    async fn probe_video(&self, url: &str) -> Result<VideoProbe, ProbeError> {
        debug!(url = %url, "probing video metadata");
        let body = self.fetch_body(url).await?;
        let len = body.len() as u64;
        let reader = mp4::Mp4Reader::read_header(Cursor::new(body), len)
            .map_err(|e| ProbeError::UnsupportedVideo(format!("{}: {}", url, e)))?;
        let duration_secs = reader.duration().as_secs_f64();
        let track = reader
            .tracks()
            .values()
            .find(|t| matches!(t.track_type(), Ok(mp4::TrackType::Video)))
            .ok_or_else(|| {
                ProbeError::UnsupportedVideo(format!("{}: no video track", url))
            })?;
        Ok(VideoProbe {
            width: track.width() as u32,
            height: track.height() as u32,
            duration_secs,
        })
    }
}

type CacheSlot<T> = Arc<OnceCell<Result<T, ProbeError>>>;

#[derive(Default)]
struct CacheInner {
    sizes: HashMap<String, CacheSlot<u64>>,
    images: HashMap<String, CacheSlot<ImageProbe>>,
    videos: HashMap<String, CacheSlot<VideoProbe>>,
}

/// Memoizing wrapper around a prober. Each URL gets one in-flight
/// slot per probe kind, so concurrent platform checks that miss the
/// cache for the same URL still trigger a single fetch. Errors are
/// cached too: a URL that failed once in a validation run fails the
/// same way for every platform that references it.
pub struct ProbeCache<P: MediaProber> {
    inner: Arc<P>,
    cache: Mutex<CacheInner>,
}

impl<P: MediaProber> ProbeCache<P> {
    pub fn new(prober: Arc<P>) -> Self {
        Self {
            inner: prober,
            cache: Mutex::new(CacheInner::default()),
        }
    }

    async fn size_slot(&self, url: &str) -> CacheSlot<u64> {
        let mut cache = self.cache.lock().await;
        cache.sizes.entry(url.to_string()).or_default().clone()
    }

    async fn image_slot(&self, url: &str) -> CacheSlot<ImageProbe> {
        let mut cache = self.cache.lock().await;
        cache.images.entry(url.to_string()).or_default().clone()
    }

    async fn video_slot(&self, url: &str) -> CacheSlot<VideoProbe> {
        let mut cache = self.cache.lock().await;
        cache.videos.entry(url.to_string()).or_default().clone()
    }
}

#[async_trait]
impl<P: MediaProber> MediaProber for ProbeCache<P> {
    async fn probe_size(&self, url: &str) -> Result<u64, ProbeError> {
        let slot = self.size_slot(url).await;
        slot.get_or_init(|| self.inner.probe_size(url))
            .await
            .clone()
    }

    async fn probe_image(&self, url: &str) -> Result<ImageProbe, ProbeError> {
        let slot = self.image_slot(url).await;
        slot.get_or_init(|| self.inner.probe_image(url))
            .await
            .clone()
    }

    async fn probe_video(&self, url: &str) -> Result<VideoProbe, ProbeError> {
        let slot = self.video_slot(url).await;
        slot.get_or_init(|| self.inner.probe_video(url))
            .await
            .clone()
    }
}
