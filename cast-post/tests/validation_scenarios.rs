//! Validation scenarios exercised through the public library API,
//! the way cast-post drives them.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use libcrosscast::error::ProbeError;
use libcrosscast::probe::{ImageProbe, MediaProber, VideoProbe};
use libcrosscast::types::{Draft, PlatformOptions};
use libcrosscast::validate::ValidationEngine;
use libcrosscast::PlatformId;

/// Prober with canned answers; URLs not listed get sane defaults.
#[derive(Default)]
struct FixtureProber {
    sizes: HashMap<String, u64>,
    unreachable: Vec<String>,
}

#[async_trait]
impl MediaProber for FixtureProber {
    async fn probe_size(&self, url: &str) -> Result<u64, ProbeError> {
        if self.unreachable.iter().any(|u| u == url) {
            return Err(ProbeError::Unreachable(format!("{}: no response", url)));
        }
        Ok(self.sizes.get(url).copied().unwrap_or(500_000))
    }

    async fn probe_image(&self, _url: &str) -> Result<ImageProbe, ProbeError> {
        Ok(ImageProbe {
            width: 1080,
            height: 1080,
        })
    }

    async fn probe_video(&self, url: &str) -> Result<VideoProbe, ProbeError> {
        if self.unreachable.iter().any(|u| u == url) {
            return Err(ProbeError::Unreachable(format!("{}: no response", url)));
        }
        Ok(VideoProbe {
            width: 1920,
            height: 1080,
            duration_secs: 60.0,
        })
    }
}

fn engine() -> ValidationEngine<FixtureProber> {
    ValidationEngine::new(Arc::new(FixtureProber::default()))
}

fn draft(body: &str, platforms: Vec<PlatformId>, media: Vec<&str>) -> Draft {
    Draft {
        title: String::new(),
        body: body.to_string(),
        platforms,
        media_urls: media.into_iter().map(String::from).collect(),
        options: PlatformOptions::default(),
    }
}

#[tokio::test]
async fn twitter_body_one_char_over_the_limit() {
    let report = engine()
        .validate(&draft(&"x".repeat(281), vec![PlatformId::Twitter], vec![]))
        .await;
    assert_eq!(report.failures.len(), 1);
    let message = &report.failures[0].message;
    assert!(message.contains("280"), "{}", message);
    assert!(message.contains("281"), "{}", message);
}

#[tokio::test]
async fn telegram_rejects_any_image() {
    let report = engine()
        .validate(&draft(
            "hello",
            vec![PlatformId::Telegram],
            vec!["https://cdn.example.com/a.jpg"],
        ))
        .await;
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].message.contains("does not support images"));
}

#[tokio::test]
async fn pinterest_rejects_six_images() {
    let media = vec![
        "https://cdn.example.com/a.jpg",
        "https://cdn.example.com/b.jpg",
        "https://cdn.example.com/c.jpg",
        "https://cdn.example.com/d.jpg",
        "https://cdn.example.com/e.jpg",
        "https://cdn.example.com/f.jpg",
    ];
    let report = engine()
        .validate(&draft("hi", vec![PlatformId::Pinterest], media))
        .await;
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0]
        .message
        .contains("at most 5 images (got 6)"));
}

#[tokio::test]
async fn youtube_fails_closed_on_unmeasurable_video() {
    let prober = FixtureProber {
        unreachable: vec!["https://cdn.example.com/clip.mp4".to_string()],
        ..FixtureProber::default()
    };
    let report = ValidationEngine::new(Arc::new(prober))
        .validate(&draft(
            "desc",
            vec![PlatformId::YouTube],
            vec!["https://cdn.example.com/clip.mp4"],
        ))
        .await;
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].message.contains("unreachable"));
}

#[tokio::test]
async fn reddit_rejects_gif() {
    let report = engine()
        .validate(&draft(
            "text",
            vec![PlatformId::Reddit],
            vec!["https://cdn.example.com/photo.gif"],
        ))
        .await;
    assert_eq!(report.failures.len(), 1);
    let message = &report.failures[0].message;
    assert!(message.contains("'gif'"), "{}", message);
    assert!(message.contains("webp"), "{}", message);
}

#[tokio::test]
async fn instagram_accepts_three_conforming_jpgs() {
    let report = engine()
        .validate(&draft(
            "a caption well under the limit",
            vec![PlatformId::Instagram],
            vec![
                "https://cdn.example.com/a.jpg",
                "https://cdn.example.com/b.jpg",
                "https://cdn.example.com/c.jpg",
            ],
        ))
        .await;
    assert!(report.is_valid(), "{:?}", report.failures);
}
