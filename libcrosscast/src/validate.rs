//! Draft validation against platform rules
//!
//! Every selected platform is checked concurrently; the report carries
//! the first failing rule of each failing platform. Validation
//! failures are data, not errors: callers always get a
//! `ValidationReport` back.

use std::sync::Arc;

use futures::future::join_all;
use tracing::debug;

use crate::platform::PlatformId;
use crate::probe::{MediaProber, ProbeCache};
use crate::rules::{self, PlatformRule, SNAPCHAT_SPOTLIGHT_TEXT_LIMIT};
use crate::types::{Draft, MediaAsset, MediaKind, SnapchatPostType};

/// One rejected rule. `platform` is `None` for draft-wide failures
/// (no platform selected, missing text).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub platform: Option<PlatformId>,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub failures: Vec<Failure>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct ValidationEngine<P: MediaProber> {
    prober: Arc<P>,
}

impl<P: MediaProber + 'static> ValidationEngine<P> {
    pub fn new(prober: Arc<P>) -> Self {
        Self { prober }
    }

    /// Validate a draft against every selected platform's rules.
    ///
    /// Media probes are memoized for the duration of this call, so a
    /// URL shared by several platforms is fetched once.
    pub async fn validate(&self, draft: &Draft) -> ValidationReport {
        let mut report = ValidationReport::default();

        if draft.platforms.is_empty() {
            report.failures.push(Failure {
                platform: None,
                message: "Select at least one platform".to_string(),
            });
            return report;
        }

        if !draft.has_text() {
            let need_text: Vec<&str> = draft
                .platforms
                .iter()
                .filter(|p| rules::rule(**p).requires_text)
                .map(|p| p.display_name())
                .collect();
            if !need_text.is_empty() {
                report.failures.push(Failure {
                    platform: None,
                    message: format!("Title or content is required for: {}", need_text.join(", ")),
                });
            }
        }

        let assets: Vec<MediaAsset> = draft
            .media_urls
            .iter()
            .map(|url| MediaAsset::classify(url))
            .collect();

        let cache = ProbeCache::new(self.prober.clone());
        let checks = draft
            .platforms
            .iter()
            .map(|platform| check_platform(*platform, draft, &assets, &cache));
        for failure in join_all(checks).await.into_iter().flatten() {
            report.failures.push(failure);
        }

        debug!(failures = report.failures.len(), "draft validated");
        report
    }
}

/// Rule row with per-draft overrides applied. Snapchat Spotlight posts
/// drop the text limit to 160 characters and accept no images.
fn effective_rule(platform: PlatformId, draft: &Draft) -> PlatformRule {
    let mut rule = *rules::rule(platform);
    if platform == PlatformId::Snapchat
        && draft.options.snapchat_post_type == SnapchatPostType::Spotlight
    {
        rule.max_text_len = Some(SNAPCHAT_SPOTLIGHT_TEXT_LIMIT);
        rule.max_images = 0;
        rule.image = None;
    }
    rule
}

/// Evaluate one platform, returning its first failing rule, if any.
async fn check_platform<P: MediaProber>(
    platform: PlatformId,
    draft: &Draft,
    assets: &[MediaAsset],
    prober: &ProbeCache<P>,
) -> Option<Failure> {
    let rule = effective_rule(platform, draft);
    let name = platform.display_name();
    let fail = |message: String| {
        Some(Failure {
            platform: Some(platform),
            message,
        })
    };

    if let Some(limit) = rule.max_text_len {
        let len = draft.body_len();
        if len > limit {
            return fail(format!(
                "{} allows at most {} characters (got {})",
                name, limit, len
            ));
        }
    }

    if rule.requires_media && assets.is_empty() {
        return fail(format!("{} requires at least one media attachment", name));
    }

    let images: Vec<&MediaAsset> = assets.iter().filter(|a| a.kind == MediaKind::Image).collect();
    let videos: Vec<&MediaAsset> = assets.iter().filter(|a| a.kind == MediaKind::Video).collect();

    if !rule.allow_mixed && !images.is_empty() && !videos.is_empty() {
        return fail(format!(
            "{} does not allow mixing images and videos in one post",
            name
        ));
    }

    if images.len() > rule.max_images {
        return if rule.max_images == 0 {
            fail(format!("{} does not support images", name))
        } else {
            fail(format!(
                "{} accepts at most {} images (got {})",
                name,
                rule.max_images,
                images.len()
            ))
        };
    }
    if videos.len() > rule.max_videos {
        return if rule.max_videos == 0 {
            fail(format!("{} does not support videos", name))
        } else {
            fail(format!(
                "{} accepts at most {} videos (got {})",
                name,
                rule.max_videos,
                videos.len()
            ))
        };
    }

    // Extension membership. Unknown-kind assets fail here against the
    // union of everything the platform accepts.
    for asset in &images {
        if let Some(limits) = &rule.image {
            if !limits.extensions.contains(&asset.extension.as_str()) {
                return fail(extension_failure(name, asset, limits.extensions));
            }
        }
    }
    for asset in &videos {
        if let Some(limits) = &rule.video {
            if !limits.extensions.contains(&asset.extension.as_str()) {
                return fail(extension_failure(name, asset, limits.extensions));
            }
        }
    }
    for asset in assets.iter().filter(|a| a.kind == MediaKind::Unknown) {
        let mut accepted: Vec<&str> = Vec::new();
        if let Some(limits) = &rule.image {
            accepted.extend_from_slice(limits.extensions);
        }
        if let Some(limits) = &rule.video {
            accepted.extend_from_slice(limits.extensions);
        }
        if accepted.is_empty() {
            return fail(format!("{} does not support media attachments", name));
        }
        return fail(extension_failure(name, asset, &accepted));
    }

    // Byte size, strictly greater than the limit fails; exactly at the
    // limit passes.
    for (asset, limits) in images
        .iter()
        .filter_map(|a| rule.image.as_ref().map(|l| (a, l)))
        .chain(videos.iter().filter_map(|a| rule.video.as_ref().map(|l| (a, l))))
    {
        let bytes = match prober.probe_size(&asset.url).await {
            Ok(bytes) => bytes,
            Err(e) => return fail(format!("{}: {}", name, e)),
        };
        let size_mb = bytes as f64 / 1_048_576.0;
        if size_mb > limits.max_size_mb {
            return fail(format!(
                "{}: {} is too large ({:.2} MB). Max allowed: {} MB",
                name, asset.url, size_mb, limits.max_size_mb
            ));
        }
    }

    // Dimension, aspect-ratio and duration bounds, only where the
    // platform defines them.
    if let Some(limits) = &rule.image {
        if limits.width_px.is_some() || limits.aspect_ratio.is_some() {
            for asset in &images {
                let probe = match prober.probe_image(&asset.url).await {
                    Ok(probe) => probe,
                    Err(e) => return fail(format!("{}: {}", name, e)),
                };
                if let Some(bounds) = limits.width_px {
                    if !bounds.contains(probe.width as f64) {
                        return fail(format!(
                            "{}: {} width {}px is outside the allowed {}-{}px",
                            name, asset.url, probe.width, bounds.min, bounds.max
                        ));
                    }
                }
                if let Some(bounds) = limits.aspect_ratio {
                    let ratio = probe.aspect_ratio();
                    if !bounds.contains(ratio) {
                        return fail(format!(
                            "{}: {} aspect ratio {:.2} is outside the allowed {}-{}",
                            name, asset.url, ratio, bounds.min, bounds.max
                        ));
                    }
                }
            }
        }
    }
    if let Some(limits) = &rule.video {
        if limits.duration_secs.is_some() {
            for asset in &videos {
                let probe = match prober.probe_video(&asset.url).await {
                    Ok(probe) => probe,
                    Err(e) => return fail(format!("{}: {}", name, e)),
                };
                if let Some(bounds) = limits.duration_secs {
                    if !bounds.contains(probe.duration_secs) {
                        return fail(format!(
                            "{}: {} duration {:.1}s is outside the allowed {}-{}s",
                            name, asset.url, probe.duration_secs, bounds.min, bounds.max
                        ));
                    }
                }
            }
        }
    }

    None
}

fn extension_failure(name: &str, asset: &MediaAsset, accepted: &[&str]) -> String {
    format!(
        "{}: invalid media extension '{}' for {}. Accepted: {}",
        name,
        asset.extension,
        asset.url,
        accepted.join(", ")
    )
}
