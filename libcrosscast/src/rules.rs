//! Platform publishing constraints
//!
//! One authoritative, immutable row per platform. The numeric limits
//! reproduce each platform's publishing API constraints exactly; the
//! validation engine walks these rows generically, so adding a platform
//! means adding a row here, not new branches in the engine.

use crate::platform::PlatformId;

/// Inclusive numeric range used for dimension, aspect-ratio and
/// duration bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Per-kind media constraints. A platform that carries no `MediaLimits`
/// for a kind does not accept that kind at all.
#[derive(Debug, Clone, Copy)]
pub struct MediaLimits {
    /// Accepted file extensions, lowercase.
    pub extensions: &'static [&'static str],
    /// Maximum file size in megabytes (1 MB = 1,048,576 bytes).
    /// An asset exactly at the limit passes; strictly over fails.
    pub max_size_mb: f64,
    /// Pixel width bounds, where the platform enforces them.
    pub width_px: Option<Range>,
    /// width / height bounds, where the platform enforces them.
    pub aspect_ratio: Option<Range>,
    /// Duration bounds in seconds (video only).
    pub duration_secs: Option<Range>,
}

impl MediaLimits {
    const fn new(extensions: &'static [&'static str], max_size_mb: f64) -> Self {
        Self {
            extensions,
            max_size_mb,
            width_px: None,
            aspect_ratio: None,
            duration_secs: None,
        }
    }

    const fn with_duration(mut self, bounds: Range) -> Self {
        self.duration_secs = Some(bounds);
        self
    }
}

/// The full constraint row for one platform.
#[derive(Debug, Clone, Copy)]
pub struct PlatformRule {
    pub platform: PlatformId,
    /// Maximum trimmed character count for the post body; `None` means
    /// no hard limit.
    pub max_text_len: Option<usize>,
    /// Whether the platform needs a title or body to publish at all.
    pub requires_text: bool,
    /// Whether the platform needs at least one media URL.
    pub requires_media: bool,
    /// Maximum image count per post (0 reads "images not supported").
    pub max_images: usize,
    /// Maximum video count per post (0 reads "videos not supported").
    pub max_videos: usize,
    /// Whether images and videos may appear in the same post. False
    /// for every platform currently supported.
    pub allow_mixed: bool,
    pub image: Option<MediaLimits>,
    pub video: Option<MediaLimits>,
}

const JPG_PNG: &[&str] = &["jpg", "jpeg", "png"];
const JPG_PNG_WEBP: &[&str] = &["jpg", "jpeg", "png", "webp"];

static BLUESKY: PlatformRule = PlatformRule {
    platform: PlatformId::Bluesky,
    max_text_len: Some(299),
    requires_text: true,
    requires_media: false,
    max_images: 4,
    max_videos: 1,
    allow_mixed: false,
    image: Some(MediaLimits::new(JPG_PNG, 1.0)),
    video: Some(MediaLimits::new(&["mp4"], 100.0)),
};

static FACEBOOK: PlatformRule = PlatformRule {
    platform: PlatformId::Facebook,
    max_text_len: None,
    requires_text: true,
    requires_media: false,
    max_images: 10,
    max_videos: 1,
    allow_mixed: false,
    image: Some(MediaLimits::new(JPG_PNG, 10.0)),
    video: Some(MediaLimits::new(&["mp4", "mov", "avi"], 2000.0)),
};

static GOOGLE_BUSINESS: PlatformRule = PlatformRule {
    platform: PlatformId::GoogleBusiness,
    max_text_len: Some(1500),
    requires_text: true,
    requires_media: true,
    max_images: 1,
    max_videos: 0,
    allow_mixed: false,
    image: Some(MediaLimits::new(JPG_PNG, 5.0)),
    video: None,
};

static INSTAGRAM: PlatformRule = PlatformRule {
    platform: PlatformId::Instagram,
    max_text_len: Some(2200),
    requires_text: false,
    requires_media: true,
    max_images: 10,
    max_videos: 1,
    allow_mixed: false,
    image: Some(MediaLimits {
        extensions: JPG_PNG,
        max_size_mb: 8.0,
        width_px: Some(Range::new(320.0, 1440.0)),
        aspect_ratio: Some(Range::new(0.8, 1.91)),
        duration_secs: None,
    }),
    video: Some(MediaLimits::new(&["mp4", "mov"], 100.0)),
};

static LINKEDIN: PlatformRule = PlatformRule {
    platform: PlatformId::LinkedIn,
    max_text_len: Some(3000),
    requires_text: true,
    requires_media: false,
    max_images: 9,
    max_videos: 1,
    allow_mixed: false,
    image: Some(MediaLimits::new(JPG_PNG, 5.0)),
    video: Some(MediaLimits::new(&["mp4"], 200.0)),
};

static PINTEREST: PlatformRule = PlatformRule {
    platform: PlatformId::Pinterest,
    max_text_len: Some(500),
    requires_text: false,
    requires_media: true,
    max_images: 5,
    max_videos: 0,
    allow_mixed: false,
    image: Some(MediaLimits::new(JPG_PNG, 20.0)),
    video: None,
};

static REDDIT: PlatformRule = PlatformRule {
    platform: PlatformId::Reddit,
    max_text_len: Some(5000),
    requires_text: true,
    requires_media: false,
    max_images: 1,
    max_videos: 0,
    allow_mixed: false,
    image: Some(MediaLimits::new(JPG_PNG_WEBP, 10.0)),
    video: None,
};

// Telegram is text-only through the gateway: no media of any kind.
static TELEGRAM: PlatformRule = PlatformRule {
    platform: PlatformId::Telegram,
    max_text_len: Some(1024),
    requires_text: true,
    requires_media: false,
    max_images: 0,
    max_videos: 0,
    allow_mixed: false,
    image: None,
    video: None,
};

static THREADS: PlatformRule = PlatformRule {
    platform: PlatformId::Threads,
    max_text_len: Some(500),
    requires_text: false,
    requires_media: false,
    max_images: 20,
    max_videos: 1,
    allow_mixed: false,
    image: Some(MediaLimits::new(JPG_PNG, 8.0)),
    video: Some(MediaLimits::new(&["mp4", "mov"], 1000.0)),
};

static TIKTOK: PlatformRule = PlatformRule {
    platform: PlatformId::TikTok,
    max_text_len: Some(2200),
    requires_text: false,
    requires_media: true,
    max_images: 0,
    max_videos: 1,
    allow_mixed: false,
    image: None,
    video: Some(
        MediaLimits::new(&["mp4", "mov", "webm"], 1000.0).with_duration(Range::new(3.0, 600.0)),
    ),
};

static TWITTER: PlatformRule = PlatformRule {
    platform: PlatformId::Twitter,
    max_text_len: Some(280),
    requires_text: true,
    requires_media: false,
    max_images: 4,
    max_videos: 4,
    allow_mixed: false,
    image: Some(MediaLimits::new(JPG_PNG_WEBP, 5.0)),
    video: Some(MediaLimits::new(&["mp4", "mov"], 512.0).with_duration(Range::new(0.5, 140.0))),
};

static YOUTUBE: PlatformRule = PlatformRule {
    platform: PlatformId::YouTube,
    max_text_len: Some(5000),
    requires_text: false,
    requires_media: true,
    max_images: 0,
    max_videos: 1,
    allow_mixed: false,
    image: None,
    video: Some(
        MediaLimits::new(&["mp4", "mov"], 4000.0).with_duration(Range::new(1.0, 43_200.0)),
    ),
};

static SNAPCHAT: PlatformRule = PlatformRule {
    platform: PlatformId::Snapchat,
    max_text_len: Some(500),
    requires_text: false,
    requires_media: true,
    max_images: 1,
    max_videos: 1,
    allow_mixed: false,
    image: Some(MediaLimits::new(JPG_PNG, 20.0)),
    video: Some(MediaLimits::new(&["mp4"], 500.0).with_duration(Range::new(1.0, 60.0))),
};

/// Trimmed character limit for a Snapchat Spotlight post. Spotlight
/// posts are also video-only; the engine applies both overrides when
/// the draft's Snapchat post type is Spotlight.
pub const SNAPCHAT_SPOTLIGHT_TEXT_LIMIT: usize = 160;

/// Look up the constraint row for a platform.
///
/// The lookup is total: `PlatformId` is a closed enum, so an unknown
/// platform cannot reach this point (it is rejected as
/// `ConfigError::UnknownPlatform` at the parse boundary).
pub fn rule(platform: PlatformId) -> &'static PlatformRule {
    match platform {
        PlatformId::Bluesky => &BLUESKY,
        PlatformId::Facebook => &FACEBOOK,
        PlatformId::GoogleBusiness => &GOOGLE_BUSINESS,
        PlatformId::Instagram => &INSTAGRAM,
        PlatformId::LinkedIn => &LINKEDIN,
        PlatformId::Pinterest => &PINTEREST,
        PlatformId::Reddit => &REDDIT,
        PlatformId::Telegram => &TELEGRAM,
        PlatformId::Threads => &THREADS,
        PlatformId::TikTok => &TIKTOK,
        PlatformId::Twitter => &TWITTER,
        PlatformId::YouTube => &YOUTUBE,
        PlatformId::Snapchat => &SNAPCHAT,
    }
}

/// Platforms that cannot publish without a title or body.
pub fn text_required_platforms() -> Vec<PlatformId> {
    PlatformId::ALL
        .into_iter()
        .filter(|p| rule(*p).requires_text)
        .collect()
}
