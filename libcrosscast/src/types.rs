//! Core data types shared across the crate

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::platform::PlatformId;

/// Visibility of a YouTube upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YouTubeVisibility {
    #[default]
    Public,
    Private,
    Unlisted,
}

impl YouTubeVisibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            YouTubeVisibility::Public => "public",
            YouTubeVisibility::Private => "private",
            YouTubeVisibility::Unlisted => "unlisted",
        }
    }
}

impl std::str::FromStr for YouTubeVisibility {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "public" => Ok(YouTubeVisibility::Public),
            "private" => Ok(YouTubeVisibility::Private),
            "unlisted" => Ok(YouTubeVisibility::Unlisted),
            other => Err(format!("unknown YouTube visibility: {}", other)),
        }
    }
}

/// Kind of Snapchat post. Spotlight posts carry a tighter text limit
/// and must be video-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SnapchatPostType {
    #[default]
    Story,
    SavedStory,
    Spotlight,
}

impl std::str::FromStr for SnapchatPostType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "story" => Ok(SnapchatPostType::Story),
            "savedstory" | "saved-story" => Ok(SnapchatPostType::SavedStory),
            "spotlight" => Ok(SnapchatPostType::Spotlight),
            other => Err(format!("unknown Snapchat post type: {}", other)),
        }
    }
}

/// Platform-specific knobs a draft may carry. All optional; defaults
/// are what the gateway assumes when the field is absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlatformOptions {
    /// Target subreddit, required by the gateway when Reddit is selected.
    pub subreddit: Option<String>,
    /// Optional link to attach to a Reddit post.
    pub reddit_link: Option<String>,
    #[serde(default)]
    pub youtube_visibility: YouTubeVisibility,
    #[serde(default)]
    pub snapchat_post_type: SnapchatPostType,
    #[serde(default)]
    pub shorten_links: bool,
}

/// A post as composed by the user, before validation or publishing.
#[derive(Debug, Clone, Default)]
pub struct Draft {
    pub title: String,
    pub body: String,
    pub platforms: Vec<PlatformId>,
    pub media_urls: Vec<String>,
    pub options: PlatformOptions,
}

impl Draft {
    /// Whether the draft carries any text at all, title or body,
    /// ignoring surrounding whitespace.
    pub fn has_text(&self) -> bool {
        !self.title.trim().is_empty() || !self.body.trim().is_empty()
    }

    /// Trimmed body length in characters (not bytes).
    pub fn body_len(&self) -> usize {
        self.body.trim().chars().count()
    }
}

/// Media kind derived from a URL's file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    Unknown,
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "webm"];

/// A media URL with its classification, computed once per draft so the
/// validation engine never re-parses URLs per platform.
#[derive(Debug, Clone)]
pub struct MediaAsset {
    pub url: String,
    pub kind: MediaKind,
    /// Lowercase extension, empty when the URL has none.
    pub extension: String,
}

impl MediaAsset {
    /// Classify a URL by the extension of its last path segment. Query
    /// strings and fragments are ignored; extensions compare
    /// case-insensitively.
    pub fn classify(url: &str) -> Self {
        let path = url
            .split(['?', '#'])
            .next()
            .unwrap_or(url);
        let segment = path.rsplit('/').next().unwrap_or(path);
        let extension = match segment.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() => ext.to_lowercase(),
            _ => String::new(),
        };
        let kind = if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            MediaKind::Image
        } else if VIDEO_EXTENSIONS.contains(&extension.as_str()) {
            MediaKind::Video
        } else {
            MediaKind::Unknown
        };
        Self {
            url: url.to_string(),
            kind,
            extension,
        }
    }
}

/// Lifecycle of a single platform share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareStatus {
    /// Accepted by the gateway; public URL not yet known.
    Pending,
    /// Publicly visible, URL resolved.
    Published,
    /// The gateway or platform rejected the share.
    Failed,
}

impl ShareStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShareStatus::Pending => "pending",
            ShareStatus::Published => "published",
            ShareStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ShareStatus::Pending),
            "published" => Some(ShareStatus::Published),
            "failed" => Some(ShareStatus::Failed),
            _ => None,
        }
    }
}

/// Outcome of publishing a post to one platform. Fields resolve
/// monotonically: once set, a value is never overwritten with a
/// different one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareRecord {
    pub platform: PlatformId,
    pub status: ShareStatus,
    /// Identifier the gateway assigned, used for status polling.
    pub remote_post_id: Option<String>,
    /// Public URL of the share once the platform resolved it.
    pub public_url: Option<String>,
    /// Final rendering of the content as the platform published it.
    pub shared_content: Option<String>,
    pub published_at: Option<i64>,
    pub error_message: Option<String>,
}

impl ShareRecord {
    pub fn pending(platform: PlatformId, remote_post_id: Option<String>) -> Self {
        Self {
            platform,
            status: ShareStatus::Pending,
            remote_post_id,
            public_url: None,
            shared_content: None,
            published_at: None,
            error_message: None,
        }
    }

    pub fn failed(platform: PlatformId, remote_post_id: Option<String>, message: String) -> Self {
        Self {
            platform,
            status: ShareStatus::Failed,
            remote_post_id,
            public_url: None,
            shared_content: None,
            published_at: None,
            error_message: Some(message),
        }
    }

    /// Absorb resolved values into this record. Only fields still
    /// unset are filled, so re-applying the same resolution (or a
    /// later, sparser one) never clobbers earlier data.
    pub fn absorb(&mut self, public_url: Option<String>, shared_content: Option<String>) {
        if self.public_url.is_none() {
            if let Some(url) = public_url {
                self.public_url = Some(url);
                self.status = ShareStatus::Published;
                if self.published_at.is_none() {
                    self.published_at = Some(Utc::now().timestamp());
                }
            }
        }
        if self.shared_content.is_none() {
            self.shared_content = shared_content;
        }
    }

    /// Whether this record still needs status polling: the gateway
    /// accepted it but the public URL has not resolved yet.
    pub fn is_unresolved(&self) -> bool {
        self.status != ShareStatus::Failed
            && self.remote_post_id.is_some()
            && self.public_url.is_none()
    }
}

/// A published (or publishing) post with its per-platform shares.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub body: String,
    pub created_at: i64,
    pub shares: Vec<ShareRecord>,
}

impl Post {
    pub fn new(title: String, body: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            body,
            created_at: Utc::now().timestamp(),
            shares: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_image_and_video() {
        assert_eq!(MediaAsset::classify("https://cdn.example.com/pic.png").kind, MediaKind::Image);
        assert_eq!(MediaAsset::classify("https://cdn.example.com/clip.MP4").kind, MediaKind::Video);
    }

    #[test]
    fn test_classify_ignores_query_and_fragment() {
        let asset = MediaAsset::classify("https://cdn.example.com/a/b/photo.JPEG?w=640#top");
        assert_eq!(asset.kind, MediaKind::Image);
        assert_eq!(asset.extension, "jpeg");
    }

    #[test]
    fn test_classify_no_extension_is_unknown() {
        let asset = MediaAsset::classify("https://cdn.example.com/download");
        assert_eq!(asset.kind, MediaKind::Unknown);
        assert_eq!(asset.extension, "");
    }

    #[test]
    fn test_classify_dotted_path_uses_last_segment() {
        // Dots in earlier path segments must not leak into the extension.
        let asset = MediaAsset::classify("https://v2.example.com/media.bundle/raw");
        assert_eq!(asset.extension, "");
        assert_eq!(asset.kind, MediaKind::Unknown);
    }

    #[test]
    fn test_classify_unrecognized_extension() {
        let asset = MediaAsset::classify("https://cdn.example.com/doc.pdf");
        assert_eq!(asset.kind, MediaKind::Unknown);
        assert_eq!(asset.extension, "pdf");
    }

    #[test]
    fn test_draft_has_text() {
        let mut draft = Draft::default();
        assert!(!draft.has_text());
        draft.title = "   ".to_string();
        assert!(!draft.has_text());
        draft.body = "hello".to_string();
        assert!(draft.has_text());
    }

    #[test]
    fn test_body_len_counts_chars_not_bytes() {
        let draft = Draft {
            body: "héllo".to_string(),
            ..Draft::default()
        };
        assert_eq!(draft.body_len(), 5);
    }

    #[test]
    fn test_absorb_fills_empty_fields_only() {
        let mut record = ShareRecord::pending(PlatformId::Twitter, Some("abc".to_string()));
        record.absorb(Some("https://x.com/1".to_string()), None);
        assert_eq!(record.status, ShareStatus::Published);
        assert!(record.published_at.is_some());

        let first_published = record.published_at;
        record.absorb(Some("https://x.com/2".to_string()), Some("text".to_string()));
        assert_eq!(record.public_url.as_deref(), Some("https://x.com/1"));
        assert_eq!(record.shared_content.as_deref(), Some("text"));
        assert_eq!(record.published_at, first_published);
    }

    #[test]
    fn test_absorb_without_url_stays_pending() {
        let mut record = ShareRecord::pending(PlatformId::Twitter, Some("abc".to_string()));
        record.absorb(None, None);
        assert_eq!(record.status, ShareStatus::Pending);
        assert!(record.is_unresolved());
    }

    #[test]
    fn test_is_unresolved() {
        let no_remote_id = ShareRecord::pending(PlatformId::Reddit, None);
        assert!(!no_remote_id.is_unresolved());

        let failed = ShareRecord::failed(
            PlatformId::Reddit,
            Some("abc".to_string()),
            "rejected".to_string(),
        );
        assert!(!failed.is_unresolved());

        let mut resolved = ShareRecord::pending(PlatformId::Reddit, Some("abc".to_string()));
        assert!(resolved.is_unresolved());
        resolved.absorb(Some("https://reddit.com/p/1".to_string()), None);
        assert!(!resolved.is_unresolved());
    }
}
