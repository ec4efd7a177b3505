//! Platform identifiers
//!
//! The set of supported publishing targets is closed: every id the rest
//! of the system sees is one of these 13 values. Free-form strings only
//! exist at the parse boundary (CLI arguments, gateway payloads), where
//! an unrecognized id is a configuration error, never a silent pass.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformId {
    Bluesky,
    Facebook,
    #[serde(rename = "gmb")]
    GoogleBusiness,
    Instagram,
    #[serde(rename = "linkedin")]
    LinkedIn,
    Pinterest,
    Reddit,
    Telegram,
    Threads,
    #[serde(rename = "tiktok")]
    TikTok,
    Twitter,
    #[serde(rename = "youtube")]
    YouTube,
    Snapchat,
}

impl PlatformId {
    /// Every supported platform, in rule-table order.
    pub const ALL: [PlatformId; 13] = [
        PlatformId::Bluesky,
        PlatformId::Facebook,
        PlatformId::GoogleBusiness,
        PlatformId::Instagram,
        PlatformId::LinkedIn,
        PlatformId::Pinterest,
        PlatformId::Reddit,
        PlatformId::Telegram,
        PlatformId::Threads,
        PlatformId::TikTok,
        PlatformId::Twitter,
        PlatformId::YouTube,
        PlatformId::Snapchat,
    ];

    /// Lowercase wire identifier used in config files, CLI arguments
    /// and gateway payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformId::Bluesky => "bluesky",
            PlatformId::Facebook => "facebook",
            PlatformId::GoogleBusiness => "gmb",
            PlatformId::Instagram => "instagram",
            PlatformId::LinkedIn => "linkedin",
            PlatformId::Pinterest => "pinterest",
            PlatformId::Reddit => "reddit",
            PlatformId::Telegram => "telegram",
            PlatformId::Threads => "threads",
            PlatformId::TikTok => "tiktok",
            PlatformId::Twitter => "twitter",
            PlatformId::YouTube => "youtube",
            PlatformId::Snapchat => "snapchat",
        }
    }

    /// Human-readable name used in validation messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            PlatformId::Bluesky => "Bluesky",
            PlatformId::Facebook => "Facebook",
            PlatformId::GoogleBusiness => "Google Business",
            PlatformId::Instagram => "Instagram",
            PlatformId::LinkedIn => "LinkedIn",
            PlatformId::Pinterest => "Pinterest",
            PlatformId::Reddit => "Reddit",
            PlatformId::Telegram => "Telegram",
            PlatformId::Threads => "Threads",
            PlatformId::TikTok => "TikTok",
            PlatformId::Twitter => "X (Twitter)",
            PlatformId::YouTube => "YouTube",
            PlatformId::Snapchat => "Snapchat",
        }
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PlatformId {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bluesky" => Ok(PlatformId::Bluesky),
            "facebook" => Ok(PlatformId::Facebook),
            "gmb" | "google-business" => Ok(PlatformId::GoogleBusiness),
            "instagram" => Ok(PlatformId::Instagram),
            "linkedin" => Ok(PlatformId::LinkedIn),
            "pinterest" => Ok(PlatformId::Pinterest),
            "reddit" => Ok(PlatformId::Reddit),
            "telegram" => Ok(PlatformId::Telegram),
            "threads" => Ok(PlatformId::Threads),
            "tiktok" => Ok(PlatformId::TikTok),
            "twitter" | "x" | "x/twitter" => Ok(PlatformId::Twitter),
            "youtube" => Ok(PlatformId::YouTube),
            "snapchat" => Ok(PlatformId::Snapchat),
            other => Err(ConfigError::UnknownPlatform(other.to_string())),
        }
    }
}
