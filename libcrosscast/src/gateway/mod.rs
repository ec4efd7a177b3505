//! Distribution gateway abstraction
//!
//! All thirteen platforms are reached through one external
//! distribution API. The `Gateway` trait covers the two calls the rest
//! of the crate needs: publish a post to one platform, and ask for the
//! settlement status of an earlier publish.

pub mod http;
pub mod mock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::platform::PlatformId;
use crate::types::{Draft, PlatformOptions};

pub use http::HttpGateway;
pub use mock::MockGateway;

/// Everything the gateway needs to publish one platform's share.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishRequest {
    pub title: String,
    pub body: String,
    pub media_urls: Vec<String>,
    pub options: PlatformOptions,
}

impl PublishRequest {
    pub fn from_draft(draft: &Draft) -> Self {
        Self {
            title: draft.title.clone(),
            body: draft.body.clone(),
            media_urls: draft.media_urls.clone(),
            options: draft.options.clone(),
        }
    }
}

/// What the gateway returned for an accepted publish. The public URL
/// and final content are often not known yet; settlement fills them
/// in later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    pub remote_post_id: Option<String>,
    pub public_url: Option<String>,
    pub shared_content: Option<String>,
}

/// Settlement status of a previously published share.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteStatus {
    /// The platform has not finished processing the share.
    Pending,
    Published {
        public_url: Option<String>,
        shared_content: Option<String>,
    },
    Failed {
        message: String,
    },
}

#[async_trait]
pub trait Gateway: Send + Sync {
    /// Publish one platform's share of a post.
    async fn publish(
        &self,
        platform: PlatformId,
        request: &PublishRequest,
    ) -> Result<PublishReceipt, GatewayError>;

    /// Look up the settlement status of an earlier publish.
    async fn status(
        &self,
        remote_post_id: &str,
        platform: PlatformId,
    ) -> Result<RemoteStatus, GatewayError>;
}
