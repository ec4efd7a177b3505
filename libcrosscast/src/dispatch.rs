//! Publish orchestration
//!
//! The dispatcher owns the submit path: persist the post, fan the
//! publish out to every selected platform at once, record what each
//! platform said, then poll inline for the shares that have not
//! resolved yet. One platform failing never touches the others, and
//! the post is persisted before any network call is made.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{error, info};

use crate::db::Database;
use crate::error::{GatewayError, Result};
use crate::gateway::{Gateway, PublishRequest};
use crate::settle::Settler;
use crate::types::{Draft, Post, ShareRecord};

pub struct Dispatcher<G: Gateway> {
    gateway: Arc<G>,
    db: Database,
    settler: Arc<Settler<G>>,
}

impl<G: Gateway> Dispatcher<G> {
    pub fn new(gateway: Arc<G>, db: Database, settler: Arc<Settler<G>>) -> Self {
        Self {
            gateway,
            db,
            settler,
        }
    }

    /// Submit a draft: persist it, then (unless `auto_share` is off)
    /// publish to every selected platform concurrently and wait inline
    /// for settlement. The returned post carries the final per-platform
    /// share records.
    pub async fn submit(&self, draft: &Draft, auto_share: bool) -> Result<Post> {
        let mut post = Post::new(draft.title.clone(), draft.body.clone());
        post.shares = draft
            .platforms
            .iter()
            .map(|p| ShareRecord::pending(*p, None))
            .collect();

        // Persisted before any network call: a gateway outage must
        // never lose the composed post.
        self.db.create_post(&post).await?;
        info!(post_id = %post.id, platforms = post.shares.len(), "post persisted");

        if !auto_share {
            return Ok(post);
        }

        let request = PublishRequest::from_draft(draft);
        let publishes = draft
            .platforms
            .iter()
            .map(|platform| self.gateway.publish(*platform, &request));
        let outcomes = join_all(publishes).await;

        for (share, outcome) in post.shares.iter_mut().zip(outcomes) {
            match outcome {
                Ok(receipt) => {
                    share.remote_post_id = receipt.remote_post_id;
                    share.absorb(receipt.public_url, receipt.shared_content);
                }
                Err(e) => {
                    error!(platform = %share.platform, error = %e, "publish failed");
                    // A rejected publish may still have a remote id
                    // worth keeping for later inspection.
                    let partial_id = match &e {
                        GatewayError::Api { remote_post_id, .. } => remote_post_id.clone(),
                        _ => None,
                    };
                    *share = ShareRecord::failed(share.platform, partial_id, e.to_string());
                }
            }
            self.db.save_share(&post.id, share).await?;
        }

        let post_id = post.id.clone();
        let polls = post
            .shares
            .iter_mut()
            .filter(|share| share.is_unresolved())
            .map(|share| self.settler.poll_inline(&post_id, share));
        for result in join_all(polls).await {
            result?;
        }

        Ok(post)
    }
}
