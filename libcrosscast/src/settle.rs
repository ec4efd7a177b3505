//! Settlement polling
//!
//! Publishing returns before the platforms have finished processing,
//! so shares start out Pending with a remote id and no public URL.
//! The settler asks the gateway for their status and patches the
//! stored records as answers arrive: inline right after a submit, and
//! from a background sweep for anything the inline window missed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::SettlementConfig;
use crate::db::Database;
use crate::error::Result;
use crate::gateway::{Gateway, RemoteStatus};
use crate::types::{ShareRecord, ShareStatus};

/// Outcome of one status query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    Resolved {
        public_url: Option<String>,
        shared_content: Option<String>,
    },
    StillPending,
    Failed(String),
}

pub struct Settler<G: Gateway> {
    gateway: Arc<G>,
    db: Database,
    config: SettlementConfig,
    sweeping: AtomicBool,
}

impl<G: Gateway> Settler<G> {
    pub fn new(gateway: Arc<G>, db: Database, config: SettlementConfig) -> Self {
        Self {
            gateway,
            db,
            config,
            sweeping: AtomicBool::new(false),
        }
    }

    /// One status query. Gateway errors are treated as still pending:
    /// a transient network problem must not fail a share.
    pub async fn check_once(&self, share: &ShareRecord) -> Settlement {
        let Some(remote_id) = &share.remote_post_id else {
            return Settlement::StillPending;
        };
        match self.gateway.status(remote_id, share.platform).await {
            Ok(RemoteStatus::Published {
                public_url,
                shared_content,
            }) => Settlement::Resolved {
                public_url,
                shared_content,
            },
            Ok(RemoteStatus::Pending) => Settlement::StillPending,
            Ok(RemoteStatus::Failed { message }) => Settlement::Failed(message),
            Err(e) => {
                warn!(
                    remote_id,
                    platform = %share.platform,
                    error = %e,
                    "status query failed, will retry"
                );
                Settlement::StillPending
            }
        }
    }

    /// Poll one share until it settles or the inline attempt budget
    /// runs out. Exhausting the budget is not an error: the share
    /// stays Pending for the background sweep to pick up.
    pub async fn poll_inline(&self, post_id: &str, share: &mut ShareRecord) -> Result<()> {
        for attempt in 1..=self.config.inline_attempts {
            tokio::time::sleep(Duration::from_secs(self.config.inline_delay_secs)).await;

            match self.check_once(share).await {
                Settlement::Resolved {
                    public_url,
                    shared_content,
                } => {
                    share.absorb(public_url, shared_content);
                    self.db.save_share(post_id, share).await?;
                    info!(
                        platform = %share.platform,
                        url = share.public_url.as_deref().unwrap_or(""),
                        "share settled"
                    );
                    return Ok(());
                }
                Settlement::Failed(message) => {
                    share.status = ShareStatus::Failed;
                    share.error_message = Some(message);
                    self.db.save_share(post_id, share).await?;
                    return Ok(());
                }
                Settlement::StillPending => {
                    debug!(
                        platform = %share.platform,
                        attempt,
                        "share still pending"
                    );
                }
            }
        }
        warn!(
            platform = %share.platform,
            attempts = self.config.inline_attempts,
            "share did not settle inline, leaving it for the sweeper"
        );
        Ok(())
    }

    /// One pass over every unresolved share in the store, one status
    /// query each. Returns how many shares were settled (published or
    /// failed). Concurrent calls collapse: if a sweep is already
    /// running, this returns immediately.
    pub async fn sweep(&self) -> Result<usize> {
        if self.sweeping.swap(true, Ordering::SeqCst) {
            debug!("sweep already in progress, skipping");
            return Ok(0);
        }
        let result = self.sweep_inner().await;
        self.sweeping.store(false, Ordering::SeqCst);
        result
    }

    async fn sweep_inner(&self) -> Result<usize> {
        let unresolved = self.db.find_unresolved().await?;
        debug!(count = unresolved.len(), "sweeping unresolved shares");

        let mut settled = 0;
        for (post_id, mut share) in unresolved {
            match self.check_once(&share).await {
                Settlement::Resolved {
                    public_url,
                    shared_content,
                } => {
                    share.absorb(public_url, shared_content);
                    self.db.save_share(&post_id, &share).await?;
                    info!(
                        post_id,
                        platform = %share.platform,
                        "share settled by sweep"
                    );
                    settled += 1;
                }
                Settlement::Failed(message) => {
                    share.status = ShareStatus::Failed;
                    share.error_message = Some(message);
                    self.db.save_share(&post_id, &share).await?;
                    settled += 1;
                }
                Settlement::StillPending => {}
            }
        }
        Ok(settled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MockGateway;
    use crate::platform::PlatformId;
    use crate::types::Post;

    fn instant_config() -> SettlementConfig {
        SettlementConfig {
            inline_attempts: 5,
            inline_delay_secs: 0,
            sweep_interval_secs: 300,
        }
    }

    async fn setup(gateway: MockGateway) -> (Arc<MockGateway>, Database, Settler<MockGateway>) {
        let gateway = Arc::new(gateway);
        let db = Database::new(":memory:").await.unwrap();
        let settler = Settler::new(gateway.clone(), db.clone(), instant_config());
        (gateway, db, settler)
    }

    async fn seed_share(db: &Database, remote_id: &str) -> (String, ShareRecord) {
        let post = Post::new("t".to_string(), "b".to_string());
        db.create_post(&post).await.unwrap();
        let share = ShareRecord::pending(PlatformId::Twitter, Some(remote_id.to_string()));
        db.save_share(&post.id, &share).await.unwrap();
        (post.id, share)
    }

    #[tokio::test]
    async fn test_poll_inline_resolves_after_pending_answers() {
        let gateway = MockGateway::new();
        gateway.script_status(
            "r1",
            vec![
                RemoteStatus::Pending,
                RemoteStatus::Pending,
                RemoteStatus::Published {
                    public_url: Some("https://x.com/1".to_string()),
                    shared_content: Some("b".to_string()),
                },
            ],
        );
        let (gateway, db, settler) = setup(gateway).await;
        let (post_id, mut share) = seed_share(&db, "r1").await;

        settler.poll_inline(&post_id, &mut share).await.unwrap();

        assert_eq!(share.status, ShareStatus::Published);
        assert_eq!(share.public_url.as_deref(), Some("https://x.com/1"));
        assert_eq!(gateway.status_count("r1"), 3);

        let stored = db.get_shares(&post_id).await.unwrap();
        assert_eq!(stored[0].status, ShareStatus::Published);
        assert_eq!(stored[0].public_url.as_deref(), Some("https://x.com/1"));
    }

    #[tokio::test]
    async fn test_poll_inline_marks_failure() {
        let gateway = MockGateway::new();
        gateway.script_status(
            "r1",
            vec![RemoteStatus::Failed {
                message: "platform rejected the post".to_string(),
            }],
        );
        let (_, db, settler) = setup(gateway).await;
        let (post_id, mut share) = seed_share(&db, "r1").await;

        settler.poll_inline(&post_id, &mut share).await.unwrap();

        assert_eq!(share.status, ShareStatus::Failed);
        let stored = db.get_shares(&post_id).await.unwrap();
        assert_eq!(stored[0].status, ShareStatus::Failed);
        assert_eq!(
            stored[0].error_message.as_deref(),
            Some("platform rejected the post")
        );
    }

    #[tokio::test]
    async fn test_poll_inline_exhausts_attempts_silently() {
        // Unscripted remote ids answer Pending forever.
        let (gateway, db, settler) = setup(MockGateway::new()).await;
        let (post_id, mut share) = seed_share(&db, "r1").await;

        settler.poll_inline(&post_id, &mut share).await.unwrap();

        assert_eq!(share.status, ShareStatus::Pending);
        assert_eq!(gateway.status_count("r1"), 5);
        let stored = db.get_shares(&post_id).await.unwrap();
        assert_eq!(stored[0].status, ShareStatus::Pending);
    }

    #[tokio::test]
    async fn test_sweep_settles_unresolved_shares() {
        let gateway = MockGateway::new();
        gateway.script_status(
            "r1",
            vec![RemoteStatus::Published {
                public_url: Some("https://x.com/1".to_string()),
                shared_content: None,
            }],
        );
        let (gateway, db, settler) = setup(gateway).await;
        let (post_id, _) = seed_share(&db, "r1").await;

        let settled = settler.sweep().await.unwrap();
        assert_eq!(settled, 1);

        let stored = db.get_shares(&post_id).await.unwrap();
        assert_eq!(stored[0].status, ShareStatus::Published);

        // A second sweep finds nothing left to do and issues no
        // further queries.
        let settled = settler.sweep().await.unwrap();
        assert_eq!(settled, 0);
        assert_eq!(gateway.status_count("r1"), 1);
    }

    #[tokio::test]
    async fn test_sweep_leaves_pending_shares_for_next_pass() {
        let (gateway, db, settler) = setup(MockGateway::new()).await;
        let (post_id, _) = seed_share(&db, "r1").await;

        let settled = settler.sweep().await.unwrap();
        assert_eq!(settled, 0);
        assert_eq!(gateway.status_count("r1"), 1);

        let stored = db.get_shares(&post_id).await.unwrap();
        assert_eq!(stored[0].status, ShareStatus::Pending);
        assert!(stored[0].remote_post_id.is_some());
    }

    #[tokio::test]
    async fn test_sweep_is_idempotent_on_settled_shares() {
        let gateway = MockGateway::new();
        gateway.script_status(
            "r1",
            vec![RemoteStatus::Published {
                public_url: Some("https://x.com/1".to_string()),
                shared_content: None,
            }],
        );
        let (_, db, settler) = setup(gateway).await;
        let (post_id, _) = seed_share(&db, "r1").await;

        settler.sweep().await.unwrap();
        let first = db.get_shares(&post_id).await.unwrap();
        settler.sweep().await.unwrap();
        let second = db.get_shares(&post_id).await.unwrap();

        assert_eq!(first[0].public_url, second[0].public_url);
        assert_eq!(first[0].published_at, second[0].published_at);
    }
}
