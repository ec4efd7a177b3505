//! Mock gateway for testing
//!
//! A configurable in-memory gateway used by dispatch and settlement
//! tests. Publishes can be scripted to fail per platform, and status
//! lookups walk a per-remote-id sequence so a test can make a share
//! stay pending for a while before resolving.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::platform::PlatformId;

use super::{Gateway, PublishReceipt, PublishRequest, RemoteStatus};

#[derive(Default)]
struct MockState {
    publish_failures: HashMap<PlatformId, GatewayError>,
    status_scripts: HashMap<String, VecDeque<RemoteStatus>>,
    publish_calls: Vec<(PlatformId, PublishRequest)>,
    status_calls: Vec<String>,
    instant_urls: bool,
}

pub struct MockGateway {
    state: Mutex<MockState>,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGateway {
    /// Gateway where every publish is accepted but stays pending: the
    /// receipt carries a remote id and no public URL.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
        }
    }

    /// Gateway where receipts resolve immediately with a public URL.
    pub fn with_instant_urls() -> Self {
        let gateway = Self::new();
        gateway.state.lock().unwrap().instant_urls = true;
        gateway
    }

    /// Make publishes to one platform fail with the given error.
    pub fn fail_platform(&self, platform: PlatformId, error: GatewayError) {
        self.state
            .lock()
            .unwrap()
            .publish_failures
            .insert(platform, error);
    }

    /// Script the status answers for a remote id, returned in order.
    /// Once the script is exhausted the last entry repeats.
    pub fn script_status(&self, remote_post_id: &str, statuses: Vec<RemoteStatus>) {
        self.state
            .lock()
            .unwrap()
            .status_scripts
            .insert(remote_post_id.to_string(), statuses.into());
    }

    pub fn publish_count(&self) -> usize {
        self.state.lock().unwrap().publish_calls.len()
    }

    pub fn published_platforms(&self) -> Vec<PlatformId> {
        self.state
            .lock()
            .unwrap()
            .publish_calls
            .iter()
            .map(|(p, _)| *p)
            .collect()
    }

    pub fn status_count(&self, remote_post_id: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .status_calls
            .iter()
            .filter(|id| id.as_str() == remote_post_id)
            .count()
    }

    fn remote_id(platform: PlatformId) -> String {
        format!("mock-{}-{}", platform.as_str(), uuid::Uuid::new_v4())
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn publish(
        &self,
        platform: PlatformId,
        request: &PublishRequest,
    ) -> Result<PublishReceipt, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.publish_calls.push((platform, request.clone()));
        if let Some(error) = state.publish_failures.get(&platform) {
            return Err(error.clone());
        }
        let remote_post_id = Self::remote_id(platform);
        let public_url = state
            .instant_urls
            .then(|| format!("https://{}.example/{}", platform.as_str(), remote_post_id));
        Ok(PublishReceipt {
            remote_post_id: Some(remote_post_id),
            public_url,
            shared_content: None,
        })
    }

    async fn status(
        &self,
        remote_post_id: &str,
        _platform: PlatformId,
    ) -> Result<RemoteStatus, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.status_calls.push(remote_post_id.to_string());
        let Some(script) = state.status_scripts.get_mut(remote_post_id) else {
            return Ok(RemoteStatus::Pending);
        };
        if script.len() > 1 {
            Ok(script.pop_front().unwrap())
        } else {
            script.front().cloned().map(Ok).unwrap_or(Ok(RemoteStatus::Pending))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PlatformOptions;

    fn request() -> PublishRequest {
        PublishRequest {
            title: String::new(),
            body: "hello".to_string(),
            media_urls: vec![],
            options: PlatformOptions::default(),
        }
    }

    #[tokio::test]
    async fn test_publish_stays_pending_by_default() {
        let gateway = MockGateway::new();
        let receipt = gateway
            .publish(PlatformId::Twitter, &request())
            .await
            .unwrap();
        assert!(receipt.remote_post_id.is_some());
        assert!(receipt.public_url.is_none());
        assert_eq!(gateway.publish_count(), 1);
    }

    #[tokio::test]
    async fn test_fail_platform() {
        let gateway = MockGateway::new();
        gateway.fail_platform(
            PlatformId::Reddit,
            GatewayError::Api {
                message: "subreddit is required".to_string(),
                remote_post_id: None,
            },
        );
        let err = gateway
            .publish(PlatformId::Reddit, &request())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("subreddit is required"));

        // Other platforms are unaffected.
        assert!(gateway.publish(PlatformId::Twitter, &request()).await.is_ok());
    }

    #[tokio::test]
    async fn test_scripted_status_sequence() {
        let gateway = MockGateway::new();
        gateway.script_status(
            "r1",
            vec![
                RemoteStatus::Pending,
                RemoteStatus::Pending,
                RemoteStatus::Published {
                    public_url: Some("https://x.com/1".to_string()),
                    shared_content: None,
                },
            ],
        );

        assert_eq!(gateway.status("r1", PlatformId::Twitter).await.unwrap(), RemoteStatus::Pending);
        assert_eq!(gateway.status("r1", PlatformId::Twitter).await.unwrap(), RemoteStatus::Pending);
        let resolved = gateway.status("r1", PlatformId::Twitter).await.unwrap();
        assert!(matches!(resolved, RemoteStatus::Published { .. }));
        // Last entry repeats once the script is exhausted.
        assert_eq!(gateway.status("r1", PlatformId::Twitter).await.unwrap(), resolved);
        assert_eq!(gateway.status_count("r1"), 4);
    }

    #[tokio::test]
    async fn test_unscripted_status_is_pending() {
        let gateway = MockGateway::new();
        assert_eq!(
            gateway.status("unknown", PlatformId::Twitter).await.unwrap(),
            RemoteStatus::Pending
        );
    }
}
