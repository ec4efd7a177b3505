//! HTTP implementation of the distribution gateway

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::platform::PlatformId;
use crate::types::{SnapchatPostType, YouTubeVisibility};

use super::{Gateway, PublishReceipt, PublishRequest, RemoteStatus};

pub struct HttpGateway {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl HttpGateway {
    pub fn new(api_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Build a gateway from config, reading the API key from the
    /// configured key file.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let key_path = shellexpand::tilde(&config.api_key_file).to_string();
        let api_key = std::fs::read_to_string(&key_path)
            .map_err(|e| GatewayError::Auth(format!("cannot read {}: {}", key_path, e)))?
            .trim()
            .to_string();
        if api_key.is_empty() {
            return Err(GatewayError::Auth(format!("{} is empty", key_path)));
        }
        Ok(Self::new(config.api_url.clone(), api_key))
    }

    fn build_payload(&self, platform: PlatformId, request: &PublishRequest) -> Value {
        let mut payload = json!({
            "post": request.body,
            "platforms": [platform.as_str()],
        });
        let obj = payload.as_object_mut().unwrap();
        if !request.media_urls.is_empty() {
            obj.insert("mediaUrls".to_string(), json!(request.media_urls));
        }
        if !request.title.trim().is_empty() {
            obj.insert("title".to_string(), json!(request.title));
        }
        if request.options.shorten_links {
            obj.insert("shortenLinks".to_string(), json!(true));
        }
        match platform {
            PlatformId::YouTube => {
                if request.options.youtube_visibility != YouTubeVisibility::Public {
                    obj.insert(
                        "youTubeVisibility".to_string(),
                        json!(request.options.youtube_visibility.as_str()),
                    );
                }
            }
            PlatformId::Reddit => {
                if let Some(subreddit) = &request.options.subreddit {
                    obj.insert("subreddit".to_string(), json!(subreddit));
                }
                if let Some(link) = &request.options.reddit_link {
                    obj.insert("redditLink".to_string(), json!(link));
                }
            }
            PlatformId::Snapchat => match request.options.snapchat_post_type {
                SnapchatPostType::Story => {}
                SnapchatPostType::SavedStory => {
                    obj.insert("snapChatOptions".to_string(), json!({ "savedStory": true }));
                }
                SnapchatPostType::Spotlight => {
                    obj.insert("snapChatOptions".to_string(), json!({ "spotlight": true }));
                }
            },
            _ => {}
        }
        payload
    }

    async fn post_json(&self, path: &str, payload: &Value) -> Result<Value, GatewayError> {
        let url = format!("{}{}", self.api_url, path);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(payload)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;
        self.decode(response).await
    }

    async fn get_json(&self, path: &str) -> Result<Value, GatewayError> {
        let url = format!("{}{}", self.api_url, path);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;
        self.decode(response).await
    }

    async fn decode(&self, response: reqwest::Response) -> Result<Value, GatewayError> {
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(GatewayError::Auth(format!("gateway returned {}", status)));
        }
        let body: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::Network(format!("invalid gateway response: {}", e)))?;
        // API errors are reported in the body, sometimes with a 200.
        let api_error = body.get("status").and_then(Value::as_str) == Some("error");
        if !status.is_success() || api_error {
            let message = error_message(&body).unwrap_or_else(|| format!("gateway returned {}", status));
            // A rejected request may still have allocated a post id;
            // keep it so settlement can pick the share up later.
            let remote_post_id = body
                .get("id")
                .or_else(|| body.get("postId"))
                .and_then(Value::as_str)
                .map(String::from);
            return Err(GatewayError::Api {
                message,
                remote_post_id,
            });
        }
        Ok(body)
    }
}

fn error_message(body: &Value) -> Option<String> {
    if let Some(errors) = body.get("errors").and_then(Value::as_array) {
        if let Some(first) = errors.first() {
            if let Some(message) = first.get("message").and_then(Value::as_str) {
                return Some(message.to_string());
            }
            return Some(first.to_string());
        }
    }
    body.get("message")
        .and_then(Value::as_str)
        .map(String::from)
}

/// Find the entry for `platform` in a `postIds` array.
fn platform_entry<'a>(body: &'a Value, platform: PlatformId) -> Option<&'a Value> {
    body.get("postIds")?
        .as_array()?
        .iter()
        .find(|entry| {
            entry
                .get("platform")
                .and_then(Value::as_str)
                .map(|p| p.eq_ignore_ascii_case(platform.as_str()))
                .unwrap_or(false)
        })
}

fn entry_str(entry: &Value, key: &str) -> Option<String> {
    entry.get(key).and_then(Value::as_str).map(String::from)
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn publish(
        &self,
        platform: PlatformId,
        request: &PublishRequest,
    ) -> Result<PublishReceipt, GatewayError> {
        debug!(platform = %platform, "publishing via gateway");
        let payload = self.build_payload(platform, request);
        let body = self.post_json("/post", &payload).await?;

        let entry = platform_entry(&body, platform);
        let remote_post_id = entry
            .and_then(|e| entry_str(e, "id").or_else(|| entry_str(e, "postId")))
            .or_else(|| body.get("id").and_then(Value::as_str).map(String::from));
        Ok(PublishReceipt {
            remote_post_id,
            public_url: entry.and_then(|e| entry_str(e, "postUrl")),
            shared_content: entry.and_then(|e| entry_str(e, "sharedContent")),
        })
    }

    async fn status(
        &self,
        remote_post_id: &str,
        platform: PlatformId,
    ) -> Result<RemoteStatus, GatewayError> {
        debug!(remote_post_id, platform = %platform, "checking settlement status");
        let body = self.get_json(&format!("/history/{}", remote_post_id)).await?;

        let Some(entry) = platform_entry(&body, platform) else {
            return Ok(RemoteStatus::Pending);
        };
        match entry.get("status").and_then(Value::as_str) {
            Some("success") => Ok(RemoteStatus::Published {
                public_url: entry_str(entry, "postUrl"),
                shared_content: entry_str(entry, "sharedContent"),
            }),
            Some("error") | Some("failed") => Ok(RemoteStatus::Failed {
                message: entry_str(entry, "message")
                    .unwrap_or_else(|| "platform rejected the post".to_string()),
            }),
            _ => Ok(RemoteStatus::Pending),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PlatformOptions;

    fn request() -> PublishRequest {
        PublishRequest {
            title: "Title".to_string(),
            body: "Body".to_string(),
            media_urls: vec!["https://cdn/a.jpg".to_string()],
            options: PlatformOptions::default(),
        }
    }

    fn gateway(url: &str) -> HttpGateway {
        HttpGateway::new(url.to_string(), "test-key".to_string())
    }

    #[test]
    fn test_payload_basic_shape() {
        let gw = gateway("https://gw.example");
        let payload = gw.build_payload(PlatformId::Twitter, &request());
        assert_eq!(payload["post"], "Body");
        assert_eq!(payload["platforms"], json!(["twitter"]));
        assert_eq!(payload["mediaUrls"], json!(["https://cdn/a.jpg"]));
        assert_eq!(payload["title"], "Title");
        assert!(payload.get("shortenLinks").is_none());
    }

    #[test]
    fn test_payload_reddit_options() {
        let gw = gateway("https://gw.example");
        let mut req = request();
        req.options.subreddit = Some("rust".to_string());
        req.options.reddit_link = Some("https://example.com".to_string());
        let payload = gw.build_payload(PlatformId::Reddit, &req);
        assert_eq!(payload["subreddit"], "rust");
        assert_eq!(payload["redditLink"], "https://example.com");
    }

    #[test]
    fn test_payload_snapchat_spotlight() {
        let gw = gateway("https://gw.example");
        let mut req = request();
        req.options.snapchat_post_type = SnapchatPostType::Spotlight;
        let payload = gw.build_payload(PlatformId::Snapchat, &req);
        assert_eq!(payload["snapChatOptions"]["spotlight"], true);
    }

    #[test]
    fn test_payload_youtube_visibility() {
        let gw = gateway("https://gw.example");
        let mut req = request();
        req.options.youtube_visibility = YouTubeVisibility::Unlisted;
        let payload = gw.build_payload(PlatformId::YouTube, &req);
        assert_eq!(payload["youTubeVisibility"], "unlisted");
    }

    #[tokio::test]
    async fn test_publish_success() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/post")
            .match_header("authorization", "Bearer test-key")
            .with_status(200)
            .with_body(
                json!({
                    "status": "success",
                    "id": "abc123",
                    "postIds": [{
                        "platform": "twitter",
                        "id": "abc123",
                        "postUrl": "https://x.com/u/1"
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let gw = gateway(&server.url());
        let receipt = gw.publish(PlatformId::Twitter, &request()).await.unwrap();
        assert_eq!(receipt.remote_post_id.as_deref(), Some("abc123"));
        assert_eq!(receipt.public_url.as_deref(), Some("https://x.com/u/1"));
    }

    #[tokio::test]
    async fn test_publish_error_keeps_partial_id() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/post")
            .with_status(400)
            .with_body(
                json!({
                    "status": "error",
                    "id": "partial-1",
                    "errors": [{ "message": "subreddit is required" }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let gw = gateway(&server.url());
        let err = gw.publish(PlatformId::Reddit, &request()).await.unwrap_err();
        match err {
            GatewayError::Api {
                message,
                remote_post_id,
            } => {
                assert_eq!(message, "subreddit is required");
                assert_eq!(remote_post_id.as_deref(), Some("partial-1"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_publish_unauthorized() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/post")
            .with_status(401)
            .create_async()
            .await;

        let gw = gateway(&server.url());
        let err = gw.publish(PlatformId::Twitter, &request()).await.unwrap_err();
        assert!(matches!(err, GatewayError::Auth(_)));
    }

    #[tokio::test]
    async fn test_status_lifecycle() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/history/abc123")
            .with_status(200)
            .with_body(
                json!({
                    "postIds": [{
                        "platform": "twitter",
                        "status": "success",
                        "postUrl": "https://x.com/u/1",
                        "sharedContent": "Body"
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let gw = gateway(&server.url());
        let status = gw.status("abc123", PlatformId::Twitter).await.unwrap();
        assert_eq!(
            status,
            RemoteStatus::Published {
                public_url: Some("https://x.com/u/1".to_string()),
                shared_content: Some("Body".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn test_status_missing_entry_is_pending() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/history/abc123")
            .with_status(200)
            .with_body(json!({ "postIds": [] }).to_string())
            .create_async()
            .await;

        let gw = gateway(&server.url());
        let status = gw.status("abc123", PlatformId::Twitter).await.unwrap();
        assert_eq!(status, RemoteStatus::Pending);
    }
}
