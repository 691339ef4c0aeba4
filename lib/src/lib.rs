//! Chat delivery bindings for Rust
//! Provides a webhook client that posts rich embeds and a channel client that
//! posts plain messages to a channel by name

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Prefix prepended to webhook endpoints given as a bare `id/token` pair.
pub const WEBHOOK_BASE_URL: &str = "https://discord.com/api/webhooks/";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Destination rejected the message with status {0}")]
    Rejected(u16),
    #[error("Channel not found: {0}")]
    ChannelNotFound(String),
    #[error("Invalid header value")]
    InvalidHeader,
    #[error("Payload too large")]
    PayloadTooLarge,
    #[error("Payload must have content, at least one embed, or both")]
    EmptyPayload,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbedImage {
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbedAuthor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbedFooter {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

/// A rich message block, serialized in the webhook wire format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<EmbedImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<EmbedImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<EmbedAuthor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WebhookMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl WebhookMessage {
    pub fn with_embed(embed: Embed) -> Self {
        Self {
            embeds: vec![embed],
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.as_deref().map_or(true, str::is_empty) && self.embeds.is_empty()
    }
}

/// Expand a bare `id/token` webhook suffix into a full endpoint URL
pub fn normalize_webhook_endpoint(endpoint: &str) -> String {
    let endpoint = endpoint.trim();
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!("{}{}", WEBHOOK_BASE_URL, endpoint.trim_start_matches('/'))
    }
}

pub struct WebhookClient {
    endpoint: String,
    username: Option<String>,
    avatar_url: Option<String>,
    client: Client,
}

impl WebhookClient {
    pub fn new(endpoint: &str) -> Result<Self, ChatError> {
        let client = Client::builder().timeout(DEFAULT_TIMEOUT).build()?;

        Ok(Self {
            endpoint: normalize_webhook_endpoint(endpoint),
            username: None,
            avatar_url: None,
            client,
        })
    }

    /// Override the name the webhook posts under
    pub fn with_username(mut self, username: Option<String>) -> Self {
        self.username = username;
        self
    }

    /// Override the avatar the webhook posts with
    pub fn with_avatar_url(mut self, avatar_url: Option<String>) -> Self {
        self.avatar_url = avatar_url;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Execute the webhook with the given message
    pub async fn execute(&self, message: &WebhookMessage) -> Result<(), ChatError> {
        if message.is_empty() {
            return Err(ChatError::EmptyPayload);
        }

        let mut payload = message.clone();
        if payload.username.is_none() {
            payload.username = self.username.clone();
        }
        if payload.avatar_url.is_none() {
            payload.avatar_url = self.avatar_url.clone();
        }

        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await?;

        check_status(response.status())
    }
}

fn check_status(status: StatusCode) -> Result<(), ChatError> {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        return Err(ChatError::PayloadTooLarge);
    }
    if status.is_client_error() || status.is_server_error() {
        return Err(ChatError::Rejected(status.as_u16()));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub id: i64,
    pub name: String,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ChannelsResponse {
    channels: Vec<Channel>,
}

#[derive(Debug, Serialize)]
struct SendMessagePayload<'a> {
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateChannelPayload<'a> {
    name: &'a str,
}

pub struct ChannelClient {
    url: String,
    client: Client,
}

impl ChannelClient {
    pub fn new(url: &str, token: &str) -> Result<Self, ChatError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("authorization"),
            HeaderValue::from_str(token).map_err(|_| ChatError::InvalidHeader)?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(DEFAULT_TIMEOUT)
            .build()?;

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// List all available channels
    pub async fn list_channels(&self) -> Result<Vec<Channel>, ChatError> {
        let response = self
            .client
            .get(format!("{}/channels", self.url))
            .send()
            .await?
            .error_for_status()?;

        let wrapper: ChannelsResponse = response.json().await?;
        Ok(wrapper.channels)
    }

    /// Find a channel ID by its name
    pub async fn find_channel_id_by_name(&self, name: &str) -> Result<Option<i64>, ChatError> {
        let channels = self.list_channels().await?;
        Ok(channels.into_iter().find(|c| c.name == name).map(|c| c.id))
    }

    /// Create a new channel
    pub async fn create_channel(&self, name: &str) -> Result<Channel, ChatError> {
        let response = self
            .client
            .post(format!("{}/channels/", self.url))
            .json(&CreateChannelPayload { name })
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }

    /// Send a message to a channel by name, creating the channel if it doesn't exist
    pub async fn send_message(&self, channel_name: &str, content: &str) -> Result<(), ChatError> {
        if content.trim().is_empty() {
            return Err(ChatError::EmptyPayload);
        }

        let channel_id = match self.find_channel_id_by_name(channel_name).await? {
            Some(id) => id,
            None => self.create_channel(channel_name).await?.id,
        };

        let response = self
            .client
            .post(format!("{}/channels/{}/messages", self.url, channel_id))
            .json(&SendMessagePayload { content })
            .send()
            .await?;

        check_status(response.status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[test]
    fn test_bare_webhook_suffix_gets_base_url() {
        assert_eq!(
            normalize_webhook_endpoint("123/abc-token"),
            "https://discord.com/api/webhooks/123/abc-token"
        );
        assert_eq!(
            normalize_webhook_endpoint("/123/abc-token"),
            "https://discord.com/api/webhooks/123/abc-token"
        );
    }

    #[test]
    fn test_full_webhook_url_is_kept() {
        let url = "https://discordapp.com/api/webhooks/123/abc";
        assert_eq!(normalize_webhook_endpoint(url), url);
    }

    #[test]
    fn test_embed_skips_absent_fields() {
        let embed = Embed {
            title: Some("Patch 1.2".to_string()),
            url: Some("https://example.com/patch".to_string()),
            color: Some(0x96692A),
            ..Embed::default()
        };

        let value = serde_json::to_value(WebhookMessage::with_embed(embed)).unwrap();
        assert_eq!(value["embeds"][0]["title"], "Patch 1.2");
        assert_eq!(value["embeds"][0]["color"], 0x96692A);
        assert!(value["embeds"][0].get("image").is_none());
        assert!(value["embeds"][0].get("footer").is_none());
        assert!(value.get("content").is_none());
        assert!(value.get("username").is_none());
    }

    #[test]
    fn test_embed_nested_objects_use_wire_names() {
        let embed = Embed {
            image: Some(EmbedImage {
                url: "https://cdn.example/a.png".to_string(),
            }),
            footer: Some(EmbedFooter {
                text: "Darkest Dungeon".to_string(),
                icon_url: Some("https://cdn.example/icon.png".to_string()),
            }),
            author: Some(EmbedAuthor {
                name: "Dota 2".to_string(),
                url: None,
                icon_url: None,
            }),
            ..Embed::default()
        };

        let value = serde_json::to_value(&embed).unwrap();
        assert_eq!(value["image"]["url"], "https://cdn.example/a.png");
        assert_eq!(value["footer"]["icon_url"], "https://cdn.example/icon.png");
        assert_eq!(value["author"]["name"], "Dota 2");
        assert!(value["author"].get("url").is_none());
    }

    #[test]
    fn test_empty_message_detected() {
        assert!(WebhookMessage::default().is_empty());

        let blank = WebhookMessage {
            content: Some(String::new()),
            ..WebhookMessage::default()
        };
        assert!(blank.is_empty());

        let text = WebhookMessage {
            content: Some("hello".to_string()),
            ..WebhookMessage::default()
        };
        assert!(!text.is_empty());
        assert!(!WebhookMessage::with_embed(Embed::default()).is_empty());
    }

    #[test]
    fn test_status_mapping() {
        assert!(check_status(StatusCode::NO_CONTENT).is_ok());
        assert!(matches!(
            check_status(StatusCode::PAYLOAD_TOO_LARGE),
            Err(ChatError::PayloadTooLarge)
        ));
        assert!(matches!(
            check_status(StatusCode::TOO_MANY_REQUESTS),
            Err(ChatError::Rejected(429))
        ));
    }

    #[tokio::test]
    async fn test_webhook_posts_embed_with_overrides() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/webhooks/123/abc")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "username": "Herald",
                "embeds": [{ "title": "Patch 1.2" }]
            })))
            .with_status(204)
            .create_async()
            .await;

        let client = WebhookClient::new(&format!("{}/api/webhooks/123/abc", server.url()))
            .unwrap()
            .with_username(Some("Herald".to_string()));
        let embed = Embed {
            title: Some("Patch 1.2".to_string()),
            ..Embed::default()
        };

        client.execute(&WebhookMessage::with_embed(embed)).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_webhook_413_is_payload_too_large() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/hook")
            .with_status(413)
            .create_async()
            .await;

        let client = WebhookClient::new(&format!("{}/hook", server.url())).unwrap();
        let message = WebhookMessage {
            content: Some("hello".to_string()),
            ..WebhookMessage::default()
        };

        let err = client.execute(&message).await.unwrap_err();
        assert!(matches!(err, ChatError::PayloadTooLarge));
    }

    #[tokio::test]
    async fn test_empty_webhook_payload_is_never_sent() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/hook")
            .with_status(204)
            .expect(0)
            .create_async()
            .await;

        let client = WebhookClient::new(&format!("{}/hook", server.url())).unwrap();
        let err = client.execute(&WebhookMessage::default()).await.unwrap_err();

        assert!(matches!(err, ChatError::EmptyPayload));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_channel_is_created_when_missing() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/channels")
            .with_status(200)
            .with_body(r#"{"channels":[{"id":1,"name":"general"}]}"#)
            .create_async()
            .await;
        let create = server
            .mock("POST", "/channels/")
            .match_body(Matcher::Json(serde_json::json!({ "name": "news" })))
            .with_status(201)
            .with_body(r#"{"id":9,"name":"news"}"#)
            .create_async()
            .await;
        let send = server
            .mock("POST", "/channels/9/messages")
            .match_header("authorization", "secret")
            .with_status(200)
            .create_async()
            .await;

        let client = ChannelClient::new(&server.url(), "secret").unwrap();
        client.send_message("news", "Patch 1.2 is out").await.unwrap();

        create.assert_async().await;
        send.assert_async().await;
    }
}
