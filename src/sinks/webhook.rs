use async_trait::async_trait;
use chatpost::{Embed, EmbedAuthor, EmbedFooter, EmbedImage, WebhookClient, WebhookMessage};

use super::DeliverySink;
use crate::domain::Notification;
use crate::errors::HeraldResult;

/// Posts each notification as a single rich embed.
pub struct WebhookSink {
    client: WebhookClient,
}

impl WebhookSink {
    pub fn new(client: WebhookClient) -> Self {
        Self { client }
    }

    pub fn endpoint(&self) -> &str {
        self.client.endpoint()
    }
}

fn non_empty(value: &str) -> Option<String> {
    Some(value.to_string()).filter(|v| !v.is_empty())
}

/// Webhook wire form of a notification
pub fn to_message(notification: &Notification) -> WebhookMessage {
    let embed = Embed {
        title: non_empty(&notification.title),
        description: non_empty(&notification.body),
        url: non_empty(&notification.link),
        color: Some(notification.color),
        image: notification.image.clone().map(|url| EmbedImage { url }),
        thumbnail: notification.thumbnail.clone().map(|url| EmbedImage { url }),
        author: notification.author.as_ref().map(|a| EmbedAuthor {
            name: a.name.clone(),
            url: a.url.clone(),
            icon_url: a.icon_url.clone(),
        }),
        footer: notification.footer.as_ref().map(|f| EmbedFooter {
            text: f.text.clone(),
            icon_url: f.icon_url.clone(),
        }),
    };

    WebhookMessage::with_embed(embed)
}

#[async_trait]
impl DeliverySink for WebhookSink {
    async fn deliver(&self, notification: &Notification) -> HeraldResult<()> {
        self.client.execute(&to_message(notification)).await?;
        Ok(())
    }
}
