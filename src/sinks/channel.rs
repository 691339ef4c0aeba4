use async_trait::async_trait;
use chatpost::{ChannelClient, ChatError};

use super::DeliverySink;
use crate::domain::Notification;
use crate::errors::HeraldResult;

/// Posts the plain-text rendering of each notification to a named channel.
pub struct ChannelSink {
    client: ChannelClient,
    channel: String,
}

impl ChannelSink {
    pub fn new(client: ChannelClient, channel: &str) -> Self {
        Self {
            client,
            channel: channel.to_string(),
        }
    }

    async fn send(&self, message: &str) -> Result<(), ChatError> {
        self.client.send_message(&self.channel, message).await
    }
}

#[async_trait]
impl DeliverySink for ChannelSink {
    /// Send the full message, shrinking the body while the channel says it is too large
    async fn deliver(&self, notification: &Notification) -> HeraldResult<()> {
        match self.send(&notification.format()).await {
            Ok(()) => return Ok(()),
            Err(ChatError::PayloadTooLarge) => {}
            Err(e) => return Err(e.into()),
        }

        let mut shorter = notification.clone();
        let mut high = notification.body.chars().count();

        while high > 0 {
            let mid = high / 2;
            shorter.body = notification.body.chars().take(mid).collect();

            match self.send(&shorter.format()).await {
                Ok(()) => return Ok(()),
                Err(ChatError::PayloadTooLarge) => high = mid,
                Err(e) => return Err(e.into()),
            }
        }

        shorter.body = String::new();
        self.send(&shorter.format()).await?;
        Ok(())
    }
}
