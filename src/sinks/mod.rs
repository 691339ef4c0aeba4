//! Delivery sinks: where formatted notifications end up.

pub mod channel;
pub mod webhook;

use async_trait::async_trait;

use crate::domain::Notification;
use crate::errors::HeraldResult;

pub use channel::ChannelSink;
pub use webhook::WebhookSink;

/// Accepts a notification for delivery. `Ok` means the destination took it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeliverySink: Send + Sync {
    async fn deliver(&self, notification: &Notification) -> HeraldResult<()>;
}

/// Dry-run sink: logs what would have been sent.
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl DeliverySink for LogSink {
    async fn deliver(&self, notification: &Notification) -> HeraldResult<()> {
        tracing::info!(
            source = %notification.source_label,
            link = %notification.link,
            "[DRY RUN] {}",
            notification.format()
        );
        Ok(())
    }
}
