use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationTemplate {
    OfferReceived,
    OfferAccepted,
    OfferDeclined,
    BookingConfirmed,
    BookingRejected,
    BookingCancelled,
}

/// Fire-and-forget delivery of user-facing events.
///
/// Consumed, never owned, by the negotiation services; a failed delivery
/// is the caller's to log and swallow, it must never surface into the
/// triggering operation's outcome.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        recipient: Uuid,
        template: NotificationTemplate,
        payload: serde_json::Value,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Delivery stand-in that writes the notification to the log stream
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(
        &self,
        recipient: Uuid,
        template: NotificationTemplate,
        payload: serde_json::Value,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        tracing::info!(%recipient, ?template, %payload, "notification dispatched");
        Ok(())
    }
}
