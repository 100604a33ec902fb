use async_trait::async_trait;
use tracing::{debug, info};

use crate::mail::{MailError, MailMessage, MailProvider};

/// Logs messages instead of sending them. Useful for local development and
/// deployments that have no mail credentials yet.
pub struct NullProvider;

#[async_trait]
impl MailProvider for NullProvider {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        info!(
            "null mail provider: to={} from={} reply_to={} subject={:?}",
            message.to,
            message.from,
            message.reply_to.as_deref().unwrap_or("-"),
            message.subject
        );
        debug!("null mail provider body:\n{}", message.text);
        Ok(())
    }

    fn name(&self) -> &str {
        "null"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_always_succeeds() {
        let message = MailMessage::new(
            "owner@example.com",
            "noreply@example.com",
            "Test",
            "body",
        )
        .with_reply_to("visitor@example.com")
        .with_html("<p>body</p>");

        assert!(NullProvider.send(message).await.is_ok());
        assert_eq!(NullProvider.name(), "null");
    }
}
