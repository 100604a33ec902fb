// Outbound mail for the contact form
mod config;
mod error;
pub mod providers;

pub use config::{MailConfig, MailProviderConfig, SesConfig};
pub use error::MailError;

use async_trait::async_trait;
use std::sync::Arc;

/// One outbound message. The contact relay only ever has a single recipient,
/// with the form submitter as reply-to.
#[derive(Debug, Clone)]
pub struct MailMessage {
    pub to: String,
    pub from: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub text: String,
    pub html: Option<String>,
}

impl MailMessage {
    pub fn new(
        to: impl Into<String>,
        from: impl Into<String>,
        subject: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            to: to.into(),
            from: from.into(),
            reply_to: None,
            subject: subject.into(),
            text: text.into(),
            html: None,
        }
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    pub fn with_reply_to(mut self, reply_to: impl Into<String>) -> Self {
        self.reply_to = Some(reply_to.into());
        self
    }
}

#[async_trait]
pub trait MailProvider: Send + Sync {
    async fn send(&self, message: MailMessage) -> Result<(), MailError>;
    fn name(&self) -> &str;
}

pub type DynMailProvider = Arc<dyn MailProvider>;

pub async fn create_provider(config: &MailProviderConfig) -> Result<DynMailProvider, MailError> {
    match config {
        MailProviderConfig::Ses(ses_config) => Ok(Arc::new(
            providers::ses::SesProvider::new(ses_config).await?,
        )),
        MailProviderConfig::Null => Ok(Arc::new(providers::null::NullProvider)),
    }
}
