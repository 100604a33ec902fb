use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_sesv2::{
    Client,
    config::{Credentials, Region},
    types::{Body, Content, Destination, EmailContent, Message},
};
use tracing::debug;

use crate::mail::{MailError, MailMessage, MailProvider, SesConfig};

pub struct SesProvider {
    client: Client,
}

impl SesProvider {
    pub async fn new(config: &SesConfig) -> Result<Self, MailError> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }

        // Explicit credentials when configured, the default provider chain
        // otherwise.
        if let (Some(access_key), Some(secret_key)) =
            (&config.access_key_id, &config.secret_access_key)
        {
            let credentials =
                Credentials::new(access_key, secret_key, None, None, "obscura-ses-provider");
            loader = loader.credentials_provider(credentials);
        }

        let aws_config = loader.load().await;
        Ok(Self {
            client: Client::new(&aws_config),
        })
    }

    fn content(data: &str) -> Result<Content, MailError> {
        Content::builder()
            .data(data)
            .charset("UTF-8")
            .build()
            .map_err(|build_error| MailError::Provider(build_error.to_string()))
    }
}

#[async_trait]
impl MailProvider for SesProvider {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        debug!("sending mail via SES to {}", message.to);

        let destination = Destination::builder()
            .to_addresses(message.to.clone())
            .build();

        let mut body = Body::builder().text(Self::content(&message.text)?);
        if let Some(html) = &message.html {
            body = body.html(Self::content(html)?);
        }

        let email = Message::builder()
            .subject(Self::content(&message.subject)?)
            .body(body.build())
            .build();

        let mut request = self
            .client
            .send_email()
            .destination(destination)
            .from_email_address(message.from.clone())
            .content(EmailContent::builder().simple(email).build());
        if let Some(reply_to) = &message.reply_to {
            request = request.reply_to_addresses(reply_to.clone());
        }

        request
            .send()
            .await
            .map_err(|send_error| MailError::Provider(send_error.to_string()))?;

        debug!("SES accepted message to {}", message.to);
        Ok(())
    }

    fn name(&self) -> &str {
        "ses"
    }
}
