use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use url::Url;

use super::templates;
use super::templates::RenderedEmail;
use crate::account::errors::EmailSenderError;
use crate::account::models::DeliveryResult;
use crate::account::models::EmailAddress;
use crate::account::ports::EmailSender;
use crate::config::EmailConfig;

const SEND_PATH: &str = "v3/mail/send";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct MailRequest<'a> {
    personalizations: Vec<Personalization<'a>>,
    from: Mailbox<'a>,
    subject: &'a str,
    content: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Personalization<'a> {
    to: Vec<Mailbox<'a>>,
}

#[derive(Debug, Serialize)]
struct Mailbox<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    value: &'a str,
}

/// Email sender backed by the SendGrid v3 HTTP API.
pub struct SendGridEmailSender {
    client: reqwest::Client,
    endpoint: Url,
    api_key: String,
    from_address: String,
}

impl SendGridEmailSender {
    /// Create a sender for the configured SendGrid account.
    ///
    /// # Errors
    /// Fails when `api_url` is not a valid URL or the HTTP client cannot be built
    pub fn new(config: &EmailConfig) -> Result<Self, anyhow::Error> {
        let base = Url::parse(&format!("{}/", config.api_url.trim_end_matches('/')))?;
        let endpoint = base.join(SEND_PATH)?;
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        tracing::info!(endpoint = %endpoint, from = %config.from_address, "SendGrid email sender initialized");

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
            from_address: config.from_address.clone(),
        })
    }

    async fn send(
        &self,
        address: &EmailAddress,
        email: RenderedEmail,
    ) -> Result<DeliveryResult, EmailSenderError> {
        let request = MailRequest {
            personalizations: vec![Personalization {
                to: vec![Mailbox {
                    email: address.as_str(),
                }],
            }],
            from: Mailbox {
                email: &self.from_address,
            },
            subject: &email.subject,
            content: vec![Content {
                kind: "text/html",
                value: &email.html,
            }],
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_builder() {
                    EmailSenderError::InvalidRequest(e.to_string())
                } else {
                    EmailSenderError::Unreachable(e.to_string())
                }
            })?;

        let status = response.status();
        tracing::debug!(status = status.as_u16(), "SendGrid responded");

        Ok(DeliveryResult {
            success: status.is_success(),
            transport_status: status.as_u16(),
        })
    }
}

#[async_trait]
impl EmailSender for SendGridEmailSender {
    async fn send_confirmation_email(
        &self,
        address: &EmailAddress,
        link: &Url,
    ) -> Result<DeliveryResult, EmailSenderError> {
        self.send(address, templates::confirmation_email(link)).await
    }

    async fn send_password_reset_email(
        &self,
        address: &EmailAddress,
        link: &Url,
    ) -> Result<DeliveryResult, EmailSenderError> {
        self.send(address, templates::password_reset_email(link))
            .await
    }
}
