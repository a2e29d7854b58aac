use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType, transport::smtp::authentication::Credentials,
};
use std::time::Duration;
use tracing::debug;

use super::EmailSender;
use crate::error::EngineError;
use crate::settings::SmtpSettings;

/// SMTP email sender built on lettre's async transport.
pub struct SmtpEmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
    timeout: Duration,
}

impl SmtpEmailSender {
    /// Builds a sender from SMTP settings.
    pub fn new(settings: &SmtpSettings, timeout: Duration) -> Result<Self, EngineError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
            .map_err(|e| EngineError::send_failed(e.to_string()))?
            .port(settings.port);

        if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from_address: settings.from_address.clone(),
            timeout,
        })
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), EngineError> {
        let message = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|e| EngineError::send_failed(format!("invalid from address: {e}")))?,
            )
            .to(to
                .parse()
                .map_err(|e| EngineError::send_failed(format!("invalid recipient: {e}")))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| EngineError::send_failed(e.to_string()))?;

        let send = self.transport.send(message);
        match tokio::time::timeout(self.timeout, send).await {
            Ok(Ok(_)) => {
                debug!(to = %to, subject = %subject, "email handed off to SMTP relay");
                Ok(())
            }
            Ok(Err(e)) => Err(EngineError::send_failed(e.to_string())),
            Err(_) => Err(EngineError::timeout(format!(
                "email to {to} exceeded {:?}",
                self.timeout
            ))),
        }
    }
}
