//! SMTP 邮件客户端实现

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart, SinglePart, header};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::ExposeSecret;
use std::time::Duration;
use tracing::{debug, info};
use yamdb_config::EmailConfig;
use yamdb_errors::{AppError, AppResult};
use yamdb_ports::{EmailSender, OutgoingEmail};

/// 邮件客户端
pub struct EmailClient {
    config: EmailConfig,
    from: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl EmailClient {
    /// 创建新的邮件客户端
    pub fn new(config: EmailConfig) -> AppResult<Self> {
        let from = format!("{} <{}>", config.from_name, config.from_email)
            .parse::<Mailbox>()
            .map_err(|e| AppError::internal(format!("Invalid from address: {}", e)))?;
        let transport = Self::build_transport(&config)?;

        Ok(Self {
            config,
            from,
            transport,
        })
    }

    /// 构建 SMTP 传输
    fn build_transport(config: &EmailConfig) -> AppResult<AsyncSmtpTransport<Tokio1Executor>> {
        let builder = if config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host).map_err(
                |e| AppError::internal(format!("Failed to create SMTP transport: {}", e)),
            )?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
        };

        let mut builder = builder
            .port(config.smtp_port)
            .timeout(Some(Duration::from_secs(config.timeout_secs)));

        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.expose_secret().clone(),
            ));
        }

        Ok(builder.build())
    }

    /// 构建邮件消息
    fn build_message(&self, email: &OutgoingEmail) -> AppResult<Message> {
        let to = email
            .to
            .parse::<Mailbox>()
            .map_err(|e| AppError::validation(format!("Invalid to address: {}", e)))?;

        let text_part = SinglePart::builder()
            .header(header::ContentType::TEXT_PLAIN)
            .body(email.text_body.clone());

        let body = match &email.html_body {
            Some(html) => MultiPart::alternative().singlepart(text_part).singlepart(
                SinglePart::builder()
                    .header(header::ContentType::TEXT_HTML)
                    .body(html.clone()),
            ),
            None => MultiPart::alternative().singlepart(text_part),
        };

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(&email.subject)
            .multipart(body)
            .map_err(|e| AppError::internal(format!("Failed to build message: {}", e)))
    }
}

#[async_trait]
impl EmailSender for EmailClient {
    async fn send(&self, email: OutgoingEmail) -> AppResult<()> {
        debug!(to = %email.to, subject = %email.subject, host = %self.config.smtp_host, "Sending email");

        let message = self.build_message(&email)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::external_service(format!("Failed to send email: {}", e)))?;

        info!(to = %email.to, subject = %email.subject, "Email sent successfully");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EmailConfig {
        EmailConfig {
            smtp_host: "smtp.example.com".to_string(),
            username: "user@example.com".to_string(),
            password: secrecy::Secret::new("password".to_string()),
            from_email: "noreply@example.com".to_string(),
            from_name: "YamDB".to_string(),
            ..EmailConfig::default()
        }
    }

    #[tokio::test]
    async fn test_build_message() {
        let client = EmailClient::new(config()).unwrap();
        let email = OutgoingEmail::text("test@example.com", "Test Subject", "Test")
            .with_html("<h1>Test</h1>");

        assert!(client.build_message(&email).is_ok());
    }

    #[tokio::test]
    async fn test_invalid_recipient_is_validation_error() {
        let client = EmailClient::new(config()).unwrap();
        let email = OutgoingEmail::text("not an address", "Test Subject", "Test");

        let err = client.build_message(&email).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_invalid_from_address() {
        let config = EmailConfig {
            from_email: "broken".to_string(),
            ..config()
        };
        assert!(EmailClient::new(config).is_err());
    }
}
