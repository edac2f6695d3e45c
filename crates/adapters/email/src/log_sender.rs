//! 只写日志的邮件发送器

use async_trait::async_trait;
use tracing::info;
use yamdb_errors::AppResult;
use yamdb_ports::{EmailSender, OutgoingEmail};

/// 把邮件内容写进日志，开发环境下代替 SMTP
#[derive(Debug, Clone)]
pub struct LogEmailSender {
    from_email: String,
}

impl LogEmailSender {
    pub fn new(from_email: impl Into<String>) -> Self {
        Self {
            from_email: from_email.into(),
        }
    }
}

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, email: OutgoingEmail) -> AppResult<()> {
        info!(
            from = %self.from_email,
            to = %email.to,
            subject = %email.subject,
            body = %email.text_body,
            "Email delivered to log"
        );
        Ok(())
    }
}
