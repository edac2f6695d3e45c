//! Email sender trait 定义

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use yamdb_errors::AppResult;

/// 出站邮件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: Option<String>,
}

impl OutgoingEmail {
    pub fn text(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            text_body: body.into(),
            html_body: None,
        }
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html_body = Some(html.into());
        self
    }
}

/// 邮件发送接口
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// 投递一封邮件
    async fn send(&self, email: OutgoingEmail) -> AppResult<()>;
}

/// 把邮件留在内存里的发送器，测试时用来读取确认码
#[derive(Debug, Clone, Default)]
pub struct RecordingEmailSender {
    sent: Arc<Mutex<Vec<OutgoingEmail>>>,
}

impl RecordingEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().await.clone()
    }

    /// 最近一封发往 `to` 的邮件
    pub async fn last_to(&self, to: &str) -> Option<OutgoingEmail> {
        self.sent
            .lock()
            .await
            .iter()
            .rev()
            .find(|e| e.to == to)
            .cloned()
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send(&self, email: OutgoingEmail) -> AppResult<()> {
        self.sent.lock().await.push(email);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recording_sender_keeps_latest_per_recipient() {
        let sender = RecordingEmailSender::new();
        sender
            .send(OutgoingEmail::text("a@example.com", "first", "1"))
            .await
            .unwrap();
        sender
            .send(OutgoingEmail::text("b@example.com", "other", "2"))
            .await
            .unwrap();
        sender
            .send(OutgoingEmail::text("a@example.com", "second", "3"))
            .await
            .unwrap();

        assert_eq!(sender.sent().await.len(), 3);
        assert_eq!(sender.last_to("a@example.com").await.unwrap().subject, "second");
        assert!(sender.last_to("c@example.com").await.is_none());
    }
}
