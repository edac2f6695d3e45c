//! Email 适配器
//!
//! 提供邮件发送功能，支持：
//! - SMTP 投递（lettre）
//! - 仅写日志的开发投递
//! - 确认码模板渲染

mod client;
mod log_sender;
mod template;

pub use client::EmailClient;
pub use log_sender::LogEmailSender;
pub use template::{CONFIRMATION_SUBJECT, ConfirmationEmail, EmailTemplate};

use std::sync::Arc;
use yamdb_config::{EmailConfig, EmailTransport};
use yamdb_errors::AppResult;
use yamdb_ports::EmailSender;

/// 按配置选择投递方式
pub fn build_sender(config: &EmailConfig) -> AppResult<Arc<dyn EmailSender>> {
    match config.transport {
        EmailTransport::Smtp => Ok(Arc::new(EmailClient::new(config.clone())?)),
        EmailTransport::Log => Ok(Arc::new(LogEmailSender::new(config.from_email.clone()))),
    }
}
