//! 邮件模板系统

use std::collections::HashMap;
use tera::Tera;
use yamdb_errors::{AppError, AppResult};
use yamdb_ports::OutgoingEmail;

const CONFIRMATION_TEXT: &str = "confirmation_code.txt";
const CONFIRMATION_HTML: &str = "confirmation_code.html";

const CONFIRMATION_TEXT_BODY: &str = "\
Hello, {{ username }}!

Your YamDB confirmation code: {{ confirmation_code }}

Exchange it for an access token at POST /api/v1/auth/token.
";

const CONFIRMATION_HTML_BODY: &str = "\
<p>Hello, <strong>{{ username }}</strong>!</p>
<p>Your YamDB confirmation code: <code>{{ confirmation_code }}</code></p>
";

/// 确认码邮件主题
pub const CONFIRMATION_SUBJECT: &str = "YamDB confirmation code";

/// 确认码邮件参数
#[derive(Debug, Clone)]
pub struct ConfirmationEmail<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub confirmation_code: &'a str,
}

/// 邮件模板管理器
pub struct EmailTemplate {
    tera: Tera,
}

impl EmailTemplate {
    /// 使用内置模板
    pub fn builtin() -> AppResult<Self> {
        Self::from_strings(HashMap::from([
            (CONFIRMATION_TEXT.to_string(), CONFIRMATION_TEXT_BODY.to_string()),
            (CONFIRMATION_HTML.to_string(), CONFIRMATION_HTML_BODY.to_string()),
        ]))
    }

    /// 从内存中的模板字符串创建
    pub fn from_strings(templates: HashMap<String, String>) -> AppResult<Self> {
        let mut tera = Tera::default();

        for (name, content) in templates {
            tera.add_raw_template(&name, &content).map_err(|e| {
                AppError::internal(format!("Failed to add template {}: {}", name, e))
            })?;
        }

        Ok(Self { tera })
    }

    /// 渲染模板
    pub fn render(&self, template_name: &str, context: &serde_json::Value) -> AppResult<String> {
        let context = tera::Context::from_serialize(context)
            .map_err(|e| AppError::internal(format!("Failed to create template context: {}", e)))?;

        self.tera.render(template_name, &context).map_err(|e| {
            AppError::internal(format!("Failed to render template {}: {}", template_name, e))
        })
    }

    /// 渲染确认码邮件
    pub fn render_confirmation(&self, params: &ConfirmationEmail<'_>) -> AppResult<OutgoingEmail> {
        let context = serde_json::json!({
            "username": params.username,
            "confirmation_code": params.confirmation_code,
        });

        let text = self.render(CONFIRMATION_TEXT, &context)?;
        let html = self.render(CONFIRMATION_HTML, &context)?;

        Ok(OutgoingEmail::text(params.email, CONFIRMATION_SUBJECT, text).with_html(html))
    }
}
