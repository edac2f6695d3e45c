//! 集成测试公共设施
//!
//! 路由挂在内存存储上，邮件留在 `RecordingEmailSender` 里

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use serde_json::Value;
use tower::ServiceExt;
use yamdb_adapter_email::EmailTemplate;
use yamdb_api::api::http::{AppState, router};
use yamdb_api::domain::{NewUser, Role, User, UserRepository};
use yamdb_api::infrastructure::{MemoryStore, Repositories};
use yamdb_auth_core::TokenService;
use yamdb_common::PageLimits;
use yamdb_ports::RecordingEmailSender;

pub const SECRET: &str = "integration-test-secret";
pub const ISSUER: &str = "yamdb";
pub const AUDIENCE: &str = "yamdb-api";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: MemoryStore,
    pub mailer: RecordingEmailSender,
    pub tokens: Arc<TokenService>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_page_limits(PageLimits::default())
    }

    pub fn with_page_limits(limits: PageLimits) -> Self {
        let store = MemoryStore::new();
        let mailer = RecordingEmailSender::new();
        let tokens = Arc::new(TokenService::new(SECRET, 3600, ISSUER, AUDIENCE));

        let state = AppState::new(
            Repositories::memory(store.clone()),
            tokens.clone(),
            Arc::new(mailer.clone()),
            Arc::new(EmailTemplate::builtin().unwrap()),
            limits,
        );

        Self {
            router: router(state.clone()),
            state,
            store,
            mailer,
            tokens,
        }
    }

    /// 发送请求，返回状态码与 JSON 响应体（空响应体为 `Value::Null`）
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, token, None).await
    }

    /// 直接在存储中创建用户
    pub async fn create_user(&self, username: &str, role: Role) -> User {
        UserRepository::create(
            &self.store,
            &NewUser::signup(username, format!("{}@example.com", username)).with_role(role),
        )
        .await
        .unwrap()
    }

    pub fn token_for(&self, user: &User) -> String {
        self.tokens
            .generate_access_token(user.id, &user.username, user.role.as_str())
            .unwrap()
    }

    /// 创建用户并签发令牌
    pub async fn login(&self, username: &str, role: Role) -> (User, String) {
        let user = self.create_user(username, role).await;
        let token = self.token_for(&user);
        (user, token)
    }

    /// 最近一封发给该邮箱的确认码
    pub async fn confirmation_code_for(&self, email: &str) -> Option<String> {
        let mail = self.mailer.last_to(email).await?;
        mail.text_body
            .lines()
            .find(|line| line.contains("confirmation code:"))
            .and_then(|line| line.split_whitespace().last())
            .map(str::to_string)
    }

    /// 管理员建好分类与体裁后创建一个作品，返回作品 ID
    ///
    /// 分类与体裁已存在时创建请求返回 400，忽略即可
    pub async fn seed_title(&self, admin_token: &str, name: &str) -> i64 {
        for (path, slug) in [("categories", "film"), ("genres", "drama")] {
            self.post(
                &format!("/api/v1/{}", path),
                Some(admin_token),
                serde_json::json!({ "name": slug, "slug": slug }),
            )
            .await;
        }

        let (status, body) = self
            .post(
                "/api/v1/titles",
                Some(admin_token),
                serde_json::json!({
                    "name": name,
                    "year": 1979,
                    "genre": ["drama"],
                    "category": "film",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["id"].as_i64().unwrap()
    }
}
