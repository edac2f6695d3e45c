//! HTTP 处理器

pub mod auth;
pub mod catalog;
pub mod reviews;
pub mod users;

use axum::http::Method;
use yamdb_errors::AppError;

use crate::application::authorize;
use crate::domain::{Action, Actor, ResourceKind};

/// PUT 整体替换统一由访问策略拒绝
pub(crate) fn replace_not_allowed(actor: &Actor, kind: ResourceKind) -> AppError {
    match authorize(actor, Action::Replace, kind, None) {
        Err(e) => e,
        Ok(()) => AppError::method_not_allowed("Method \"PUT\" not allowed"),
    }
}

/// 路径存在但没有对应方法的请求，与策略拒绝的 405 保持同一响应格式
pub(crate) async fn method_not_allowed(method: Method) -> AppError {
    AppError::method_not_allowed(format!("Method \"{}\" not allowed", method))
}
