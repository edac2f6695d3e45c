//! 认证中间件

use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use super::state::AppState;
use crate::domain::Actor;

/// 当前调用者
///
/// 由 [`auth_middleware`] 放入请求扩展；缺失时视为匿名
pub struct CurrentActor(pub Actor);

impl<S> FromRequestParts<S> for CurrentActor
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<Actor>().cloned().unwrap_or_default()))
    }
}

/// Bearer 认证中间件
///
/// - 没有 Authorization 头或不是 Bearer 方案：匿名
/// - 令牌无效、过期或用户已不存在：401
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string());

    let actor = match token {
        None => Actor::Anonymous,
        Some(token) => {
            let resolved = match state.tokens.validate_access_token(&token) {
                Ok(claims) => state.accounts.resolve_actor(&claims).await,
                Err(e) => Err(e),
            };

            match resolved {
                Ok(actor) => {
                    if let Some(principal) = actor.principal() {
                        debug!(user_id = %principal.id, role = %principal.role, "Request authenticated");
                    }
                    actor
                }
                Err(e) => {
                    warn!(error = %e, "Token rejected");
                    return e.into_response();
                }
            }
        }
    };

    request.extensions_mut().insert(actor);
    next.run(request).await
}
