//! 注册与令牌

use axum::{Json, extract::State};
use yamdb_errors::AppResult;

use crate::api::http::extract::ValidJson;
use crate::api::http::state::AppState;
use crate::application::{SignupRequest, SignupResponse, TokenRequest, TokenResponse};

/// POST /auth/signup
pub async fn signup(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<SignupRequest>,
) -> AppResult<Json<SignupResponse>> {
    Ok(Json(state.accounts.signup(input).await?))
}

/// POST /auth/token
pub async fn token(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<TokenRequest>,
) -> AppResult<Json<TokenResponse>> {
    Ok(Json(state.accounts.issue_token(input).await?))
}
