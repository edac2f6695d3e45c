//! 用户管理与个人资料

use axum::{
    Json,
    extract::{OriginalUri, State},
    http::StatusCode,
};
use yamdb_errors::{AppError, AppResult};

use super::replace_not_allowed;
use crate::api::http::extract::{ValidJson, ValidPath, ValidQuery};
use crate::api::http::middleware::CurrentActor;
use crate::api::http::pagination::{ListResponse, PageQuery};
use crate::api::http::state::AppState;
use crate::application::{UserCreate, UserPatch, UserView};
use crate::domain::ResourceKind;

pub async fn list_users(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    OriginalUri(uri): OriginalUri,
    ValidQuery(query): ValidQuery<PageQuery>,
) -> AppResult<Json<ListResponse<UserView>>> {
    let page = state.page(query.limit, query.offset);
    let users = state
        .accounts
        .list_users(&actor, query.search.as_deref(), page)
        .await?;
    Ok(Json(ListResponse::from_page(users, &uri)))
}

pub async fn create_user(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ValidJson(input): ValidJson<UserCreate>,
) -> AppResult<(StatusCode, Json<UserView>)> {
    let user = state.accounts.create_user(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_user(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ValidPath(username): ValidPath<String>,
) -> AppResult<Json<UserView>> {
    Ok(Json(state.accounts.get_user(&actor, &username).await?))
}

pub async fn update_user(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ValidPath(username): ValidPath<String>,
    ValidJson(input): ValidJson<UserPatch>,
) -> AppResult<Json<UserView>> {
    Ok(Json(
        state.accounts.update_user(&actor, &username, input).await?,
    ))
}

pub async fn replace_user(CurrentActor(actor): CurrentActor) -> AppError {
    replace_not_allowed(&actor, ResourceKind::UserAccount)
}

pub async fn delete_user(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ValidPath(username): ValidPath<String>,
) -> AppResult<StatusCode> {
    state.accounts.delete_user(&actor, &username).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /users/me
pub async fn get_me(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> AppResult<Json<UserView>> {
    Ok(Json(state.accounts.get_self(&actor).await?))
}

/// PATCH /users/me
pub async fn update_me(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ValidJson(input): ValidJson<UserPatch>,
) -> AppResult<Json<UserView>> {
    Ok(Json(state.accounts.update_self(&actor, input).await?))
}

pub async fn replace_me(CurrentActor(actor): CurrentActor) -> AppError {
    replace_not_allowed(&actor, ResourceKind::OwnProfile)
}
