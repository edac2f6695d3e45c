//! 分类、体裁与作品

use axum::{
    Json,
    extract::{OriginalUri, State},
    http::StatusCode,
};
use yamdb_common::TitleId;
use yamdb_errors::{AppError, AppResult};

use super::replace_not_allowed;
use crate::api::http::extract::{ValidJson, ValidPath, ValidQuery};
use crate::api::http::middleware::CurrentActor;
use crate::api::http::pagination::{ListResponse, PageQuery};
use crate::api::http::state::AppState;
use crate::application::{SlugCreate, SlugView, TitleCreate, TitlePatch, TitleQuery, TitleView};
use crate::domain::ResourceKind;

// ============================================================================
// 分类
// ============================================================================

pub async fn list_categories(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    ValidQuery(query): ValidQuery<PageQuery>,
) -> AppResult<Json<ListResponse<SlugView>>> {
    let page = state.page(query.limit, query.offset);
    let categories = state
        .catalog
        .list_categories(query.search.as_deref(), page)
        .await?;
    Ok(Json(ListResponse::from_page(categories, &uri)))
}

pub async fn create_category(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ValidJson(input): ValidJson<SlugCreate>,
) -> AppResult<(StatusCode, Json<SlugView>)> {
    let category = state.catalog.create_category(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn get_category(
    State(state): State<AppState>,
    ValidPath(slug): ValidPath<String>,
) -> AppResult<Json<SlugView>> {
    Ok(Json(state.catalog.get_category(&slug).await?))
}

pub async fn delete_category(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ValidPath(slug): ValidPath<String>,
) -> AppResult<StatusCode> {
    state.catalog.delete_category(&actor, &slug).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// 体裁
// ============================================================================

pub async fn list_genres(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    ValidQuery(query): ValidQuery<PageQuery>,
) -> AppResult<Json<ListResponse<SlugView>>> {
    let page = state.page(query.limit, query.offset);
    let genres = state
        .catalog
        .list_genres(query.search.as_deref(), page)
        .await?;
    Ok(Json(ListResponse::from_page(genres, &uri)))
}

pub async fn create_genre(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ValidJson(input): ValidJson<SlugCreate>,
) -> AppResult<(StatusCode, Json<SlugView>)> {
    let genre = state.catalog.create_genre(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(genre)))
}

pub async fn get_genre(
    State(state): State<AppState>,
    ValidPath(slug): ValidPath<String>,
) -> AppResult<Json<SlugView>> {
    Ok(Json(state.catalog.get_genre(&slug).await?))
}

pub async fn delete_genre(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ValidPath(slug): ValidPath<String>,
) -> AppResult<StatusCode> {
    state.catalog.delete_genre(&actor, &slug).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// 作品
// ============================================================================

pub async fn list_titles(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    ValidQuery(query): ValidQuery<PageQuery>,
    ValidQuery(filter): ValidQuery<TitleQuery>,
) -> AppResult<Json<ListResponse<TitleView>>> {
    let page = state.page(query.limit, query.offset);
    let titles = state.catalog.list_titles(filter, page).await?;
    Ok(Json(ListResponse::from_page(titles, &uri)))
}

pub async fn create_title(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ValidJson(input): ValidJson<TitleCreate>,
) -> AppResult<(StatusCode, Json<TitleView>)> {
    let title = state.catalog.create_title(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(title)))
}

pub async fn get_title(
    State(state): State<AppState>,
    ValidPath(title_id): ValidPath<i64>,
) -> AppResult<Json<TitleView>> {
    Ok(Json(state.catalog.get_title(TitleId(title_id)).await?))
}

pub async fn update_title(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ValidPath(title_id): ValidPath<i64>,
    ValidJson(input): ValidJson<TitlePatch>,
) -> AppResult<Json<TitleView>> {
    Ok(Json(
        state
            .catalog
            .update_title(&actor, TitleId(title_id), input)
            .await?,
    ))
}

pub async fn replace_title(CurrentActor(actor): CurrentActor) -> AppError {
    replace_not_allowed(&actor, ResourceKind::Title)
}

pub async fn delete_title(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ValidPath(title_id): ValidPath<i64>,
) -> AppResult<StatusCode> {
    state.catalog.delete_title(&actor, TitleId(title_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
