//! 评论与回复

use axum::{
    Json,
    extract::{OriginalUri, State},
    http::StatusCode,
};
use yamdb_common::{CommentId, ReviewId, TitleId};
use yamdb_errors::{AppError, AppResult};

use super::replace_not_allowed;
use crate::api::http::extract::{ValidJson, ValidPath, ValidQuery};
use crate::api::http::middleware::CurrentActor;
use crate::api::http::pagination::{ListResponse, PageQuery};
use crate::api::http::state::AppState;
use crate::application::{
    CommentCreate, CommentPatch, CommentView, ReviewCreate, ReviewPatch, ReviewView,
};
use crate::domain::ResourceKind;

// ============================================================================
// 评论
// ============================================================================

pub async fn list_reviews(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    ValidPath(title_id): ValidPath<i64>,
    ValidQuery(query): ValidQuery<PageQuery>,
) -> AppResult<Json<ListResponse<ReviewView>>> {
    let page = state.page(query.limit, query.offset);
    let reviews = state.reviews.list_reviews(TitleId(title_id), page).await?;
    Ok(Json(ListResponse::from_page(reviews, &uri)))
}

pub async fn create_review(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ValidPath(title_id): ValidPath<i64>,
    ValidJson(input): ValidJson<ReviewCreate>,
) -> AppResult<(StatusCode, Json<ReviewView>)> {
    let review = state
        .reviews
        .create_review(&actor, TitleId(title_id), input)
        .await?;
    Ok((StatusCode::CREATED, Json(review)))
}

pub async fn get_review(
    State(state): State<AppState>,
    ValidPath((title_id, review_id)): ValidPath<(i64, i64)>,
) -> AppResult<Json<ReviewView>> {
    Ok(Json(
        state
            .reviews
            .get_review(TitleId(title_id), ReviewId(review_id))
            .await?,
    ))
}

pub async fn update_review(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ValidPath((title_id, review_id)): ValidPath<(i64, i64)>,
    ValidJson(input): ValidJson<ReviewPatch>,
) -> AppResult<Json<ReviewView>> {
    Ok(Json(
        state
            .reviews
            .update_review(&actor, TitleId(title_id), ReviewId(review_id), input)
            .await?,
    ))
}

pub async fn replace_review(CurrentActor(actor): CurrentActor) -> AppError {
    replace_not_allowed(&actor, ResourceKind::Review)
}

pub async fn delete_review(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ValidPath((title_id, review_id)): ValidPath<(i64, i64)>,
) -> AppResult<StatusCode> {
    state
        .reviews
        .delete_review(&actor, TitleId(title_id), ReviewId(review_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// 回复
// ============================================================================

pub async fn list_comments(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    ValidPath((title_id, review_id)): ValidPath<(i64, i64)>,
    ValidQuery(query): ValidQuery<PageQuery>,
) -> AppResult<Json<ListResponse<CommentView>>> {
    let page = state.page(query.limit, query.offset);
    let comments = state
        .reviews
        .list_comments(TitleId(title_id), ReviewId(review_id), page)
        .await?;
    Ok(Json(ListResponse::from_page(comments, &uri)))
}

pub async fn create_comment(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ValidPath((title_id, review_id)): ValidPath<(i64, i64)>,
    ValidJson(input): ValidJson<CommentCreate>,
) -> AppResult<(StatusCode, Json<CommentView>)> {
    let comment = state
        .reviews
        .create_comment(&actor, TitleId(title_id), ReviewId(review_id), input)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn get_comment(
    State(state): State<AppState>,
    ValidPath((title_id, review_id, comment_id)): ValidPath<(i64, i64, i64)>,
) -> AppResult<Json<CommentView>> {
    Ok(Json(
        state
            .reviews
            .get_comment(TitleId(title_id), ReviewId(review_id), CommentId(comment_id))
            .await?,
    ))
}

pub async fn update_comment(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ValidPath((title_id, review_id, comment_id)): ValidPath<(i64, i64, i64)>,
    ValidJson(input): ValidJson<CommentPatch>,
) -> AppResult<Json<CommentView>> {
    Ok(Json(
        state
            .reviews
            .update_comment(
                &actor,
                TitleId(title_id),
                ReviewId(review_id),
                CommentId(comment_id),
                input,
            )
            .await?,
    ))
}

pub async fn replace_comment(CurrentActor(actor): CurrentActor) -> AppError {
    replace_not_allowed(&actor, ResourceKind::Comment)
}

pub async fn delete_comment(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ValidPath((title_id, review_id, comment_id)): ValidPath<(i64, i64, i64)>,
) -> AppResult<StatusCode> {
    state
        .reviews
        .delete_comment(
            &actor,
            TitleId(title_id),
            ReviewId(review_id),
            CommentId(comment_id),
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
