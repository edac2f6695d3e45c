//! 路由表
//!
//! 所有接口挂在 `/api/v1` 下，路径不带结尾斜杠

use axum::{
    Router, middleware,
    routing::{get, post},
};

use super::handlers::{auth, catalog, method_not_allowed, reviews, users};
use super::middleware::auth_middleware;
use super::state::AppState;

pub const API_PREFIX: &str = "/api/v1";

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        // 认证
        .route("/auth/signup", post(auth::signup))
        .route("/auth/token", post(auth::token))
        // 用户
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/me",
            get(users::get_me)
                .patch(users::update_me)
                .put(users::replace_me),
        )
        .route(
            "/users/{username}",
            get(users::get_user)
                .patch(users::update_user)
                .put(users::replace_user)
                .delete(users::delete_user),
        )
        // 分类 / 体裁
        .route(
            "/categories",
            get(catalog::list_categories).post(catalog::create_category),
        )
        .route(
            "/categories/{slug}",
            get(catalog::get_category).delete(catalog::delete_category),
        )
        .route(
            "/genres",
            get(catalog::list_genres).post(catalog::create_genre),
        )
        .route(
            "/genres/{slug}",
            get(catalog::get_genre).delete(catalog::delete_genre),
        )
        // 作品
        .route(
            "/titles",
            get(catalog::list_titles).post(catalog::create_title),
        )
        .route(
            "/titles/{title_id}",
            get(catalog::get_title)
                .patch(catalog::update_title)
                .put(catalog::replace_title)
                .delete(catalog::delete_title),
        )
        // 评论
        .route(
            "/titles/{title_id}/reviews",
            get(reviews::list_reviews).post(reviews::create_review),
        )
        .route(
            "/titles/{title_id}/reviews/{review_id}",
            get(reviews::get_review)
                .patch(reviews::update_review)
                .put(reviews::replace_review)
                .delete(reviews::delete_review),
        )
        // 回复
        .route(
            "/titles/{title_id}/reviews/{review_id}/comments",
            get(reviews::list_comments).post(reviews::create_comment),
        )
        .route(
            "/titles/{title_id}/reviews/{review_id}/comments/{comment_id}",
            get(reviews::get_comment)
                .patch(reviews::update_comment)
                .put(reviews::replace_comment)
                .delete(reviews::delete_comment),
        )
        .method_not_allowed_fallback(method_not_allowed)
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state);

    Router::new().nest(API_PREFIX, api)
}
