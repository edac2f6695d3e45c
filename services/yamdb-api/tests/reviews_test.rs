//! 评论与回复

mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;
use yamdb_api::domain::Role;

#[tokio::test]
async fn test_one_review_per_author_and_title() {
    let app = TestApp::new();
    let (_, admin) = app.login("admin", Role::Admin).await;
    let (_, author) = app.login("author", Role::User).await;
    let (_, other) = app.login("other", Role::User).await;
    let stalker = app.seed_title(&admin, "Stalker").await;
    let mirror = app.seed_title(&admin, "Mirror").await;

    let reviews = format!("/api/v1/titles/{}/reviews", stalker);
    let (status, body) = app
        .post(&reviews, Some(&author), json!({ "text": "slow and great", "score": 9 }))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["author"], "author");
    assert_eq!(body["score"], 9);
    assert!(body["pub_date"].is_string());

    let (status, body) = app
        .post(&reviews, Some(&author), json!({ "text": "again", "score": 1 }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], 409);

    let (status, _) = app
        .post(&reviews, Some(&other), json!({ "text": "fine", "score": 6 }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .post(
            &format!("/api/v1/titles/{}/reviews", mirror),
            Some(&author),
            json!({ "text": "personal", "score": 8 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = app.get(&reviews, None).await;
    assert_eq!(body["count"], 2);
}

#[tokio::test]
async fn test_review_score_bounds() {
    let app = TestApp::new();
    let (_, admin) = app.login("admin", Role::Admin).await;
    let (_, author) = app.login("author", Role::User).await;
    let id = app.seed_title(&admin, "Stalker").await;
    let reviews = format!("/api/v1/titles/{}/reviews", id);

    for score in [0, 11, -3] {
        let (status, body) = app
            .post(&reviews, Some(&author), json!({ "text": "out of range", "score": score }))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "score {}", score);
        assert!(body["detail"].as_str().unwrap().contains("score"));
    }

    let (status, _) = app
        .post(&reviews, Some(&author), json!({ "score": 5 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .post(&reviews, Some(&author), json!({ "text": "edge", "score": 10 }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let review_uri = format!("{}/{}", reviews, body["id"]);

    let (status, _) = app
        .patch(&review_uri, Some(&author), json!({ "score": 0 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_review_on_missing_title() {
    let app = TestApp::new();
    let (_, author) = app.login("author", Role::User).await;

    let (status, _) = app
        .post(
            "/api/v1/titles/404/reviews",
            Some(&author),
            json!({ "text": "nowhere", "score": 5 }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get("/api/v1/titles/404/reviews", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_review_is_scoped_to_its_title() {
    let app = TestApp::new();
    let (_, admin) = app.login("admin", Role::Admin).await;
    let (_, author) = app.login("author", Role::User).await;
    let stalker = app.seed_title(&admin, "Stalker").await;
    let mirror = app.seed_title(&admin, "Mirror").await;

    let (_, body) = app
        .post(
            &format!("/api/v1/titles/{}/reviews", stalker),
            Some(&author),
            json!({ "text": "scoped", "score": 7 }),
        )
        .await;
    let review_id = body["id"].as_i64().unwrap();

    let wrong = format!("/api/v1/titles/{}/reviews/{}", mirror, review_id);
    let (status, _) = app.get(&wrong, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.delete(&wrong, Some(&admin)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app
        .post(
            &format!("{}/comments", wrong),
            Some(&author),
            json!({ "text": "lost" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .get(&format!("/api/v1/titles/{}/reviews/{}", stalker, review_id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "scoped");
}

#[tokio::test]
async fn test_comment_lifecycle() {
    let app = TestApp::new();
    let (_, admin) = app.login("admin", Role::Admin).await;
    let (_, author) = app.login("author", Role::User).await;
    let (_, commenter) = app.login("commenter", Role::User).await;
    let (_, moderator) = app.login("moderator", Role::Moderator).await;
    let title_id = app.seed_title(&admin, "Stalker").await;

    let (_, body) = app
        .post(
            &format!("/api/v1/titles/{}/reviews", title_id),
            Some(&author),
            json!({ "text": "review", "score": 8 }),
        )
        .await;
    let comments = format!(
        "/api/v1/titles/{}/reviews/{}/comments",
        title_id, body["id"]
    );

    let (status, _) = app.post(&comments, None, json!({ "text": "anon" })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .post(&comments, Some(&commenter), json!({ "text": "agreed" }))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["author"], "commenter");
    let comment_uri = format!("{}/{}", comments, body["id"]);

    let (status, _) = app
        .post(&comments, Some(&commenter), json!({ "text": "" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .patch(&comment_uri, Some(&author), json!({ "text": "not yours" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .patch(&comment_uri, Some(&commenter), json!({ "text": "strongly agreed" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "strongly agreed");

    let (status, body) = app.get(&comment_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "strongly agreed");

    let (_, body) = app.get(&comments, None).await;
    assert_eq!(body["count"], 1);

    let (status, _) = app.delete(&comment_uri, Some(&moderator)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get(&comment_uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleting_review_removes_comments() {
    let app = TestApp::new();
    let (_, admin) = app.login("admin", Role::Admin).await;
    let (_, author) = app.login("author", Role::User).await;
    let title_id = app.seed_title(&admin, "Stalker").await;

    let (_, body) = app
        .post(
            &format!("/api/v1/titles/{}/reviews", title_id),
            Some(&author),
            json!({ "text": "review", "score": 8 }),
        )
        .await;
    let review_uri = format!("/api/v1/titles/{}/reviews/{}", title_id, body["id"]);
    let (_, body) = app
        .post(
            &format!("{}/comments", review_uri),
            Some(&author),
            json!({ "text": "self reply" }),
        )
        .await;
    let comment_uri = format!("{}/comments/{}", review_uri, body["id"]);

    let (status, _) = app.delete(&review_uri, Some(&author)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&comment_uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // 删除后可以重新评论
    let (status, _) = app
        .post(
            &format!("/api/v1/titles/{}/reviews", title_id),
            Some(&author),
            json!({ "text": "second take", "score": 9 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_deleting_title_removes_reviews() {
    let app = TestApp::new();
    let (_, admin) = app.login("admin", Role::Admin).await;
    let (_, author) = app.login("author", Role::User).await;
    let title_id = app.seed_title(&admin, "Stalker").await;

    let (_, body) = app
        .post(
            &format!("/api/v1/titles/{}/reviews", title_id),
            Some(&author),
            json!({ "text": "review", "score": 8 }),
        )
        .await;
    let review_uri = format!("/api/v1/titles/{}/reviews/{}", title_id, body["id"]);

    let (status, _) = app
        .delete(&format!("/api/v1/titles/{}", title_id), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&review_uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_author_name_follows_rename() {
    let app = TestApp::new();
    let (_, admin) = app.login("admin", Role::Admin).await;
    let (_, author) = app.login("author", Role::User).await;
    let title_id = app.seed_title(&admin, "Stalker").await;

    let (_, body) = app
        .post(
            &format!("/api/v1/titles/{}/reviews", title_id),
            Some(&author),
            json!({ "text": "review", "score": 8 }),
        )
        .await;
    let review_uri = format!("/api/v1/titles/{}/reviews/{}", title_id, body["id"]);

    let (status, _) = app
        .patch(
            "/api/v1/users/author",
            Some(&admin),
            json!({ "username": "renamed" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.get(&review_uri, None).await;
    assert_eq!(body["author"], "renamed");
}
