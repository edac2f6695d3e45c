//! 分类、体裁与作品目录

mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;
use yamdb_api::domain::Role;
use yamdb_common::PageLimits;

async fn create_slug(app: &TestApp, token: &str, path: &str, name: &str, slug: &str) {
    let (status, body) = app
        .post(
            &format!("/api/v1/{}", path),
            Some(token),
            json!({ "name": name, "slug": slug }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body, json!({ "name": name, "slug": slug }));
}

#[tokio::test]
async fn test_category_lifecycle() {
    let app = TestApp::new();
    let (_, admin) = app.login("admin", Role::Admin).await;

    create_slug(&app, &admin, "categories", "Films", "films").await;
    create_slug(&app, &admin, "categories", "Books", "books").await;

    let (status, body) = app.get("/api/v1/categories?search=boo", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["slug"], "books");

    let (status, body) = app
        .post(
            "/api/v1/categories",
            Some(&admin),
            json!({ "name": "Movies", "slug": "films" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("slug"));

    let (status, _) = app
        .post(
            "/api/v1/categories",
            Some(&admin),
            json!({ "name": "Bad", "slug": "not a slug!" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.delete("/api/v1/categories/books", Some(&admin)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.delete("/api/v1/categories/books", Some(&admin)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = app.get("/api/v1/categories", None).await;
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn test_retrieve_category_and_genre_by_slug() {
    let app = TestApp::new();
    let (_, admin) = app.login("admin", Role::Admin).await;
    create_slug(&app, &admin, "categories", "Films", "films").await;
    create_slug(&app, &admin, "genres", "Drama", "drama").await;

    let (status, body) = app.get("/api/v1/categories/films", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "name": "Films", "slug": "films" }));

    let (status, body) = app.get("/api/v1/genres/drama", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "name": "Drama", "slug": "drama" }));

    let (status, body) = app.get("/api/v1/genres/none", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);

    let (status, _) = app.get("/api/v1/categories/drama", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unsupported_slug_verbs_return_problem_details() {
    let app = TestApp::new();
    let (_, admin) = app.login("admin", Role::Admin).await;
    create_slug(&app, &admin, "genres", "Drama", "drama").await;

    let (status, body) = app
        .patch("/api/v1/genres/drama", Some(&admin), json!({ "name": "Tragedy" }))
        .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["status"], 405);
    assert!(body["detail"].as_str().unwrap().contains("PATCH"));

    let (status, body) = app
        .put("/api/v1/categories/films", None, json!({ "name": "Films" }))
        .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["status"], 405);

    let (_, body) = app.get("/api/v1/genres/drama", None).await;
    assert_eq!(body["name"], "Drama");
}

#[tokio::test]
async fn test_create_and_read_title() {
    let app = TestApp::new();
    let (_, admin) = app.login("admin", Role::Admin).await;
    create_slug(&app, &admin, "categories", "Films", "films").await;
    create_slug(&app, &admin, "genres", "Drama", "drama").await;
    create_slug(&app, &admin, "genres", "Sci-Fi", "sci-fi").await;

    let (status, body) = app
        .post(
            "/api/v1/titles",
            Some(&admin),
            json!({
                "name": "Solaris",
                "year": 1972,
                "description": "A psychologist visits a space station.",
                "genre": ["drama", "sci-fi"],
                "category": "films",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let id = body["id"].as_i64().unwrap();
    assert_eq!(body["name"], "Solaris");
    assert_eq!(body["rating"], serde_json::Value::Null);
    assert_eq!(body["category"], json!({ "name": "Films", "slug": "films" }));
    assert_eq!(body["genre"].as_array().unwrap().len(), 2);

    let (status, fetched) = app.get(&format!("/api/v1/titles/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, body);

    let (status, _) = app.get("/api/v1/titles/9999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.get("/api/v1/titles/not-a-number", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_title_without_optional_fields() {
    let app = TestApp::new();
    let (_, admin) = app.login("admin", Role::Admin).await;
    create_slug(&app, &admin, "genres", "Drama", "drama").await;

    let (status, body) = app
        .post(
            "/api/v1/titles",
            Some(&admin),
            json!({ "name": "Untitled", "year": 2001, "genre": ["drama"] }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["description"], "");
    assert_eq!(body["category"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_title_validation() {
    let app = TestApp::new();
    let (_, admin) = app.login("admin", Role::Admin).await;
    create_slug(&app, &admin, "genres", "Drama", "drama").await;

    let cases = [
        json!({ "name": "Future", "year": 9999, "genre": ["drama"] }),
        json!({ "name": "No genre", "year": 2000, "genre": [] }),
        json!({ "name": "Ghost genre", "year": 2000, "genre": ["ghost"] }),
        json!({ "name": "Ghost category", "year": 2000, "genre": ["drama"], "category": "ghost" }),
        json!({ "year": 2000, "genre": ["drama"] }),
    ];
    for case in cases {
        let (status, body) = app.post("/api/v1/titles", Some(&admin), case.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", case);
        assert_eq!(body["status"], 400);
    }

    let (_, body) = app.get("/api/v1/titles", None).await;
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_patch_title_keeps_unspecified_fields() {
    let app = TestApp::new();
    let (_, admin) = app.login("admin", Role::Admin).await;
    let (_, user) = app.login("user", Role::User).await;
    let id = app.seed_title(&admin, "Stalker").await;
    create_slug(&app, &admin, "genres", "Sci-Fi", "sci-fi").await;
    let uri = format!("/api/v1/titles/{}", id);

    let (status, _) = app.patch(&uri, Some(&user), json!({ "year": 1980 })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .patch(&uri, Some(&admin), json!({ "genre": ["sci-fi"] }))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["name"], "Stalker");
    assert_eq!(body["year"], 1979);
    assert_eq!(body["category"]["slug"], "film");
    assert_eq!(body["genre"], json!([{ "name": "Sci-Fi", "slug": "sci-fi" }]));

    let (status, _) = app.patch("/api/v1/titles/9999", Some(&admin), json!({ "year": 1980 })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.delete(&uri, Some(&admin)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get(&uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_title_filters() {
    let app = TestApp::new();
    let (_, admin) = app.login("admin", Role::Admin).await;
    app.seed_title(&admin, "Stalker").await;
    create_slug(&app, &admin, "categories", "Books", "books").await;
    create_slug(&app, &admin, "genres", "Comedy", "comedy").await;

    let (status, _) = app
        .post(
            "/api/v1/titles",
            Some(&admin),
            json!({ "name": "Three Men in a Boat", "year": 1889, "genre": ["comedy"], "category": "books" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = app.get("/api/v1/titles?category=books", None).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["name"], "Three Men in a Boat");

    let (_, body) = app.get("/api/v1/titles?genre=drama", None).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["name"], "Stalker");

    let (_, body) = app.get("/api/v1/titles?year=1889", None).await;
    assert_eq!(body["count"], 1);

    let (_, body) = app.get("/api/v1/titles?name=stalk", None).await;
    assert_eq!(body["count"], 1);

    let (_, body) = app.get("/api/v1/titles?genre=drama&year=1889", None).await;
    assert_eq!(body["count"], 0);

    let (status, _) = app.get("/api/v1/titles?year=soon", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_deleting_category_detaches_titles() {
    let app = TestApp::new();
    let (_, admin) = app.login("admin", Role::Admin).await;
    let id = app.seed_title(&admin, "Stalker").await;

    let (status, _) = app.delete("/api/v1/categories/film", Some(&admin)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.delete("/api/v1/genres/drama", Some(&admin)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app.get(&format!("/api/v1/titles/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["category"], serde_json::Value::Null);
    assert_eq!(body["genre"], json!([]));
}

#[tokio::test]
async fn test_rating_follows_reviews() {
    let app = TestApp::new();
    let (_, admin) = app.login("admin", Role::Admin).await;
    let id = app.seed_title(&admin, "Stalker").await;

    for (name, score) in [("first", 10), ("second", 7), ("third", 8)] {
        let (_, token) = app.login(name, Role::User).await;
        let (status, _) = app
            .post(
                &format!("/api/v1/titles/{}/reviews", id),
                Some(&token),
                json!({ "text": "noted", "score": score }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    // (10 + 7 + 8) / 3 = 8.33
    let (_, body) = app.get(&format!("/api/v1/titles/{}", id), None).await;
    assert_eq!(body["rating"], 8);

    let (_, body) = app.get("/api/v1/titles", None).await;
    assert_eq!(body["results"][0]["rating"], 8);
}

#[tokio::test]
async fn test_list_pagination_links() {
    let app = TestApp::with_page_limits(PageLimits {
        default_limit: 2,
        max_limit: 3,
    });
    let (_, admin) = app.login("admin", Role::Admin).await;
    for slug in ["a", "b", "c", "d", "e"] {
        create_slug(&app, &admin, "genres", &slug.to_uppercase(), slug).await;
    }

    let (_, body) = app.get("/api/v1/genres", None).await;
    assert_eq!(body["count"], 5);
    assert_eq!(body["results"].as_array().unwrap().len(), 2);
    assert_eq!(body["next"], "/api/v1/genres?limit=2&offset=2");
    assert_eq!(body["previous"], serde_json::Value::Null);

    let (_, body) = app.get("/api/v1/genres?offset=4", None).await;
    assert_eq!(body["results"].as_array().unwrap().len(), 1);
    assert_eq!(body["results"][0]["slug"], "e");
    assert_eq!(body["next"], serde_json::Value::Null);
    assert_eq!(body["previous"], "/api/v1/genres?limit=2&offset=2");

    // 超过上限的 limit 被截断
    let (_, body) = app.get("/api/v1/genres?limit=50", None).await;
    assert_eq!(body["results"].as_array().unwrap().len(), 3);
    assert_eq!(body["next"], "/api/v1/genres?limit=3&offset=3");
}
