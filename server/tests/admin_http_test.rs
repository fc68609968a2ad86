//! HTTP-level admin tests.
//!
//! The first registered account is the system admin.
//!
//! Run with: `cargo test --test admin_http_test`

mod helpers;

use axum::http::{Method, StatusCode};
use helpers::{body_json, option_id, TestApp};
use serde_json::json;

#[tokio::test]
async fn test_first_user_is_admin() {
    let app = TestApp::new();
    let (_, admin) = app.register("Ada", "ada@example.com").await;
    let (_, user) = app.register("Grace", "grace@example.com").await;

    let resp = app
        .send(Method::GET, "/api/admin/status", Some(&admin), None)
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["is_admin"], true);

    let resp = app
        .send(Method::GET, "/api/admin/status", Some(&user), None)
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["is_admin"], false);
}

#[tokio::test]
async fn test_admin_routes_require_auth() {
    let app = TestApp::new();

    let resp = app.send(Method::GET, "/api/admin/status", None, None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app.send(Method::GET, "/api/admin/polls", None, None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_non_admin_is_forbidden() {
    let app = TestApp::new();
    app.register("Ada", "ada@example.com").await;
    let (_, user) = app.register("Grace", "grace@example.com").await;
    let poll = app.create_poll(&user, "Mine", &["A", "B"]).await;

    let resp = app
        .send(Method::GET, "/api/admin/polls", Some(&user), None)
        .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(resp).await["error"], "not_admin");

    let uri = format!("/api/admin/polls/{}", poll["id"].as_str().unwrap());
    let resp = app.send(Method::DELETE, &uri, Some(&user), None).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_lists_all_polls_with_tallies() {
    let app = TestApp::new();
    let (_, admin) = app.register("Ada", "ada@example.com").await;
    let (_, user) = app.register("Grace", "grace@example.com").await;
    app.create_poll(&admin, "Admin poll", &["A", "B"]).await;
    let poll = app.create_poll(&user, "User poll", &["Yes", "No"]).await;

    let resp = app
        .send(
            Method::POST,
            &format!("/api/polls/{}/votes", poll["id"].as_str().unwrap()),
            None,
            Some(json!({ "option_id": option_id(&poll, "Yes") })),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = app
        .send(Method::GET, "/api/admin/polls", Some(&admin), None)
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let polls = body_json(resp).await;
    let polls = polls.as_array().unwrap();
    assert_eq!(polls.len(), 2);
    let user_poll = polls.iter().find(|p| p["title"] == "User poll").unwrap();
    assert_eq!(user_poll["total_votes"], 1);
    assert_eq!(user_poll["options"][0]["percentage"], 100);
}

#[tokio::test]
async fn test_admin_deletes_any_poll() {
    let app = TestApp::new();
    let (_, admin) = app.register("Ada", "ada@example.com").await;
    let (_, user) = app.register("Grace", "grace@example.com").await;
    let poll = app.create_poll(&user, "User poll", &["A", "B"]).await;
    let id = poll["id"].as_str().unwrap();

    let uri = format!("/api/admin/polls/{id}");
    let resp = app.send(Method::DELETE, &uri, Some(&admin), None).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app
        .send(Method::GET, &format!("/api/polls/{id}"), None, None)
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app.send(Method::DELETE, &uri, Some(&admin), None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
