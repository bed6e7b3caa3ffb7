mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn register_returns_user_and_tokens() {
    let app = TestApp::new();

    let (status, body) = app
        .post(
            "/api/auth/register",
            None,
            json!({ "email": "  Ana@Example.com ", "fullName": "Ana", "password": "hunter22" }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "User registered successfully");
    let user = &body["data"]["user"];
    assert_eq!(user["email"], "ana@example.com");
    assert_eq!(user["role"], "user");
    assert!(user.get("passwordHash").is_none());
    assert!(body["data"]["token"].is_string());
    assert!(body["data"]["refreshToken"].is_string());
}

#[tokio::test]
async fn register_rejects_missing_fields_and_duplicates() {
    let app = TestApp::new();

    let (status, body) = app
        .post("/api/auth/register", None, json!({ "email": "ana@example.com" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Email, full name, and password are required");

    app.player("ana@example.com", "Ana").await;
    let (status, body) = app
        .post(
            "/api/auth/register",
            None,
            json!({ "email": "ANA@example.com", "fullName": "Other", "password": "pw" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User with this email already exists");
}

#[tokio::test]
async fn admin_accounts_cannot_self_register() {
    let app = TestApp::new();
    let (status, body) = app
        .post(
            "/api/auth/register",
            None,
            json!({ "email": "root@example.com", "fullName": "Root", "password": "pw", "role": "admin" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Admin accounts cannot be self-registered");
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let app = TestApp::new();
    app.player("ana@example.com", "Ana").await;

    let (wrong_pw_status, wrong_pw) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "ana@example.com", "password": "nope" }),
        )
        .await;
    let (unknown_status, unknown) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "ghost@example.com", "password": "nope" }),
        )
        .await;

    assert_eq!(wrong_pw_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_pw["message"], "Invalid credentials");
    assert_eq!(wrong_pw, unknown);

    let (status, body) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "ana@example.com", "password": "hunter22" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Login successful");
}

#[tokio::test]
async fn refresh_requires_a_refresh_token() {
    let app = TestApp::new();
    let ana = app.player("ana@example.com", "Ana").await;

    let (status, body) = app
        .post(
            "/api/auth/refresh",
            None,
            json!({ "refreshToken": ana.refresh_token }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["token"].is_string());

    let (status, body) = app
        .post("/api/auth/refresh", None, json!({ "refreshToken": ana.token }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Refresh token required");

    let (status, _) = app.post("/api/auth/refresh", None, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn protected_routes_need_an_access_token() {
    let app = TestApp::new();
    let ana = app.player("ana@example.com", "Ana").await;

    let (status, body) = app.get("/api/auth/profile").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "No token provided");

    let (status, _) = app.get_as("/api/auth/profile", "garbage").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.get_as("/api/auth/profile", &ana.refresh_token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Access token required");

    let (status, body) = app.get_as("/api/auth/profile", &ana.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["id"], ana.id.as_str());
}

#[tokio::test]
async fn profile_update_and_password_change() {
    let app = TestApp::new();
    let ana = app.player("ana@example.com", "Ana").await;

    let (status, body) = app
        .put(
            "/api/auth/profile",
            &ana.token,
            json!({ "fullName": "Ana Lima", "avatarUrl": "https://img.example.com/a.png" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["fullName"], "Ana Lima");

    let (status, body) = app
        .put("/api/auth/profile", &ana.token, json!({ "fullName": "  " }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"], json!(["Full name is required"]));

    let (status, body) = app
        .put(
            "/api/auth/change-password",
            &ana.token,
            json!({ "currentPassword": "wrong", "newPassword": "s3cret!" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Current password is incorrect");

    let (status, _) = app
        .put(
            "/api/auth/change-password",
            &ana.token,
            json!({ "currentPassword": "hunter22", "newPassword": "s3cret!" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "ana@example.com", "password": "s3cret!" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn logout_acknowledges() {
    let app = TestApp::new();
    let ana = app.player("ana@example.com", "Ana").await;
    let (status, body) = app
        .request(Method::POST, "/api/auth/logout", Some(&ana.token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logged out successfully");
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = TestApp::new();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"email\":"))
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn health_and_unknown_routes() {
    let app = TestApp::new();

    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"]["backend"], "memory");

    let (status, body) = app.get("/api/nothing-here").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Route not found");
}
