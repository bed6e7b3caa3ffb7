//! Shared helpers for the HTTP integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use esports_arena_api::config::Config;
use esports_arena_api::store::MemoryStore;
use esports_arena_api::{build_router, AppState};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt; // For `oneshot`

#[derive(Clone)]
pub struct TestApp {
    router: Router,
}

/// A registered account and its access token.
pub struct Account {
    pub id: String,
    pub token: String,
    pub refresh_token: String,
}

impl TestApp {
    pub fn new() -> Self {
        let state = AppState::new(Arc::new(MemoryStore::new()), Config::for_tests());
        Self {
            router: build_router(state),
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let request = builder.body(body).unwrap();
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None, None).await
    }

    pub async fn get_as(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, Some(token), None).await
    }

    pub async fn register(&self, email: &str, full_name: &str, role: &str) -> Account {
        let (status, body) = self
            .post(
                "/api/auth/register",
                None,
                json!({
                    "email": email,
                    "fullName": full_name,
                    "password": "hunter22",
                    "role": role,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        Account {
            id: body["data"]["user"]["id"].as_str().unwrap().to_string(),
            token: body["data"]["token"].as_str().unwrap().to_string(),
            refresh_token: body["data"]["refreshToken"].as_str().unwrap().to_string(),
        }
    }

    pub async fn organizer(&self, email: &str) -> Account {
        self.register(email, "Olga Organizer", "organizer").await
    }

    pub async fn player(&self, email: &str, full_name: &str) -> Account {
        self.register(email, full_name, "user").await
    }

    /// Creates a tournament starting tomorrow and returns its id.
    pub async fn create_tournament(&self, token: &str, body: Value) -> String {
        let mut payload = json!({
            "name": "Cup",
            "startDate": (Utc::now() + Duration::days(1)).to_rfc3339(),
        });
        if let (Some(dst), Some(src)) = (payload.as_object_mut(), body.as_object()) {
            for (k, v) in src {
                dst.insert(k.clone(), v.clone());
            }
        }
        let (status, body) = self.post("/api/tournaments", Some(token), payload).await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
        body["data"]["tournament"]["id"].as_str().unwrap().to_string()
    }

    /// Registers `account` for the tournament and returns the competitor id.
    pub async fn join(&self, tournament_id: &str, account: &Account, team: &str) -> String {
        let (status, body) = self
            .post(
                &format!("/api/tournaments/{tournament_id}/register"),
                Some(&account.token),
                json!({ "name": team }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "join failed: {body}");
        body["data"]["competitor"]["id"].as_str().unwrap().to_string()
    }
}
