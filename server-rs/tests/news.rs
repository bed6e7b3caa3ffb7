mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::{json, Value};

async fn draft(app: &TestApp, token: &str, body: Value) -> String {
    let (status, body) = app.post("/api/news", Some(token), body).await;
    assert_eq!(status, StatusCode::CREATED, "create news failed: {body}");
    body["data"]["news"]["id"].as_str().unwrap().to_string()
}

async fn publish(app: &TestApp, token: &str, id: &str) {
    let (status, body) = app
        .post(&format!("/api/news/{id}/publish"), Some(token), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK, "publish failed: {body}");
}

#[tokio::test]
async fn drafts_stay_hidden_until_published() {
    let app = TestApp::new();
    let olga = app.organizer("olga@example.com").await;
    let id = draft(
        &app,
        &olga.token,
        json!({ "title": "Finals recap", "content": "What a night.", "images": ["a.png", "  "] }),
    )
    .await;

    let (_, body) = app.get("/api/news").await;
    assert_eq!(body["data"]["news"], json!([]));
    assert_eq!(body["data"]["pagination"]["total"], 0);

    let (status, body) = app.get(&format!("/api/news/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["news"]["status"], "draft");
    assert_eq!(body["data"]["news"]["images"], json!(["a.png"]));
    assert_eq!(body["data"]["news"]["author"]["fullName"], "Olga Organizer");

    publish(&app, &olga.token, &id).await;

    let (_, body) = app.get("/api/news").await;
    let news = body["data"]["news"].as_array().unwrap();
    assert_eq!(news.len(), 1);
    assert_eq!(news[0]["status"], "public");
    assert!(news[0]["publishedAt"].is_string());
}

#[tokio::test]
async fn search_requires_a_query() {
    let app = TestApp::new();
    let olga = app.organizer("olga@example.com").await;
    for title in ["Spring Cup announced", "Patch notes"] {
        let id = draft(&app, &olga.token, json!({ "title": title, "content": "..." })).await;
        publish(&app, &olga.token, &id).await;
    }

    let (status, body) = app.get("/api/news/search").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Search query is required");

    let (status, body) = app.get("/api/news/search?q=SPRING").await;
    assert_eq!(status, StatusCode::OK);
    let news = body["data"]["news"].as_array().unwrap();
    assert_eq!(news.len(), 1);
    assert_eq!(news[0]["title"], "Spring Cup announced");
}

#[tokio::test]
async fn malformed_news_ids_read_as_missing() {
    let app = TestApp::new();
    let (status, body) = app.get("/api/news/not-a-uuid").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "News article not found");
}

#[tokio::test]
async fn tournament_news_and_featured() {
    let app = TestApp::new();
    let olga = app.organizer("olga@example.com").await;
    let tournament = app.create_tournament(&olga.token, json!({})).await;

    let (status, body) = app
        .post(
            "/api/news",
            Some(&olga.token),
            json!({ "title": "t", "content": "c", "tournamentId": uuid::Uuid::new_v4() }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Tournament not found");

    for n in 0..3 {
        let id = draft(
            &app,
            &olga.token,
            json!({ "title": format!("Day {n}"), "content": "c", "tournamentId": tournament }),
        )
        .await;
        publish(&app, &olga.token, &id).await;
    }
    draft(&app, &olga.token, json!({ "title": "Unpublished", "content": "c" })).await;

    let (_, body) = app.get(&format!("/api/news/tournament/{tournament}")).await;
    let news = body["data"]["news"].as_array().unwrap();
    assert_eq!(news.len(), 3);
    assert_eq!(news[0]["tournament"]["name"], "Cup");

    let (_, body) = app.get("/api/news/featured?limit=2").await;
    assert_eq!(body["data"]["news"].as_array().unwrap().len(), 2);

    let (_, body) = app.get(&format!("/api/news/author/{}", olga.id)).await;
    assert_eq!(body["data"]["pagination"]["total"], 4);
}

#[tokio::test]
async fn only_organizers_write_news() {
    let app = TestApp::new();
    let olga = app.organizer("olga@example.com").await;
    let ana = app.player("ana@example.com", "Ana").await;

    let (status, _) = app
        .post("/api/news", Some(&ana.token), json!({ "title": "t", "content": "c" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let id = draft(&app, &olga.token, json!({ "title": "t", "content": "c" })).await;
    let (status, body) = app
        .put(
            &format!("/api/news/{id}"),
            &olga.token,
            json!({ "title": "Updated" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["news"]["title"], "Updated");

    let (status, _) = app.delete(&format!("/api/news/{id}"), &olga.token).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get(&format!("/api/news/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
