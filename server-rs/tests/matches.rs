mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::TestApp;
use serde_json::{json, Value};

struct Bracket {
    app: TestApp,
    organizer: String,
    tournament: String,
    team_a: String,
    team_b: String,
}

async fn bracket() -> Bracket {
    let app = TestApp::new();
    let olga = app.organizer("olga@example.com").await;
    let ana = app.player("ana@example.com", "Ana").await;
    let ben = app.player("ben@example.com", "Ben").await;
    let tournament = app
        .create_tournament(&olga.token, json!({ "name": "Spring Cup" }))
        .await;
    let team_a = app.join(&tournament, &ana, "Team Ana").await;
    let team_b = app.join(&tournament, &ben, "Team Ben").await;
    Bracket {
        app,
        organizer: olga.token,
        tournament,
        team_a,
        team_b,
    }
}

impl Bracket {
    async fn create_match(&self, body: Value) -> (StatusCode, Value) {
        self.app
            .post("/api/matches", Some(&self.organizer), body)
            .await
    }

    async fn scheduled_match(&self) -> String {
        let (status, body) = self
            .create_match(json!({
                "tournamentId": self.tournament,
                "teamA": self.team_a,
                "teamB": self.team_b,
                "scheduledAt": (Utc::now() + Duration::hours(2)).to_rfc3339(),
            }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create match failed: {body}");
        body["data"]["match"]["id"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn created_matches_are_populated() {
    let b = bracket().await;
    let id = b.scheduled_match().await;

    let (status, body) = b.app.get(&format!("/api/matches/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    let game = &body["data"]["match"];
    assert_eq!(game["status"], "pending");
    assert_eq!(game["score"], json!({ "a": 0, "b": 0 }));
    assert_eq!(game["teams"]["a"]["name"], "Team Ana");
    assert_eq!(game["teams"]["b"]["name"], "Team Ben");
    assert_eq!(game["tournament"]["name"], "Spring Cup");
}

#[tokio::test]
async fn create_checks_the_teams() {
    let b = bracket().await;

    let (status, body) = b
        .create_match(json!({ "tournamentId": b.tournament, "teamA": b.team_a }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Tournament, team A and team B are required");

    let (status, body) = b
        .create_match(json!({
            "tournamentId": b.tournament,
            "teamA": b.team_a,
            "teamB": b.team_a,
        }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "A match needs two different competitors");

    let (status, body) = b
        .create_match(json!({
            "tournamentId": b.tournament,
            "teamA": b.team_a,
            "teamB": uuid::Uuid::new_v4(),
        }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "One or both competitors not found");

    let (status, body) = b
        .create_match(json!({
            "tournamentId": uuid::Uuid::new_v4(),
            "teamA": b.team_a,
            "teamB": b.team_b,
        }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Tournament not found");
}

#[tokio::test]
async fn teams_must_belong_to_the_tournament() {
    let b = bracket().await;
    let cara = b.app.player("cara@example.com", "Cara").await;
    let other = b
        .app
        .create_tournament(&b.organizer, json!({ "name": "Autumn Cup" }))
        .await;
    let outsider = b.app.join(&other, &cara, "Team Cara").await;

    let (status, body) = b
        .create_match(json!({
            "tournamentId": b.tournament,
            "teamA": b.team_a,
            "teamB": outsider,
        }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Both competitors must belong to the tournament");
}

#[tokio::test]
async fn result_marks_the_match_done() {
    let b = bracket().await;
    let id = b.scheduled_match().await;

    let (status, body) = b
        .app
        .post(
            &format!("/api/matches/{id}/result"),
            Some(&b.organizer),
            json!({ "scoreA": 3 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Both team scores are required");

    let (status, body) = b
        .app
        .post(
            &format!("/api/matches/{id}/result"),
            Some(&b.organizer),
            json!({ "scoreA": 3, "scoreB": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["match"]["status"], "done");
    assert_eq!(body["data"]["match"]["score"], json!({ "a": 3, "b": 1 }));

    let (_, body) = b.app.get("/api/matches?status=done").await;
    assert_eq!(body["data"]["pagination"]["total"], 1);
}

#[tokio::test]
async fn reschedule_requires_a_date() {
    let b = bracket().await;
    let id = b.scheduled_match().await;
    let uri = format!("/api/matches/{id}/reschedule");

    let (status, body) = b.app.post(&uri, Some(&b.organizer), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "New date is required");

    let (status, body) = b
        .app
        .post(&uri, Some(&b.organizer), json!({ "newDate": "2031-05-01" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["match"]["scheduledAt"], "2031-05-01T00:00:00Z");
}

#[tokio::test]
async fn lookups_by_tournament_and_competitor() {
    let b = bracket().await;
    b.scheduled_match().await;
    b.scheduled_match().await;

    let (status, body) = b
        .app
        .get(&format!("/api/matches/tournament/{}?limit=1", b.tournament))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["matches"].as_array().unwrap().len(), 1);
    assert_eq!(
        body["data"]["pagination"],
        json!({ "current": 1, "pages": 2, "total": 2 })
    );

    let (_, body) = b
        .app
        .get(&format!("/api/matches/competitor/{}", b.team_b))
        .await;
    assert_eq!(body["data"]["matches"].as_array().unwrap().len(), 2);

    let (_, body) = b.app.get("/api/matches/upcoming").await;
    assert_eq!(body["data"]["matches"].as_array().unwrap().len(), 2);

    let (_, body) = b.app.get("/api/matches/ongoing").await;
    assert_eq!(body["data"]["matches"], json!([]));
}

#[tokio::test]
async fn withdrawn_teams_leave_an_empty_slot() {
    let b = bracket().await;
    let id = b.scheduled_match().await;
    let ana = b
        .app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "ana@example.com", "password": "hunter22" }),
        )
        .await
        .1["data"]["token"]
        .as_str()
        .unwrap()
        .to_string();

    let (status, _) = b
        .app
        .post(
            &format!("/api/tournaments/{}/withdraw", b.tournament),
            Some(&ana),
            json!({ "competitorId": b.team_a }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = b.app.get(&format!("/api/matches/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["match"]["teamA"], Value::Null);
    assert_eq!(body["data"]["match"]["teams"]["a"], Value::Null);
    assert_eq!(body["data"]["match"]["teams"]["b"]["name"], "Team Ben");
}

#[tokio::test]
async fn players_cannot_manage_matches() {
    let b = bracket().await;
    let id = b.scheduled_match().await;
    let cara = b.app.player("cara@example.com", "Cara").await;

    let (status, _) = b
        .app
        .post(&format!("/api/matches/{id}/start"), Some(&cara.token), json!({}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = b.app.delete(&format!("/api/matches/{id}"), &cara.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = b.app.delete(&format!("/api/matches/{id}"), &b.organizer).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Match deleted successfully");
}
