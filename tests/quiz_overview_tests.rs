use axum::http::StatusCode;
use serde_json::{json, Value};

mod common;

fn status_of<'a>(quizzes: &'a Value, id: &str) -> &'a Value {
    &quizzes.as_array().unwrap().iter().find(|q| q["id"] == id).unwrap()["status"]
}

#[tokio::test]
async fn test_health_names_backend() {
    let app = common::create_test_app();
    let (status, body) = app.send("GET", "/api/v1/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true, "backend": "memory" }));
}

#[tokio::test]
async fn test_overview_lists_seed_quizzes_as_open() {
    let app = common::create_test_app();
    let (status, body) = app.send("GET", "/api/v1/quizzes", Some("fresh-user"), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(status_of(&body, "berufspaedagogik-grundlagen"), "open");
    assert_eq!(status_of(&body, "didaktik-pruefung"), "open");
    let basics = body.as_array().unwrap().iter().find(|q| q["id"] == "berufspaedagogik-grundlagen").unwrap();
    assert_eq!(basics["question_count"], 3);
}

#[tokio::test]
async fn test_attempts_drive_quiz_status_per_user() {
    let app = common::create_test_app();
    let quiz = "didaktik-pruefung";

    // First attempt: nothing answered, 0%.
    let (_, session) = app.send("POST", &format!("/api/v1/quizzes/{quiz}/sessions"), Some("anna"), None).await;
    let id = session["session_id"].as_str().unwrap().to_string();
    app.send("POST", &format!("/api/v1/sessions/{id}/submit"), None, None).await;
    app.wait_for_attempts(1).await;

    let (_, body) = app.send("GET", "/api/v1/quizzes", Some("anna"), None).await;
    assert_eq!(status_of(&body, quiz), "repeat");

    // Second attempt: everything right.
    let (_, session) = app.send("POST", &format!("/api/v1/quizzes/{quiz}/sessions"), Some("anna"), None).await;
    let id = session["session_id"].as_str().unwrap().to_string();
    app.send("PUT", &format!("/api/v1/sessions/{id}/answers/dd-1"), None, Some(json!({ "value": [0, 2] }))).await;
    app.send("PUT", &format!("/api/v1/sessions/{id}/answers/dd-2"), None, Some(json!({ "value": 1 }))).await;
    let (_, result) = app.send("POST", &format!("/api/v1/sessions/{id}/submit"), None, None).await;
    assert_eq!(result["percentage"], 100);
    app.wait_for_attempts(2).await;

    let (_, body) = app.send("GET", "/api/v1/quizzes", Some("anna"), None).await;
    assert_eq!(status_of(&body, quiz), "mastered");

    // Other users and anonymous callers are unaffected.
    let (_, body) = app.send("GET", "/api/v1/quizzes", Some("ben"), None).await;
    assert_eq!(status_of(&body, quiz), "open");
    let (_, body) = app.send("GET", "/api/v1/quizzes", None, None).await;
    assert_eq!(status_of(&body, quiz), "open");

    let (status, detail) = app.send("GET", &format!("/api/v1/quizzes/{quiz}"), Some("anna"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["time_limit_seconds"], 600);
    assert_eq!(detail["best_percentage"], 100);
    assert_eq!(detail["attempts"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_anonymous_attempts_are_not_persisted_by_default() {
    let app = common::create_test_app();
    let (_, session) = app.send("POST", "/api/v1/quizzes/didaktik-pruefung/sessions", None, None).await;
    let id = session["session_id"].as_str().unwrap().to_string();
    let (status, _) = app.send("POST", &format!("/api/v1/sessions/{id}/submit"), None, None).await;
    assert_eq!(status, StatusCode::OK);

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert!(app.backend.all_attempts().await.is_empty());
}
