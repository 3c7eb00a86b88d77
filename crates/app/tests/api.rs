use std::sync::Arc;

use app::{AppState, router};
use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header::CONTENT_TYPE},
};
use chrono::FixedOffset;
use serde_json::{Value, json};
use services::{AppServices, Clock, CompletionError, ai::CompletionProvider};
use storage::repository::Storage;
use study_core::time::fixed_now;
use tower::ServiceExt;

struct CannedProvider(&'static str);

#[async_trait]
impl CompletionProvider for CannedProvider {
    async fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
        Ok(self.0.to_string())
    }
}

fn app_with(provider: Option<Arc<dyn CompletionProvider>>) -> Router {
    let services = AppServices::from_storage(
        &Storage::in_memory(),
        Clock::fixed(fixed_now()),
        FixedOffset::east_opt(0).unwrap(),
        provider,
    );
    router(AppState::from_services(services))
}

fn app() -> Router {
    app_with(None)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        request = request.header("x-user-id", user);
    }
    let request = match body {
        Some(body) => request
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn subject_body(name: &str) -> Value {
    json!({
        "name": name,
        "description": null,
        "difficulty": "medium",
        "examDate": "2023-12-01T09:00:00Z",
        "totalTopics": 4,
        "priority": "high"
    })
}

fn topic_body(name: &str) -> Value {
    json!({
        "name": name,
        "description": null,
        "difficulty": "easy",
        "estimatedHours": 2.0
    })
}

#[tokio::test]
async fn health_needs_no_identity() {
    let (status, body) = send(&app(), "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["aiEnabled"], false);
}

#[tokio::test]
async fn missing_or_blank_user_is_unauthorized() {
    let app = app();
    let (status, body) = send(&app, "GET", "/subjects", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = send(&app, "GET", "/subjects", Some("   "), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn profile_is_created_once() {
    let app = app();
    let (status, body) = send(&app, "GET", "/profile", Some("ada"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_null());

    let draft = json!({
        "name": "Ada",
        "studyIntensity": "medium",
        "preferredDifficulty": "medium",
        "dailyStudyHours": 2.0,
        "breakFrequency": 25
    });
    let (status, _) = send(&app, "POST", "/profile", Some("ada"), Some(draft.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(&app, "POST", "/profile", Some("ada"), Some(draft)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &app,
        "PATCH",
        "/profile",
        Some("ada"),
        Some(json!({ "breakFrequency": 40 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["breakFrequency"], 40);
    assert_eq!(body["name"], "Ada");
}

#[tokio::test]
async fn topic_progress_flows_into_subject() {
    let app = app();
    let (status, subject) =
        send(&app, "POST", "/subjects", Some("ada"), Some(subject_body("Chemistry"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(subject["completedTopics"], 0);
    let subject_id = subject["id"].as_u64().unwrap();

    let mut topic_ids = Vec::new();
    for name in ["Atoms", "Bonds"] {
        let (status, topic) = send(
            &app,
            "POST",
            &format!("/subjects/{subject_id}/topics"),
            Some("ada"),
            Some(topic_body(name)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(topic["completed"], false);
        topic_ids.push(topic["id"].as_u64().unwrap());
    }

    let (status, topic) = send(
        &app,
        "PATCH",
        &format!("/topics/{}/progress", topic_ids[0]),
        Some("ada"),
        Some(json!({ "completed": true, "masteryLevel": 150 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(topic["masteryLevel"], 100);

    let (_, subjects) = send(&app, "GET", "/subjects", Some("ada"), None).await;
    assert_eq!(subjects[0]["completedTopics"], 1);

    let (status, progress) = send(
        &app,
        "GET",
        &format!("/subjects/{subject_id}/progress"),
        Some("ada"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(progress["completedTopics"], 1);
    assert_eq!(progress["totalTopics"], 2);

    let (status, _) = send(
        &app,
        "GET",
        &format!("/subjects/{subject_id}/progress"),
        Some("mallory"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/subjects/{subject_id}"),
        Some("mallory"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/subjects/{subject_id}"),
        Some("ada"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, topics) = send(
        &app,
        "GET",
        &format!("/subjects/{subject_id}/topics"),
        Some("ada"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(topics, json!([]));
}

#[tokio::test]
async fn blank_subject_name_is_rejected() {
    let (status, body) =
        send(&app(), "POST", "/subjects", Some("ada"), Some(subject_body("  "))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn ending_a_session_twice_conflicts() {
    let app = app();
    let (status, session) = send(&app, "POST", "/sessions", Some("ada"), Some(json!({}))).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = session["id"].as_u64().unwrap();

    let (_, active) = send(&app, "GET", "/sessions/active", Some("ada"), None).await;
    assert_eq!(active["id"].as_u64(), Some(id));

    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/sessions/{id}/activity"),
        Some("ada"),
        Some(json!({ "interactionCount": 3, "focusLevel": "high" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let end = format!("/sessions/{id}/end");
    let (status, ended) = send(
        &app,
        "POST",
        &end,
        Some("ada"),
        Some(json!({ "notes": "covered chapter 2" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ended["sessionId"].as_u64(), Some(id));
    assert_eq!(ended["duration"], 0);

    let (status, _) = send(&app, "POST", &end, Some("ada"), Some(json!({}))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, active) = send(&app, "GET", "/sessions/active", Some("ada"), None).await;
    assert!(active.is_null());

    let (_, recent) = send(&app, "GET", "/sessions/recent?limit=5", Some("ada"), None).await;
    assert_eq!(recent.as_array().map(Vec::len), Some(1));

    let (status, stats) = send(&app, "GET", "/analytics", Some("ada"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalSessions"], 1);

    let (status, _) = send(
        &app,
        "GET",
        "/analytics?days=7&tzOffsetMinutes=1440",
        Some("ada"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_analytics_window_is_a_bad_request() {
    let app = app();
    let (status, body) = send(
        &app,
        "GET",
        &format!("/analytics?days={}", u32::MAX),
        Some("ada"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, stats) = send(&app, "GET", "/analytics?days=0", Some("ada"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalSessions"], 0);
}

#[tokio::test]
async fn saved_quiz_is_graded_by_the_server() {
    let app = app();
    let (_, subject) =
        send(&app, "POST", "/subjects", Some("ada"), Some(subject_body("Physics"))).await;
    let subject_id = subject["id"].as_u64().unwrap();

    let question = json!({
        "question": "Unit of force?",
        "options": ["joule", "newton", "watt", "pascal"],
        "correctAnswer": 1,
        "explanation": "1 N = 1 kg m/s^2"
    });
    let (status, quiz) = send(
        &app,
        "POST",
        &format!("/subjects/{subject_id}/quizzes"),
        Some("ada"),
        Some(json!({
            "title": "Mechanics",
            "topicId": null,
            "difficulty": "easy",
            "questions": [question.clone(), question]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let quiz_id = quiz["id"].as_u64().unwrap();

    let attempts = format!("/quizzes/{quiz_id}/attempts");
    let (status, _) = send(
        &app,
        "POST",
        &attempts,
        Some("ada"),
        Some(json!({ "answers": [1], "timeSpent": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, attempt) = send(
        &app,
        "POST",
        &attempts,
        Some("ada"),
        Some(json!({ "answers": [1, 0], "timeSpent": 42 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(attempt["score"], 50);

    let (status, _) = send(&app, "GET", &attempts, Some("mallory"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, listed) = send(&app, "GET", &attempts, Some("ada"), None).await;
    assert_eq!(listed.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn ai_routes_are_unavailable_without_a_provider() {
    let (status, body) = send(
        &app(),
        "POST",
        "/ai/explain",
        Some("ada"),
        Some(json!({
            "topic": "Entropy",
            "subject": "Physics",
            "difficulty": "easy"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn unusable_quiz_completion_is_tagged_as_fallback() {
    let app = app_with(Some(Arc::new(CannedProvider("I cannot produce JSON today."))));
    let (status, body) = send(
        &app,
        "POST",
        "/ai/quiz",
        Some("ada"),
        Some(json!({
            "subject": "Biology",
            "topic": "cells",
            "difficulty": "medium",
            "questionCount": 3
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "fallbackUsed");
    assert_eq!(body["questions"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["questions"][0]["correctAnswer"], 0);
}

#[tokio::test]
async fn chat_returns_completion_text() {
    let app = app_with(Some(Arc::new(CannedProvider("Let's review osmosis."))));
    let (status, body) = send(
        &app,
        "POST",
        "/ai/chat",
        Some("ada"),
        Some(json!({
            "message": "What's next?",
            "conversationHistory": [
                { "role": "user", "content": "hi" },
                { "role": "assistant", "content": "hello" }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "Let's review osmosis.");
}
