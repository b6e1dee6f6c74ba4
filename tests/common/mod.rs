use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use study_quiz_backend::{
    backend::MemoryBackend,
    config::SessionSettings,
    routes::build_router,
    seeds::{seed_decks, seed_modules, seed_quizzes},
    state::AppState,
};
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub backend: Arc<MemoryBackend>,
}

pub fn create_test_app() -> TestApp {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let backend = Arc::new(MemoryBackend::new(seed_quizzes()));
    let state = AppState::with_backend(backend.clone(), SessionSettings::default(), seed_decks(), seed_modules());
    TestApp { router: build_router(Arc::new(state)), backend }
}

impl TestApp {
    /// Send one request; returns the status and the JSON body (Null when empty).
    pub async fn send(&self, method: &str, uri: &str, user: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header("x-user-id", user);
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, json)
    }

    /// Wait until the detached persistence tasks have landed `count` attempts.
    pub async fn wait_for_attempts(&self, count: usize) {
        for _ in 0..200 {
            if self.backend.all_attempts().await.len() >= count {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        panic!("expected {count} persisted attempts");
    }
}
