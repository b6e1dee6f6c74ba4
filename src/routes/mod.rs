//! Router assembly: HTTP endpoints, WebSocket upgrade, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws`
/// - quiz, session, deck and summary module endpoints under `/api/v1/...`
/// - static SPA from `./static` with index fallback
/// - permissive CORS and per-request trace spans
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new("./static/index.html"));

    let api = Router::new()
        .route("/health", get(http::http_health))
        // Quizzes
        .route("/quizzes", get(http::http_list_quizzes))
        .route("/quizzes/:quiz_id", get(http::http_get_quiz))
        .route("/quizzes/:quiz_id/sessions", post(http::http_start_session))
        // Sessions
        .route("/sessions/:session_id", get(http::http_get_session).delete(http::http_abandon_session))
        .route("/sessions/:session_id/answers/:question_id", put(http::http_put_answer))
        .route("/sessions/:session_id/answers/:question_id/toggle", post(http::http_toggle_option))
        .route("/sessions/:session_id/next", post(http::http_next))
        .route("/sessions/:session_id/previous", post(http::http_previous))
        .route("/sessions/:session_id/submit", post(http::http_submit))
        // Flashcards
        .route("/decks", get(http::http_list_decks))
        .route("/decks/:deck_id/reviews", post(http::http_start_review))
        .route("/reviews/:review_id", get(http::http_get_review))
        .route("/reviews/:review_id/mark", post(http::http_mark_card))
        .route("/reviews/:review_id/restart", post(http::http_restart_review))
        // Summaries
        .route("/modules", get(http::http_list_modules))
        .route("/modules/:module_id", get(http::http_get_module));

    Router::new()
        .route("/ws", get(ws::ws_upgrade))
        .nest("/api/v1", api)
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .fallback_service(static_service)
}
