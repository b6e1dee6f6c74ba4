//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented; the caller's identity comes from the `x-user-id` header.

use std::sync::Arc;
use axum::{
  extract::{Path, Query, State},
  http::{HeaderMap, StatusCode},
  response::IntoResponse,
  Json,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::Module;
use crate::error::AppResult;
use crate::logic::{self, Direction};
use crate::protocol::*;
use crate::state::AppState;
use crate::util::user_id_from_headers;

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut { ok: true, backend: state.backend.name() })
}

// -------- Quizzes --------

#[instrument(level = "info", skip(state, headers))]
pub async fn http_list_quizzes(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
) -> AppResult<Json<Vec<QuizSummaryOut>>> {
  let user_id = user_id_from_headers(&headers);
  let quizzes = logic::quiz_overview(&state, user_id.as_deref()).await?;
  info!(target: "quiz", count = quizzes.len(), anonymous = user_id.is_none(), "HTTP quiz overview served");
  Ok(Json(quizzes))
}

#[instrument(level = "info", skip(state, headers))]
pub async fn http_get_quiz(
  State(state): State<Arc<AppState>>,
  Path(quiz_id): Path<String>,
  headers: HeaderMap,
) -> AppResult<Json<QuizDetailOut>> {
  let user_id = user_id_from_headers(&headers);
  Ok(Json(logic::quiz_detail(&state, &quiz_id, user_id.as_deref()).await?))
}

#[instrument(level = "info", skip(state, headers))]
pub async fn http_start_session(
  State(state): State<Arc<AppState>>,
  Path(quiz_id): Path<String>,
  headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
  let session = logic::start_session(&state, &quiz_id, user_id_from_headers(&headers)).await?;
  info!(target: "quiz", session_id = %session.session_id, %quiz_id, "HTTP session started");
  Ok((StatusCode::CREATED, Json(session)))
}

// -------- Sessions --------

#[instrument(level = "debug", skip(state))]
pub async fn http_get_session(
  State(state): State<Arc<AppState>>,
  Path(session_id): Path<Uuid>,
) -> AppResult<Json<SessionOut>> {
  Ok(Json(logic::session_view(&state, session_id).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_abandon_session(
  State(state): State<Arc<AppState>>,
  Path(session_id): Path<Uuid>,
) -> AppResult<StatusCode> {
  logic::abandon(&state, session_id).await?;
  Ok(StatusCode::NO_CONTENT)
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_put_answer(
  State(state): State<Arc<AppState>>,
  Path((session_id, question_id)): Path<(Uuid, String)>,
  Json(body): Json<AnswerIn>,
) -> AppResult<Json<SessionOut>> {
  Ok(Json(logic::record_answer(&state, session_id, &question_id, body.value).await?))
}

#[instrument(level = "info", skip(state, body), fields(option = body.option))]
pub async fn http_toggle_option(
  State(state): State<Arc<AppState>>,
  Path((session_id, question_id)): Path<(Uuid, String)>,
  Json(body): Json<ToggleIn>,
) -> AppResult<Json<SessionOut>> {
  Ok(Json(logic::toggle_option(&state, session_id, &question_id, body.option).await?))
}

#[instrument(level = "debug", skip(state))]
pub async fn http_next(
  State(state): State<Arc<AppState>>,
  Path(session_id): Path<Uuid>,
) -> AppResult<Json<SessionOut>> {
  Ok(Json(logic::navigate(&state, session_id, Direction::Next).await?))
}

#[instrument(level = "debug", skip(state))]
pub async fn http_previous(
  State(state): State<Arc<AppState>>,
  Path(session_id): Path<Uuid>,
) -> AppResult<Json<SessionOut>> {
  Ok(Json(logic::navigate(&state, session_id, Direction::Previous).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_submit(
  State(state): State<Arc<AppState>>,
  Path(session_id): Path<Uuid>,
) -> AppResult<Json<ResultOut>> {
  Ok(Json(logic::submit(&state, session_id).await?))
}

// -------- Flashcards --------

#[instrument(level = "info", skip(state))]
pub async fn http_list_decks(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(logic::list_decks(&state))
}

#[instrument(level = "info", skip(state))]
pub async fn http_start_review(
  State(state): State<Arc<AppState>>,
  Path(deck_id): Path<String>,
) -> AppResult<impl IntoResponse> {
  let review = logic::start_review(&state, &deck_id).await?;
  Ok((StatusCode::CREATED, Json(review)))
}

#[instrument(level = "debug", skip(state))]
pub async fn http_get_review(
  State(state): State<Arc<AppState>>,
  Path(review_id): Path<Uuid>,
) -> AppResult<Json<DeckReviewOut>> {
  Ok(Json(logic::review_view(&state, review_id).await?))
}

#[instrument(level = "debug", skip(state, body))]
pub async fn http_mark_card(
  State(state): State<Arc<AppState>>,
  Path(review_id): Path<Uuid>,
  Json(body): Json<MarkIn>,
) -> AppResult<Json<DeckReviewOut>> {
  Ok(Json(logic::mark_card(&state, review_id, body.result).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_restart_review(
  State(state): State<Arc<AppState>>,
  Path(review_id): Path<Uuid>,
) -> AppResult<Json<DeckReviewOut>> {
  Ok(Json(logic::restart_review(&state, review_id).await?))
}

// -------- Summaries --------

#[instrument(level = "info", skip(state, query), fields(q = query.q.as_deref().unwrap_or("")))]
pub async fn http_list_modules(
  State(state): State<Arc<AppState>>,
  Query(query): Query<ModuleQuery>,
) -> impl IntoResponse {
  let modules = logic::list_modules(&state, query.q.as_deref());
  info!(target: "study_backend", count = modules.len(), "HTTP module catalogue served");
  Json(modules)
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_module(
  State(state): State<Arc<AppState>>,
  Path(module_id): Path<String>,
) -> AppResult<Json<Module>> {
  Ok(Json(logic::module_detail(&state, &module_id)?))
}
