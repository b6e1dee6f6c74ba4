//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Quiz overview and detail (per-user status from prior attempts)
//!   - Quiz session lifecycle: start, answer, navigate, submit, abandon
//!   - Flashcard deck reviews
//!   - Summary module catalogue (list with search, detail)

use std::collections::HashMap;
use std::sync::Arc;

use tokio::time::Instant;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::{Answer, Attempt, Module};
use crate::error::{AppError, AppResult};
use crate::flashcards::{CardResult, DeckReview};
use crate::live::LiveSession;
use crate::protocol::*;
use crate::state::{AppState, ReviewSlot};

#[derive(Clone, Copy, Debug)]
pub enum Direction {
  Next,
  Previous,
}

/// No attempts: open. Any attempt at 80% or better: mastered. Otherwise: repeat.
pub fn quiz_status<'a>(attempts: impl IntoIterator<Item = &'a Attempt>) -> QuizStatus {
  let mut seen = false;
  for a in attempts {
    seen = true;
    if a.max_score > 0 && u64::from(a.score) * 5 >= u64::from(a.max_score) * 4 {
      return QuizStatus::Mastered;
    }
  }
  if seen { QuizStatus::Repeat } else { QuizStatus::Open }
}

/// Attempts of the user, or none for anonymous callers. Failures degrade to "no attempts".
async fn user_attempts(state: &AppState, user_id: Option<&str>, quiz_id: Option<&str>) -> Vec<Attempt> {
  let Some(user_id) = user_id else { return Vec::new() };
  match state.backend.fetch_attempts(user_id, quiz_id).await {
    Ok(a) => a,
    Err(e) => {
      warn!(target: "quiz", %user_id, error = %e, "Could not load prior attempts");
      Vec::new()
    }
  }
}

#[instrument(level = "info", skip(state))]
pub async fn quiz_overview(state: &AppState, user_id: Option<&str>) -> AppResult<Vec<QuizSummaryOut>> {
  let listings = state.backend.list_quizzes().await?;
  let attempts = user_attempts(state, user_id, None).await;
  Ok(
    listings
      .into_iter()
      .map(|l| {
        let status = quiz_status(attempts.iter().filter(|a| a.quiz_id == l.quiz.id));
        QuizSummaryOut {
          id: l.quiz.id,
          title: l.quiz.title,
          description: l.quiz.description,
          difficulty: l.quiz.difficulty,
          time_limit_seconds: l.quiz.time_limit_seconds,
          question_count: l.question_count,
          status,
        }
      })
      .collect(),
  )
}

#[instrument(level = "info", skip(state))]
pub async fn quiz_detail(state: &AppState, quiz_id: &str, user_id: Option<&str>) -> AppResult<QuizDetailOut> {
  let quiz = state.backend.fetch_quiz(quiz_id).await?;
  let question_count = state.backend.fetch_questions(quiz_id).await?.len();
  let attempts = user_attempts(state, user_id, Some(quiz_id)).await;
  Ok(QuizDetailOut {
    quiz,
    question_count,
    status: quiz_status(&attempts),
    best_percentage: attempts.iter().map(Attempt::percentage).max(),
    attempts: attempts.iter().map(AttemptOut::from).collect(),
  })
}

/// Load the quiz once and open a session on it. Nothing is registered on failure.
#[instrument(level = "info", skip(state))]
pub async fn start_session(state: &AppState, quiz_id: &str, user_id: Option<String>) -> AppResult<SessionOut> {
  let quiz = state.backend.fetch_quiz(quiz_id).await?;
  let questions = state.backend.fetch_questions(quiz_id).await?;
  let live = LiveSession::start(quiz, questions, user_id, state.backend.clone(), &state.settings).await;
  state.insert_session(live.clone()).await;
  Ok(live.inspect(|s| session_out(&live, s)).await)
}

async fn live_session(state: &AppState, session_id: Uuid) -> AppResult<Arc<LiveSession>> {
  state
    .session(session_id)
    .await
    .ok_or_else(|| AppError::NotFound(format!("session {}", session_id)))
}

pub async fn session_view(state: &AppState, session_id: Uuid) -> AppResult<SessionOut> {
  let live = live_session(state, session_id).await?;
  Ok(live.inspect(|s| session_out(&live, s)).await)
}

#[instrument(level = "info", skip(state, value))]
pub async fn record_answer(state: &AppState, session_id: Uuid, question_id: &str, value: Answer) -> AppResult<SessionOut> {
  let live = live_session(state, session_id).await?;
  live.record_answer(question_id, value).await?;
  Ok(live.inspect(|s| session_out(&live, s)).await)
}

#[instrument(level = "info", skip(state))]
pub async fn toggle_option(state: &AppState, session_id: Uuid, question_id: &str, option: usize) -> AppResult<SessionOut> {
  let live = live_session(state, session_id).await?;
  live.toggle_option(question_id, option).await?;
  Ok(live.inspect(|s| session_out(&live, s)).await)
}

#[instrument(level = "debug", skip(state))]
pub async fn navigate(state: &AppState, session_id: Uuid, direction: Direction) -> AppResult<SessionOut> {
  let live = live_session(state, session_id).await?;
  match direction {
    Direction::Next => live.go_to_next().await,
    Direction::Previous => live.go_to_previous().await,
  };
  Ok(live.inspect(|s| session_out(&live, s)).await)
}

#[instrument(level = "info", skip(state))]
pub async fn submit(state: &AppState, session_id: Uuid) -> AppResult<ResultOut> {
  let live = live_session(state, session_id).await?;
  let result = live.submit().await;
  info!(target: "quiz", %session_id, score = result.score, max_score = result.max_score, "Result served");
  Ok(live.inspect(|s| result_out(s.questions(), &result)).await)
}

/// Forget the session. An unsubmitted one leaves no attempt behind.
#[instrument(level = "info", skip(state))]
pub async fn abandon(state: &AppState, session_id: Uuid) -> AppResult<()> {
  let live = state
    .remove_session(session_id)
    .await
    .ok_or_else(|| AppError::NotFound(format!("session {}", session_id)))?;
  live.abandon().await;
  Ok(())
}

// -------- Flashcards --------

pub fn list_decks(state: &AppState) -> Vec<DeckOut> {
  state.decks.iter().map(DeckOut::from).collect()
}

#[instrument(level = "info", skip(state))]
pub async fn start_review(state: &AppState, deck_id: &str) -> AppResult<DeckReviewOut> {
  let deck = state
    .deck(deck_id)
    .cloned()
    .ok_or_else(|| AppError::NotFound(format!("deck {}", deck_id)))?;
  let review_id = Uuid::new_v4();
  let review = DeckReview::new(deck);
  let out = deck_review_out(review_id, &review);
  state.reviews.write().await.insert(review_id, ReviewSlot::new(review));
  info!(target: "flashcards", %deck_id, %review_id, "Deck review started");
  Ok(out)
}

pub async fn review_view(state: &AppState, review_id: Uuid) -> AppResult<DeckReviewOut> {
  let reviews = state.reviews.read().await;
  let slot = reviews
    .get(&review_id)
    .ok_or_else(|| AppError::NotFound(format!("review {}", review_id)))?;
  Ok(deck_review_out(review_id, &slot.review))
}

#[instrument(level = "debug", skip(state))]
pub async fn mark_card(state: &AppState, review_id: Uuid, result: CardResult) -> AppResult<DeckReviewOut> {
  let mut reviews = state.reviews.write().await;
  let review = review_mut(&mut reviews, review_id)?;
  review.mark(result)?;
  if review.is_completed() {
    info!(target: "flashcards", %review_id, known = review.known(), unknown = review.unknown(), "Deck review completed");
  }
  Ok(deck_review_out(review_id, review))
}

#[instrument(level = "debug", skip(state))]
pub async fn restart_review(state: &AppState, review_id: Uuid) -> AppResult<DeckReviewOut> {
  let mut reviews = state.reviews.write().await;
  let review = review_mut(&mut reviews, review_id)?;
  review.restart();
  Ok(deck_review_out(review_id, review))
}

/// Mutable access to a review; counts as activity for eviction.
fn review_mut(reviews: &mut HashMap<Uuid, ReviewSlot>, review_id: Uuid) -> AppResult<&mut DeckReview> {
  let slot = reviews
    .get_mut(&review_id)
    .ok_or_else(|| AppError::NotFound(format!("review {}", review_id)))?;
  slot.last_active = Instant::now();
  Ok(&mut slot.review)
}

// -------- Summaries --------

/// Modules whose title, description or section content contains `query` (case-insensitive).
#[instrument(level = "debug", skip(state))]
pub fn list_modules(state: &AppState, query: Option<&str>) -> Vec<ModuleSummaryOut> {
  let term = query.unwrap_or_default();
  state
    .modules
    .iter()
    .filter(|m| m.matches(term))
    .map(ModuleSummaryOut::from)
    .collect()
}

pub fn module_detail(state: &AppState, module_id: &str) -> AppResult<Module> {
  state
    .module(module_id)
    .cloned()
    .ok_or_else(|| AppError::NotFound(format!("module {}", module_id)))
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use super::*;
  use crate::backend::MemoryBackend;
  use crate::config::SessionSettings;
  use crate::domain::AttemptStatus;
  use crate::seeds::{seed_decks, seed_modules, seed_quizzes};

  fn attempt(score: u32, max_score: u32) -> Attempt {
    Attempt { id: None, quiz_id: "q".into(), user_id: Some("u".into()), score, max_score, status: AttemptStatus::Completed, created_at: None }
  }

  #[test]
  fn status_follows_best_attempt() {
    assert_eq!(quiz_status(&[]), QuizStatus::Open);
    assert_eq!(quiz_status(&[attempt(3, 5)]), QuizStatus::Repeat);
    assert_eq!(quiz_status(&[attempt(3, 5), attempt(4, 5)]), QuizStatus::Mastered);
    assert_eq!(quiz_status(&[attempt(0, 0)]), QuizStatus::Repeat);
  }

  fn state() -> AppState {
    let backend = Arc::new(MemoryBackend::new(seed_quizzes()));
    AppState::with_backend(backend, SessionSettings::default(), seed_decks(), seed_modules())
  }

  #[tokio::test(start_paused = true)]
  async fn sweep_evicts_submitted_sessions_after_retention() {
    let state = state();
    let retain = state.settings.retain_submitted_secs;

    let mut ids = Vec::new();
    for _ in 0..50 {
      let session = start_session(&state, "berufspaedagogik-grundlagen", None).await.unwrap();
      submit(&state, session.session_id).await.unwrap();
      ids.push(session.session_id);
    }
    let open = start_session(&state, "berufspaedagogik-grundlagen", None).await.unwrap();
    assert_eq!(state.sessions.read().await.len(), 51);

    // Results stay viewable for a while.
    assert_eq!(state.sweep().await, (0, 0));
    assert!(session_view(&state, ids[0]).await.unwrap().submitted);

    tokio::time::advance(Duration::from_secs(retain)).await;
    assert_eq!(state.sweep().await.0, 50);
    assert_eq!(state.sessions.read().await.len(), 1);
    assert!(matches!(session_view(&state, ids[0]).await, Err(AppError::NotFound(_))));
    assert!(session_view(&state, open.session_id).await.is_ok());
  }

  #[tokio::test(start_paused = true)]
  async fn sweep_drops_idle_sessions_and_reviews() {
    let state = state();
    let idle = Duration::from_secs(state.settings.idle_timeout_secs);

    let session = start_session(&state, "berufspaedagogik-grundlagen", None).await.unwrap();
    let kept = start_review(&state, "d1").await.unwrap();
    let dropped = start_review(&state, "d2").await.unwrap();

    tokio::time::advance(idle - Duration::from_secs(1)).await;
    mark_card(&state, kept.review_id, CardResult::Known).await.unwrap();
    tokio::time::advance(Duration::from_secs(1)).await;

    assert_eq!(state.sweep().await, (1, 1));
    assert!(session_view(&state, session.session_id).await.is_err());
    assert!(review_view(&state, kept.review_id).await.is_ok());
    assert!(review_view(&state, dropped.review_id).await.is_err());
  }

  #[test]
  fn module_listing_filters_by_query() {
    let state = state();
    let all = list_modules(&state, None);
    assert_eq!(all.len(), state.modules.len());
    assert_eq!(list_modules(&state, Some("   ")).len(), all.len());

    let hits = list_modules(&state, Some("LERNFELD"));
    assert!(!hits.is_empty());
    assert!(hits.len() < all.len());
    assert!(list_modules(&state, Some("gibt es nicht")).is_empty());

    assert!(matches!(module_detail(&state, "nope"), Err(AppError::NotFound(_))));
  }
}
