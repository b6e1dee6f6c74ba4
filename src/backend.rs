//! Backend gateway: quizzes, questions and attempts live in a remote relational
//! backend exposed over a PostgREST-style REST API.
//!
//! `RestBackend` talks to that API; `MemoryBackend` serves the local quiz bank
//! and keeps attempts in memory when no backend is configured.
//!
//! NOTE: We never log the API key; request logs carry table names, ids and sizes.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::{
  questions_from_rows, Attempt, InvalidQuestion, NewAttempt, Question, QuestionRow, Quiz, QuizListing,
};
use crate::util::trunc_for_log;

#[derive(Debug, Error)]
pub enum BackendError {
  #[error("backend request failed: {0}")]
  Http(#[from] reqwest::Error),
  #[error("backend HTTP {status}: {message}")]
  Status { status: u16, message: String },
  #[error("{what} not found: {id}")]
  NotFound { what: &'static str, id: String },
  #[error("invalid record: {0}")]
  InvalidRecord(#[from] InvalidQuestion),
}

/// Everything the service needs from the remote backend.
#[async_trait]
pub trait QuizBackend: Send + Sync {
  /// Short name for logs.
  fn name(&self) -> &'static str;

  async fn list_quizzes(&self) -> Result<Vec<QuizListing>, BackendError>;

  async fn fetch_quiz(&self, quiz_id: &str) -> Result<Quiz, BackendError>;

  /// Questions in presentation order.
  async fn fetch_questions(&self, quiz_id: &str) -> Result<Vec<Question>, BackendError>;

  async fn insert_attempt(&self, attempt: &NewAttempt) -> Result<(), BackendError>;

  /// Attempts of one user, newest first, optionally restricted to one quiz.
  async fn fetch_attempts(&self, user_id: &str, quiz_id: Option<&str>) -> Result<Vec<Attempt>, BackendError>;
}

#[derive(Clone)]
pub struct RestBackend {
  pub client: reqwest::Client,
  pub base_url: String,
  api_key: Option<String>,
}

impl RestBackend {
  /// Construct the client if we find BACKEND_URL; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let base_url = std::env::var("BACKEND_URL").ok()?;
    let api_key = std::env::var("BACKEND_API_KEY").ok();
    Self::new(base_url, api_key).ok()
  }

  pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self, BackendError> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(10))
      .build()?;
    let base_url = base_url.into().trim_end_matches('/').to_string();
    Ok(Self { client, base_url, api_key })
  }

  fn table_url(&self, table: &str) -> String {
    format!("{}/rest/v1/{}", self.base_url, table)
  }

  fn request(&self, method: reqwest::Method, table: &str) -> reqwest::RequestBuilder {
    let mut req = self
      .client
      .request(method, self.table_url(table))
      .header(USER_AGENT, "study-quiz-backend/0.1")
      .header(CONTENT_TYPE, "application/json");
    if let Some(key) = &self.api_key {
      req = req.header("apikey", key).header(AUTHORIZATION, format!("Bearer {}", key));
    }
    req
  }

  /// GET a table with PostgREST filters and decode the row array.
  #[instrument(level = "debug", skip(self, query))]
  async fn select<T: for<'a> Deserialize<'a>>(&self, table: &str, query: &[(&str, String)]) -> Result<Vec<T>, BackendError> {
    let start = std::time::Instant::now();
    let res = self.request(reqwest::Method::GET, table).query(query).send().await?;
    let res = check_status(res).await?;
    let rows: Vec<T> = res.json().await?;
    info!(target: "backend", %table, rows = rows.len(), elapsed = ?start.elapsed(), "Rows fetched");
    Ok(rows)
  }
}

#[async_trait]
impl QuizBackend for RestBackend {
  fn name(&self) -> &'static str {
    "rest"
  }

  async fn list_quizzes(&self) -> Result<Vec<QuizListing>, BackendError> {
    #[derive(Deserialize)]
    struct CountRow { count: usize }
    #[derive(Deserialize)]
    struct ListingRow {
      #[serde(flatten)] quiz: Quiz,
      #[serde(default)] questions: Vec<CountRow>,
    }

    let rows: Vec<ListingRow> = self
      .select(
        "quizzes",
        &[("select", "*,questions:quiz_questions(count)".into()), ("order", "created_at.desc".into())],
      )
      .await?;
    Ok(
      rows
        .into_iter()
        .map(|r| QuizListing {
          question_count: r.questions.first().map(|c| c.count).unwrap_or(0),
          quiz: r.quiz,
        })
        .collect(),
    )
  }

  async fn fetch_quiz(&self, quiz_id: &str) -> Result<Quiz, BackendError> {
    let rows: Vec<Quiz> = self
      .select("quizzes", &[("select", "*".into()), ("id", format!("eq.{quiz_id}")), ("limit", "1".into())])
      .await?;
    rows
      .into_iter()
      .next()
      .ok_or_else(|| BackendError::NotFound { what: "quiz", id: quiz_id.to_string() })
  }

  async fn fetch_questions(&self, quiz_id: &str) -> Result<Vec<Question>, BackendError> {
    let rows: Vec<QuestionRow> = self
      .select(
        "quiz_questions",
        &[("select", "*".into()), ("quiz_id", format!("eq.{quiz_id}")), ("order", "order.asc".into())],
      )
      .await?;
    Ok(questions_from_rows(rows)?)
  }

  #[instrument(level = "info", skip(self, attempt), fields(quiz_id = %attempt.quiz_id, score = attempt.score, max_score = attempt.max_score))]
  async fn insert_attempt(&self, attempt: &NewAttempt) -> Result<(), BackendError> {
    let res = self
      .request(reqwest::Method::POST, "quiz_attempts")
      .header("Prefer", "return=minimal")
      .json(attempt)
      .send()
      .await?;
    check_status(res).await?;
    info!(target: "backend", quiz_id = %attempt.quiz_id, "Attempt stored");
    Ok(())
  }

  async fn fetch_attempts(&self, user_id: &str, quiz_id: Option<&str>) -> Result<Vec<Attempt>, BackendError> {
    let mut query = vec![
      ("select", "*".to_string()),
      ("user_id", format!("eq.{user_id}")),
      ("order", "created_at.desc".to_string()),
    ];
    if let Some(quiz_id) = quiz_id {
      query.push(("quiz_id", format!("eq.{quiz_id}")));
    }
    self.select("quiz_attempts", &query).await
  }
}

async fn check_status(res: reqwest::Response) -> Result<reqwest::Response, BackendError> {
  if res.status().is_success() {
    return Ok(res);
  }
  let status = res.status().as_u16();
  let body = res.text().await.unwrap_or_default();
  let message = extract_backend_error(&body).unwrap_or_else(|| trunc_for_log(&body, 300));
  Err(BackendError::Status { status, message })
}

/// Try to extract a clean error message from a PostgREST error body.
fn extract_backend_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EObj { message: String }
  serde_json::from_str::<EObj>(body).ok().map(|e| e.message)
}

/// In-process backend: a fixed quiz bank plus attempts recorded in memory.
pub struct MemoryBackend {
  quizzes: Vec<(Quiz, Vec<QuestionRow>)>,
  attempts: RwLock<Vec<Attempt>>,
}

impl MemoryBackend {
  pub fn new(quizzes: Vec<(Quiz, Vec<QuestionRow>)>) -> Self {
    Self { quizzes, attempts: RwLock::new(Vec::new()) }
  }

  fn entry(&self, quiz_id: &str) -> Result<&(Quiz, Vec<QuestionRow>), BackendError> {
    self
      .quizzes
      .iter()
      .find(|(q, _)| q.id == quiz_id)
      .ok_or_else(|| BackendError::NotFound { what: "quiz", id: quiz_id.to_string() })
  }

  /// Every stored attempt, oldest first.
  pub async fn all_attempts(&self) -> Vec<Attempt> {
    self.attempts.read().await.clone()
  }
}

#[async_trait]
impl QuizBackend for MemoryBackend {
  fn name(&self) -> &'static str {
    "memory"
  }

  async fn list_quizzes(&self) -> Result<Vec<QuizListing>, BackendError> {
    Ok(
      self
        .quizzes
        .iter()
        .map(|(quiz, rows)| QuizListing { quiz: quiz.clone(), question_count: rows.len() })
        .collect(),
    )
  }

  async fn fetch_quiz(&self, quiz_id: &str) -> Result<Quiz, BackendError> {
    Ok(self.entry(quiz_id)?.0.clone())
  }

  async fn fetch_questions(&self, quiz_id: &str) -> Result<Vec<Question>, BackendError> {
    Ok(questions_from_rows(self.entry(quiz_id)?.1.clone())?)
  }

  async fn insert_attempt(&self, attempt: &NewAttempt) -> Result<(), BackendError> {
    let stored = Attempt {
      id: Some(Uuid::new_v4().to_string()),
      quiz_id: attempt.quiz_id.clone(),
      user_id: attempt.user_id.clone(),
      score: attempt.score,
      max_score: attempt.max_score,
      status: attempt.status,
      created_at: Some(Utc::now()),
    };
    self.attempts.write().await.push(stored);
    info!(target: "backend", quiz_id = %attempt.quiz_id, "Attempt stored in memory");
    Ok(())
  }

  async fn fetch_attempts(&self, user_id: &str, quiz_id: Option<&str>) -> Result<Vec<Attempt>, BackendError> {
    let attempts = self.attempts.read().await;
    Ok(
      attempts
        .iter()
        .rev()
        .filter(|a| a.user_id.as_deref() == Some(user_id))
        .filter(|a| quiz_id.map_or(true, |id| a.quiz_id == id))
        .cloned()
        .collect(),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{AttemptStatus, QuestionType};

  fn bank() -> MemoryBackend {
    let quiz = Quiz {
      id: "q".into(),
      title: "Quiz".into(),
      description: String::new(),
      difficulty: String::new(),
      time_limit_seconds: None,
    };
    let rows = vec![
      QuestionRow {
        id: "second".into(),
        quiz_id: Some("q".into()),
        kind: QuestionType::ShortAnswer,
        question: "why?".into(),
        options: None,
        correct_answer: None,
        feedback: None,
        order: 1,
      },
      QuestionRow {
        id: "first".into(),
        quiz_id: Some("q".into()),
        kind: QuestionType::ShortAnswer,
        question: "what?".into(),
        options: None,
        correct_answer: None,
        feedback: None,
        order: 0,
      },
    ];
    MemoryBackend::new(vec![(quiz, rows)])
  }

  fn attempt(user: &str, quiz: &str, score: u32) -> NewAttempt {
    NewAttempt { quiz_id: quiz.into(), user_id: Some(user.into()), score, max_score: 4, status: AttemptStatus::Completed }
  }

  #[tokio::test]
  async fn memory_backend_orders_questions() {
    let backend = bank();
    let ids: Vec<String> = backend.fetch_questions("q").await.unwrap().into_iter().map(|q| q.id).collect();
    assert_eq!(ids, vec!["first", "second"]);
    assert!(matches!(backend.fetch_quiz("missing").await, Err(BackendError::NotFound { .. })));
  }

  #[tokio::test]
  async fn memory_backend_filters_attempts_newest_first() {
    let backend = bank();
    backend.insert_attempt(&attempt("u1", "q", 1)).await.unwrap();
    backend.insert_attempt(&attempt("u2", "q", 2)).await.unwrap();
    backend.insert_attempt(&attempt("u1", "other", 3)).await.unwrap();
    backend.insert_attempt(&attempt("u1", "q", 4)).await.unwrap();

    let mine: Vec<u32> = backend.fetch_attempts("u1", Some("q")).await.unwrap().iter().map(|a| a.score).collect();
    assert_eq!(mine, vec![4, 1]);
    assert_eq!(backend.fetch_attempts("u1", None).await.unwrap().len(), 3);
    assert_eq!(backend.all_attempts().await.len(), 4);
  }

  #[test]
  fn postgrest_error_bodies_are_unwrapped() {
    let body = r#"{"code":"42P01","message":"relation \"quiz_attempts\" does not exist"}"#;
    assert_eq!(extract_backend_error(body).as_deref(), Some("relation \"quiz_attempts\" does not exist"));
    assert_eq!(extract_backend_error("<html>"), None);
  }

  #[test]
  fn rest_urls_drop_trailing_slash() {
    let backend = RestBackend::new("https://db.example.org/", None).unwrap();
    assert_eq!(backend.table_url("quizzes"), "https://db.example.org/rest/v1/quizzes");
  }
}
