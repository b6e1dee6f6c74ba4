//! A running quiz session shared between request handlers and its countdown task.
//!
//! All state changes go through one async mutex, so a timer expiry and a manual
//! submit can never both perform the transition. Persisting the attempt happens
//! in a detached task; its failure is logged and never reaches the learner.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::backend::QuizBackend;
use crate::config::SessionSettings;
use crate::domain::{Answer, AttemptStatus, NewAttempt, Question, Quiz};
use crate::scoring::QuizResult;
use crate::session::{QuizSession, SessionError, Submission, Tick};
use crate::timer;

pub struct LiveSession {
  pub id: Uuid,
  pub quiz: Quiz,
  pub user_id: Option<String>,
  session: Mutex<QuizSession>,
  backend: Arc<dyn QuizBackend>,
  persist_anonymous: bool,
  countdown: Mutex<Option<JoinHandle<()>>>,
  /// Last learner action, or the moment of submission.
  last_active: Mutex<Instant>,
}

impl LiveSession {
  /// Build the session and, for timed quizzes, start its countdown.
  #[instrument(level = "info", skip_all, fields(quiz_id = %quiz.id, questions = questions.len()))]
  pub async fn start(
    quiz: Quiz,
    questions: Vec<Question>,
    user_id: Option<String>,
    backend: Arc<dyn QuizBackend>,
    settings: &SessionSettings,
  ) -> Arc<Self> {
    let time_limit = quiz.time_limit();
    let live = Arc::new(Self {
      id: Uuid::new_v4(),
      session: Mutex::new(QuizSession::new(quiz.id.clone(), questions.into(), time_limit)),
      quiz,
      user_id,
      backend,
      persist_anonymous: settings.persist_anonymous,
      countdown: Mutex::new(None),
      last_active: Mutex::new(Instant::now()),
    });

    if let Some(limit) = time_limit {
      let period = Duration::from_millis(settings.tick_interval_ms.max(1));
      let handle = timer::spawn_countdown(Arc::downgrade(&live), period);
      *live.countdown.lock().await = Some(handle);
      info!(target: "quiz", session_id = %live.id, limit_seconds = limit, "Countdown started");
    }
    info!(target: "quiz", session_id = %live.id, user = ?live.user_id, "Session started");
    live
  }

  /// Run a read-only closure against the current state.
  pub async fn inspect<R>(&self, f: impl FnOnce(&QuizSession) -> R) -> R {
    let session = self.session.lock().await;
    f(&*session)
  }

  pub async fn record_answer(&self, question_id: &str, answer: Answer) -> Result<(), SessionError> {
    self.touch().await;
    self.session.lock().await.record_answer(question_id, answer)
  }

  pub async fn toggle_option(&self, question_id: &str, option: usize) -> Result<(), SessionError> {
    self.touch().await;
    self.session.lock().await.toggle_option(question_id, option)
  }

  pub async fn go_to_next(&self) -> usize {
    self.touch().await;
    self.session.lock().await.go_to_next()
  }

  pub async fn go_to_previous(&self) -> usize {
    self.touch().await;
    self.session.lock().await.go_to_previous()
  }

  /// Whether the registry may drop this session at `now`.
  /// Submitted sessions are kept `retain_submitted_secs` after submission,
  /// open ones until `idle_timeout_secs` without learner activity.
  pub async fn is_stale(&self, now: Instant, settings: &SessionSettings) -> bool {
    let idle = now.saturating_duration_since(*self.last_active.lock().await);
    let limit = if self.session.lock().await.is_submitted() {
      settings.retain_submitted_secs
    } else {
      settings.idle_timeout_secs
    };
    idle >= Duration::from_secs(limit)
  }

  async fn touch(&self) {
    *self.last_active.lock().await = Instant::now();
  }

  /// Manual submit. Idempotent; only the first call cancels the countdown and persists.
  #[instrument(level = "info", skip(self), fields(session_id = %self.id))]
  pub async fn submit(&self) -> Arc<QuizResult> {
    let submission = self.session.lock().await.submit();
    if submission.first {
      self.touch().await;
      self.cancel_countdown().await;
      self.persist(&submission);
    }
    submission.result
  }

  /// One countdown step; called by the timer task only.
  pub(crate) async fn tick(&self) -> Tick {
    let tick = self.session.lock().await.tick();
    if let Tick::Expired(submission) = &tick {
      self.touch().await;
      info!(target: "quiz", session_id = %self.id, "Auto-submitted on time limit");
      self.persist(submission);
    }
    tick
  }

  /// Drop an unsubmitted session: stop the countdown, persist nothing.
  pub async fn abandon(&self) {
    self.cancel_countdown().await;
    info!(target: "quiz", session_id = %self.id, "Session abandoned");
  }

  async fn cancel_countdown(&self) {
    if let Some(handle) = self.countdown.lock().await.take() {
      handle.abort();
    }
  }

  /// Fire-and-forget insert of the attempt for a fresh submission.
  fn persist(&self, submission: &Submission) {
    if !submission.first {
      return;
    }
    if self.user_id.is_none() && !self.persist_anonymous {
      info!(target: "quiz", session_id = %self.id, "Anonymous attempt not persisted");
      return;
    }
    let attempt = NewAttempt {
      quiz_id: self.quiz.id.clone(),
      user_id: self.user_id.clone(),
      score: submission.result.score,
      max_score: submission.result.max_score,
      status: AttemptStatus::Completed,
    };
    let backend = self.backend.clone();
    let session_id = self.id;
    tokio::spawn(async move {
      match backend.insert_attempt(&attempt).await {
        Ok(()) => info!(target: "quiz", %session_id, backend = backend.name(), "Attempt persisted"),
        Err(e) => error!(target: "quiz", %session_id, backend = backend.name(), error = %e, "Failed to persist attempt"),
      }
    });
  }
}
