//! Quiz session state machine: `Active(index)` -> `Submitted(result)`.
//!
//! The session owns the answer store and the optional countdown. Submission is
//! idempotent: the first call scores a snapshot of the answers, every later
//! call hands back the same shared result.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::answers::AnswerStore;
use crate::domain::{Answer, Question, QuestionKind, QuestionType};
use crate::scoring::{self, QuizResult};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
  #[error("unknown question: {0}")]
  UnknownQuestion(String),
  #[error("answer does not fit {expected:?} question {question_id}: {reason}")]
  ShapeViolation { question_id: String, expected: QuestionType, reason: &'static str },
  #[error("session already submitted")]
  AlreadySubmitted,
}

#[derive(Clone, Debug)]
enum Phase {
  Active,
  Submitted(Arc<QuizResult>),
}

/// Outcome of `submit`: the result, and whether this call made the transition.
#[derive(Clone, Debug)]
pub struct Submission {
  pub result: Arc<QuizResult>,
  pub first: bool,
}

/// Outcome of one countdown tick.
#[derive(Clone, Debug)]
pub enum Tick {
  Running { remaining: u32 },
  /// Time ran out; the tick itself performed the submission.
  Expired(Submission),
  /// No countdown, or the session is already submitted.
  Idle,
}

#[derive(Clone, Debug)]
pub struct QuizSession {
  quiz_id: String,
  questions: Arc<[Question]>,
  answers: AnswerStore,
  current_index: usize,
  remaining_seconds: Option<u32>,
  phase: Phase,
}

impl QuizSession {
  /// `questions` must already be in presentation order.
  pub fn new(quiz_id: impl Into<String>, questions: Arc<[Question]>, time_limit_seconds: Option<u32>) -> Self {
    Self {
      quiz_id: quiz_id.into(),
      questions,
      answers: AnswerStore::new(),
      current_index: 0,
      remaining_seconds: time_limit_seconds.filter(|s| *s > 0),
      phase: Phase::Active,
    }
  }

  pub fn quiz_id(&self) -> &str {
    &self.quiz_id
  }

  pub fn questions(&self) -> &[Question] {
    &self.questions
  }

  pub fn current_index(&self) -> usize {
    self.current_index
  }

  pub fn current_question(&self) -> Option<&Question> {
    self.questions.get(self.current_index)
  }

  pub fn answer(&self, question_id: &str) -> Option<&Answer> {
    self.answers.get(question_id)
  }

  pub fn remaining_seconds(&self) -> Option<u32> {
    self.remaining_seconds
  }

  pub fn is_submitted(&self) -> bool {
    matches!(self.phase, Phase::Submitted(_))
  }

  pub fn result(&self) -> Option<Arc<QuizResult>> {
    match &self.phase {
      Phase::Submitted(result) => Some(result.clone()),
      Phase::Active => None,
    }
  }

  /// Replace the answer for a question. The value must match the question's shape.
  pub fn record_answer(&mut self, question_id: &str, answer: Answer) -> Result<(), SessionError> {
    let question = self.active_question(question_id)?;
    if let Err(reason) = check_shape(&question.kind, &answer) {
      let err = SessionError::ShapeViolation {
        question_id: question_id.to_string(),
        expected: question.kind.question_type(),
        reason,
      };
      warn!(target: "quiz", quiz_id = %self.quiz_id, %question_id, error = %err, "Rejected answer");
      return Err(err);
    }
    self.answers.set(question_id, answer);
    Ok(())
  }

  /// Flip one option of a multiple-choice selection.
  pub fn toggle_option(&mut self, question_id: &str, option: usize) -> Result<(), SessionError> {
    let question = self.active_question(question_id)?;
    let reason = match &question.kind {
      QuestionKind::MultipleChoice { options, .. } if option < options.len() => None,
      QuestionKind::MultipleChoice { .. } => Some("option index out of range"),
      _ => Some("only multiple-choice questions can toggle options"),
    };
    if let Some(reason) = reason {
      let err = SessionError::ShapeViolation {
        question_id: question_id.to_string(),
        expected: question.kind.question_type(),
        reason,
      };
      warn!(target: "quiz", quiz_id = %self.quiz_id, %question_id, error = %err, "Rejected toggle");
      return Err(err);
    }
    let selected = self.answers.toggle(question_id, option);
    debug!(target: "quiz", %question_id, option, selected = selected.len(), "Toggled option");
    Ok(())
  }

  /// Clamped; a no-op on the last question and after submission.
  pub fn go_to_next(&mut self) -> usize {
    if !self.is_submitted() && self.current_index + 1 < self.questions.len() {
      self.current_index += 1;
    }
    self.current_index
  }

  /// Clamped; a no-op on the first question and after submission.
  pub fn go_to_previous(&mut self) -> usize {
    if !self.is_submitted() {
      self.current_index = self.current_index.saturating_sub(1);
    }
    self.current_index
  }

  /// Score the current answers and freeze the session. Safe to call repeatedly.
  pub fn submit(&mut self) -> Submission {
    if let Phase::Submitted(result) = &self.phase {
      return Submission { result: result.clone(), first: false };
    }
    let result = Arc::new(scoring::score(&self.questions, &self.answers));
    info!(
      target: "quiz",
      quiz_id = %self.quiz_id,
      score = result.score,
      max_score = result.max_score,
      percentage = result.percentage,
      band = ?result.band,
      "Session submitted"
    );
    self.phase = Phase::Submitted(result.clone());
    Submission { result, first: true }
  }

  /// Advance the countdown by one second. A limit of N seconds submits on the Nth tick, when remaining reaches 0.
  pub fn tick(&mut self) -> Tick {
    if self.is_submitted() {
      return Tick::Idle;
    }
    let Some(remaining) = self.remaining_seconds else {
      return Tick::Idle;
    };
    let remaining = remaining.saturating_sub(1);
    self.remaining_seconds = Some(remaining);
    if remaining == 0 {
      info!(target: "quiz", quiz_id = %self.quiz_id, "Time limit reached");
      Tick::Expired(self.submit())
    } else {
      Tick::Running { remaining }
    }
  }

  fn active_question(&self, question_id: &str) -> Result<&Question, SessionError> {
    if self.is_submitted() {
      return Err(SessionError::AlreadySubmitted);
    }
    self
      .questions
      .iter()
      .find(|q| q.id == question_id)
      .ok_or_else(|| SessionError::UnknownQuestion(question_id.to_string()))
  }
}

fn check_shape(kind: &QuestionKind, answer: &Answer) -> Result<(), &'static str> {
  match (kind, answer) {
    (QuestionKind::SingleChoice { options, .. }, Answer::Choice(i)) => {
      if *i < options.len() { Ok(()) } else { Err("option index out of range") }
    }
    (QuestionKind::MultipleChoice { options, .. }, Answer::Choices(selected)) => {
      if selected.iter().all(|i| *i < options.len()) { Ok(()) } else { Err("option index out of range") }
    }
    (QuestionKind::ShortAnswer, Answer::Text(_)) => Ok(()),
    (QuestionKind::SingleChoice { .. }, _) => Err("expected a single option index"),
    (QuestionKind::MultipleChoice { .. }, _) => Err("expected a set of option indices"),
    (QuestionKind::ShortAnswer, _) => Err("expected free text"),
  }
}
