//! Domain models used by the backend: quizzes, questions with their answer shapes,
//! learner answers, persisted attempts, flashcard decks and summary modules.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Quiz metadata as stored in the backend.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Quiz {
  pub id: String,
  pub title: String,
  #[serde(default)] pub description: String,
  #[serde(default)] pub difficulty: String, // free-form (e.g., "Grundlagen", "Vertiefung")
  #[serde(default)] pub time_limit_seconds: Option<u32>,
}

impl Quiz {
  /// The countdown only exists for a positive limit.
  pub fn time_limit(&self) -> Option<u32> {
    self.time_limit_seconds.filter(|s| *s > 0)
  }
}

/// Wire name of the three question kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
  SingleChoice,
  MultipleChoice,
  ShortAnswer,
}

/// `correct_answer` column: usually an index array, a bare index in hand-written
/// banks, and a (possibly empty) string for short answers.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum CorrectAnswerRow {
  Index(usize),
  Indices(Vec<usize>),
  Text(String),
}

/// Question row as the backend returns it (table `quiz_questions`).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct QuestionRow {
  pub id: String,
  #[serde(default)] pub quiz_id: Option<String>,
  #[serde(rename = "type")]
  pub kind: QuestionType,
  pub question: String,
  #[serde(default)] pub options: Option<Vec<String>>,
  #[serde(default)] pub correct_answer: Option<CorrectAnswerRow>,
  #[serde(default)] pub feedback: Option<String>,
  #[serde(default)] pub order: i64,
}

/// Each kind carries the shape of its own correct answer.
#[derive(Clone, Debug, PartialEq)]
pub enum QuestionKind {
  SingleChoice { options: Vec<String>, correct: usize },
  MultipleChoice { options: Vec<String>, correct: BTreeSet<usize> },
  /// Free text; never auto-graded.
  ShortAnswer,
}

impl QuestionKind {
  pub fn question_type(&self) -> QuestionType {
    match self {
      QuestionKind::SingleChoice { .. } => QuestionType::SingleChoice,
      QuestionKind::MultipleChoice { .. } => QuestionType::MultipleChoice,
      QuestionKind::ShortAnswer => QuestionType::ShortAnswer,
    }
  }

  pub fn options(&self) -> &[String] {
    match self {
      QuestionKind::SingleChoice { options, .. } | QuestionKind::MultipleChoice { options, .. } => options,
      QuestionKind::ShortAnswer => &[],
    }
  }

  pub fn is_scorable(&self) -> bool {
    !matches!(self, QuestionKind::ShortAnswer)
  }

  /// Correct option indices in ascending order (empty for short answers).
  pub fn correct_options(&self) -> Vec<usize> {
    match self {
      QuestionKind::SingleChoice { correct, .. } => vec![*correct],
      QuestionKind::MultipleChoice { correct, .. } => correct.iter().copied().collect(),
      QuestionKind::ShortAnswer => Vec::new(),
    }
  }
}

/// Immutable question once loaded into a session.
#[derive(Clone, Debug, PartialEq)]
pub struct Question {
  pub id: String,
  pub prompt: String,
  pub kind: QuestionKind,
  pub feedback: String,
  pub order: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidQuestion {
  #[error("question {id}: {kind:?} needs at least one option")]
  MissingOptions { id: String, kind: QuestionType },
  #[error("question {id}: single choice needs a correct option index")]
  MissingCorrectIndex { id: String },
  #[error("question {id}: correct index {index} is outside {len} options")]
  IndexOutOfRange { id: String, index: usize, len: usize },
}

impl TryFrom<QuestionRow> for Question {
  type Error = InvalidQuestion;

  fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
    let kind = match row.kind {
      QuestionType::ShortAnswer => QuestionKind::ShortAnswer,
      choice => {
        let options = row.options.unwrap_or_default();
        if options.is_empty() {
          return Err(InvalidQuestion::MissingOptions { id: row.id, kind: choice });
        }
        let indices: Vec<usize> = match row.correct_answer {
          Some(CorrectAnswerRow::Index(i)) => vec![i],
          Some(CorrectAnswerRow::Indices(v)) => v,
          Some(CorrectAnswerRow::Text(_)) | None => Vec::new(),
        };
        if let Some(&index) = indices.iter().find(|i| **i >= options.len()) {
          return Err(InvalidQuestion::IndexOutOfRange { id: row.id, index, len: options.len() });
        }
        if choice == QuestionType::SingleChoice {
          // Stored as a one-element array; only the first entry counts.
          let correct = *indices.first().ok_or_else(|| InvalidQuestion::MissingCorrectIndex { id: row.id.clone() })?;
          QuestionKind::SingleChoice { options, correct }
        } else {
          QuestionKind::MultipleChoice { options, correct: indices.into_iter().collect() }
        }
      }
    };

    Ok(Question {
      id: row.id,
      prompt: row.question,
      kind,
      feedback: row.feedback.unwrap_or_default(),
      order: row.order,
    })
  }
}

/// Convert backend rows and stable-sort them into presentation order.
pub fn questions_from_rows(rows: Vec<QuestionRow>) -> Result<Vec<Question>, InvalidQuestion> {
  let mut questions = rows.into_iter().map(Question::try_from).collect::<Result<Vec<_>, _>>()?;
  questions.sort_by_key(|q| q.order);
  Ok(questions)
}

/// A learner's answer. On the wire: a number, an array of numbers, or a string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
  Choice(usize),
  Choices(BTreeSet<usize>),
  Text(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
  Completed,
}

/// Insert payload for table `quiz_attempts`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NewAttempt {
  pub quiz_id: String,
  pub user_id: Option<String>,
  pub score: u32,
  pub max_score: u32,
  pub status: AttemptStatus,
}

/// Attempt read back from the backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
  #[serde(default)] pub id: Option<String>,
  pub quiz_id: String,
  #[serde(default)] pub user_id: Option<String>,
  pub score: u32,
  pub max_score: u32,
  pub status: AttemptStatus,
  #[serde(default)] pub created_at: Option<DateTime<Utc>>,
}

impl Attempt {
  pub fn percentage(&self) -> u8 {
    crate::scoring::percentage(self.score, self.max_score)
  }
}

/// Quiz plus its question count, as listed in the overview.
#[derive(Clone, Debug, PartialEq)]
pub struct QuizListing {
  pub quiz: Quiz,
  pub question_count: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Flashcard {
  pub id: String,
  pub front: String,
  pub back: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Deck {
  pub id: String,
  pub title: String,
  #[serde(default)] pub cards: Vec<Flashcard>,
}

/// Kind of a summary section; fixes the order a module is usually written in.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
  Schwerpunkte,
  Begriffe,
  Beispiele,
  Fragen,
  Fazit,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Section {
  pub id: String,
  #[serde(rename = "type")]
  pub kind: SectionType,
  pub title: String,
  #[serde(default)] pub content: String,
}

/// Metadata of a PDF attached to a module. The file itself lives elsewhere.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PdfFile {
  pub id: String,
  pub name: String,
  pub upload_date: String,
  pub url: String,
}

/// A summary module: course notes split into sections, plus linked PDFs.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Module {
  pub id: String,
  pub title: String,
  #[serde(default)] pub description: String,
  #[serde(default)] pub added_by: String,
  #[serde(default)] pub sections: Vec<Section>,
  #[serde(default)] pub pdfs: Vec<PdfFile>,
}

impl Module {
  /// Case-insensitive match on title, description or any section content.
  /// An empty term matches every module.
  pub fn matches(&self, term: &str) -> bool {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
      return true;
    }
    self.title.to_lowercase().contains(&needle)
      || self.description.to_lowercase().contains(&needle)
      || self.sections.iter().any(|s| s.content.to_lowercase().contains(&needle))
  }
}
