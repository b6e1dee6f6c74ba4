//! Loading service configuration (session settings + optional quiz bank, decks and
//! summary modules) from TOML.
//!
//! See `AppConfig` and `SessionSettings` for expected schema.

use serde::Deserialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::domain::{Deck, Module, QuestionRow, Quiz};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
  #[serde(default)]
  pub session: SessionSettings,
  #[serde(default)]
  pub quizzes: Vec<QuizCfg>,
  #[serde(default)]
  pub decks: Vec<Deck>,
  #[serde(default)]
  pub modules: Vec<Module>,
}

/// Session behavior knobs.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct SessionSettings {
  /// Countdown period; one tick removes one second from the limit.
  #[serde(default = "default_tick_interval_ms")]
  pub tick_interval_ms: u64,
  /// Store attempts of learners without a user id.
  #[serde(default)]
  pub persist_anonymous: bool,
  /// How long a submitted session stays viewable before it is evicted.
  #[serde(default = "default_retain_submitted_secs")]
  pub retain_submitted_secs: u64,
  /// Unsubmitted sessions and deck reviews untouched this long are dropped.
  #[serde(default = "default_idle_timeout_secs")]
  pub idle_timeout_secs: u64,
  /// Period of the background sweep over sessions and reviews.
  #[serde(default = "default_sweep_interval_secs")]
  pub sweep_interval_secs: u64,
}

fn default_tick_interval_ms() -> u64 { 1000 }
fn default_retain_submitted_secs() -> u64 { 10 * 60 }
fn default_idle_timeout_secs() -> u64 { 2 * 60 * 60 }
fn default_sweep_interval_secs() -> u64 { 60 }

impl Default for SessionSettings {
  fn default() -> Self {
    Self {
      tick_interval_ms: default_tick_interval_ms(),
      persist_anonymous: false,
      retain_submitted_secs: default_retain_submitted_secs(),
      idle_timeout_secs: default_idle_timeout_secs(),
      sweep_interval_secs: default_sweep_interval_secs(),
    }
  }
}

/// Quiz entry accepted in TOML configuration (local bank, used without a remote backend).
#[derive(Clone, Debug, Deserialize)]
pub struct QuizCfg {
  #[serde(default)] pub id: Option<String>,
  pub title: String,
  #[serde(default)] pub description: String,
  #[serde(default)] pub difficulty: String,
  #[serde(default)] pub time_limit_seconds: Option<u32>,
  #[serde(default)] pub questions: Vec<QuestionRow>,
}

impl QuizCfg {
  pub fn into_quiz(self) -> (Quiz, Vec<QuestionRow>) {
    let id = self.id.unwrap_or_else(|| Uuid::new_v4().to_string());
    let questions = self
      .questions
      .into_iter()
      .map(|mut q| {
        q.quiz_id = Some(id.clone());
        q
      })
      .collect();
    let quiz = Quiz {
      id,
      title: self.title,
      description: self.description,
      difficulty: self.difficulty,
      time_limit_seconds: self.time_limit_seconds,
    };
    (quiz, questions)
  }
}

pub fn parse_config(s: &str) -> Result<AppConfig, toml::de::Error> {
  toml::from_str::<AppConfig>(s)
}

/// Attempt to load `AppConfig` from STUDY_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_config_from_env() -> Option<AppConfig> {
  let path = std::env::var("STUDY_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_config(&s) {
      Ok(cfg) => {
        info!(target: "study_backend", %path, quizzes = cfg.quizzes.len(), decks = cfg.decks.len(), modules = cfg.modules.len(), "Loaded config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "study_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "study_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{CorrectAnswerRow, QuestionType, SectionType};

  const SAMPLE: &str = r#"
[session]
tick_interval_ms = 250
retain_submitted_secs = 30

[[quizzes]]
id = "didaktik"
title = "Didaktik"
difficulty = "Vertiefung"
time_limit_seconds = 600

  [[quizzes.questions]]
  id = "q1"
  type = "multiple_choice"
  question = "Welche Methoden sind handlungsorientiert?"
  options = ["Projektmethode", "Frontalunterricht", "Leittextmethode"]
  correct_answer = [0, 2]
  order = 0

  [[quizzes.questions]]
  id = "q2"
  type = "short_answer"
  question = "Was ist eine vollständige Handlung?"
  feedback = "Informieren, Planen, Entscheiden, Ausführen, Kontrollieren, Bewerten."
  order = 1

[[decks]]
id = "d1"
title = "Rechtliche Grundlagen"

  [[decks.cards]]
  id = "c1"
  front = "BBiG"
  back = "Berufsbildungsgesetz"

[[modules]]
id = "m1"
title = "Lernpsychologie"
added_by = "admin"

  [[modules.sections]]
  id = "s1"
  type = "begriffe"
  title = "Zentrale Begriffe"
  content = "Behaviorismus, Kognitivismus, Konstruktivismus"

  [[modules.pdfs]]
  id = "p1"
  name = "lernpsychologie.pdf"
  upload_date = "2024-03-01"
  url = "/files/lernpsychologie.pdf"
"#;

  #[test]
  fn parses_bank_and_settings() {
    let cfg = parse_config(SAMPLE).unwrap();
    assert_eq!(cfg.session.tick_interval_ms, 250);
    assert!(!cfg.session.persist_anonymous);
    assert_eq!(cfg.session.retain_submitted_secs, 30);
    assert_eq!(cfg.session.idle_timeout_secs, SessionSettings::default().idle_timeout_secs);
    assert_eq!(cfg.decks[0].cards.len(), 1);
    assert_eq!(cfg.modules[0].sections[0].kind, SectionType::Begriffe);
    assert_eq!(cfg.modules[0].pdfs[0].name, "lernpsychologie.pdf");

    let (quiz, rows) = cfg.quizzes[0].clone().into_quiz();
    assert_eq!(quiz.id, "didaktik");
    assert_eq!(quiz.time_limit(), Some(600));
    assert_eq!(rows[0].kind, QuestionType::MultipleChoice);
    assert_eq!(rows[0].correct_answer, Some(CorrectAnswerRow::Indices(vec![0, 2])));
    assert!(rows.iter().all(|r| r.quiz_id.as_deref() == Some("didaktik")));
  }

  #[test]
  fn empty_file_uses_defaults() {
    let cfg = parse_config("").unwrap();
    assert_eq!(cfg.session, SessionSettings::default());
    assert!(cfg.quizzes.is_empty());
  }

  #[test]
  fn quiz_without_id_gets_one() {
    let cfg = parse_config("[[quizzes]]\ntitle = \"Ohne Id\"\n").unwrap();
    let (quiz, rows) = cfg.quizzes[0].clone().into_quiz();
    assert!(!quiz.id.is_empty());
    assert!(rows.is_empty());
  }
}
