//! Scoring engine: pure function from (questions, answers) to a result.
//!
//! - Single choice: chosen index must equal the correct index.
//! - Multiple choice: set equality; no answer counts as the empty selection.
//! - Short answer: shown with its feedback, never graded.

use serde::Serialize;

use crate::answers::AnswerStore;
use crate::domain::{Answer, Question, QuestionKind};

/// Ordered, non-overlapping bands evaluated highest threshold first.
const BANDS: [(u8, FeedbackBand); 4] = [
  (90, FeedbackBand::Mastered),
  (70, FeedbackBand::Good),
  (50, FeedbackBand::Adequate),
  (0, FeedbackBand::NeedsPractice),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackBand {
  Mastered,
  Good,
  Adequate,
  NeedsPractice,
}

impl FeedbackBand {
  pub fn from_percentage(percentage: u8) -> Self {
    BANDS
      .iter()
      .find(|(threshold, _)| percentage >= *threshold)
      .map(|(_, band)| *band)
      .unwrap_or(FeedbackBand::NeedsPractice)
  }

  pub fn message(self) -> &'static str {
    match self {
      FeedbackBand::Mastered => "Excellent! You have mastered this topic.",
      FeedbackBand::Good => "Good work, keep it up!",
      FeedbackBand::Adequate => "Solid foundation, now go deeper.",
      FeedbackBand::NeedsPractice => "A little more practice needed. Stay with it!",
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
  Correct,
  Incorrect,
  /// Not auto-gradable; presented without a mark.
  Neutral,
}

#[derive(Clone, Debug, PartialEq)]
pub struct QuestionReview {
  pub question_id: String,
  pub verdict: Verdict,
  pub answer: Option<Answer>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct QuizResult {
  pub score: u32,
  pub max_score: u32,
  pub percentage: u8,
  pub band: FeedbackBand,
  /// One entry per question, in presentation order.
  pub reviews: Vec<QuestionReview>,
}

/// `round(100 * score / max_score)`, half rounding up; 100 when nothing is scorable.
pub fn percentage(score: u32, max_score: u32) -> u8 {
  if max_score == 0 {
    return 100;
  }
  let score = u64::from(score.min(max_score));
  let max = u64::from(max_score);
  ((200 * score + max) / (2 * max)) as u8
}

pub fn grade(question: &Question, answer: Option<&Answer>) -> Verdict {
  let correct = match (&question.kind, answer) {
    (QuestionKind::ShortAnswer, _) => return Verdict::Neutral,
    (QuestionKind::SingleChoice { correct, .. }, Some(Answer::Choice(chosen))) => chosen == correct,
    (QuestionKind::SingleChoice { .. }, _) => false,
    (QuestionKind::MultipleChoice { correct, .. }, Some(Answer::Choices(selected))) => selected == correct,
    (QuestionKind::MultipleChoice { correct, .. }, None) => correct.is_empty(),
    (QuestionKind::MultipleChoice { .. }, Some(_)) => false,
  };
  if correct { Verdict::Correct } else { Verdict::Incorrect }
}

pub fn score(questions: &[Question], answers: &AnswerStore) -> QuizResult {
  let mut score = 0u32;
  let mut max_score = 0u32;
  let mut reviews = Vec::with_capacity(questions.len());

  for q in questions {
    let answer = answers.get(&q.id);
    let verdict = grade(q, answer);
    if q.kind.is_scorable() {
      max_score += 1;
      if verdict == Verdict::Correct {
        score += 1;
      }
    }
    reviews.push(QuestionReview { question_id: q.id.clone(), verdict, answer: answer.cloned() });
  }

  let percentage = percentage(score, max_score);
  QuizResult { score, max_score, percentage, band: FeedbackBand::from_percentage(percentage), reviews }
}
