//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.
//! Correct answers are only ever sent inside a submitted result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Answer, Attempt, Deck, Module, Question, QuestionType, Quiz};
use crate::flashcards::{CardResult, DeckReview};
use crate::live::LiveSession;
use crate::scoring::{FeedbackBand, QuizResult, Verdict};
use crate::session::QuizSession;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    StartQuiz {
        #[serde(rename = "quizId")]
        quiz_id: String,
        #[serde(default, rename = "userId")]
        user_id: Option<String>,
    },
    View {
        #[serde(rename = "sessionId")]
        session_id: Uuid,
    },
    Answer {
        #[serde(rename = "sessionId")]
        session_id: Uuid,
        #[serde(rename = "questionId")]
        question_id: String,
        value: Answer,
    },
    ToggleOption {
        #[serde(rename = "sessionId")]
        session_id: Uuid,
        #[serde(rename = "questionId")]
        question_id: String,
        option: usize,
    },
    Next {
        #[serde(rename = "sessionId")]
        session_id: Uuid,
    },
    Previous {
        #[serde(rename = "sessionId")]
        session_id: Uuid,
    },
    Submit {
        #[serde(rename = "sessionId")]
        session_id: Uuid,
    },
    Abandon {
        #[serde(rename = "sessionId")]
        session_id: Uuid,
    },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Session {
        session: SessionOut,
    },
    Result {
        result: ResultOut,
    },
    Abandoned {
        #[serde(rename = "sessionId")]
        session_id: Uuid,
    },
    Error {
        message: String,
    },
}

/// Question as shown while playing (no correct answer).
#[derive(Debug, Serialize)]
pub struct QuestionOut {
    pub id: String,
    pub kind: QuestionType,
    pub prompt: String,
    pub options: Vec<String>,
}

/// Session view used by both WS and HTTP.
#[derive(Debug, Serialize)]
pub struct SessionOut {
    pub session_id: Uuid,
    pub quiz_id: String,
    pub title: String,
    pub question_index: usize,
    pub question_count: usize,
    pub progress_percent: u8,
    pub is_last: bool,
    pub question: Option<QuestionOut>,
    pub answer: Option<Answer>,
    pub remaining_seconds: Option<u32>,
    pub submitted: bool,
    pub result: Option<ResultOut>,
}

#[derive(Debug, Serialize)]
pub struct ReviewOut {
    pub question_id: String,
    pub prompt: String,
    pub kind: QuestionType,
    pub verdict: Verdict,
    pub answer: Option<Answer>,
    pub options: Vec<String>,
    pub correct_options: Vec<usize>,
    pub feedback: String,
}

#[derive(Debug, Serialize)]
pub struct ResultOut {
    pub score: u32,
    pub max_score: u32,
    pub percentage: u8,
    pub band: FeedbackBand,
    pub message: String,
    pub reviews: Vec<ReviewOut>,
}

pub fn question_out(q: &Question) -> QuestionOut {
    QuestionOut {
        id: q.id.clone(),
        kind: q.kind.question_type(),
        prompt: q.prompt.clone(),
        options: q.kind.options().to_vec(),
    }
}

/// Join the per-question verdicts with the question texts for the detail view.
pub fn result_out(questions: &[Question], result: &QuizResult) -> ResultOut {
    let reviews = questions
        .iter()
        .zip(&result.reviews)
        .map(|(q, r)| ReviewOut {
            question_id: q.id.clone(),
            prompt: q.prompt.clone(),
            kind: q.kind.question_type(),
            verdict: r.verdict,
            answer: r.answer.clone(),
            options: q.kind.options().to_vec(),
            correct_options: q.kind.correct_options(),
            feedback: q.feedback.clone(),
        })
        .collect();
    ResultOut {
        score: result.score,
        max_score: result.max_score,
        percentage: result.percentage,
        band: result.band,
        message: result.band.message().to_string(),
        reviews,
    }
}

pub fn session_out(live: &LiveSession, s: &QuizSession) -> SessionOut {
    let count = s.questions().len();
    let index = s.current_index();
    let current = s.current_question();
    SessionOut {
        session_id: live.id,
        quiz_id: live.quiz.id.clone(),
        title: live.quiz.title.clone(),
        question_index: index,
        question_count: count,
        progress_percent: if count == 0 { 0 } else { (index * 100 / count) as u8 },
        is_last: index + 1 >= count,
        question: current.map(question_out),
        answer: current.and_then(|q| s.answer(&q.id)).cloned(),
        remaining_seconds: s.remaining_seconds(),
        submitted: s.is_submitted(),
        result: s.result().map(|r| result_out(s.questions(), &r)),
    }
}

//
// Quiz overview DTOs
//

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizStatus {
    Open,
    Mastered,
    Repeat,
}

#[derive(Debug, Serialize)]
pub struct QuizSummaryOut {
    pub id: String,
    pub title: String,
    pub description: String,
    pub difficulty: String,
    pub time_limit_seconds: Option<u32>,
    pub question_count: usize,
    pub status: QuizStatus,
}

#[derive(Debug, Serialize)]
pub struct AttemptOut {
    pub score: u32,
    pub max_score: u32,
    pub percentage: u8,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<&Attempt> for AttemptOut {
    fn from(a: &Attempt) -> Self {
        Self { score: a.score, max_score: a.max_score, percentage: a.percentage(), created_at: a.created_at }
    }
}

#[derive(Debug, Serialize)]
pub struct QuizDetailOut {
    #[serde(flatten)]
    pub quiz: Quiz,
    pub question_count: usize,
    pub status: QuizStatus,
    pub best_percentage: Option<u8>,
    pub attempts: Vec<AttemptOut>,
}

//
// HTTP request DTOs
//

#[derive(Debug, Deserialize)]
pub struct AnswerIn {
    pub value: Answer,
}

#[derive(Debug, Deserialize)]
pub struct ToggleIn {
    pub option: usize,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
    pub backend: &'static str,
}

//
// Flashcard DTOs
//

#[derive(Debug, Serialize)]
pub struct DeckOut {
    pub id: String,
    pub title: String,
    pub card_count: usize,
}

impl From<&Deck> for DeckOut {
    fn from(d: &Deck) -> Self {
        Self { id: d.id.clone(), title: d.title.clone(), card_count: d.cards.len() }
    }
}

#[derive(Debug, Serialize)]
pub struct CardOut {
    pub id: String,
    pub front: String,
    pub back: String,
}

#[derive(Debug, Serialize)]
pub struct DeckReviewOut {
    pub review_id: Uuid,
    pub deck_id: String,
    pub title: String,
    pub current_index: usize,
    pub card_count: usize,
    pub progress_percent: u8,
    pub card: Option<CardOut>,
    pub known: u32,
    pub unknown: u32,
    pub completed: bool,
}

pub fn deck_review_out(review_id: Uuid, r: &DeckReview) -> DeckReviewOut {
    DeckReviewOut {
        review_id,
        deck_id: r.deck().id.clone(),
        title: r.deck().title.clone(),
        current_index: r.current_index(),
        card_count: r.deck().cards.len(),
        progress_percent: r.progress_percent(),
        card: r.current_card().map(|c| CardOut { id: c.id.clone(), front: c.front.clone(), back: c.back.clone() }),
        known: r.known(),
        unknown: r.unknown(),
        completed: r.is_completed(),
    }
}

#[derive(Debug, Deserialize)]
pub struct MarkIn {
    pub result: CardResult,
}

//
// Summary module DTOs
//

#[derive(Debug, Deserialize)]
pub struct ModuleQuery {
    #[serde(default)]
    pub q: Option<String>,
}

/// Catalogue entry; sections and PDFs only come with the detail view.
#[derive(Debug, Serialize)]
pub struct ModuleSummaryOut {
    pub id: String,
    pub title: String,
    pub description: String,
    pub added_by: String,
    pub section_count: usize,
    pub pdf_count: usize,
}

impl From<&Module> for ModuleSummaryOut {
    fn from(m: &Module) -> Self {
        Self {
            id: m.id.clone(),
            title: m.title.clone(),
            description: m.description.clone(),
            added_by: m.added_by.clone(),
            section_count: m.sections.len(),
            pdf_count: m.pdfs.len(),
        }
    }
}
