//! Service-level error type and its HTTP mapping.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde_json::json;
use thiserror::Error;

use crate::backend::BackendError;
use crate::flashcards::ReviewError;
use crate::session::SessionError;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Session error: {0}")]
  Session(#[from] SessionError),

  #[error("Review error: {0}")]
  Review(#[from] ReviewError),

  #[error("Backend error: {0}")]
  Backend(#[from] BackendError),

  #[error("Not found: {0}")]
  NotFound(String),
}

impl AppError {
  pub fn status(&self) -> StatusCode {
    match self {
      AppError::Session(SessionError::ShapeViolation { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
      AppError::Session(SessionError::UnknownQuestion(_)) => StatusCode::NOT_FOUND,
      AppError::Session(SessionError::AlreadySubmitted) | AppError::Review(ReviewError::Completed) => StatusCode::CONFLICT,
      AppError::Backend(BackendError::NotFound { .. }) | AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Backend(_) => StatusCode::BAD_GATEWAY,
    }
  }
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    let status = self.status();
    let message = match status {
      StatusCode::UNPROCESSABLE_ENTITY => "Answer does not fit the question",
      StatusCode::NOT_FOUND => "Resource not found",
      StatusCode::CONFLICT => "Already completed",
      _ => "Backend unavailable",
    };

    let body = Json(json!({
      "error": {
        "message": message,
        "details": self.to_string(),
      }
    }));

    (status, body).into_response()
  }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::QuestionType;

  #[test]
  fn errors_map_to_statuses() {
    let shape = AppError::from(SessionError::ShapeViolation {
      question_id: "q".into(),
      expected: QuestionType::ShortAnswer,
      reason: "expected free text",
    });
    assert_eq!(shape.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(AppError::from(SessionError::AlreadySubmitted).status(), StatusCode::CONFLICT);
    assert_eq!(AppError::NotFound("session x".into()).status(), StatusCode::NOT_FOUND);
    let down = AppError::from(BackendError::Status { status: 500, message: "boom".into() });
    assert_eq!(down.status(), StatusCode::BAD_GATEWAY);
  }
}
