//! Per-session answer store: question id -> learner's current answer.

use std::collections::{BTreeSet, HashMap};

use crate::domain::Answer;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnswerStore {
  by_question: HashMap<String, Answer>,
}

impl AnswerStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, question_id: &str) -> Option<&Answer> {
    self.by_question.get(question_id)
  }

  /// Replace whatever was stored for this question.
  pub fn set(&mut self, question_id: impl Into<String>, answer: Answer) {
    self.by_question.insert(question_id.into(), answer);
  }

  /// Symmetric difference of `{option}` with the stored selection.
  /// A non-set answer in the slot is replaced by a fresh selection.
  pub fn toggle(&mut self, question_id: &str, option: usize) -> BTreeSet<usize> {
    let mut selected = match self.by_question.remove(question_id) {
      Some(Answer::Choices(selected)) => selected,
      _ => BTreeSet::new(),
    };
    if !selected.remove(&option) {
      selected.insert(option);
    }
    self.by_question.insert(question_id.to_string(), Answer::Choices(selected.clone()));
    selected
  }

  pub fn len(&self) -> usize {
    self.by_question.len()
  }

  pub fn is_empty(&self) -> bool {
    self.by_question.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn set_overwrites_previous_answer() {
    let mut store = AnswerStore::new();
    store.set("q1", Answer::Choice(0));
    store.set("q1", Answer::Choice(2));
    assert_eq!(store.get("q1"), Some(&Answer::Choice(2)));
    assert_eq!(store.len(), 1);
  }

  #[test]
  fn toggle_adds_then_removes() {
    let mut store = AnswerStore::new();
    store.toggle("q1", 2);
    store.toggle("q1", 0);
    assert_eq!(store.get("q1"), Some(&Answer::Choices([0, 2].into_iter().collect())));

    let left = store.toggle("q1", 2);
    assert_eq!(left, [0].into_iter().collect::<BTreeSet<_>>());
  }

  #[test]
  fn missing_answers_stay_absent() {
    let store = AnswerStore::new();
    assert!(store.get("nope").is_none());
    assert!(store.is_empty());
  }
}
