//! Flashcard deck review: step through the cards once, counting known/unknown.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Deck, Flashcard};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardResult {
  Known,
  Unknown,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReviewError {
  #[error("review already completed")]
  Completed,
}

#[derive(Clone, Debug)]
pub struct DeckReview {
  deck: Deck,
  current_index: usize,
  known: u32,
  unknown: u32,
  completed: bool,
}

impl DeckReview {
  pub fn new(deck: Deck) -> Self {
    let completed = deck.cards.is_empty();
    Self { deck, current_index: 0, known: 0, unknown: 0, completed }
  }

  pub fn deck(&self) -> &Deck { &self.deck }
  pub fn current_index(&self) -> usize { self.current_index }
  pub fn known(&self) -> u32 { self.known }
  pub fn unknown(&self) -> u32 { self.unknown }
  pub fn is_completed(&self) -> bool { self.completed }

  pub fn current_card(&self) -> Option<&Flashcard> {
    if self.completed { None } else { self.deck.cards.get(self.current_index) }
  }

  /// Share of cards already passed, 0..=100.
  pub fn progress_percent(&self) -> u8 {
    let total = self.deck.cards.len();
    if total == 0 {
      return 0;
    }
    (self.current_index * 100 / total) as u8
  }

  /// Count the result for the current card and move on; the last card completes the review.
  pub fn mark(&mut self, result: CardResult) -> Result<(), ReviewError> {
    if self.completed {
      return Err(ReviewError::Completed);
    }
    match result {
      CardResult::Known => self.known += 1,
      CardResult::Unknown => self.unknown += 1,
    }
    if self.current_index + 1 < self.deck.cards.len() {
      self.current_index += 1;
    } else {
      self.completed = true;
    }
    Ok(())
  }

  pub fn restart(&mut self) {
    self.current_index = 0;
    self.known = 0;
    self.unknown = 0;
    self.completed = self.deck.cards.is_empty();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn deck(n: usize) -> Deck {
    Deck {
      id: "d1".into(),
      title: "Rechtliche Grundlagen".into(),
      cards: (0..n)
        .map(|i| Flashcard { id: format!("c{i}"), front: format!("front {i}"), back: format!("back {i}") })
        .collect(),
    }
  }

  #[test]
  fn marking_walks_the_deck_and_completes() {
    let mut r = DeckReview::new(deck(3));
    r.mark(CardResult::Known).unwrap();
    assert_eq!(r.current_index(), 1);
    assert_eq!(r.progress_percent(), 33);
    r.mark(CardResult::Unknown).unwrap();
    r.mark(CardResult::Known).unwrap();

    assert!(r.is_completed());
    assert_eq!((r.known(), r.unknown()), (2, 1));
    assert!(r.current_card().is_none());
    assert_eq!(r.mark(CardResult::Known), Err(ReviewError::Completed));
  }

  #[test]
  fn restart_resets_counters() {
    let mut r = DeckReview::new(deck(2));
    r.mark(CardResult::Known).unwrap();
    r.mark(CardResult::Known).unwrap();
    r.restart();
    assert!(!r.is_completed());
    assert_eq!((r.current_index(), r.known(), r.unknown()), (0, 0, 0));
    assert_eq!(r.current_card().map(|c| c.id.as_str()), Some("c0"));
  }

  #[test]
  fn empty_deck_starts_completed() {
    let r = DeckReview::new(deck(0));
    assert!(r.is_completed());
    assert_eq!(r.progress_percent(), 0);
  }
}
