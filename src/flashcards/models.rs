//! Data models for the flashcard system

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Lowest Leitner box; failed cards always return here
pub const FIRST_BOX: i32 = 1;

/// Highest Leitner box; a correct answer here keeps the card in place
pub const LAST_BOX: i32 = 5;

/// A deck is a collection of flashcards
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub card_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Deck {
    pub fn new(name: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            description: None,
            card_count: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A flashcard with question (front) and answer (back)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flashcard {
    pub id: Uuid,
    pub deck_id: Uuid,
    pub front: String,
    pub back: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Flashcard {
    pub fn new(deck_id: Uuid, front: String, back: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            deck_id,
            front,
            back,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Outcome of a single review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewOutcome {
    /// The learner failed to recall the card
    Again,
    /// The learner recalled the card
    Gotit,
}

/// Error for an outcome value outside the two accepted forms
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid review outcome: {0:?} (expected \"again\" or \"gotit\")")]
pub struct InvalidOutcome(pub String);

impl FromStr for ReviewOutcome {
    type Err = InvalidOutcome;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "again" => Ok(Self::Again),
            "gotit" => Ok(Self::Gotit),
            other => Err(InvalidOutcome(other.to_string())),
        }
    }
}

/// Current spaced repetition state for a card
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardState {
    pub card_id: Uuid,
    /// Current Leitner box (1-5)
    #[serde(rename = "box", default = "default_box")]
    pub box_number: i32,
    /// When the card is next due for review
    pub next_review_at: DateTime<Utc>,
    /// Number of reviews answered correctly
    #[serde(default)]
    pub correct_count: i64,
    /// Number of reviews answered incorrectly
    #[serde(default)]
    pub incorrect_count: i64,
}

fn default_box() -> i32 {
    FIRST_BOX
}

impl CardState {
    /// Initial state: box 1, due immediately, zero counters
    pub fn new(card_id: Uuid) -> Self {
        Self {
            card_id,
            box_number: FIRST_BOX,
            next_review_at: Utc::now(),
            correct_count: 0,
            incorrect_count: 0,
        }
    }

    /// Check if the card is due for review at the given time
    pub fn is_due_at(&self, now: DateTime<Utc>) -> bool {
        self.next_review_at <= now
    }
}

/// A card with its current state, used for review sessions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardWithState {
    pub card: Flashcard,
    pub state: CardState,
}

/// Review statistics for a deck
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub total_cards: usize,
    pub due_cards: usize,
    /// Cards per box; index 0 is box 1
    pub box_counts: [usize; 5],
    pub total_correct: i64,
    pub total_incorrect: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_parse() {
        assert_eq!("again".parse::<ReviewOutcome>(), Ok(ReviewOutcome::Again));
        assert_eq!("gotit".parse::<ReviewOutcome>(), Ok(ReviewOutcome::Gotit));

        assert!("easy".parse::<ReviewOutcome>().is_err());
        assert!("GOTIT".parse::<ReviewOutcome>().is_err());
        assert!("".parse::<ReviewOutcome>().is_err());
    }

    #[test]
    fn test_outcome_serde_form() {
        assert_eq!(
            serde_json::to_string(&ReviewOutcome::Again).unwrap(),
            "\"again\""
        );
        assert_eq!(
            serde_json::to_string(&ReviewOutcome::Gotit).unwrap(),
            "\"gotit\""
        );
    }

    #[test]
    fn test_new_card_state_is_immediately_due() {
        let state = CardState::new(Uuid::new_v4());

        assert_eq!(state.box_number, FIRST_BOX);
        assert_eq!(state.correct_count, 0);
        assert_eq!(state.incorrect_count, 0);
        assert!(state.is_due_at(Utc::now()));
    }

    #[test]
    fn test_card_state_serializes_box_field() {
        let state = CardState::new(Uuid::new_v4());
        let json = serde_json::to_value(&state).unwrap();

        assert_eq!(json["box"], 1);
        assert!(json.get("nextReviewAt").is_some());
        assert_eq!(json["correctCount"], 0);
    }
}
