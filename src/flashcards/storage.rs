//! Storage operations for decks and flashcards
//!
//! Directory structure:
//! ```text
//! {data_dir}/flashcards/
//! ├── decks.json           # Array of all decks
//! ├── cards/
//! │   └── {card-id}.json   # Card content
//! └── states/
//!     └── {card-id}.json   # Card scheduling state
//! ```
//!
//! Card content and scheduling state are stored in separate files so a
//! review rewrites only the state record.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use super::algorithm::schedule_review;
use super::models::*;

/// Maximum number of cards returned by a single due-card query
pub const DUE_QUERY_LIMIT: usize = 100;

#[derive(Error, Debug)]
pub enum FlashcardStorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Deck not found: {0}")]
    DeckNotFound(Uuid),

    #[error("Card not found: {0}")]
    CardNotFound(Uuid),
}

pub type Result<T> = std::result::Result<T, FlashcardStorageError>;

/// Storage manager for deck and card operations
pub struct FlashcardStorage {
    /// Base data path (e.g. ~/.local/share/studybox)
    base_path: PathBuf,
    /// Serializes writers of decks.json
    decks_lock: Mutex<()>,
    /// Per-card locks; a review is a read-modify-write, so two concurrent
    /// reviews of the same card must not start from the same snapshot
    review_locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl FlashcardStorage {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            base_path,
            decks_lock: Mutex::new(()),
            review_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Get the flashcards directory
    fn flashcards_dir(&self) -> PathBuf {
        self.base_path.join("flashcards")
    }

    /// Get the cards directory
    fn cards_dir(&self) -> PathBuf {
        self.flashcards_dir().join("cards")
    }

    /// Get the states directory
    fn states_dir(&self) -> PathBuf {
        self.flashcards_dir().join("states")
    }

    /// Get the decks.json path
    fn decks_path(&self) -> PathBuf {
        self.flashcards_dir().join("decks.json")
    }

    /// Get the path for a specific card
    fn card_path(&self, card_id: Uuid) -> PathBuf {
        self.cards_dir().join(format!("{}.json", card_id))
    }

    /// Get the path for a card's state
    fn state_path(&self, card_id: Uuid) -> PathBuf {
        self.states_dir().join(format!("{}.json", card_id))
    }

    /// Initialize the storage directories
    pub fn init(&self) -> Result<()> {
        fs::create_dir_all(self.flashcards_dir())?;
        fs::create_dir_all(self.cards_dir())?;
        fs::create_dir_all(self.states_dir())?;

        let decks_path = self.decks_path();
        if !decks_path.exists() {
            let empty_decks: Vec<Deck> = Vec::new();
            fs::write(&decks_path, serde_json::to_string_pretty(&empty_decks)?)?;
        }

        Ok(())
    }

    fn read_decks(&self) -> Result<Vec<Deck>> {
        let decks_path = self.decks_path();
        if !decks_path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&decks_path)?;
        let decks: Vec<Deck> = serde_json::from_str(&content)?;
        Ok(decks)
    }

    fn write_decks(&self, decks: &[Deck]) -> Result<()> {
        fs::write(self.decks_path(), serde_json::to_string_pretty(decks)?)?;
        Ok(())
    }

    /// Get the lock guarding reviews of a single card
    fn review_lock(&self, card_id: Uuid) -> Arc<Mutex<()>> {
        let mut locks = self.review_locks.lock().unwrap();
        locks.entry(card_id).or_default().clone()
    }

    // ==================== Deck Operations ====================

    /// List all decks
    pub fn list_decks(&self) -> Result<Vec<Deck>> {
        self.read_decks()
    }

    /// Get a specific deck
    pub fn get_deck(&self, deck_id: Uuid) -> Result<Deck> {
        self.read_decks()?
            .into_iter()
            .find(|d| d.id == deck_id)
            .ok_or(FlashcardStorageError::DeckNotFound(deck_id))
    }

    /// Create a new deck
    pub fn create_deck(&self, name: String, description: Option<String>) -> Result<Deck> {
        self.init()?;

        let _guard = self.decks_lock.lock().unwrap();

        let mut deck = Deck::new(name);
        deck.description = description;

        let mut decks = self.read_decks()?;
        decks.push(deck.clone());
        self.write_decks(&decks)?;

        log::info!("Created deck {} ({:?})", deck.id, deck.name);
        Ok(deck)
    }

    /// Update a deck
    pub fn update_deck(&self, deck: &Deck) -> Result<()> {
        let _guard = self.decks_lock.lock().unwrap();

        let mut decks = self.read_decks()?;
        let pos = decks
            .iter()
            .position(|d| d.id == deck.id)
            .ok_or(FlashcardStorageError::DeckNotFound(deck.id))?;

        decks[pos] = deck.clone();
        self.write_decks(&decks)
    }

    /// Delete a deck and all its cards
    pub fn delete_deck(&self, deck_id: Uuid) -> Result<()> {
        // Resolve before removing card files so an unknown id is an error
        self.get_deck(deck_id)?;

        for card in self.list_cards(deck_id)? {
            self.remove_card_files(card.id)?;
        }

        let _guard = self.decks_lock.lock().unwrap();
        let mut decks = self.read_decks()?;
        decks.retain(|d| d.id != deck_id);
        self.write_decks(&decks)?;

        log::info!("Deleted deck {}", deck_id);
        Ok(())
    }

    /// Recount a deck's cards after a create or delete
    fn update_deck_card_count(&self, deck_id: Uuid) -> Result<()> {
        let card_count = self.list_cards(deck_id)?.len();

        let _guard = self.decks_lock.lock().unwrap();
        let mut decks = self.read_decks()?;
        let deck = decks
            .iter_mut()
            .find(|d| d.id == deck_id)
            .ok_or(FlashcardStorageError::DeckNotFound(deck_id))?;

        deck.card_count = card_count;
        deck.updated_at = Utc::now();
        self.write_decks(&decks)
    }

    // ==================== Card Operations ====================

    /// List all cards in a deck, oldest first
    pub fn list_cards(&self, deck_id: Uuid) -> Result<Vec<Flashcard>> {
        let cards_dir = self.cards_dir();
        if !cards_dir.exists() {
            return Ok(Vec::new());
        }

        let mut cards = Vec::new();
        for entry in fs::read_dir(&cards_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                let content = fs::read_to_string(&path)?;
                let card: Flashcard = serde_json::from_str(&content)?;
                if card.deck_id == deck_id {
                    cards.push(card);
                }
            }
        }

        cards.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(cards)
    }

    /// Get a specific card
    pub fn get_card(&self, card_id: Uuid) -> Result<Flashcard> {
        let card_path = self.card_path(card_id);
        if !card_path.exists() {
            return Err(FlashcardStorageError::CardNotFound(card_id));
        }

        let content = fs::read_to_string(&card_path)?;
        let card: Flashcard = serde_json::from_str(&content)?;
        Ok(card)
    }

    /// Create a new card in a deck.
    ///
    /// The card starts in box 1 with a next-review time of "now", so it is
    /// immediately eligible for study.
    pub fn create_card(
        &self,
        deck_id: Uuid,
        front: String,
        back: String,
        tags: Option<Vec<String>>,
    ) -> Result<Flashcard> {
        self.init()?;

        // The deck must exist before any card file is written
        self.get_deck(deck_id)?;

        let mut card = Flashcard::new(deck_id, front, back);
        if let Some(t) = tags {
            card.tags = t;
        }

        fs::write(self.card_path(card.id), serde_json::to_string_pretty(&card)?)?;

        let state = CardState::new(card.id);
        fs::write(
            self.state_path(card.id),
            serde_json::to_string_pretty(&state)?,
        )?;

        self.update_deck_card_count(deck_id)?;

        Ok(card)
    }

    /// Update a card's content
    pub fn update_card(&self, card: &Flashcard) -> Result<()> {
        let card_path = self.card_path(card.id);
        if !card_path.exists() {
            return Err(FlashcardStorageError::CardNotFound(card.id));
        }

        fs::write(&card_path, serde_json::to_string_pretty(card)?)?;
        Ok(())
    }

    /// Delete a card and its state
    pub fn delete_card(&self, card_id: Uuid) -> Result<()> {
        let card = self.get_card(card_id)?;

        self.remove_card_files(card_id)?;
        self.update_deck_card_count(card.deck_id)?;

        Ok(())
    }

    fn remove_card_files(&self, card_id: Uuid) -> Result<()> {
        let card_path = self.card_path(card_id);
        if card_path.exists() {
            fs::remove_file(&card_path)?;
        }

        let state_path = self.state_path(card_id);
        if state_path.exists() {
            fs::remove_file(&state_path)?;
        }

        Ok(())
    }

    // ==================== State Operations ====================

    /// Get the scheduling state for a card
    pub fn get_card_state(&self, card_id: Uuid) -> Result<CardState> {
        let state_path = self.state_path(card_id);
        if !state_path.exists() {
            // A card without a state file behaves like a fresh card
            return Ok(CardState::new(card_id));
        }

        let content = fs::read_to_string(&state_path)?;
        let state: CardState = serde_json::from_str(&content)?;
        Ok(state)
    }

    /// Write the scheduling state for a card
    pub fn update_card_state(&self, state: &CardState) -> Result<()> {
        fs::write(
            self.state_path(state.card_id),
            serde_json::to_string_pretty(state)?,
        )?;
        Ok(())
    }

    // ==================== Review Operations ====================

    /// Get the cards of a deck that are due for review right now
    pub fn due_cards(&self, deck_id: Uuid) -> Result<Vec<CardWithState>> {
        self.due_cards_at(deck_id, Utc::now())
    }

    /// Get the cards of a deck with `next_review_at <= now`, oldest-overdue
    /// first, capped at [`DUE_QUERY_LIMIT`].
    ///
    /// Recomputed on every call; "due" is a function of wall-clock time, not
    /// just of writes to the store.
    pub fn due_cards_at(&self, deck_id: Uuid, now: DateTime<Utc>) -> Result<Vec<CardWithState>> {
        self.get_deck(deck_id)?;

        let mut due = Vec::new();
        for card in self.list_cards(deck_id)? {
            let state = self.get_card_state(card.id)?;
            if state.is_due_at(now) {
                due.push(CardWithState { card, state });
            }
        }

        // Oldest overdue first, so no card starves under the page cap
        due.sort_by(|a, b| a.state.next_review_at.cmp(&b.state.next_review_at));
        due.truncate(DUE_QUERY_LIMIT);

        Ok(due)
    }

    /// Submit a review outcome for a card
    pub fn submit_review(&self, card_id: Uuid, outcome: ReviewOutcome) -> Result<CardWithState> {
        self.submit_review_at(card_id, outcome, Utc::now())
    }

    /// Apply one review outcome to one card and return the updated card.
    ///
    /// The whole read-modify-write runs under the card's review lock, so two
    /// concurrent reviews of the same card cannot lose an increment.
    pub fn submit_review_at(
        &self,
        card_id: Uuid,
        outcome: ReviewOutcome,
        now: DateTime<Utc>,
    ) -> Result<CardWithState> {
        let lock = self.review_lock(card_id);
        let _guard = lock.lock().unwrap();

        let card = self.get_card(card_id)?;
        let mut state = self.get_card_state(card_id)?;

        let schedule = schedule_review(state.box_number, outcome, now);
        state.box_number = schedule.box_number;
        state.next_review_at = schedule.next_review_at;
        match outcome {
            ReviewOutcome::Gotit => state.correct_count += 1,
            ReviewOutcome::Again => state.incorrect_count += 1,
        }

        self.update_card_state(&state)?;

        log::debug!(
            "Reviewed card {}: {:?} -> box {}, next {}",
            card_id,
            outcome,
            state.box_number,
            state.next_review_at
        );

        Ok(CardWithState { card, state })
    }

    /// Get review statistics for a deck
    pub fn review_stats(&self, deck_id: Uuid) -> Result<ReviewStats> {
        self.review_stats_at(deck_id, Utc::now())
    }

    /// Review statistics for a deck at the given time
    pub fn review_stats_at(&self, deck_id: Uuid, now: DateTime<Utc>) -> Result<ReviewStats> {
        self.get_deck(deck_id)?;

        let cards = self.list_cards(deck_id)?;
        let mut stats = ReviewStats {
            total_cards: cards.len(),
            ..ReviewStats::default()
        };

        for card in &cards {
            let state = self.get_card_state(card.id)?;

            let box_index = state.box_number.clamp(FIRST_BOX, LAST_BOX) - FIRST_BOX;
            stats.box_counts[box_index as usize] += 1;
            stats.total_correct += state.correct_count;
            stats.total_incorrect += state.incorrect_count;

            if state.is_due_at(now) {
                stats.due_cards += 1;
            }
        }

        Ok(stats)
    }
}
