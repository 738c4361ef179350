//! Flashcard and spaced repetition system
//!
//! This module provides:
//! - Deck management (collections of flashcards)
//! - Flashcard CRUD
//! - Leitner box scheduling
//! - Review state tracking and due-card queries

pub mod algorithm;
pub mod models;
pub mod storage;

pub use models::*;
pub use storage::{FlashcardStorage, FlashcardStorageError, DUE_QUERY_LIMIT};
