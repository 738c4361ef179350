//! HTTP API for the study service
//!
//! A thin JSON layer over [`FlashcardStorage`]; scheduling decisions live in
//! the flashcards module. Every failing endpoint returns the same envelope:
//! `{"error": {"kind": "...", "message": "..."}}` with kind `validation`,
//! `not_found` or `storage`.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use crate::flashcards::{
    CardWithState, Deck, Flashcard, FlashcardStorage, FlashcardStorageError, ReviewOutcome,
    ReviewStats,
};

/// Shared state for all request handlers
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<FlashcardStorage>,
}

/// API error, carrying the taxonomy kind used in the response envelope
#[derive(Debug)]
pub enum ApiError {
    /// Malformed input, rejected before any storage access
    Validation(String),
    /// Well-formed id that does not resolve
    NotFound(String),
    /// Underlying persistence failure; surfaced, never retried here
    Storage(String),
}

impl ApiError {
    fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::Storage(_) => "storage",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::Validation(msg) | Self::NotFound(msg) | Self::Storage(msg) => msg,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": {
                "kind": self.kind(),
                "message": self.message(),
            }
        });
        (self.status(), Json(body)).into_response()
    }
}

impl From<FlashcardStorageError> for ApiError {
    fn from(err: FlashcardStorageError) -> Self {
        match err {
            FlashcardStorageError::DeckNotFound(_) | FlashcardStorageError::CardNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            FlashcardStorageError::Io(_) | FlashcardStorageError::Json(_) => {
                log::error!("Storage failure: {}", err);
                Self::Storage(err.to_string())
            }
        }
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Parse a UUID path segment, mapping failure to a validation error
fn parse_id(kind: &str, raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|e| ApiError::Validation(format!("Invalid {} ID: {}", kind, e)))
}

// ==================== Request Bodies ====================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeckRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDeckRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCardRequest {
    pub front: String,
    pub back: String,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCardRequest {
    #[serde(default)]
    pub front: Option<String>,
    #[serde(default)]
    pub back: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    /// "again" or "gotit"; kept as a string so a bad value is rejected as a
    /// validation error before the card is loaded
    pub outcome: String,
}

// ==================== Deck Handlers ====================

/// List all decks
async fn list_decks(State(state): State<AppState>) -> ApiResult<Json<Vec<Deck>>> {
    Ok(Json(state.storage.list_decks()?))
}

/// Create a new deck
async fn create_deck(
    State(state): State<AppState>,
    Json(req): Json<CreateDeckRequest>,
) -> ApiResult<(StatusCode, Json<Deck>)> {
    if req.name.trim().is_empty() {
        return Err(ApiError::Validation("Deck name must not be empty".into()));
    }

    let deck = state.storage.create_deck(req.name, req.description)?;
    Ok((StatusCode::CREATED, Json(deck)))
}

/// Get a specific deck
async fn get_deck(
    State(state): State<AppState>,
    Path(deck_id): Path<String>,
) -> ApiResult<Json<Deck>> {
    let id = parse_id("deck", &deck_id)?;
    Ok(Json(state.storage.get_deck(id)?))
}

/// Update a deck's properties
async fn update_deck(
    State(state): State<AppState>,
    Path(deck_id): Path<String>,
    Json(req): Json<UpdateDeckRequest>,
) -> ApiResult<Json<Deck>> {
    let id = parse_id("deck", &deck_id)?;
    let mut deck = state.storage.get_deck(id)?;

    if let Some(name) = req.name {
        if name.trim().is_empty() {
            return Err(ApiError::Validation("Deck name must not be empty".into()));
        }
        deck.name = name;
    }
    if let Some(description) = req.description {
        deck.description = Some(description);
    }

    deck.updated_at = chrono::Utc::now();
    state.storage.update_deck(&deck)?;

    Ok(Json(deck))
}

/// Delete a deck and all its cards
async fn delete_deck(
    State(state): State<AppState>,
    Path(deck_id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id("deck", &deck_id)?;
    state.storage.delete_deck(id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ==================== Card Handlers ====================

/// List all cards in a deck
async fn list_cards(
    State(state): State<AppState>,
    Path(deck_id): Path<String>,
) -> ApiResult<Json<Vec<Flashcard>>> {
    let id = parse_id("deck", &deck_id)?;
    // Resolve the deck so an unknown id is not an empty list
    state.storage.get_deck(id)?;
    Ok(Json(state.storage.list_cards(id)?))
}

/// Create a new card in a deck
async fn create_card(
    State(state): State<AppState>,
    Path(deck_id): Path<String>,
    Json(req): Json<CreateCardRequest>,
) -> ApiResult<(StatusCode, Json<Flashcard>)> {
    let id = parse_id("deck", &deck_id)?;
    let card = state.storage.create_card(id, req.front, req.back, req.tags)?;
    Ok((StatusCode::CREATED, Json(card)))
}

/// Get a card together with its scheduling state
async fn get_card(
    State(state): State<AppState>,
    Path(card_id): Path<String>,
) -> ApiResult<Json<CardWithState>> {
    let id = parse_id("card", &card_id)?;
    let card = state.storage.get_card(id)?;
    let card_state = state.storage.get_card_state(id)?;
    Ok(Json(CardWithState {
        card,
        state: card_state,
    }))
}

/// Update a card's content
async fn update_card(
    State(state): State<AppState>,
    Path(card_id): Path<String>,
    Json(req): Json<UpdateCardRequest>,
) -> ApiResult<Json<Flashcard>> {
    let id = parse_id("card", &card_id)?;
    let mut card = state.storage.get_card(id)?;

    if let Some(front) = req.front {
        card.front = front;
    }
    if let Some(back) = req.back {
        card.back = back;
    }
    if let Some(tags) = req.tags {
        card.tags = tags;
    }

    card.updated_at = chrono::Utc::now();
    state.storage.update_card(&card)?;

    Ok(Json(card))
}

/// Delete a card
async fn delete_card(
    State(state): State<AppState>,
    Path(card_id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id("card", &card_id)?;
    state.storage.delete_card(id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ==================== Review Handlers ====================

/// Get the due cards of a deck, oldest overdue first
async fn due_cards(
    State(state): State<AppState>,
    Path(deck_id): Path<String>,
) -> ApiResult<Json<Vec<CardWithState>>> {
    let id = parse_id("deck", &deck_id)?;
    Ok(Json(state.storage.due_cards(id)?))
}

/// Submit a review outcome for a card
async fn submit_review(
    State(state): State<AppState>,
    Path(card_id): Path<String>,
    Json(req): Json<ReviewRequest>,
) -> ApiResult<Json<CardWithState>> {
    let id = parse_id("card", &card_id)?;
    let outcome: ReviewOutcome = req
        .outcome
        .parse()
        .map_err(|e: crate::flashcards::InvalidOutcome| ApiError::Validation(e.to_string()))?;

    Ok(Json(state.storage.submit_review(id, outcome)?))
}

/// Get review statistics for a deck
async fn deck_stats(
    State(state): State<AppState>,
    Path(deck_id): Path<String>,
) -> ApiResult<Json<ReviewStats>> {
    let id = parse_id("deck", &deck_id)?;
    Ok(Json(state.storage.review_stats(id)?))
}

/// Build the API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/decks", get(list_decks).post(create_deck))
        .route(
            "/api/decks/{deck_id}",
            get(get_deck).put(update_deck).delete(delete_deck),
        )
        .route(
            "/api/decks/{deck_id}/cards",
            get(list_cards).post(create_card),
        )
        .route("/api/decks/{deck_id}/due", get(due_cards))
        .route("/api/decks/{deck_id}/stats", get(deck_stats))
        .route(
            "/api/cards/{card_id}",
            get(get_card).put(update_card).delete(delete_card),
        )
        .route("/api/cards/{card_id}/review", post(submit_review))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
