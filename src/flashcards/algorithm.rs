//! Leitner box scheduling
//!
//! A card sits in one of five boxes. A correct answer ("gotit") promotes it
//! one box, a failed answer ("again") sends it back to box 1. The review
//! interval for box b is 2^(b-1) days, so the sequence across boxes 1-5 is
//! 1, 2, 4, 8, 16 days.

use chrono::{DateTime, Duration, Utc};

use super::models::{ReviewOutcome, FIRST_BOX, LAST_BOX};

/// Result of scheduling a single review
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub box_number: i32,
    pub next_review_at: DateTime<Utc>,
}

/// Days until the next review for a card in the given box
pub fn interval_days(box_number: i32) -> i64 {
    1_i64 << (box_number.clamp(FIRST_BOX, LAST_BOX) - FIRST_BOX)
}

/// Compute the next box and review time for a card.
///
/// `now` is an explicit argument rather than a clock read, so the result is
/// deterministic under test; callers on the request path pass `Utc::now()`.
pub fn schedule_review(box_number: i32, outcome: ReviewOutcome, now: DateTime<Utc>) -> Schedule {
    // Out-of-range stored boxes are treated as the nearest valid box
    let box_number = box_number.clamp(FIRST_BOX, LAST_BOX);

    let new_box = match outcome {
        ReviewOutcome::Again => FIRST_BOX,
        ReviewOutcome::Gotit => (box_number + 1).min(LAST_BOX),
    };

    Schedule {
        box_number: new_box,
        next_review_at: now + Duration::days(interval_days(new_box)),
    }
}
