//! The card queue and everything that changes it.
//!
//! ```text
//! deck/
//! ├── card.rs           - proposal data and vote direction
//! ├── controller.rs     - ordered queue, position, optimistic vote commit
//! └── vote_dispatch.rs  - background vote delivery with retry
//! ```

pub mod card;
pub mod controller;
pub mod vote_dispatch;

pub use card::{Card, VoteDirection};
pub use controller::{
    validate_idea, DeckController, DeckStatus, LoadTicket, IDEA_MAX_CHARS, IDEA_MIN_CHARS,
};
pub use vote_dispatch::{RetryPolicy, VoteDispatcher};

use crate::api::ApiError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Idea is too short ({length} characters, at least {min} required)")]
    TooShort { length: usize, min: usize },

    #[error("Idea is too long ({length} characters, at most {max} allowed)")]
    TooLong { length: usize, max: usize },
}

#[derive(Debug, Error)]
pub enum DeckError {
    #[error("Failed to load deck: {0}")]
    Load(ApiError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("No card to vote on")]
    NoCurrentCard,

    #[error("Card {0} already has a committed vote")]
    AlreadyCommitted(String),

    #[error("Load result superseded by a newer request")]
    StaleLoad,

    #[error("An idea submission is already in progress")]
    SubmitInProgress,

    #[error("Failed to submit idea: {0}")]
    Submit(ApiError),
}
