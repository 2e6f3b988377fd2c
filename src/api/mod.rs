//! # Backend Collaborators
//!
//! The swipe engine talks to the outside world through three narrow contracts:
//!
//! - [`DeckDataSource`] - fetches the ordered list of released proposals
//! - [`VoteClient`] - records a vote; fire-and-forget from the engine's view
//! - [`IdeaSubmission`] - creates a new proposal from user text
//!
//! Two implementations ship with the crate:
//!
//! ```text
//! api/
//! ├── http.rs    - reqwest client against the proposal web API
//! └── memory.rs  - seeded in-memory backend (offline mode and test double)
//! ```
//!
//! All methods return `Send` futures so results can be produced on background
//! tasks and handed back to the engine loop over a channel.

pub mod http;
pub mod memory;

pub use http::HttpBackend;
pub use memory::MemoryBackend;

use crate::deck::{Card, VoteDirection};
use std::future::Future;
use thiserror::Error;

/// Errors surfaced by backend collaborators
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport level failure (connect, timeout, TLS)
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-success status
    #[error("Server responded with status {0}")]
    Status(u16),

    /// The response body could not be decoded
    #[error("Invalid response payload: {0}")]
    Decode(String),

    /// The server refused the submitted idea
    #[error("Idea rejected: {0}")]
    Rejected(String),

    /// The referenced proposal does not exist
    #[error("Unknown proposal: {0}")]
    UnknownCard(String),
}

impl ApiError {
    /// Failures worth retrying: transport errors and server-side statuses
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Network(_) => true,
            ApiError::Status(status) => *status >= 500,
            ApiError::Decode(_) | ApiError::Rejected(_) | ApiError::UnknownCard(_) => false,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ApiError::Status(status.as_u16())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Source of the deck. Returns released proposals in server order.
pub trait DeckDataSource: Send + Sync + 'static {
    fn load_released(&self) -> impl Future<Output = Result<Vec<Card>, ApiError>> + Send;
}

/// Sink for committed votes.
pub trait VoteClient: Send + Sync + 'static {
    fn send(
        &self,
        card_id: &str,
        direction: VoteDirection,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;
}

/// Creation of new proposals. `text` has already been trimmed and validated.
pub trait IdeaSubmission: Send + Sync + 'static {
    fn create(&self, text: &str) -> impl Future<Output = Result<Card, ApiError>> + Send;
}
