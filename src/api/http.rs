//! HTTP implementation of the backend contracts.
//!
//! Routes:
//! - `GET  {base}/api/ideas` → `{ "ideas": [Card, ...] }` (released only, server order)
//! - `POST {base}/api/vote`  ← `{ "id": "...", "dir": "yes" | "no" }`
//! - `POST {base}/api/ideas` ← `{ "text": "..." }` → `Card`, `400 { "error": ... }` when invalid

use super::{ApiError, DeckDataSource, IdeaSubmission, VoteClient};
use crate::deck::{Card, VoteDirection};
use reqwest::header::CACHE_CONTROL;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct IdeasEnvelope {
    #[serde(default)]
    pub(crate) ideas: Vec<Card>,
}

#[derive(Debug, Serialize)]
pub(crate) struct VoteRequest<'a> {
    pub(crate) id: &'a str,
    pub(crate) dir: VoteDirection,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateIdeaRequest<'a> {
    pub(crate) text: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Backend reached over HTTP with a shared connection pool
#[derive(Clone, Debug)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.trim_end_matches('/').to_string();
        info!("HTTP backend configured for {}", base_url);
        Ok(Self { client, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl DeckDataSource for HttpBackend {
    async fn load_released(&self) -> Result<Vec<Card>, ApiError> {
        let response = self
            .client
            .get(self.url("/api/ideas"))
            .header(CACHE_CONTROL, "no-store")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Loading ideas failed with status {}", status);
            return Err(ApiError::Status(status.as_u16()));
        }

        let envelope: IdeasEnvelope = response.json().await?;
        debug!("Loaded {} released ideas", envelope.ideas.len());
        Ok(envelope.ideas)
    }
}

impl VoteClient for HttpBackend {
    async fn send(&self, card_id: &str, direction: VoteDirection) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.url("/api/vote"))
            .json(&VoteRequest {
                id: card_id,
                dir: direction,
            })
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                debug!("Vote {} for {} accepted", direction, card_id);
                Ok(())
            }
            StatusCode::NOT_FOUND => Err(ApiError::UnknownCard(card_id.to_string())),
            status => Err(ApiError::Status(status.as_u16())),
        }
    }
}

impl IdeaSubmission for HttpBackend {
    async fn create(&self, text: &str) -> Result<Card, ApiError> {
        let response = self
            .client
            .post(self.url("/api/ideas"))
            .json(&CreateIdeaRequest { text })
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST {
            let reason = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| "Invalid text".to_string());
            return Err(ApiError::Rejected(reason));
        }
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }

        let card: Card = response.json().await?;
        info!("Created idea {}", card.id);
        Ok(card)
    }
}
