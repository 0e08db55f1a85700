//! Reading club endpoints.

use crate::error::{AppError, Result};
use crate::models::{Club, NewClub};
use crate::services::ApiClient;
use crate::utils::encode_segment;

/// Typed wrapper over `/clubs`.
pub struct Clubs<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn clubs(&self) -> Clubs<'_> {
        Clubs { client: self }
    }
}

impl Clubs<'_> {
    /// `GET /clubs`, newest first.
    pub async fn list(&self) -> Result<Vec<Club>> {
        self.client.get("clubs", &[]).await
    }

    /// `POST /clubs`; the creator becomes the first member.
    pub async fn create(&self, club: &NewClub) -> Result<Club> {
        if club.name.trim().is_empty() {
            return Err(AppError::validation("Club name is required"));
        }
        self.client.post("clubs", club).await
    }

    /// `POST /clubs/:id/join`
    pub async fn join(&self, id: &str) -> Result<Club> {
        self.client
            .post_empty(&format!("clubs/{}/join", encode_segment(id)))
            .await
    }

    /// `POST /clubs/:id/leave`
    pub async fn leave(&self, id: &str) -> Result<Club> {
        self.client
            .post_empty(&format!("clubs/{}/leave", encode_segment(id)))
            .await
    }
}
