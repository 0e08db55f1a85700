//! Book catalog endpoints (proxied third-party catalog).

use crate::error::Result;
use crate::models::{Book, BookEnvelope, BookSearchResult};
use crate::services::ApiClient;
use crate::utils::encode_segment;

/// Query used when the search box is empty, so discovery still shows something.
pub const DEFAULT_CATALOG_QUERY: &str = "subject:fiction";

/// Typed wrapper over `/books`.
pub struct Books<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn books(&self) -> Books<'_> {
        Books { client: self }
    }
}

impl Books<'_> {
    /// `GET /books/search?q=..&maxResults=..&startIndex=..`
    pub async fn search(
        &self,
        query: &str,
        max_results: u32,
        start_index: u32,
    ) -> Result<BookSearchResult> {
        let query = match query.trim() {
            "" => DEFAULT_CATALOG_QUERY,
            q => q,
        };
        self.client
            .get(
                "books/search",
                &[
                    ("q", query.to_string()),
                    ("maxResults", max_results.to_string()),
                    ("startIndex", start_index.to_string()),
                ],
            )
            .await
    }

    /// `GET /books/genre/:genre`
    pub async fn by_genre(&self, genre: &str, max_results: u32) -> Result<BookSearchResult> {
        self.client
            .get(
                &format!("books/genre/{}", encode_segment(genre)),
                &[("maxResults", max_results.to_string())],
            )
            .await
    }

    /// `GET /books/:id`
    pub async fn get(&self, id: &str) -> Result<Book> {
        let envelope: BookEnvelope = self
            .client
            .get(&format!("books/{}", encode_segment(id)), &[])
            .await?;
        Ok(envelope.book)
    }
}
