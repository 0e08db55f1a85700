//! AI assistant endpoints.

use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::{
    AiBook, AiSearchResult, ChatMessage, ChatReply, ChatRequest, Recommendations,
};
use crate::services::ApiClient;

#[derive(Serialize)]
struct SearchQuery<'a> {
    query: &'a str,
}

/// Typed wrapper over `/ai`.
pub struct Assistant<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn ai(&self) -> Assistant<'_> {
        Assistant { client: self }
    }
}

impl Assistant<'_> {
    /// `POST /ai/search`: natural-language book search.
    pub async fn search(&self, query: &str) -> Result<Vec<AiBook>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::validation("Search query is required"));
        }
        let result: AiSearchResult = self.client.post("ai/search", &SearchQuery { query }).await?;
        Ok(result.books)
    }

    /// `GET /ai/recommend`: suggestions based on the reader's own history.
    pub async fn recommend(&self) -> Result<Vec<AiBook>> {
        let result: Recommendations = self.client.get("ai/recommend", &[]).await?;
        Ok(result.recommendations)
    }

    /// `POST /ai/chat`
    ///
    /// The reply carries the updated history; callers pass it back on the
    /// next turn.
    pub async fn chat(&self, message: &str, history: &[ChatMessage]) -> Result<ChatReply> {
        let request = ChatRequest {
            message: message.trim(),
            history,
        };
        request.validate()?;
        self.client.post("ai/chat", &request).await
    }
}
