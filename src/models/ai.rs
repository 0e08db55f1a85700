//! AI search, recommendation and chat data structures.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Longest chat message the backend accepts.
pub const MAX_CHAT_MESSAGE_LEN: usize = 1000;

/// A book suggested by the AI assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiBook {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub match_reason: String,
    #[serde(default)]
    pub similarity_score: Option<f64>,
}

/// `data` of `POST /ai/search`.
#[derive(Debug, Clone, Deserialize)]
pub struct AiSearchResult {
    #[serde(default)]
    pub query: String,
    pub books: Vec<AiBook>,
}

/// `data` of `GET /ai/recommend`; the backend builds the reader profile
/// from stored reviews and wishlist.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendations {
    pub recommendations: Vec<AiBook>,
    #[serde(default)]
    pub user_profile: Option<serde_json::Value>,
}

/// Who said a chat line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One line of chat history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Request body for `POST /ai/chat`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub message: &'a str,
    pub history: &'a [ChatMessage],
}

impl ChatRequest<'_> {
    pub fn validate(&self) -> Result<()> {
        if self.message.trim().is_empty() {
            return Err(AppError::validation(
                "Message is required and must be a non-empty string",
            ));
        }
        if self.message.chars().count() > MAX_CHAT_MESSAGE_LEN {
            return Err(AppError::validation(format!(
                "Message is too long (max {MAX_CHAT_MESSAGE_LEN} characters)"
            )));
        }
        Ok(())
    }
}

/// `data` of `POST /ai/chat`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatReply {
    pub reply: String,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_validation() {
        let history = [ChatMessage::user("hi"), ChatMessage::assistant("hello")];

        let ok = ChatRequest { message: "something like Dune?", history: &history };
        assert!(ok.validate().is_ok());

        let blank = ChatRequest { message: "  ", history: &history };
        assert!(blank.validate().is_err());

        let long = "x".repeat(MAX_CHAT_MESSAGE_LEN + 1);
        let too_long = ChatRequest { message: &long, history: &[] };
        assert!(too_long.validate().is_err());
    }

    #[test]
    fn test_chat_history_wire_format() {
        let json = serde_json::to_value(ChatMessage::assistant("Try Hyperion")).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["content"], "Try Hyperion");
    }
}
