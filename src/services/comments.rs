//! Comment endpoints.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::Comment;
use crate::services::ApiClient;
use crate::utils::encode_segment;

#[derive(Serialize)]
struct AddComment<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct CommentWrapper {
    comment: Comment,
}

#[derive(Deserialize)]
struct CommentsWrapper {
    comments: Vec<Comment>,
}

/// Typed wrapper over review comments.
pub struct Comments<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn comments(&self) -> Comments<'_> {
        Comments { client: self }
    }
}

impl Comments<'_> {
    /// `GET /reviews/:id/comments`
    pub async fn list(&self, review_id: &str) -> Result<Vec<Comment>> {
        let wrapper: CommentsWrapper = self
            .client
            .get(
                &format!("reviews/{}/comments", encode_segment(review_id)),
                &[],
            )
            .await?;
        Ok(wrapper.comments)
    }

    /// `POST /reviews/:id/comments`
    pub async fn add(&self, review_id: &str, text: &str) -> Result<Comment> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::validation("Comment text is required"));
        }

        let wrapper: CommentWrapper = self
            .client
            .post(
                &format!("reviews/{}/comments", encode_segment(review_id)),
                &AddComment { text },
            )
            .await?;
        Ok(wrapper.comment)
    }

    /// `DELETE /comments/:id`
    pub async fn delete(&self, comment_id: &str) -> Result<()> {
        self.client
            .delete(&format!("comments/{}", encode_segment(comment_id)))
            .await
    }
}
