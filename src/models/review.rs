//! Review and comment data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::feed::{Engageable, Identified};

/// Author info embedded in reviews and comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    #[serde(alias = "_id")]
    pub id: String,

    pub username: String,

    #[serde(default)]
    pub profile_image: String,
}

/// A book review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(alias = "_id")]
    pub id: String,

    pub user_id: String,

    #[serde(default)]
    pub user: Option<UserSummary>,

    pub book_title: String,

    pub book_author: String,

    #[serde(default)]
    pub book_image: Option<String>,

    #[serde(default, rename = "bookISBN")]
    pub book_isbn: Option<String>,

    pub rating: u8,

    pub review_text: String,

    #[serde(default)]
    pub google_book_id: Option<String>,

    /// Ids of users who liked this review
    #[serde(default)]
    pub likes: Vec<String>,

    #[serde(default)]
    pub likes_count: u32,

    #[serde(default)]
    pub comments_count: u32,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Review {
    /// Whether the given user has liked this review.
    pub fn is_liked_by(&self, user_id: &str) -> bool {
        self.likes.iter().any(|id| id == user_id)
    }
}

impl Identified for Review {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Engageable for Review {
    fn is_engaged(&self, viewer: &str) -> bool {
        self.is_liked_by(viewer)
    }

    fn engagement_count(&self) -> u32 {
        self.likes_count
    }

    fn set_engaged(&mut self, viewer: &str, engaged: bool) {
        if engaged == self.is_liked_by(viewer) {
            return;
        }
        if engaged {
            self.likes.push(viewer.to_string());
            self.likes_count += 1;
        } else {
            self.likes.retain(|id| id != viewer);
            self.likes_count = self.likes_count.saturating_sub(1);
        }
    }
}

/// Request body for `POST /reviews`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub book_title: String,
    pub book_author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub book_image: Option<String>,
    #[serde(rename = "bookISBN", skip_serializing_if = "Option::is_none")]
    pub book_isbn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_book_id: Option<String>,
    pub rating: u8,
    pub review_text: String,
}

impl NewReview {
    /// Check the fields the backend would otherwise reject.
    pub fn validate(&self) -> Result<()> {
        if self.book_title.trim().is_empty() {
            return Err(AppError::validation("Book title is required"));
        }
        if self.book_author.trim().is_empty() {
            return Err(AppError::validation("Book author is required"));
        }
        if !(1..=5).contains(&self.rating) {
            return Err(AppError::validation("Rating must be between 1 and 5"));
        }
        if self.review_text.trim().is_empty() {
            return Err(AppError::validation("Review text is required"));
        }
        Ok(())
    }
}

/// Body of like/unlike responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeStatus {
    pub likes_count: u32,
    pub is_liked: bool,
}

/// A comment on a review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(alias = "_id")]
    pub id: String,

    pub review_id: String,

    pub user: UserSummary,

    pub text: String,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Identified for Comment {
    fn id(&self) -> &str {
        &self.id
    }
}
