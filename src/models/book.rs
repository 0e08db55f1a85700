//! Book catalog and wishlist data structures.

use serde::{Deserialize, Serialize};

/// Cover image links.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageLinks {
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub small_thumbnail: Option<String>,
}

/// A catalog volume.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub published_date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub page_count: Option<u32>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub image_links: Option<ImageLinks>,
    #[serde(default)]
    pub average_rating: Option<f32>,
    #[serde(default)]
    pub ratings_count: Option<u32>,
}

impl Book {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Untitled")
    }

    pub fn display_author(&self) -> &str {
        self.authors.first().map_or("Unknown Author", String::as_str)
    }

    pub fn cover(&self) -> Option<&str> {
        self.image_links.as_ref()?.thumbnail.as_deref()
    }
}

impl crate::feed::Identified for Book {
    fn id(&self) -> &str {
        &self.id
    }
}

/// `data` of `GET /books/:id`.
#[derive(Debug, Clone, Deserialize)]
pub struct BookEnvelope {
    pub book: Book,
}

/// A book saved for later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    pub book_id: String,
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub cover: Option<String>,
}

impl From<&Book> for WishlistItem {
    fn from(book: &Book) -> Self {
        Self {
            book_id: book.id.clone(),
            title: book.display_title().to_string(),
            authors: book.authors.clone(),
            cover: book.cover().map(str::to_string),
        }
    }
}
