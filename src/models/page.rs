//! Page of a paginated listing.

use serde::{Deserialize, Serialize};

use crate::models::{Book, Review};

/// One page as returned by a paged endpoint, normalised across resources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,

    /// 1-based page number this page represents
    pub current_page: u32,

    pub has_next_page: bool,

    /// Total items on the server, independent of how many are loaded
    pub total_count: u64,
}

impl<T> Page<T> {
    /// A single page holding the whole listing.
    pub fn complete(items: Vec<T>) -> Self {
        let total_count = items.len() as u64;
        Self {
            items,
            current_page: 1,
            has_next_page: false,
            total_count,
        }
    }
}

/// Wire shape of `GET /reviews?page=N&limit=L`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPage {
    pub reviews: Vec<Review>,
    pub current_page: u32,
    pub has_next_page: bool,
    #[serde(default)]
    pub total_reviews: u64,
}

impl From<ReviewPage> for Page<Review> {
    fn from(page: ReviewPage) -> Self {
        Self {
            items: page.reviews,
            current_page: page.current_page,
            has_next_page: page.has_next_page,
            total_count: page.total_reviews,
        }
    }
}

/// Wire shape of `GET /books/search`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookSearchResult {
    #[serde(default)]
    pub items: Vec<Book>,
    #[serde(default)]
    pub total_items: u64,
}

impl BookSearchResult {
    /// Convert an offset-based result into a page.
    pub fn into_page(self, page: u32, limit: u32) -> Page<Book> {
        let start = u64::from(page.saturating_sub(1)) * u64::from(limit);
        let has_next_page =
            !self.items.is_empty() && start + (self.items.len() as u64) < self.total_items;
        Page {
            items: self.items,
            current_page: page,
            has_next_page,
            total_count: self.total_items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_page_wire_format() {
        let page: ReviewPage = serde_json::from_str(
            r#"{"reviews":[],"currentPage":2,"totalPages":4,"hasNextPage":true,"totalReviews":37}"#,
        )
        .unwrap();
        let page: Page<Review> = page.into();

        assert_eq!(page.current_page, 2);
        assert!(page.has_next_page);
        assert_eq!(page.total_count, 37);
    }

    #[test]
    fn test_book_search_has_next() {
        let books = |n: usize| BookSearchResult {
            items: (0..n)
                .map(|i| Book {
                    id: format!("b{i}"),
                    title: Some(format!("Book {i}")),
                    ..Book::default()
                })
                .collect(),
            total_items: 25,
        };

        assert!(books(10).into_page(1, 10).has_next_page);
        assert!(books(10).into_page(2, 10).has_next_page);
        assert!(!books(5).into_page(3, 10).has_next_page);
        assert!(!books(0).into_page(4, 10).has_next_page);
    }
}
