//! Feed bindings to the backend resources.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::feed::{EngagementBackend, OptimisticToggler, PageSource, PaginatedFeed};
use crate::models::{Book, Club, Page, ReconcilePolicy, Review};
use crate::services::ApiClient;

/// `GET /reviews?page&limit`
#[derive(Clone)]
pub struct ReviewFeedSource {
    client: ApiClient,
}

impl ReviewFeedSource {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageSource<Review> for ReviewFeedSource {
    async fn fetch_page(&self, page: u32, limit: u32) -> Result<Page<Review>> {
        self.client.reviews().list(page, limit).await
    }
}

/// `GET /users/:userId/reviews?page&limit` for a profile screen.
#[derive(Clone)]
pub struct UserReviewSource {
    client: ApiClient,
    user_id: String,
}

impl UserReviewSource {
    pub fn new(client: ApiClient, user_id: impl Into<String>) -> Self {
        Self {
            client,
            user_id: user_id.into(),
        }
    }
}

#[async_trait]
impl PageSource<Review> for UserReviewSource {
    async fn fetch_page(&self, page: u32, limit: u32) -> Result<Page<Review>> {
        self.client.users().reviews(&self.user_id, page, limit).await
    }
}

/// `GET /clubs`; the backend returns every club at once.
#[derive(Clone)]
pub struct ClubSource {
    client: ApiClient,
}

impl ClubSource {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageSource<Club> for ClubSource {
    async fn fetch_page(&self, _page: u32, _limit: u32) -> Result<Page<Club>> {
        Ok(Page::complete(self.client.clubs().list().await?))
    }
}

/// First result index of `page`; saturates instead of wrapping.
fn catalog_offset(page: u32, limit: u32) -> u32 {
    page.saturating_sub(1).saturating_mul(limit)
}

/// Catalog search paged by offset.
#[derive(Clone)]
pub struct CatalogSource {
    client: ApiClient,
    query: String,
}

impl CatalogSource {
    pub fn new(client: ApiClient, query: impl Into<String>) -> Self {
        Self {
            client,
            query: query.into(),
        }
    }
}

#[async_trait]
impl PageSource<Book> for CatalogSource {
    async fn fetch_page(&self, page: u32, limit: u32) -> Result<Page<Book>> {
        let start_index = catalog_offset(page, limit);
        let result = self
            .client
            .books()
            .search(&self.query, limit, start_index)
            .await?;
        Ok(result.into_page(page, limit))
    }
}

/// Like/unlike on reviews.
#[derive(Clone)]
pub struct ReviewLikes {
    client: ApiClient,
}

impl ReviewLikes {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EngagementBackend for ReviewLikes {
    async fn engage(&self, id: &str) -> Result<()> {
        let status = self.client.reviews().like(id).await?;
        log::debug!("Review {} now has {} likes", id, status.likes_count);
        Ok(())
    }

    async fn disengage(&self, id: &str) -> Result<()> {
        let status = self.client.reviews().unlike(id).await?;
        log::debug!("Review {} now has {} likes", id, status.likes_count);
        Ok(())
    }
}

/// Join/leave on clubs.
#[derive(Clone)]
pub struct ClubMembership {
    client: ApiClient,
}

impl ClubMembership {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EngagementBackend for ClubMembership {
    async fn engage(&self, id: &str) -> Result<()> {
        self.client.clubs().join(id).await.map(|_| ())
    }

    async fn disengage(&self, id: &str) -> Result<()> {
        self.client.clubs().leave(id).await.map(|_| ())
    }
}

impl ApiClient {
    /// Paginated review feed.
    pub fn review_feed(&self, page_size: u32) -> PaginatedFeed<Review> {
        PaginatedFeed::new(ReviewFeedSource::new(self.clone()), page_size)
    }

    /// Paginated reviews written by `user_id`.
    pub fn user_review_feed(&self, user_id: &str, page_size: u32) -> PaginatedFeed<Review> {
        PaginatedFeed::new(UserReviewSource::new(self.clone(), user_id), page_size)
    }

    /// Club directory as a single-page feed.
    pub fn club_feed(&self) -> PaginatedFeed<Club> {
        PaginatedFeed::new(ClubSource::new(self.clone()), 1)
    }

    /// Catalog search results for `query`.
    pub fn catalog_feed(&self, query: &str, page_size: u32) -> PaginatedFeed<Book> {
        PaginatedFeed::new(CatalogSource::new(self.clone(), query), page_size)
    }

    /// Like toggles for `feed` on behalf of `viewer`.
    pub fn review_likes(
        &self,
        feed: Arc<PaginatedFeed<Review>>,
        viewer: &str,
        policy: ReconcilePolicy,
    ) -> OptimisticToggler<Review> {
        OptimisticToggler::new(feed, Arc::new(ReviewLikes::new(self.clone())), viewer)
            .with_policy(policy)
    }

    /// Join/leave toggles for `feed` on behalf of `viewer`.
    pub fn club_membership(
        &self,
        feed: Arc<PaginatedFeed<Club>>,
        viewer: &str,
        policy: ReconcilePolicy,
    ) -> OptimisticToggler<Club> {
        OptimisticToggler::new(feed, Arc::new(ClubMembership::new(self.clone())), viewer)
            .with_policy(policy)
    }
}
