//! Review endpoints.

use crate::error::Result;
use crate::models::{LikeStatus, NewReview, Page, Review, ReviewPage};
use crate::services::ApiClient;
use crate::utils::encode_segment;

/// Typed wrapper over `/reviews`.
pub struct Reviews<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn reviews(&self) -> Reviews<'_> {
        Reviews { client: self }
    }
}

impl Reviews<'_> {
    /// `GET /reviews?page=N&limit=L`
    pub async fn list(&self, page: u32, limit: u32) -> Result<Page<Review>> {
        let page: ReviewPage = self
            .client
            .get(
                "reviews",
                &[("page", page.to_string()), ("limit", limit.to_string())],
            )
            .await?;
        Ok(page.into())
    }

    /// `GET /reviews/:id`
    pub async fn get(&self, id: &str) -> Result<Review> {
        #[derive(serde::Deserialize)]
        struct Wrapper {
            review: Review,
        }
        let wrapper: Wrapper = self
            .client
            .get(&format!("reviews/{}", encode_segment(id)), &[])
            .await?;
        Ok(wrapper.review)
    }

    /// `POST /reviews`
    pub async fn create(&self, review: &NewReview) -> Result<Review> {
        review.validate()?;

        #[derive(serde::Deserialize)]
        struct Wrapper {
            review: Review,
        }
        let wrapper: Wrapper = self.client.post("reviews", review).await?;
        log::info!("Created review {} for '{}'", wrapper.review.id, review.book_title);
        Ok(wrapper.review)
    }

    /// `DELETE /reviews/:id`
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.client
            .delete(&format!("reviews/{}", encode_segment(id)))
            .await
    }

    /// `POST /reviews/:id/like`
    pub async fn like(&self, id: &str) -> Result<LikeStatus> {
        self.client
            .post_empty(&format!("reviews/{}/like", encode_segment(id)))
            .await
    }

    /// `DELETE /reviews/:id/like`
    pub async fn unlike(&self, id: &str) -> Result<LikeStatus> {
        self.client
            .delete_for(&format!("reviews/{}/like", encode_segment(id)))
            .await
    }
}
