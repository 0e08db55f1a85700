//! Profile, per-user review and wishlist endpoints.

use std::path::Path;

use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{
    Page, ProfileEnvelope, ProfileImage, ProfileUpdate, Review, ReviewPage, UserProfile,
    WishlistItem,
};
use crate::services::ApiClient;
use crate::services::client::FileUpload;
use crate::utils::encode_segment;

/// Largest profile image the backend accepts.
pub const MAX_PROFILE_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Content type for an accepted image extension.
fn image_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

#[derive(Deserialize)]
struct WishlistWrapper {
    wishlist: Vec<WishlistItem>,
}

/// Typed wrapper over `/users`.
pub struct Users<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    pub fn users(&self) -> Users<'_> {
        Users { client: self }
    }
}

impl Users<'_> {
    /// `GET /users/profile`
    pub async fn profile(&self) -> Result<UserProfile> {
        let envelope: ProfileEnvelope = self.client.get("users/profile", &[]).await?;
        Ok(envelope.user)
    }

    /// `PUT /users/profile`
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile> {
        let envelope: ProfileEnvelope = self.client.put("users/profile", update).await?;
        Ok(envelope.user)
    }

    /// `POST /users/profile/image` with the file as the `image` form field.
    ///
    /// Type and size are checked locally before anything is uploaded.
    pub async fn upload_profile_image(&self, path: &Path) -> Result<ProfileImage> {
        let mime = image_mime(path).ok_or_else(|| {
            AppError::validation(
                "Invalid file type. Only JPEG, PNG, GIF, and WebP images are allowed.",
            )
        })?;
        let bytes = tokio::fs::read(path).await?;
        if bytes.len() > MAX_PROFILE_IMAGE_BYTES {
            return Err(AppError::validation("Image is too large (max 5MB)"));
        }
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image")
            .to_string();

        log::info!("Uploading profile image {} ({} bytes)", file_name, bytes.len());
        self.client
            .post_file(
                "users/profile/image",
                FileUpload {
                    field: "image",
                    file_name,
                    mime,
                    bytes,
                },
            )
            .await
    }

    /// `GET /users/:userId/reviews?page=N&limit=L`, newest first.
    pub async fn reviews(&self, user_id: &str, page: u32, limit: u32) -> Result<Page<Review>> {
        let page: ReviewPage = self
            .client
            .get_public(
                &format!("users/{}/reviews", encode_segment(user_id)),
                &[("page", page.to_string()), ("limit", limit.to_string())],
            )
            .await?;
        Ok(page.into())
    }

    /// `GET /users/wishlist`
    pub async fn wishlist(&self) -> Result<Vec<WishlistItem>> {
        let wrapper: WishlistWrapper = self.client.get("users/wishlist", &[]).await?;
        Ok(wrapper.wishlist)
    }

    /// `POST /users/wishlist`
    pub async fn add_to_wishlist(&self, item: &WishlistItem) -> Result<Vec<WishlistItem>> {
        let wrapper: WishlistWrapper = self.client.post("users/wishlist", item).await?;
        Ok(wrapper.wishlist)
    }

    /// `DELETE /users/wishlist/:bookId`
    pub async fn remove_from_wishlist(&self, book_id: &str) -> Result<Vec<WishlistItem>> {
        let wrapper: WishlistWrapper = self
            .client
            .delete_for(&format!("users/wishlist/{}", encode_segment(book_id)))
            .await?;
        Ok(wrapper.wishlist)
    }
}
