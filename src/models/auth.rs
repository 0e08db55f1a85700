//! Authentication and profile data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::UserSummary;

/// `data` of register/login responses.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    pub user: UserSummary,
    pub access_token: String,
    pub refresh_token: String,
}

/// `data` of `POST /auth/refresh`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshedToken {
    pub access_token: String,
    /// Some backends rotate the refresh token as well
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// The signed-in user's profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(alias = "_id")]
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub profile_image: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub favorite_genres: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// `data` of profile endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileEnvelope {
    pub user: UserProfile,
}

/// `data` of `POST /users/profile/image`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileImage {
    pub user: UserProfile,
    /// Server path of the stored image, e.g. `/uploads/profiles/profile-1.png`
    pub image_url: String,
}

/// Request body for `PUT /users/profile`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favorite_genres: Option<Vec<String>>,
}
