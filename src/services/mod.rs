//! API client layer.
//!
//! [`ApiClient`] owns transport, credentials and error mapping; each
//! resource gets a borrowed, typed wrapper:
//! - `auth()`: register, login, logout, refresh
//! - `reviews()`: paged listing, create/delete, like/unlike
//! - `comments()`: list/add/delete per review
//! - `clubs()`: list, create, join/leave
//! - `ai()`: search, recommendations, chat
//! - `books()`: catalog search and details
//! - `users()`: profile, profile image, per-user reviews, wishlist

mod ai;
mod auth;
mod books;
mod client;
mod clubs;
mod comments;
mod reviews;
mod users;

pub use ai::Assistant;
pub use auth::Auth;
pub use books::{Books, DEFAULT_CATALOG_QUERY};
pub use client::{ApiClient, SessionExpiredHook};
pub use clubs::Clubs;
pub use comments::Comments;
pub use reviews::Reviews;
pub use users::Users;
