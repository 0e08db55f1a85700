// src/models/mod.rs

//! Domain models for the bookfeed client.
//!
//! Wire types mirror the backend's JSON (camelCase, Mongo `_id` accepted
//! as `id`); configuration lives alongside them.

mod ai;
mod auth;
mod book;
mod club;
mod config;
mod page;
mod review;

// Re-export all public types
pub use ai::{
    AiBook, AiSearchResult, ChatMessage, ChatReply, ChatRequest, ChatRole, MAX_CHAT_MESSAGE_LEN,
    Recommendations,
};
pub use auth::{
    AuthPayload, ProfileEnvelope, ProfileImage, ProfileUpdate, RefreshedToken, UserProfile,
};
pub use book::{Book, BookEnvelope, ImageLinks, WishlistItem};
pub use club::{Club, ClubMember, NewClub};
pub use config::{
    ApiConfig, Config, FeedConfig, LoggingConfig, PathsConfig, ReconcilePolicy, RetryConfig,
};
pub use page::{BookSearchResult, Page, ReviewPage};
pub use review::{Comment, LikeStatus, NewReview, Review, UserSummary};
