// src/feed/mod.rs

//! Headless controllers for list screens.
//!
//! A renderer drives these from its own event loop:
//! - [`PaginatedFeed`] loads pages into an atomically replaced collection
//! - [`ScrollTrigger`] / [`ScrollListener`] decide when to call `load_more()`
//! - [`OptimisticToggler`] flips likes and memberships before the backend answers
//! - [`Debounced`] holds search input until typing settles
//! - [`Query`] / [`Mutation`] wrap one-off reads and writes

mod collection;
mod controller;
mod debounce;
mod optimistic;
mod resource;
mod scroll;
mod sources;

pub use collection::{Identified, PaginatedCollection};
pub use controller::{
    FeedSnapshot, LoadMode, LoadOutcome, LoadRequest, PageSource, PaginatedFeed, SkipReason,
};
pub use debounce::Debounced;
pub use optimistic::{
    Engageable, EngagementBackend, OptimisticToggler, PendingToggle, ToggleOutcome,
};
pub use resource::{Mutation, Query};
pub use scroll::{
    LoadGate, LoadMoreTarget, ScrollListener, ScrollMetrics, ScrollObservation, ScrollTrigger,
    TriggerStrategy,
};
pub use sources::{
    CatalogSource, ClubMembership, ClubSource, ReviewFeedSource, ReviewLikes, UserReviewSource,
};

use crate::error::{AppError, ErrorKind};

/// Error state kept by a controller for display and a retry action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedError {
    pub kind: ErrorKind,
    /// Text for the user, see [`AppError::user_message`]
    pub message: String,
}

impl FeedError {
    /// Whether a "Try Again" action makes sense.
    pub fn is_retryable(&self) -> bool {
        !matches!(self.kind, ErrorKind::AuthExpired | ErrorKind::Validation)
    }
}

impl From<&AppError> for FeedError {
    fn from(error: &AppError) -> Self {
        Self {
            kind: error.kind(),
            message: error.user_message(),
        }
    }
}
