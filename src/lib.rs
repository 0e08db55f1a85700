// src/lib.rs

//! bookfeed: client-side data flow for a book-review social app.
//!
//! Typed API client with bearer auth and token refresh, plus the headless
//! feed controllers (pagination, infinite scroll, optimistic toggles,
//! debounced input) a UI drives.

pub mod credentials;
pub mod error;
pub mod feed;
pub mod models;
pub mod services;
pub mod utils;
