//! # API Module
//!
//! HTTP endpoints served by the local callback server while `monthpicks auth`
//! runs:
//!
//! - [`callback`] - receives Spotify's authorization redirect and exchanges
//!   the code for a token (PKCE)
//! - [`health`] - reports server status and whether a token was received
//!
//! ```rust,ignore
//! use axum::{Router, routing::get};
//! use monthpicks::api::{callback, health};
//!
//! let app = Router::new()
//!     .route("/callback", get(callback))
//!     .route("/health", get(health));
//! ```

mod callback;
mod health;

pub use callback::{CallbackError, callback, complete_exchange};
pub use health::health;
