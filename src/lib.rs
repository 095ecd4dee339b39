//! Monthly Release Playlist Library
//!
//! This library implements a monthly playlist-curation job: it reads a curated
//! artist list, asks the Spotify catalog for every release those artists put out
//! during the previous calendar month, deduplicates and filters the resulting
//! tracks and writes them into a playlist named after that month.
//!
//! # Modules
//!
//! - `api` - HTTP endpoints for the local OAuth callback server
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `management` - Token persistence and refresh
//! - `pipeline` - Release window, harvesting, deduplication and content filtering
//! - `server` - Local HTTP server for OAuth callbacks
//! - `source` - Artist sources (Notion database, plain file)
//! - `spotify` - Spotify Web API client and rate-limited gateway
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers
//!
//! # Flow
//!
//! ```text
//! source ─► harvest(single) ─┐
//!       └─► harvest(album) ──┴► merge ─► dedup ─► unwanted ─► playlist
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod management;
pub mod pipeline;
pub mod server;
pub mod source;
pub mod spotify;
pub mod types;
pub mod utils;

/// Result alias used by the CLI glue code.
///
/// The core modules return typed errors (`GatewayError`, `SourceError`, ...);
/// everything that only needs to be reported to the user is boxed into this.
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// Accepts the same arguments as `println!`.
///
/// ```
/// info!("Processing album: {}...", album.name);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program
/// with status 1.
///
/// Only the CLI layer uses this macro. Library code returns errors and leaves
/// the decision to terminate to its caller.
///
/// ```
/// error!("No artists found in Notion.");
/// // unreachable
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// Used for recoverable, per-item problems: a skipped artist, an abandoned
/// page, a rate-limit wait.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
