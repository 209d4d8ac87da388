//! # Arena Development Tools
//!
//! Command-line tools for development:
//! - Card catalog validation
//! - Headless bot-vs-bot matches for balance checks

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod headless;
pub mod validate;

use arena_core::error::GameError;
use thiserror::Error;

/// Errors reported by the tools.
#[derive(Debug, Error)]
pub enum ToolError {
    /// A file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File that failed.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The engine rejected the input.
    #[error(transparent)]
    Game(#[from] GameError),

    /// Match parameters are unusable.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// The summary could not be written.
    #[error("Failed to encode summary: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Result type for tool operations.
pub type Result<T> = std::result::Result<T, ToolError>;
