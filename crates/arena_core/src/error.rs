//! Error types for the match simulation.

use thiserror::Error;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all match simulation errors.
///
/// Gameplay commands never surface these: an invalid deploy is a silent
/// no-op (see [`crate::simulation::DeployRejection`]). Errors are reserved
/// for setup (catalog, config) and for the room-capacity signal on join.
#[derive(Debug, Error)]
pub enum GameError {
    /// Card catalog could not be parsed.
    #[error("Failed to parse card catalog '{source_name}': {message}")]
    CatalogParse {
        /// Name of the source that failed to parse (file path or `builtin`).
        source_name: String,
        /// Error message.
        message: String,
    },

    /// Card catalog parsed but failed validation.
    #[error("Invalid card catalog: {0}")]
    InvalidCatalog(String),

    /// Card id not present in the catalog.
    #[error("Unknown card: {0}")]
    UnknownCard(String),

    /// A third player tried to join a two-sided match.
    #[error("Room is full")]
    RoomFull,

    /// Snapshot encoding or decoding failed.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Match configuration could not be parsed.
    #[error("Failed to parse match config: {0}")]
    ConfigParse(String),
}
