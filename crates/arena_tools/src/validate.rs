//! Catalog validation.

use std::path::Path;

use arena_core::data::CardCatalog;
use tracing::info;

use crate::{Result, ToolError};

/// Parse and validate a RON card catalog.
///
/// Returns the number of cards on success.
///
/// # Errors
///
/// Fails if the file cannot be read, does not parse, or breaks a catalog
/// rule (duplicate ids, unknown spawn references, missing spell radius...).
pub fn validate_catalog_file(path: &Path) -> Result<usize> {
    let text = std::fs::read_to_string(path).map_err(|source| ToolError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let count = validate_catalog_str(&text, &path.display().to_string())?;
    info!(path = %path.display(), cards = count, "Catalog is valid");
    Ok(count)
}

/// Validate catalog text. `source_name` only appears in error messages.
///
/// # Errors
///
/// Same as [`validate_catalog_file`], minus the read.
pub fn validate_catalog_str(text: &str, source_name: &str) -> Result<usize> {
    let catalog = CardCatalog::from_ron_str(text, source_name)?;
    Ok(catalog.len())
}
