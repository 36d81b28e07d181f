//! Input validation for identifiers and JSON files read from disk.
//!
//! Profile ids arrive from the host and are turned into file paths by the JSON
//! profile provider, so they are checked before any path is built.

use crate::errors::TrackerError;
use std::path::{Path, PathBuf};

/// Longest profile id accepted.
pub const MAX_PROFILE_ID_LEN: usize = 64;

/// Validate a profile id: ASCII alphanumerics, `-` and `_`, 1..=64 chars.
pub fn validate_profile_id(id: &str) -> Result<&str, TrackerError> {
    let trimmed = id.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_PROFILE_ID_LEN || trimmed != id {
        return Err(TrackerError::InvalidProfileId(id.to_string()));
    }
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(TrackerError::InvalidProfileId(id.to_string()));
    }
    Ok(trimmed)
}

/// Build `<dir>/<id>.json` for a validated profile id.
pub fn secure_profile_path(dir: &Path, id: &str) -> Result<PathBuf, TrackerError> {
    let id = validate_profile_id(id)?;
    Ok(dir.join(format!("{id}.json")))
}

/// Reject files over `max_bytes` before reading them.
pub fn validate_file_size(path: &Path, size: u64, max_bytes: u64) -> Result<(), TrackerError> {
    if size > max_bytes {
        return Err(TrackerError::FileTooLarge {
            path: path.display().to_string(),
            limit: max_bytes,
        });
    }
    Ok(())
}

/// Parse JSON after stripping a UTF-8 BOM or stray NUL padding some writers leave behind.
pub fn parse_json_lenient<T>(content: &str) -> Result<T, TrackerError>
where
    T: serde::de::DeserializeOwned,
{
    let cleaned = content
        .trim_start_matches('\u{feff}')
        .trim_start_matches('\0')
        .trim_end_matches('\0');
    Ok(serde_json::from_str(cleaned)?)
}
