//! Profile provider backed by a directory of `<profile-id>.json` files.
//!
//! Files are read on every snapshot request under a shared file lock, so the
//! host can keep writing them with an exclusive lock while the tracker runs.
//! A corrupt or oversized file only affects its own profile.

use super::{ProfileProvider, ProfileSnapshot};
use crate::errors::TrackerError;
use crate::validation::{parse_json_lenient, secure_profile_path, validate_file_size, validate_profile_id};
use fs2::FileExt;
use log::debug;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Default cap on a single profile file.
pub const DEFAULT_MAX_PROFILE_BYTES: u64 = 8 * 1024 * 1024;

pub struct JsonProfileDirectory {
    dir: PathBuf,
    max_bytes: u64,
}

impl JsonProfileDirectory {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            max_bytes: DEFAULT_MAX_PROFILE_BYTES,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read_profile(&self, path: &Path) -> Result<String, TrackerError> {
        let file = fs::OpenOptions::new().read(true).open(path)?;
        validate_file_size(path, file.metadata()?.len(), self.max_bytes)?;
        file.lock_shared()?;
        let read = read_capped(&file, path, self.max_bytes);
        let _ = file.unlock();
        read
    }
}

/// Read at most `max_bytes`; the file may have grown since its size was checked.
fn read_capped<R: Read>(reader: R, path: &Path, max_bytes: u64) -> Result<String, TrackerError> {
    let mut contents = String::new();
    reader
        .take(max_bytes.saturating_add(1))
        .read_to_string(&mut contents)?;
    validate_file_size(path, contents.len() as u64, max_bytes)?;
    Ok(contents)
}

impl ProfileProvider for JsonProfileDirectory {
    fn profile_ids(&self) -> Result<Vec<String>, TrackerError> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match validate_profile_id(stem) {
                Ok(id) => ids.push(id.to_string()),
                Err(_) => debug!("Ignoring profile file with invalid name: {}", path.display()),
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn snapshot(&self, profile_id: &str) -> Result<ProfileSnapshot, TrackerError> {
        let path = secure_profile_path(&self.dir, profile_id)?;
        let contents = self
            .read_profile(&path)
            .map_err(|e| TrackerError::ProfileUnavailable {
                profile_id: profile_id.to_string(),
                reason: e.to_string(),
            })?;
        parse_json_lenient(&contents).map_err(|e| TrackerError::ProfileUnavailable {
            profile_id: profile_id.to_string(),
            reason: e.to_string(),
        })
    }
}
