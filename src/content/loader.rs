//! JSON loaders for the content database.
//!
//! A content directory holds:
//! - `quests.json`: object of quest id → quest template (required)
//! - `hideout_areas.json`: list of area definitions (required)
//! - `items.json`: object of template id → item template (optional)
//! - `locales.json`: object of locale key → text (optional)

use super::{AreaDefinition, ContentStore, ItemTemplate, QuestTemplate};
use crate::errors::TrackerError;
use crate::validation::parse_json_lenient;
use log::{debug, error, info};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub const QUESTS_FILE: &str = "quests.json";
pub const HIDEOUT_AREAS_FILE: &str = "hideout_areas.json";
pub const ITEMS_FILE: &str = "items.json";
pub const LOCALES_FILE: &str = "locales.json";

/// Load a content directory into a [`ContentStore`].
pub fn load_content_dir<P: AsRef<Path>>(dir: P) -> Result<ContentStore, TrackerError> {
    let dir = dir.as_ref();

    let mut quests: HashMap<String, QuestTemplate> = read_required(&dir.join(QUESTS_FILE))?;
    // The map key is authoritative; records may omit or disagree on `id`.
    for (id, quest) in quests.iter_mut() {
        if quest.id != *id {
            quest.id = id.clone();
        }
    }
    let areas: Vec<AreaDefinition> = read_required(&dir.join(HIDEOUT_AREAS_FILE))?;
    let items: HashMap<String, ItemTemplate> = read_optional(&dir.join(ITEMS_FILE))?;
    let locales: HashMap<String, String> = read_optional(&dir.join(LOCALES_FILE))?;

    info!(
        "Loaded content from {}: {} quests, {} hideout areas, {} items, {} locale entries",
        dir.display(),
        quests.len(),
        areas.len(),
        items.len(),
        locales.len()
    );

    Ok(ContentStore::from_parts(quests, areas, items, locales))
}

fn read_required<T: DeserializeOwned>(path: &Path) -> Result<T, TrackerError> {
    let contents = fs::read_to_string(path).map_err(|e| {
        TrackerError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to read {}: {}", path.display(), e),
        ))
    })?;
    parse_json_lenient(&contents).map_err(|e| {
        error!("Failed to parse {}: {}", path.display(), e);
        e
    })
}

fn read_optional<T: DeserializeOwned + Default>(path: &Path) -> Result<T, TrackerError> {
    if !path.exists() {
        debug!("{} not present, using empty table", path.display());
        return Ok(T::default());
    }
    read_required(path)
}
