//! # Profile Snapshots
//!
//! Per-profile source data the tracker reads during a full pass. Snapshots are
//! materialized by a [`ProfileProvider`]; the tracker never writes them back.

pub mod json;

use crate::errors::TrackerError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

pub use json::JsonProfileDirectory;

/// Host-side quest status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestStatus {
    Locked,
    AvailableForStart,
    Started,
    AvailableForFinish,
    Success,
    Fail,
    FailRestartable,
    MarkedAsFailed,
    Expired,
    AvailableAfter,
}

impl QuestStatus {
    /// Failed or expired statuses diverge from the normal start → finish path.
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            QuestStatus::Fail
                | QuestStatus::FailRestartable
                | QuestStatus::MarkedAsFailed
                | QuestStatus::Expired
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestStatusEntry {
    pub quest_id: String,
    pub status: QuestStatus,
    /// Finish-condition ids the host already marked as met.
    #[serde(default)]
    pub completed_conditions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    #[serde(default)]
    pub id: String,
    pub template_id: String,
    #[serde(default)]
    pub stack_count: Option<u64>,
    #[serde(default)]
    pub found_in_raid: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HideoutAreaState {
    #[serde(rename = "type")]
    pub area_type: u32,
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub constructing: bool,
    /// Unix seconds at which the running upgrade finishes.
    #[serde(default)]
    pub complete_time: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraderStanding {
    #[serde(default)]
    pub loyalty_level: Option<u32>,
}

/// Everything a full pass needs about one profile.
///
/// Sections are optional because hosts hand out partially created profiles;
/// the tracker skips such profiles for the pass instead of guessing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub quests: Option<Vec<QuestStatusEntry>>,
    #[serde(default)]
    pub inventory: Option<Vec<InventoryItem>>,
    #[serde(default)]
    pub hideout: Option<Vec<HideoutAreaState>>,
    #[serde(default)]
    pub traders: BTreeMap<String, TraderStanding>,
    /// Named progress counters, keyed by quest condition id.
    #[serde(default)]
    pub condition_counters: HashMap<String, f64>,
}

impl ProfileSnapshot {
    /// A snapshot with every section present and empty.
    pub fn new(nickname: &str) -> Self {
        Self {
            nickname: Some(nickname.to_string()),
            quests: Some(Vec::new()),
            inventory: Some(Vec::new()),
            hideout: Some(Vec::new()),
            traders: BTreeMap::new(),
            condition_counters: HashMap::new(),
        }
    }

    pub fn with_quest(mut self, quest_id: &str, status: QuestStatus) -> Self {
        self.quests.get_or_insert_with(Vec::new).push(QuestStatusEntry {
            quest_id: quest_id.to_string(),
            status,
            completed_conditions: Vec::new(),
        });
        self
    }

    pub fn with_item(mut self, template_id: &str, stack_count: Option<u64>, found_in_raid: bool) -> Self {
        let inventory = self.inventory.get_or_insert_with(Vec::new);
        let id = format!("item{}", inventory.len());
        inventory.push(InventoryItem {
            id,
            template_id: template_id.to_string(),
            stack_count,
            found_in_raid,
        });
        self
    }

    pub fn with_area(mut self, area_type: u32, level: u32) -> Self {
        self.hideout.get_or_insert_with(Vec::new).push(HideoutAreaState {
            area_type,
            level,
            constructing: false,
            complete_time: None,
        });
        self
    }

    pub fn with_construction(mut self, area_type: u32, level: u32, complete_time: Option<i64>) -> Self {
        self.hideout.get_or_insert_with(Vec::new).push(HideoutAreaState {
            area_type,
            level,
            constructing: true,
            complete_time,
        });
        self
    }

    pub fn with_trader(mut self, trader_id: &str, loyalty_level: u32) -> Self {
        self.traders.insert(
            trader_id.to_string(),
            TraderStanding {
                loyalty_level: Some(loyalty_level),
            },
        );
        self
    }

    pub fn with_counter(mut self, condition_id: &str, value: f64) -> Self {
        self.condition_counters.insert(condition_id.to_string(), value);
        self
    }
}

/// Source of per-profile snapshots.
pub trait ProfileProvider: Send + Sync {
    /// Every profile id the host knows about.
    fn profile_ids(&self) -> Result<Vec<String>, TrackerError>;

    fn snapshot(&self, profile_id: &str) -> Result<ProfileSnapshot, TrackerError>;
}

/// Provider for hosts that already hold snapshots in memory.
#[derive(Debug, Default)]
pub struct InMemoryProfiles {
    profiles: RwLock<BTreeMap<String, ProfileSnapshot>>,
}

impl InMemoryProfiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a profile snapshot.
    pub fn put(&self, profile_id: &str, snapshot: ProfileSnapshot) {
        let mut guard = self
            .profiles
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.insert(profile_id.to_string(), snapshot);
    }

    pub fn remove(&self, profile_id: &str) -> Option<ProfileSnapshot> {
        let mut guard = self
            .profiles
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.remove(profile_id)
    }
}

impl ProfileProvider for InMemoryProfiles {
    fn profile_ids(&self) -> Result<Vec<String>, TrackerError> {
        let guard = self
            .profiles
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(guard.keys().cloned().collect())
    }

    fn snapshot(&self, profile_id: &str) -> Result<ProfileSnapshot, TrackerError> {
        let guard = self
            .profiles
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard
            .get(profile_id)
            .cloned()
            .ok_or_else(|| TrackerError::ProfileUnavailable {
                profile_id: profile_id.to_string(),
                reason: "not found".to_string(),
            })
    }
}
