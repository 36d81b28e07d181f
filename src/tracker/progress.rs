//! Derived per-profile progression state as published to readers.

use super::catalog::RequirementCatalog;
use super::hideout::FacilityProgress;
use super::quests::{QuestDisplayInfo, QuestState};
use serde::Serialize;
use std::collections::BTreeMap;

/// Published state for one profile. Readers hold it behind an `Arc` and never
/// see it change; every update publishes a new value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfileProgress {
    pub profile_id: String,
    /// `None` until a full pass has seen the profile.
    pub nickname: Option<String>,
    pub quest_in_progress: BTreeMap<String, bool>,
    pub quest_completed: BTreeMap<String, bool>,
    /// Sticky: once true, stays true.
    pub items_collected: BTreeMap<String, bool>,
    pub hideout: FacilityProgress,
    pub trader_loyalty: BTreeMap<String, u32>,
    pub display_quests: Vec<QuestDisplayInfo>,
}

impl ProfileProgress {
    /// A fresh record with every required item marked not yet collected.
    pub fn new(profile_id: &str, catalog: &RequirementCatalog) -> Self {
        Self {
            profile_id: profile_id.to_string(),
            items_collected: catalog
                .required_items()
                .keys()
                .map(|id| (id.clone(), false))
                .collect(),
            ..Default::default()
        }
    }

    pub fn quest_state(&self, quest_id: &str) -> QuestState {
        QuestState::from_flags(
            self.quest_in_progress.get(quest_id).copied().unwrap_or(false),
            self.quest_completed.get(quest_id).copied().unwrap_or(false),
        )
    }

    pub fn completed_quest_count(&self) -> usize {
        self.quest_completed.values().filter(|&&done| done).count()
    }

    pub fn collected_item_count(&self) -> usize {
        self.items_collected.values().filter(|&&done| done).count()
    }

    /// True when every tracked quest is completed and every required item collected.
    pub fn is_aggregate_ready(&self, catalog: &RequirementCatalog) -> bool {
        catalog
            .required_quests()
            .iter()
            .all(|q| self.quest_state(&q.id) == QuestState::Completed)
            && catalog
                .required_items()
                .keys()
                .all(|id| self.items_collected.get(id).copied().unwrap_or(false))
    }
}
