//! Requirement catalog: what the aggregate quest needs, built once at startup.

use crate::content::{ContentDatabase, StageRequirement};
use crate::errors::TrackerError;
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Quest id of the Collector quest, the default aggregate quest.
pub const DEFAULT_AGGREGATE_QUEST_ID: &str = "5c51aac186f77432ea65c552";

const HANDOVER_ITEM_CONDITION: &str = "HandoverItem";
const QUEST_CONDITION: &str = "Quest";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackedQuest {
    pub id: String,
    pub name: String,
}

/// Immutable after [`RequirementCatalog::build`]. Anything absent is simply not tracked.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RequirementCatalog {
    aggregate_quest_id: String,
    /// Prerequisite quests in the aggregate quest's declaration order.
    required_quests: Vec<TrackedQuest>,
    #[serde(skip)]
    quest_index: HashMap<String, usize>,
    required_items: BTreeMap<String, String>,
    item_names: BTreeMap<String, String>,
}

impl RequirementCatalog {
    /// Build the catalog for `aggregate_quest_id`.
    ///
    /// Fails only when the aggregate quest itself is missing; every other gap
    /// is logged and left out.
    pub fn build(
        content: &dyn ContentDatabase,
        aggregate_quest_id: &str,
    ) -> Result<Self, TrackerError> {
        let aggregate = content
            .quest(aggregate_quest_id)
            .ok_or_else(|| TrackerError::AggregateQuestMissing(aggregate_quest_id.to_string()))?;

        let mut catalog = RequirementCatalog {
            aggregate_quest_id: aggregate_quest_id.to_string(),
            ..Default::default()
        };

        for condition in &aggregate.conditions.available_for_finish {
            if condition.condition_type != HANDOVER_ITEM_CONDITION {
                continue;
            }
            let Some(item_id) = condition.target.as_ref().and_then(|t| t.first()) else {
                debug!("Hand-over condition {} has no target, skipping", condition.id);
                continue;
            };
            let name = display_name(content, item_id);
            catalog.required_items.insert(item_id.to_string(), name);
        }

        for condition in &aggregate.conditions.available_for_start {
            if condition.condition_type != QUEST_CONDITION {
                continue;
            }
            let Some(quest_id) = condition.target.as_ref().and_then(|t| t.first()) else {
                continue;
            };
            let Some(quest) = content.quest(quest_id) else {
                warn!("Prerequisite quest {} not found in content, not tracking it", quest_id);
                continue;
            };
            if catalog.quest_index.contains_key(quest_id) {
                continue;
            }
            catalog
                .quest_index
                .insert(quest_id.to_string(), catalog.required_quests.len());
            catalog.required_quests.push(TrackedQuest {
                id: quest_id.to_string(),
                name: quest.name.clone(),
            });
        }

        for area in content.hideout_areas() {
            for stage in area.stages.values() {
                for requirement in &stage.requirements {
                    if let StageRequirement::Item { template_id, .. } = requirement {
                        if !catalog.item_names.contains_key(template_id) {
                            let name = display_name(content, template_id);
                            catalog.item_names.insert(template_id.clone(), name);
                        }
                    }
                }
            }
        }

        info!(
            "Requirement catalog built for {}: {} quests, {} hand-over items, {} hideout item names",
            aggregate_quest_id,
            catalog.required_quests.len(),
            catalog.required_items.len(),
            catalog.item_names.len()
        );
        Ok(catalog)
    }

    pub fn aggregate_quest_id(&self) -> &str {
        &self.aggregate_quest_id
    }

    pub fn required_quests(&self) -> &[TrackedQuest] {
        &self.required_quests
    }

    pub fn is_tracked_quest(&self, quest_id: &str) -> bool {
        self.quest_index.contains_key(quest_id)
    }

    pub fn quest_name(&self, quest_id: &str) -> Option<&str> {
        self.quest_index
            .get(quest_id)
            .map(|&i| self.required_quests[i].name.as_str())
    }

    pub fn required_items(&self) -> &BTreeMap<String, String> {
        &self.required_items
    }

    pub fn is_required_item(&self, template_id: &str) -> bool {
        self.required_items.contains_key(template_id)
    }

    /// Cached hideout item name, if the item appears in any stage.
    pub fn cached_item_name(&self, template_id: &str) -> Option<&str> {
        self.item_names.get(template_id).map(String::as_str)
    }

    pub fn item_name_cache_len(&self) -> usize {
        self.item_names.len()
    }
}

fn display_name(content: &dyn ContentDatabase, template_id: &str) -> String {
    content
        .item_name(template_id)
        .unwrap_or_else(|| template_id.to_string())
}
