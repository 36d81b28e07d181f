//! Hideout requirement resolution: what each area's next upgrade still needs.

use super::catalog::RequirementCatalog;
use super::inventory::InventoryTally;
use crate::content::{AreaType, ContentDatabase, StageRequirement};
use crate::profile::HideoutAreaState;
use chrono::{DateTime, Utc};
use log::trace;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemRequirement {
    pub template_id: String,
    pub name: String,
    pub requires_found_in_raid: bool,
    pub count_needed: u64,
    pub count_owned: u64,
}

impl ItemRequirement {
    pub fn is_complete(&self) -> bool {
        self.count_owned >= self.count_needed
    }
}

/// Another area's level the next stage depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AreaLevelRequirement {
    pub current_level: u32,
    pub required_level: u32,
}

impl AreaLevelRequirement {
    pub fn is_met(&self) -> bool {
        self.current_level >= self.required_level
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstructionState {
    pub completed: bool,
    /// `None` when the host has not scheduled a completion time yet.
    pub completes_at: Option<DateTime<Utc>>,
    /// Seconds the stage takes to build.
    pub total_duration_secs: Option<f64>,
}

/// Next-stage requirements for every upgradeable area of one profile.
/// Replaced wholesale on every pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FacilityProgress {
    pub items_needed_by_area: BTreeMap<AreaType, Vec<ItemRequirement>>,
    pub loyalty_needed_by_area: BTreeMap<AreaType, BTreeMap<String, u32>>,
    pub prerequisite_area_levels: BTreeMap<AreaType, BTreeMap<AreaType, AreaLevelRequirement>>,
    pub construction: BTreeMap<AreaType, ConstructionState>,
}

impl FacilityProgress {
    /// True when every item, loyalty and area requirement of the area's next
    /// stage is satisfied. Loyalty is checked against `trader_loyalty`.
    pub fn is_area_ready(&self, area: AreaType, trader_loyalty: &BTreeMap<String, u32>) -> bool {
        let items_ok = self
            .items_needed_by_area
            .get(&area)
            .map(|items| items.iter().all(ItemRequirement::is_complete))
            .unwrap_or(true);
        let loyalty_ok = self
            .loyalty_needed_by_area
            .get(&area)
            .map(|traders| {
                traders
                    .iter()
                    .all(|(trader, &needed)| trader_loyalty.get(trader).copied().unwrap_or(0) >= needed)
            })
            .unwrap_or(true);
        let areas_ok = self
            .prerequisite_area_levels
            .get(&area)
            .map(|reqs| reqs.values().all(AreaLevelRequirement::is_met))
            .unwrap_or(true);
        items_ok && loyalty_ok && areas_ok
    }
}

/// Resolve the next stage of every area in `areas` against the content database.
///
/// Areas at their last defined stage, areas unknown to the content database
/// and unknown area codes produce no entries.
pub fn resolve_facilities(
    areas: &[HideoutAreaState],
    content: &dyn ContentDatabase,
    catalog: &RequirementCatalog,
    tally: &InventoryTally,
    now: DateTime<Utc>,
) -> FacilityProgress {
    let mut progress = FacilityProgress::default();
    let profile_levels: HashMap<u32, u32> = areas.iter().map(|a| (a.area_type, a.level)).collect();

    for area in areas {
        let Some(area_type) = AreaType::from_code(area.area_type) else {
            trace!("Skipping unknown hideout area code {}", area.area_type);
            continue;
        };
        let Some(definition) = content.hideout_area(area.area_type) else {
            continue;
        };
        let Some(next_stage) = area.level.checked_add(1).and_then(|next| definition.stage(next)) else {
            // Max level
            continue;
        };

        let items = progress.items_needed_by_area.entry(area_type).or_default();

        for requirement in &next_stage.requirements {
            match requirement {
                StageRequirement::Item {
                    template_id,
                    count,
                    is_spawned_in_session,
                } => {
                    if let Some(existing) = items.iter_mut().find(|r| r.template_id == *template_id) {
                        existing.count_needed = existing.count_needed.saturating_add(u64::from(*count));
                    } else {
                        items.push(ItemRequirement {
                            template_id: template_id.clone(),
                            name: item_name(content, catalog, template_id),
                            requires_found_in_raid: *is_spawned_in_session,
                            count_needed: u64::from(*count),
                            count_owned: 0,
                        });
                    }
                }
                StageRequirement::TraderLoyalty {
                    trader_id,
                    loyalty_level,
                } => {
                    progress
                        .loyalty_needed_by_area
                        .entry(area_type)
                        .or_default()
                        .insert(trader_id.clone(), *loyalty_level);
                }
                StageRequirement::Area {
                    area_type: required_code,
                    required_level,
                } => {
                    let Some(required_area) = AreaType::from_code(*required_code) else {
                        continue;
                    };
                    if required_area == area_type {
                        continue;
                    }
                    let current_level = profile_levels.get(required_code).copied().unwrap_or(0);
                    progress
                        .prerequisite_area_levels
                        .entry(area_type)
                        .or_default()
                        .insert(
                            required_area,
                            AreaLevelRequirement {
                                current_level,
                                required_level: *required_level,
                            },
                        );
                }
                StageRequirement::Other => {}
            }
        }

        if area.constructing {
            let completes_at = area
                .complete_time
                .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));
            progress.construction.insert(
                area_type,
                ConstructionState {
                    completed: completes_at.map(|at| at <= now).unwrap_or(false),
                    completes_at,
                    total_duration_secs: next_stage.construction_time,
                },
            );
        }
    }

    fill_owned_counts(&mut progress, tally);
    progress
}

fn fill_owned_counts(progress: &mut FacilityProgress, tally: &InventoryTally) {
    for requirements in progress.items_needed_by_area.values_mut() {
        for requirement in requirements.iter_mut() {
            requirement.count_owned = if requirement.requires_found_in_raid {
                tally.found_in_raid(&requirement.template_id)
            } else {
                tally.total(&requirement.template_id)
            };
        }
    }
}

fn item_name(content: &dyn ContentDatabase, catalog: &RequirementCatalog, template_id: &str) -> String {
    if let Some(name) = catalog.cached_item_name(template_id) {
        return name.to_string();
    }
    content
        .item_name(template_id)
        .unwrap_or_else(|| template_id.to_string())
}
