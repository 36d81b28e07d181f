//! # Content Database
//!
//! Read-only game content the tracker resolves requirements against: quest
//! templates, hideout area stage definitions, item templates and locale text.
//!
//! The tracker only talks to the [`ContentDatabase`] trait. [`ContentStore`] is the
//! in-memory implementation, filled either programmatically (tests, embedding
//! hosts) or from a directory of JSON files via [`loader::load_content_dir`].

pub mod loader;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub use loader::load_content_dir;

/// Base class every currency item template descends from.
pub const MONEY_BASE_CLASS: &str = "543be5dd4bdc2deb348b4569";

/// Guard against cyclic parent chains in malformed item data.
const MAX_PARENT_DEPTH: usize = 32;

/// Hideout areas known to the tracker. Area codes outside this list are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum AreaType {
    Vents,
    Security,
    Lavatory,
    Stash,
    Generator,
    Heating,
    WaterCollector,
    MedStation,
    Kitchen,
    RestSpace,
    Workbench,
    IntelligenceCenter,
    ShootingRange,
    Library,
    ScavCase,
    Illumination,
    PlaceOfFame,
    AirFilteringUnit,
    SolarPower,
    BoozeGenerator,
    BitcoinFarm,
    ChristmasTree,
    EmergencyWall,
    Gym,
    WeaponStand,
    WeaponStandSecondary,
    EquipmentPresetsStand,
    CircleOfCultists,
}

impl AreaType {
    const ALL: [AreaType; 28] = [
        AreaType::Vents,
        AreaType::Security,
        AreaType::Lavatory,
        AreaType::Stash,
        AreaType::Generator,
        AreaType::Heating,
        AreaType::WaterCollector,
        AreaType::MedStation,
        AreaType::Kitchen,
        AreaType::RestSpace,
        AreaType::Workbench,
        AreaType::IntelligenceCenter,
        AreaType::ShootingRange,
        AreaType::Library,
        AreaType::ScavCase,
        AreaType::Illumination,
        AreaType::PlaceOfFame,
        AreaType::AirFilteringUnit,
        AreaType::SolarPower,
        AreaType::BoozeGenerator,
        AreaType::BitcoinFarm,
        AreaType::ChristmasTree,
        AreaType::EmergencyWall,
        AreaType::Gym,
        AreaType::WeaponStand,
        AreaType::WeaponStandSecondary,
        AreaType::EquipmentPresetsStand,
        AreaType::CircleOfCultists,
    ];

    /// Map a numeric area code as stored in content and profiles.
    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    pub fn code(self) -> u32 {
        self as u32
    }
}

/// Target of a quest condition; content stores either one id or a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionTarget {
    One(String),
    Many(Vec<String>),
}

impl ConditionTarget {
    /// First referenced id. An empty list yields `None`.
    pub fn first(&self) -> Option<&str> {
        match self {
            ConditionTarget::One(id) => Some(id.as_str()),
            ConditionTarget::Many(ids) => ids.first().map(String::as_str),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestCondition {
    pub id: String,
    pub condition_type: String,
    #[serde(default)]
    pub target: Option<ConditionTarget>,
    /// Threshold the matching progress counter must reach.
    #[serde(default)]
    pub value: Option<f64>,
}

impl QuestCondition {
    pub fn new(id: &str, condition_type: &str) -> Self {
        Self {
            id: id.to_string(),
            condition_type: condition_type.to_string(),
            target: None,
            value: None,
        }
    }

    pub fn with_target(mut self, target: &str) -> Self {
        self.target = Some(ConditionTarget::One(target.to_string()));
        self
    }

    pub fn with_targets(mut self, targets: &[&str]) -> Self {
        self.target = Some(ConditionTarget::Many(
            targets.iter().map(|t| t.to_string()).collect(),
        ));
        self
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestConditions {
    #[serde(default)]
    pub available_for_start: Vec<QuestCondition>,
    #[serde(default)]
    pub available_for_finish: Vec<QuestCondition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestTemplate {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub conditions: QuestConditions,
}

impl QuestTemplate {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            conditions: QuestConditions::default(),
        }
    }

    pub fn with_start_condition(mut self, condition: QuestCondition) -> Self {
        self.conditions.available_for_start.push(condition);
        self
    }

    pub fn with_finish_condition(mut self, condition: QuestCondition) -> Self {
        self.conditions.available_for_finish.push(condition);
        self
    }
}

/// One requirement entry of an area upgrade stage, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StageRequirement {
    Item {
        template_id: String,
        #[serde(default)]
        count: u32,
        /// Item must have been found in raid to count.
        #[serde(default)]
        is_spawned_in_session: bool,
    },
    TraderLoyalty {
        trader_id: String,
        #[serde(default)]
        loyalty_level: u32,
    },
    Area {
        area_type: u32,
        #[serde(default)]
        required_level: u32,
    },
    /// Skills, tools, quest gates: not tracked.
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AreaStage {
    #[serde(default)]
    pub requirements: Vec<StageRequirement>,
    /// Seconds.
    #[serde(default)]
    pub construction_time: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaDefinition {
    #[serde(rename = "type")]
    pub area_type: u32,
    /// Stage definitions keyed by the level they unlock ("0", "1", ...).
    #[serde(default)]
    pub stages: BTreeMap<String, AreaStage>,
}

impl AreaDefinition {
    pub fn new(area: AreaType) -> Self {
        Self {
            area_type: area.code(),
            stages: BTreeMap::new(),
        }
    }

    pub fn with_stage(mut self, level: u32, stage: AreaStage) -> Self {
        self.stages.insert(level.to_string(), stage);
        self
    }

    pub fn stage(&self, level: u32) -> Option<&AreaStage> {
        self.stages.get(&level.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemTemplate {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub parent: Option<String>,
}

/// Read-only view of the game content the tracker needs.
pub trait ContentDatabase: Send + Sync {
    fn quest(&self, id: &str) -> Option<&QuestTemplate>;

    fn hideout_areas(&self) -> &[AreaDefinition];

    fn hideout_area(&self, area_type: u32) -> Option<&AreaDefinition> {
        self.hideout_areas().iter().find(|a| a.area_type == area_type)
    }

    fn item_name(&self, template_id: &str) -> Option<String>;

    /// True when the template descends from the money base class.
    fn is_currency(&self, template_id: &str) -> bool;

    fn locale_text(&self, key: &str) -> Option<&str>;
}

/// In-memory content database.
#[derive(Debug, Clone, Default)]
pub struct ContentStore {
    quests: HashMap<String, QuestTemplate>,
    areas: Vec<AreaDefinition>,
    items: HashMap<String, ItemTemplate>,
    locales: HashMap<String, String>,
}

impl ContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quest(mut self, quest: QuestTemplate) -> Self {
        self.quests.insert(quest.id.clone(), quest);
        self
    }

    pub fn with_area(mut self, area: AreaDefinition) -> Self {
        self.areas.retain(|a| a.area_type != area.area_type);
        self.areas.push(area);
        self
    }

    pub fn with_item(mut self, id: &str, name: &str, parent: Option<&str>) -> Self {
        self.items.insert(
            id.to_string(),
            ItemTemplate {
                id: id.to_string(),
                name: Some(name.to_string()),
                parent: parent.map(str::to_string),
            },
        );
        self
    }

    /// Register a bare base-class node (no display name).
    pub fn with_base_class(mut self, id: &str, parent: Option<&str>) -> Self {
        self.items.insert(
            id.to_string(),
            ItemTemplate {
                id: id.to_string(),
                name: None,
                parent: parent.map(str::to_string),
            },
        );
        self
    }

    pub fn with_locale(mut self, key: &str, text: &str) -> Self {
        self.locales.insert(key.to_string(), text.to_string());
        self
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn from_parts(
        quests: HashMap<String, QuestTemplate>,
        areas: Vec<AreaDefinition>,
        items: HashMap<String, ItemTemplate>,
        locales: HashMap<String, String>,
    ) -> Self {
        Self {
            quests,
            areas,
            items,
            locales,
        }
    }
}

impl ContentDatabase for ContentStore {
    fn quest(&self, id: &str) -> Option<&QuestTemplate> {
        self.quests.get(id)
    }

    fn hideout_areas(&self) -> &[AreaDefinition] {
        &self.areas
    }

    fn item_name(&self, template_id: &str) -> Option<String> {
        if let Some(name) = self.items.get(template_id).and_then(|i| i.name.clone()) {
            return Some(name);
        }
        self.locales.get(&format!("{template_id} Name")).cloned()
    }

    fn is_currency(&self, template_id: &str) -> bool {
        let mut current = self.items.get(template_id).and_then(|i| i.parent.as_deref());
        for _ in 0..MAX_PARENT_DEPTH {
            match current {
                Some(MONEY_BASE_CLASS) => return true,
                Some(parent) => {
                    current = self.items.get(parent).and_then(|i| i.parent.as_deref());
                }
                None => return false,
            }
        }
        false
    }

    fn locale_text(&self, key: &str) -> Option<&str> {
        self.locales.get(key).map(String::as_str)
    }
}
