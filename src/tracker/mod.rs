//! Progression tracking for the aggregate quest and hideout upgrades.
//!
//! Bottom-up: [`catalog`] is built once from content; [`inventory`],
//! [`hideout`] and [`quests`] derive per-profile state; [`engine`] runs
//! passes and incremental updates; [`driver`] ticks the engine on tokio.

pub mod catalog;
pub mod driver;
pub mod engine;
pub mod hideout;
pub mod inventory;
pub mod notify;
pub mod progress;
pub mod quests;

pub use catalog::{RequirementCatalog, TrackedQuest, DEFAULT_AGGREGATE_QUEST_ID};
pub use driver::{start_tracker, DriverConfig, TrackerHandle};
pub use engine::{
    EngineBuilder, PassOutcome, PassSummary, ProgressionEngine, QuestEvent, QuestEventKind,
    QuestLifecycleHook, TickOutcome, DEFAULT_UPDATE_INTERVAL,
};
pub use hideout::{AreaLevelRequirement, ConstructionState, FacilityProgress, ItemRequirement};
pub use inventory::{InventoryTally, ItemCount};
pub use notify::{ChangeNotifier, Subscription};
pub use progress::ProfileProgress;
pub use quests::{QuestConditionDisplay, QuestDisplayInfo, QuestState, MISSING_CONDITION_TEXT};
