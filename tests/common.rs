//! Test utilities & fixtures.
//! A small content database around the collector quest plus helpers for
//! building engines over in-memory or on-disk profiles.
#![allow(dead_code)] // Each test binary uses a different subset.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use progression_tracker::content::{
    AreaDefinition, AreaStage, AreaType, ContentStore, QuestCondition, QuestTemplate,
    StageRequirement, MONEY_BASE_CLASS,
};
use progression_tracker::profile::InMemoryProfiles;
use progression_tracker::tracker::{ProgressionEngine, DEFAULT_AGGREGATE_QUEST_ID};

pub const AGG: &str = DEFAULT_AGGREGATE_QUEST_ID;
pub const Q_SHOOTER: &str = "q_shooter";
pub const Q_GUNSMITH: &str = "q_gunsmith";
pub const Q_UNTRACKED: &str = "q_untracked";
pub const EGG: &str = "egg";
pub const FIGURINE: &str = "figurine";
pub const BOLTS: &str = "bolts";
pub const ROUBLES: &str = "roubles";
pub const RIFLE: &str = "rifle";
pub const TRADER_A: &str = "trader_a";

pub fn item_req(tpl: &str, count: u32, fir: bool) -> StageRequirement {
    StageRequirement::Item {
        template_id: tpl.to_string(),
        count,
        is_spawned_in_session: fir,
    }
}

/// Collector quest needing two prerequisite quests and two hand-over items;
/// a workbench whose level 2 needs 2 + 3 bolts and trader A at 2; a
/// lavatory whose level 1 needs currency and a rifle; a single-stage generator.
pub fn content() -> ContentStore {
    let workbench = AreaDefinition::new(AreaType::Workbench)
        .with_stage(1, AreaStage::default())
        .with_stage(
            2,
            AreaStage {
                requirements: vec![
                    item_req(BOLTS, 2, false),
                    item_req(BOLTS, 3, false),
                    StageRequirement::TraderLoyalty {
                        trader_id: TRADER_A.to_string(),
                        loyalty_level: 2,
                    },
                ],
                construction_time: Some(3600.0),
            },
        );
    let lavatory = AreaDefinition::new(AreaType::Lavatory).with_stage(
        1,
        AreaStage {
            requirements: vec![item_req(ROUBLES, 2000, false), item_req(RIFLE, 2, false)],
            construction_time: None,
        },
    );
    let generator = AreaDefinition::new(AreaType::Generator).with_stage(1, AreaStage::default());

    ContentStore::new()
        .with_quest(
            QuestTemplate::new(AGG, "Collector")
                .with_start_condition(QuestCondition::new("s1", "Quest").with_target(Q_SHOOTER))
                .with_start_condition(QuestCondition::new("s2", "Quest").with_target(Q_GUNSMITH))
                .with_finish_condition(QuestCondition::new("h1", "HandoverItem").with_target(EGG))
                .with_finish_condition(
                    QuestCondition::new("h2", "HandoverItem").with_targets(&[FIGURINE, "spare"]),
                ),
        )
        .with_quest(
            QuestTemplate::new(Q_SHOOTER, "Shooter Born")
                .with_finish_condition(QuestCondition::new("kills", "CounterCreator").with_value(5.0)),
        )
        .with_quest(QuestTemplate::new(Q_GUNSMITH, "Gunsmith"))
        .with_quest(QuestTemplate::new(Q_UNTRACKED, "Delivery"))
        .with_base_class(MONEY_BASE_CLASS, None)
        .with_item(ROUBLES, "Roubles", Some(MONEY_BASE_CLASS))
        .with_item(BOLTS, "Bolts", None)
        .with_item(RIFLE, "Rifle", None)
        .with_item(EGG, "Golden egg", None)
        .with_item(FIGURINE, "Golden rooster", None)
        .with_locale("kills", "Eliminate 5 targets")
        .with_area(workbench)
        .with_area(lavatory)
        .with_area(generator)
}

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

/// Engine over an in-memory provider with a fixed clock and a 600 s threshold.
pub fn engine() -> (Arc<InMemoryProfiles>, ProgressionEngine) {
    let profiles = Arc::new(InMemoryProfiles::new());
    let engine = ProgressionEngine::builder(Arc::new(content()), profiles.clone())
        .update_threshold(Duration::from_secs(600))
        .clock(fixed_now)
        .log_updates(false)
        .build()
        .expect("engine");
    (profiles, engine)
}
