mod common;

use common::*;
use progression_tracker::content::AreaType;
use progression_tracker::profile::{ProfileSnapshot, QuestStatus, TraderStanding};
use progression_tracker::tracker::{PassOutcome, QuestState, MISSING_CONDITION_TEXT};

fn completed(outcome: PassOutcome) -> progression_tracker::tracker::PassSummary {
    match outcome {
        PassOutcome::Completed(summary) => summary,
        PassOutcome::AlreadyRunning => panic!("pass unexpectedly rejected"),
    }
}

#[test]
fn workbench_next_stage_sums_duplicate_items() {
    let (profiles, engine) = engine();
    let mut snap = ProfileSnapshot::new("Alice").with_area(AreaType::Workbench.code(), 1);
    for _ in 0..4 {
        snap = snap.with_item(BOLTS, None, false);
    }
    profiles.put("alice", snap);

    completed(engine.recompute());
    let progress = engine.progress("alice").expect("alice tracked");

    let items = &progress.hideout.items_needed_by_area[&AreaType::Workbench];
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].template_id, BOLTS);
    assert_eq!(items[0].name, "Bolts");
    assert_eq!(items[0].count_needed, 5);
    assert_eq!(items[0].count_owned, 4);
    assert!(!items[0].is_complete());

    let loyalty = &progress.hideout.loyalty_needed_by_area[&AreaType::Workbench];
    assert_eq!(loyalty.get(TRADER_A), Some(&2));
    assert!(!progress
        .hideout
        .is_area_ready(AreaType::Workbench, &progress.trader_loyalty));
}

#[test]
fn max_level_areas_produce_no_entries() {
    let (profiles, engine) = engine();
    profiles.put(
        "bob",
        ProfileSnapshot::new("Bob")
            .with_area(AreaType::Workbench.code(), 2)
            .with_area(AreaType::Generator.code(), 1),
    );
    completed(engine.recompute());
    let progress = engine.progress("bob").unwrap();
    assert!(progress.hideout.items_needed_by_area.is_empty());
    assert!(progress.hideout.loyalty_needed_by_area.is_empty());
    assert!(progress.hideout.construction.is_empty());
}

#[test]
fn currency_counts_stack_size_other_items_count_instances() {
    let (profiles, engine) = engine();
    profiles.put(
        "carol",
        ProfileSnapshot::new("Carol")
            .with_area(AreaType::Lavatory.code(), 0)
            .with_item(ROUBLES, Some(1500), false)
            .with_item(ROUBLES, Some(600), false)
            .with_item(RIFLE, Some(30), false),
    );
    completed(engine.recompute());
    let progress = engine.progress("carol").unwrap();
    let items = &progress.hideout.items_needed_by_area[&AreaType::Lavatory];
    let roubles = items.iter().find(|r| r.template_id == ROUBLES).unwrap();
    let rifle = items.iter().find(|r| r.template_id == RIFLE).unwrap();
    assert_eq!(roubles.count_owned, 2100);
    assert!(roubles.is_complete());
    assert_eq!(rifle.count_owned, 1);
    assert!(!rifle.is_complete());
}

#[test]
fn collected_items_stay_collected() {
    let (profiles, engine) = engine();
    profiles.put(
        "dave",
        ProfileSnapshot::new("Dave")
            .with_item(EGG, None, true)
            .with_item(FIGURINE, None, false),
    );
    completed(engine.recompute());
    let first = engine.progress("dave").unwrap();
    assert_eq!(first.items_collected.get(EGG), Some(&true));
    assert_eq!(first.items_collected.get(FIGURINE), Some(&false));

    // The egg was handed over; it is gone from the inventory.
    profiles.put("dave", ProfileSnapshot::new("Dave"));
    completed(engine.recompute());
    let second = engine.progress("dave").unwrap();
    assert_eq!(second.items_collected.get(EGG), Some(&true));
    assert_eq!(second.items_collected.get(FIGURINE), Some(&false));
    assert_eq!(second.collected_item_count(), 1);
}

#[test]
fn full_pass_is_idempotent() {
    let (profiles, engine) = engine();
    profiles.put(
        "erin",
        ProfileSnapshot::new("Erin")
            .with_area(AreaType::Workbench.code(), 1)
            .with_item(BOLTS, None, true)
            .with_quest(Q_SHOOTER, QuestStatus::Started)
            .with_trader(TRADER_A, 1),
    );
    completed(engine.recompute());
    let first = engine.snapshot();
    completed(engine.recompute());
    let second = engine.snapshot();
    assert_eq!(first.len(), second.len());
    for (id, progress) in &first {
        assert_eq!(**progress, *second[id]);
    }
}

#[test]
fn broken_profiles_are_skipped_without_failing_the_pass() {
    let (profiles, engine) = engine();
    profiles.put("ok", ProfileSnapshot::new("Ok"));
    let mut no_inventory = ProfileSnapshot::new("Half");
    no_inventory.inventory = None;
    profiles.put("half", no_inventory);
    let mut nameless = ProfileSnapshot::new("x");
    nameless.nickname = None;
    profiles.put("nameless", nameless);

    let mut sub = engine.subscribe();
    let summary = completed(engine.recompute());
    assert_eq!(summary.profiles_processed, 1);
    assert_eq!(summary.profiles_skipped, 2);
    assert!(engine.progress("ok").is_some());
    assert!(engine.progress("half").is_none());
    assert!(engine.progress("nameless").is_none());
    assert!(sub.try_changed());
    assert!(!sub.try_changed());

    let metrics = engine.metrics();
    assert_eq!(metrics.passes_completed, 1);
    assert_eq!(metrics.profiles_skipped, 2);
}

#[test]
fn quest_classification_and_condition_display() {
    let (profiles, engine) = engine();
    profiles.put(
        "fay",
        ProfileSnapshot::new("Fay")
            .with_quest(Q_SHOOTER, QuestStatus::Started)
            .with_quest(Q_GUNSMITH, QuestStatus::Success)
            .with_quest(Q_UNTRACKED, QuestStatus::Started)
            .with_counter("kills", 5.0),
    );
    completed(engine.recompute());
    let progress = engine.progress("fay").unwrap();

    assert_eq!(progress.quest_state(Q_SHOOTER), QuestState::InProgress);
    assert_eq!(progress.quest_state(Q_GUNSMITH), QuestState::Completed);
    assert!(!progress.quest_in_progress.contains_key(Q_UNTRACKED));
    assert!(!progress.quest_completed.contains_key(Q_UNTRACKED));

    assert_eq!(progress.display_quests.len(), 1);
    let display = &progress.display_quests[0];
    assert_eq!(display.quest_id, Q_SHOOTER);
    assert_eq!(display.quest_name, "Shooter Born");
    assert_eq!(display.conditions.len(), 1);
    assert_eq!(display.conditions[0].text, "Eliminate 5 targets");
    assert!(display.conditions[0].completed);
    assert_ne!(display.conditions[0].text, MISSING_CONDITION_TEXT);
}

#[test]
fn construction_and_trader_loyalty_are_reported() {
    let (profiles, engine) = engine();
    let finished = fixed_now().timestamp() - 60;
    profiles.put(
        "gil",
        ProfileSnapshot::new("Gil")
            .with_construction(AreaType::Workbench.code(), 1, Some(finished))
            .with_trader(TRADER_A, 3),
    );
    completed(engine.recompute());
    let progress = engine.progress("gil").unwrap();
    let construction = &progress.hideout.construction[&AreaType::Workbench];
    assert!(construction.completed);
    assert_eq!(construction.total_duration_secs, Some(3600.0));
    assert_eq!(progress.trader_loyalty.get(TRADER_A), Some(&3));
}

#[test]
fn names_and_pass_timestamp_are_exposed() {
    let (profiles, engine) = engine();
    assert!(engine.last_pass_at().is_none());
    profiles.put("p1", ProfileSnapshot::new("Alice"));
    profiles.put("p2", ProfileSnapshot::new("Bob"));
    completed(engine.recompute());
    let names = engine.profile_names();
    assert_eq!(names.get("p1").map(String::as_str), Some("Alice"));
    assert_eq!(names.get("p2").map(String::as_str), Some("Bob"));
    assert_eq!(engine.last_pass_at(), Some(fixed_now()));
}

#[test]
fn catalog_tracks_prerequisites_and_handover_items() {
    let (_, engine) = engine();
    let catalog = engine.catalog();
    let ids: Vec<&str> = catalog.required_quests().iter().map(|q| q.id.as_str()).collect();
    assert_eq!(ids, vec![Q_SHOOTER, Q_GUNSMITH]);
    assert!(catalog.is_required_item(EGG));
    assert!(catalog.is_required_item(FIGURINE));
    assert!(!catalog.is_required_item("spare"));
    assert_eq!(catalog.cached_item_name(BOLTS), Some("Bolts"));
}

#[test]
fn trader_without_loyalty_level_is_recorded_at_zero() {
    let (profiles, engine) = engine();
    let mut snap = ProfileSnapshot::new("Hal").with_trader(TRADER_A, 2);
    snap.traders
        .insert("trader_b".to_string(), TraderStanding { loyalty_level: None });
    profiles.put("hal", snap);
    completed(engine.recompute());
    let progress = engine.progress("hal").unwrap();
    assert_eq!(progress.trader_loyalty.get(TRADER_A), Some(&2));
    assert_eq!(progress.trader_loyalty.get("trader_b"), Some(&0));
}

#[test]
fn out_of_range_profile_values_do_not_abort_the_pass() {
    let (profiles, engine) = engine();
    profiles.put(
        "rich",
        ProfileSnapshot::new("Rich")
            .with_area(AreaType::Lavatory.code(), 0)
            .with_item(ROUBLES, Some(u64::MAX), false)
            .with_item(ROUBLES, Some(1), false),
    );
    profiles.put(
        "odd",
        ProfileSnapshot::new("Odd").with_area(AreaType::Workbench.code(), u32::MAX),
    );
    profiles.put(
        "plain",
        ProfileSnapshot::new("Plain").with_area(AreaType::Workbench.code(), 1),
    );

    let mut sub = engine.subscribe();
    let summary = completed(engine.recompute());
    assert_eq!(summary.profiles_processed, 3);
    assert!(sub.try_changed());

    let rich = engine.progress("rich").unwrap();
    let roubles = rich.hideout.items_needed_by_area[&AreaType::Lavatory]
        .iter()
        .find(|r| r.template_id == ROUBLES)
        .unwrap();
    assert_eq!(roubles.count_owned, u64::MAX);

    let odd = engine.progress("odd").unwrap();
    assert!(odd.hideout.items_needed_by_area.is_empty());

    let plain = engine.progress("plain").unwrap();
    assert!(plain
        .hideout
        .items_needed_by_area
        .contains_key(&AreaType::Workbench));
}

#[test]
fn profile_becomes_aggregate_ready() {
    let (profiles, engine) = engine();
    profiles.put(
        "ivy",
        ProfileSnapshot::new("Ivy")
            .with_quest(Q_SHOOTER, QuestStatus::Success)
            .with_item(EGG, None, true),
    );
    completed(engine.recompute());
    let partial = engine.progress("ivy").unwrap();
    assert_eq!(partial.completed_quest_count(), 1);
    assert!(!partial.is_aggregate_ready(engine.catalog()));

    profiles.put(
        "ivy",
        ProfileSnapshot::new("Ivy")
            .with_quest(Q_SHOOTER, QuestStatus::Success)
            .with_quest(Q_GUNSMITH, QuestStatus::Success)
            .with_item(FIGURINE, None, true),
    );
    completed(engine.recompute());
    let ready = engine.progress("ivy").unwrap();
    assert_eq!(ready.completed_quest_count(), 2);
    assert_eq!(ready.collected_item_count(), 2);
    assert!(ready.is_aggregate_ready(engine.catalog()));
}
