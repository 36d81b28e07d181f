//! Inventory reconciliation: flat item stacks → per-template owned counts.

use super::catalog::RequirementCatalog;
use crate::content::ContentDatabase;
use crate::profile::InventoryItem;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ItemCount {
    pub total: u64,
    pub found_in_raid: u64,
}

/// Owned counts per item template. Rebuilt from scratch every pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InventoryTally {
    counts: BTreeMap<String, ItemCount>,
}

impl InventoryTally {
    pub fn get(&self, template_id: &str) -> Option<ItemCount> {
        self.counts.get(template_id).copied()
    }

    pub fn total(&self, template_id: &str) -> u64 {
        self.get(template_id).map(|c| c.total).unwrap_or(0)
    }

    pub fn found_in_raid(&self, template_id: &str) -> u64 {
        self.get(template_id).map(|c| c.found_in_raid).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    pub tally: InventoryTally,
    /// Required hand-over items seen found-in-raid in this inventory.
    pub found_required: BTreeSet<String>,
}

/// Fold an inventory into a fresh tally.
///
/// Currency stacks count their stack size (an absent size counts 0); every
/// other item counts 1 per instance regardless of its stack size. Counts
/// saturate at `u64::MAX`.
pub fn reconcile(
    items: &[InventoryItem],
    content: &dyn ContentDatabase,
    catalog: &RequirementCatalog,
) -> Reconciliation {
    let mut result = Reconciliation::default();
    for item in items {
        let count_to_add = if content.is_currency(&item.template_id) {
            item.stack_count.unwrap_or(0)
        } else {
            1
        };

        let entry = result
            .tally
            .counts
            .entry(item.template_id.clone())
            .or_default();
        entry.total = entry.total.saturating_add(count_to_add);

        if item.found_in_raid {
            entry.found_in_raid = entry.found_in_raid.saturating_add(count_to_add);
            if catalog.is_required_item(&item.template_id) {
                result.found_required.insert(item.template_id.clone());
            }
        }
    }
    result
}

/// Merge this pass's found-in-raid sightings into the sticky collected flags.
///
/// Flags only ever go from false to true; every required item gets an entry.
pub fn merge_collected(
    collected: &mut BTreeMap<String, bool>,
    catalog: &RequirementCatalog,
    found_required: &BTreeSet<String>,
) {
    for template_id in found_required {
        collected.insert(template_id.clone(), true);
    }
    for template_id in catalog.required_items().keys() {
        collected.entry(template_id.clone()).or_insert(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentStore, QuestCondition, QuestTemplate, MONEY_BASE_CLASS};
    use crate::tracker::catalog::DEFAULT_AGGREGATE_QUEST_ID;

    fn setup() -> (ContentStore, RequirementCatalog) {
        let content = ContentStore::new()
            .with_quest(
                QuestTemplate::new(DEFAULT_AGGREGATE_QUEST_ID, "Collector")
                    .with_finish_condition(QuestCondition::new("h1", "HandoverItem").with_target("egg")),
            )
            .with_base_class(MONEY_BASE_CLASS, None)
            .with_item("roubles", "Roubles", Some(MONEY_BASE_CLASS))
            .with_item("rifle", "Rifle", None)
            .with_item("egg", "Golden egg", None);
        let catalog = RequirementCatalog::build(&content, DEFAULT_AGGREGATE_QUEST_ID).unwrap();
        (content, catalog)
    }

    fn item(tpl: &str, stack: Option<u64>, fir: bool) -> InventoryItem {
        InventoryItem {
            id: String::new(),
            template_id: tpl.to_string(),
            stack_count: stack,
            found_in_raid: fir,
        }
    }

    #[test]
    fn currency_counts_stack_other_items_count_one() {
        let (content, catalog) = setup();
        let items = vec![
            item("roubles", Some(500), false),
            item("roubles", Some(250), true),
            item("rifle", Some(30), false),
            item("rifle", None, true),
        ];
        let rec = reconcile(&items, &content, &catalog);
        assert_eq!(rec.tally.total("roubles"), 750);
        assert_eq!(rec.tally.found_in_raid("roubles"), 250);
        assert_eq!(rec.tally.total("rifle"), 2);
        assert_eq!(rec.tally.found_in_raid("rifle"), 1);
        assert_eq!(rec.tally.total("absent"), 0);
    }

    #[test]
    fn huge_currency_stacks_saturate() {
        let (content, catalog) = setup();
        let items = vec![item("roubles", Some(u64::MAX), true), item("roubles", Some(1), true)];
        let rec = reconcile(&items, &content, &catalog);
        assert_eq!(rec.tally.total("roubles"), u64::MAX);
        assert_eq!(rec.tally.found_in_raid("roubles"), u64::MAX);
    }

    #[test]
    fn currency_without_stack_size_counts_zero() {
        let (content, catalog) = setup();
        let rec = reconcile(&[item("roubles", None, false)], &content, &catalog);
        assert_eq!(rec.tally.total("roubles"), 0);
        assert_eq!(rec.tally.len(), 1);
    }

    #[test]
    fn reconciliation_is_order_independent() {
        let (content, catalog) = setup();
        let mut items = vec![
            item("roubles", Some(10), true),
            item("egg", None, false),
            item("rifle", None, true),
        ];
        let forward = reconcile(&items, &content, &catalog).tally;
        items.reverse();
        let backward = reconcile(&items, &content, &catalog).tally;
        assert_eq!(forward, backward);
    }

    #[test]
    fn only_found_in_raid_required_items_are_collected() {
        let (content, catalog) = setup();
        let rec = reconcile(&[item("egg", None, false)], &content, &catalog);
        assert!(rec.found_required.is_empty());
        let rec = reconcile(&[item("egg", None, true), item("rifle", None, true)], &content, &catalog);
        assert_eq!(rec.found_required.len(), 1);
        assert!(rec.found_required.contains("egg"));
    }

    #[test]
    fn collected_flags_are_sticky() {
        let (_, catalog) = setup();
        let mut collected = BTreeMap::new();
        merge_collected(&mut collected, &catalog, &BTreeSet::new());
        assert_eq!(collected.get("egg"), Some(&false));

        let found: BTreeSet<String> = ["egg".to_string()].into_iter().collect();
        merge_collected(&mut collected, &catalog, &found);
        assert_eq!(collected.get("egg"), Some(&true));

        merge_collected(&mut collected, &catalog, &BTreeSet::new());
        assert_eq!(collected.get("egg"), Some(&true));
    }
}
