//! Quest status tracking for the aggregate quest's prerequisites.
//!
//! Each tracked quest is NotTracked, InProgress or Completed per profile.
//! Full passes classify the host's status list; lifecycle events jump straight
//! to InProgress or Completed and are held as *pending* until the host's
//! snapshots catch up (see [`host_supersedes`]).

use super::catalog::RequirementCatalog;
use crate::content::ContentDatabase;
use crate::profile::{QuestStatus, QuestStatusEntry};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Shown for conditions without locale text.
pub const MISSING_CONDITION_TEXT: &str = "Unknown condition";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum QuestState {
    NotTracked,
    InProgress,
    Completed,
}

impl QuestState {
    /// Map a host status to the local state.
    pub fn from_status(status: QuestStatus) -> Self {
        match status {
            QuestStatus::Started | QuestStatus::AvailableForFinish => QuestState::InProgress,
            QuestStatus::Success => QuestState::Completed,
            _ => QuestState::NotTracked,
        }
    }

    /// The `(in_progress, completed)` flag pair. Never both true.
    pub fn flags(self) -> (bool, bool) {
        match self {
            QuestState::NotTracked => (false, false),
            QuestState::InProgress => (true, false),
            QuestState::Completed => (false, true),
        }
    }

    pub fn from_flags(in_progress: bool, completed: bool) -> Self {
        match (in_progress, completed) {
            (_, true) => QuestState::Completed,
            (true, false) => QuestState::InProgress,
            (false, false) => QuestState::NotTracked,
        }
    }
}

/// Write both flags for one quest together.
pub fn write_state(
    in_progress: &mut BTreeMap<String, bool>,
    completed: &mut BTreeMap<String, bool>,
    quest_id: &str,
    state: QuestState,
) {
    let (p, c) = state.flags();
    in_progress.insert(quest_id.to_string(), p);
    completed.insert(quest_id.to_string(), c);
}

/// Whether the host's status has caught up with (or diverged from) a pending
/// incremental transition, so the host classification should govern again.
///
/// A host status *behind* the pending state is a stale read and does not
/// supersede it. Failure statuses always supersede.
pub fn host_supersedes(pending: QuestState, host: Option<QuestStatus>) -> bool {
    let Some(status) = host else {
        return false;
    };
    if status.is_failure() {
        return true;
    }
    QuestState::from_status(status) >= pending
}

/// Classify every tracked quest in the host's status list.
/// Quests absent from the list are not reported.
pub fn classify(
    catalog: &RequirementCatalog,
    entries: &[QuestStatusEntry],
) -> BTreeMap<String, (QuestStatus, QuestState)> {
    entries
        .iter()
        .filter(|entry| catalog.is_tracked_quest(&entry.quest_id))
        .map(|entry| {
            (
                entry.quest_id.clone(),
                (entry.status, QuestState::from_status(entry.status)),
            )
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestConditionDisplay {
    pub condition_id: String,
    pub text: String,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestDisplayInfo {
    pub quest_id: String,
    pub quest_name: String,
    pub conditions: Vec<QuestConditionDisplay>,
}

/// Build the condition breakdown for one tracked quest.
///
/// A condition is complete when the host lists it as completed, or when the
/// progress counter named by its id reaches its threshold.
pub fn build_display(
    catalog: &RequirementCatalog,
    content: &dyn ContentDatabase,
    quest_id: &str,
    entry: Option<&QuestStatusEntry>,
    counters: &HashMap<String, f64>,
) -> QuestDisplayInfo {
    let quest_name = catalog
        .quest_name(quest_id)
        .unwrap_or(quest_id)
        .to_string();
    let conditions = content
        .quest(quest_id)
        .map(|quest| {
            quest
                .conditions
                .available_for_finish
                .iter()
                .map(|condition| {
                    let listed = entry
                        .map(|e| e.completed_conditions.iter().any(|c| *c == condition.id))
                        .unwrap_or(false);
                    let counted = match (counters.get(&condition.id), condition.value) {
                        (Some(&progress), Some(threshold)) => progress >= threshold,
                        _ => false,
                    };
                    QuestConditionDisplay {
                        condition_id: condition.id.clone(),
                        text: content
                            .locale_text(&condition.id)
                            .unwrap_or(MISSING_CONDITION_TEXT)
                            .to_string(),
                        completed: listed || counted,
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    QuestDisplayInfo {
        quest_id: quest_id.to_string(),
        quest_name,
        conditions,
    }
}
