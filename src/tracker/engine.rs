//! The progression engine: full passes, incremental quest transitions and the
//! published per-profile state.
//!
//! Published state lives in one engine-wide `RwLock<HashMap<..>>` of slots.
//! Each slot holds an `Arc<ProfileProgress>` that readers clone out; writers
//! never mutate a published value in place:
//!
//! * a full pass computes each profile's new record with no lock held, then
//!   takes the write lock only to merge sticky/pending state and swap the `Arc`;
//! * an incremental transition takes the write lock and copies-on-write via
//!   `Arc::make_mut`.
//!
//! Passes never overlap. A second pass started while one is running returns
//! [`PassOutcome::AlreadyRunning`] immediately.

use super::catalog::{RequirementCatalog, DEFAULT_AGGREGATE_QUEST_ID};
use super::hideout::resolve_facilities;
use super::inventory::{merge_collected, reconcile};
use super::notify::{ChangeNotifier, Subscription};
use super::progress::ProfileProgress;
use super::quests::{build_display, classify, host_supersedes, write_state, QuestDisplayInfo, QuestState};
use crate::content::ContentDatabase;
use crate::errors::TrackerError;
use crate::metrics::{MetricsSnapshot, TrackerMetrics};
use crate::profile::{ProfileProvider, QuestStatus};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

/// Default full-pass threshold for [`ProgressionEngine::on_update`].
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(600);

/// Source of "now" for construction timers and bookkeeping timestamps.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestEventKind {
    Accepted,
    Completed,
}

impl QuestEventKind {
    fn target_state(self) -> QuestState {
        match self {
            QuestEventKind::Accepted => QuestState::InProgress,
            QuestEventKind::Completed => QuestState::Completed,
        }
    }
}

/// A quest lifecycle event raised by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestEvent {
    pub profile_id: String,
    pub quest_id: String,
    pub kind: QuestEventKind,
}

impl QuestEvent {
    pub fn accepted(profile_id: &str, quest_id: &str) -> Self {
        Self {
            profile_id: profile_id.to_string(),
            quest_id: quest_id.to_string(),
            kind: QuestEventKind::Accepted,
        }
    }

    pub fn completed(profile_id: &str, quest_id: &str) -> Self {
        Self {
            profile_id: profile_id.to_string(),
            quest_id: quest_id.to_string(),
            kind: QuestEventKind::Completed,
        }
    }
}

/// Entry points the host calls when a quest is accepted or handed in.
///
/// Both return whether tracked state changed (`false` for untracked quests).
pub trait QuestLifecycleHook: Send + Sync {
    fn on_quest_accepted(&self, profile_id: &str, quest_id: &str) -> bool;
    fn on_quest_completed(&self, profile_id: &str, quest_id: &str) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassSummary {
    pub profiles_processed: usize,
    pub profiles_skipped: usize,
    pub duration: Duration,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    Completed(PassSummary),
    AlreadyRunning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Elapsed time has not reached the update threshold.
    NotDue,
    /// A pass was due but another one is still running.
    Busy,
    Completed(PassSummary),
}

struct ProfileSlot {
    published: Arc<ProfileProgress>,
    /// Incremental transitions the host's snapshots have not caught up with.
    pending: HashMap<String, QuestState>,
}

impl ProfileSlot {
    fn new(profile_id: &str, catalog: &RequirementCatalog) -> Self {
        Self {
            published: Arc::new(ProfileProgress::new(profile_id, catalog)),
            pending: HashMap::new(),
        }
    }
}

/// One profile's recomputed state, built with no lock held.
struct ComputedProfile {
    progress: ProfileProgress,
    found_required: BTreeSet<String>,
    host_quests: BTreeMap<String, (QuestStatus, QuestState)>,
    displays: HashMap<String, QuestDisplayInfo>,
}

enum ProfileSkip {
    NoNickname,
    Failed(TrackerError),
}

impl From<TrackerError> for ProfileSkip {
    fn from(err: TrackerError) -> Self {
        ProfileSkip::Failed(err)
    }
}

/// Clears the running flag when the pass ends, including by panic.
struct PassGuard<'a>(&'a AtomicBool);

impl<'a> PassGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| PassGuard(flag))
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct EngineBuilder {
    content: Arc<dyn ContentDatabase>,
    profiles: Arc<dyn ProfileProvider>,
    aggregate_quest_id: String,
    update_threshold: Duration,
    log_updates: bool,
    clock: Option<Clock>,
}

impl EngineBuilder {
    pub fn new(content: Arc<dyn ContentDatabase>, profiles: Arc<dyn ProfileProvider>) -> Self {
        Self {
            content,
            profiles,
            aggregate_quest_id: DEFAULT_AGGREGATE_QUEST_ID.to_string(),
            update_threshold: DEFAULT_UPDATE_INTERVAL,
            log_updates: true,
            clock: None,
        }
    }

    pub fn aggregate_quest_id(mut self, id: impl Into<String>) -> Self {
        self.aggregate_quest_id = id.into();
        self
    }

    pub fn update_threshold(mut self, threshold: Duration) -> Self {
        self.update_threshold = threshold;
        self
    }

    pub fn log_updates(mut self, enabled: bool) -> Self {
        self.log_updates = enabled;
        self
    }

    pub fn clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        let clock: Clock = Arc::new(clock);
        self.clock = Some(clock);
        self
    }

    /// Build the catalog and the engine. Fails when the aggregate quest is missing.
    pub fn build(self) -> Result<ProgressionEngine, TrackerError> {
        let catalog = RequirementCatalog::build(self.content.as_ref(), &self.aggregate_quest_id)?;
        Ok(ProgressionEngine {
            content: self.content,
            profiles: self.profiles,
            catalog,
            state: RwLock::new(HashMap::new()),
            pass_running: AtomicBool::new(false),
            update_threshold: self.update_threshold,
            log_updates: self.log_updates,
            clock: self.clock.unwrap_or_else(|| Arc::new(Utc::now) as Clock),
            notifier: ChangeNotifier::new(),
            metrics: TrackerMetrics::new(),
            last_pass_at: Mutex::new(None),
            last_quest_update_at: Mutex::new(None),
        })
    }
}

pub struct ProgressionEngine {
    content: Arc<dyn ContentDatabase>,
    profiles: Arc<dyn ProfileProvider>,
    catalog: RequirementCatalog,
    state: RwLock<HashMap<String, ProfileSlot>>,
    pass_running: AtomicBool,
    update_threshold: Duration,
    log_updates: bool,
    clock: Clock,
    notifier: ChangeNotifier,
    metrics: TrackerMetrics,
    last_pass_at: Mutex<Option<DateTime<Utc>>>,
    last_quest_update_at: Mutex<Option<DateTime<Utc>>>,
}

impl std::fmt::Debug for ProgressionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressionEngine")
            .field("aggregate_quest_id", &self.catalog.aggregate_quest_id())
            .field("update_threshold", &self.update_threshold)
            .field("pass_running", &self.is_pass_running())
            .finish_non_exhaustive()
    }
}

impl ProgressionEngine {
    pub fn builder(
        content: Arc<dyn ContentDatabase>,
        profiles: Arc<dyn ProfileProvider>,
    ) -> EngineBuilder {
        EngineBuilder::new(content, profiles)
    }

    pub fn catalog(&self) -> &RequirementCatalog {
        &self.catalog
    }

    pub fn update_threshold(&self) -> Duration {
        self.update_threshold
    }

    pub fn is_pass_running(&self) -> bool {
        self.pass_running.load(Ordering::Acquire)
    }

    pub fn subscribe(&self) -> Subscription {
        self.notifier.subscribe()
    }

    pub fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn last_pass_at(&self) -> Option<DateTime<Utc>> {
        *lock(&self.last_pass_at)
    }

    pub fn last_quest_update_at(&self) -> Option<DateTime<Utc>> {
        *lock(&self.last_quest_update_at)
    }

    /// Current published state for one profile.
    pub fn progress(&self, profile_id: &str) -> Option<Arc<ProfileProgress>> {
        self.read_state()
            .get(profile_id)
            .map(|slot| Arc::clone(&slot.published))
    }

    /// Current published state for every known profile.
    pub fn snapshot(&self) -> BTreeMap<String, Arc<ProfileProgress>> {
        self.read_state()
            .iter()
            .map(|(id, slot)| (id.clone(), Arc::clone(&slot.published)))
            .collect()
    }

    /// Profile id → nickname for every profile a full pass has seen.
    pub fn profile_names(&self) -> BTreeMap<String, String> {
        self.read_state()
            .iter()
            .filter_map(|(id, slot)| {
                slot.published
                    .nickname
                    .as_ref()
                    .map(|name| (id.clone(), name.clone()))
            })
            .collect()
    }

    /// Tick entry point. Runs a full pass once `elapsed` reaches the threshold.
    pub fn on_update(&self, elapsed: Duration) -> TickOutcome {
        if elapsed < self.update_threshold {
            self.metrics.inc_tick_not_due();
            return TickOutcome::NotDue;
        }
        match self.recompute() {
            PassOutcome::Completed(summary) => TickOutcome::Completed(summary),
            PassOutcome::AlreadyRunning => TickOutcome::Busy,
        }
    }

    /// Recompute every profile's derived state.
    ///
    /// Profile failures skip that profile only. The pass always completes and
    /// fires exactly one change notification.
    pub fn recompute(&self) -> PassOutcome {
        let Some(_guard) = PassGuard::acquire(&self.pass_running) else {
            debug!("Progression pass already running, rejecting overlapping request");
            self.metrics.inc_pass_rejected();
            return PassOutcome::AlreadyRunning;
        };

        let started = Instant::now();
        let now = (self.clock)();

        let profile_ids = match self.profiles.profile_ids() {
            Ok(ids) => ids,
            Err(e) => {
                warn!("Could not enumerate profiles: {}", e);
                Vec::new()
            }
        };

        let mut processed = 0usize;
        let mut skipped = 0usize;
        for profile_id in &profile_ids {
            match self.compute_profile(profile_id, now) {
                Ok(computed) => {
                    self.merge_and_swap(profile_id, computed);
                    processed += 1;
                }
                Err(ProfileSkip::NoNickname) => {
                    debug!("Profile {} has no nickname yet, skipping", profile_id);
                    skipped += 1;
                }
                Err(ProfileSkip::Failed(e)) => {
                    warn!("Skipping profile {} this pass: {}", profile_id, e);
                    skipped += 1;
                }
            }
        }

        let duration = started.elapsed();
        *lock(&self.last_pass_at) = Some(now);
        self.metrics
            .record_pass(processed as u64, skipped as u64, duration);

        if self.log_updates {
            info!(
                "Progression pass finished: {} profiles updated, {} skipped in {:?}",
                processed, skipped, duration
            );
        } else {
            debug!(
                "Progression pass finished: {} profiles updated, {} skipped in {:?}",
                processed, skipped, duration
            );
        }

        self.notifier.notify();
        PassOutcome::Completed(PassSummary {
            profiles_processed: processed,
            profiles_skipped: skipped,
            duration,
            finished_at: now,
        })
    }

    /// Apply a lifecycle transition for one quest.
    ///
    /// Untracked quests are ignored and return `false`. A profile no pass has
    /// seen yet gets a minimal record so the transition is not lost.
    pub fn apply_quest_transition(
        &self,
        profile_id: &str,
        quest_id: &str,
        kind: QuestEventKind,
    ) -> bool {
        if !self.catalog.is_tracked_quest(quest_id) {
            self.metrics.inc_incremental_ignored();
            return false;
        }

        let target = kind.target_state();
        {
            let mut state = self.write_state();
            let slot = state
                .entry(profile_id.to_string())
                .or_insert_with(|| ProfileSlot::new(profile_id, &self.catalog));
            let progress = Arc::make_mut(&mut slot.published);
            write_state(
                &mut progress.quest_in_progress,
                &mut progress.quest_completed,
                quest_id,
                target,
            );
            slot.pending.insert(quest_id.to_string(), target);
        }

        *lock(&self.last_quest_update_at) = Some((self.clock)());
        self.metrics.inc_incremental_applied();
        if self.log_updates {
            info!(
                "Quest {} for profile {} is now {:?}",
                quest_id, profile_id, target
            );
        }
        self.notifier.notify();
        true
    }

    pub fn handle_event(&self, event: &QuestEvent) -> bool {
        self.apply_quest_transition(&event.profile_id, &event.quest_id, event.kind)
    }

    fn compute_profile(
        &self,
        profile_id: &str,
        now: DateTime<Utc>,
    ) -> Result<ComputedProfile, ProfileSkip> {
        let snapshot = self.profiles.snapshot(profile_id)?;
        let Some(nickname) = snapshot.nickname.clone() else {
            return Err(ProfileSkip::NoNickname);
        };
        let incomplete = |section| TrackerError::IncompleteProfile {
            profile_id: profile_id.to_string(),
            section,
        };
        let inventory = snapshot.inventory.as_ref().ok_or_else(|| incomplete("inventory"))?;
        let hideout = snapshot.hideout.as_ref().ok_or_else(|| incomplete("hideout"))?;
        let quests = snapshot.quests.as_ref().ok_or_else(|| incomplete("quest list"))?;

        let content = self.content.as_ref();
        let reconciliation = reconcile(inventory, content, &self.catalog);
        let facilities = resolve_facilities(hideout, content, &self.catalog, &reconciliation.tally, now);
        let host_quests = classify(&self.catalog, quests);

        let entries: HashMap<&str, _> = quests
            .iter()
            .filter(|e| self.catalog.is_tracked_quest(&e.quest_id))
            .map(|e| (e.quest_id.as_str(), e))
            .collect();
        let displays = self
            .catalog
            .required_quests()
            .iter()
            .map(|quest| {
                let display = build_display(
                    &self.catalog,
                    content,
                    &quest.id,
                    entries.get(quest.id.as_str()).copied(),
                    &snapshot.condition_counters,
                );
                (quest.id.clone(), display)
            })
            .collect();

        let trader_loyalty = snapshot
            .traders
            .iter()
            .map(|(id, standing)| (id.clone(), standing.loyalty_level.unwrap_or(0)))
            .collect();

        Ok(ComputedProfile {
            progress: ProfileProgress {
                profile_id: profile_id.to_string(),
                nickname: Some(nickname),
                hideout: facilities,
                trader_loyalty,
                ..Default::default()
            },
            found_required: reconciliation.found_required,
            host_quests,
            displays,
        })
    }

    /// Merge sticky items and pending transitions into a computed record and
    /// publish it. The write lock covers only this merge.
    fn merge_and_swap(&self, profile_id: &str, computed: ComputedProfile) {
        let ComputedProfile {
            mut progress,
            found_required,
            host_quests,
            mut displays,
        } = computed;

        let mut state = self.write_state();
        let slot = state
            .entry(profile_id.to_string())
            .or_insert_with(|| ProfileSlot::new(profile_id, &self.catalog));

        progress.items_collected = slot.published.items_collected.clone();
        merge_collected(&mut progress.items_collected, &self.catalog, &found_required);

        for quest in self.catalog.required_quests() {
            let host = host_quests.get(&quest.id);
            let host_state = host.map(|(_, s)| *s).unwrap_or(QuestState::NotTracked);
            let resolved = match slot.pending.get(&quest.id).copied() {
                Some(pending) if !host_supersedes(pending, host.map(|(status, _)| *status)) => {
                    pending
                }
                Some(_) => {
                    slot.pending.remove(&quest.id);
                    host_state
                }
                None => host_state,
            };
            write_state(
                &mut progress.quest_in_progress,
                &mut progress.quest_completed,
                &quest.id,
                resolved,
            );
            if resolved == QuestState::InProgress {
                if let Some(display) = displays.remove(&quest.id) {
                    progress.display_quests.push(display);
                }
            }
        }

        if *slot.published != progress {
            slot.published = Arc::new(progress);
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, HashMap<String, ProfileSlot>> {
        self.state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, HashMap<String, ProfileSlot>> {
        self.state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl QuestLifecycleHook for ProgressionEngine {
    fn on_quest_accepted(&self, profile_id: &str, quest_id: &str) -> bool {
        self.apply_quest_transition(profile_id, quest_id, QuestEventKind::Accepted)
    }

    fn on_quest_completed(&self, profile_id: &str, quest_id: &str) -> bool {
        self.apply_quest_transition(profile_id, quest_id, QuestEventKind::Completed)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
