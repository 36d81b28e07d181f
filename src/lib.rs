//! # Progression Tracker - derived progression views for game profiles
//!
//! Reads persistent player profiles and static content data and keeps a
//! per-profile view of how far each player is along a designated collector
//! quest, which hand-over items they have already found in raid, and what the
//! next upgrade of each hideout area still needs.
//!
//! ## Features
//!
//! - **Requirement catalog**: prerequisite quests and hand-over items of the aggregate quest, built once at startup.
//! - **Hideout resolver**: next-stage item, trader loyalty and area-level requirements with owned counts and construction timers.
//! - **Quest tracking**: not-started / in-progress / completed per tracked quest, plus a condition breakdown for quests in progress.
//! - **Full passes and incremental updates**: a timed recompute of every profile, and lifecycle hooks that flip quest state immediately.
//! - **Change notification**: any number of independently cancellable subscribers.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use progression_tracker::content::loader::load_content_dir;
//! use progression_tracker::profile::json::JsonProfileDirectory;
//! use progression_tracker::tracker::{start_tracker, DriverConfig, ProgressionEngine};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let content = load_content_dir("data/content")?;
//!     let profiles = JsonProfileDirectory::new("data/profiles");
//!     let engine = ProgressionEngine::builder(Arc::new(content), Arc::new(profiles)).build()?;
//!
//!     let handle = start_tracker(Arc::new(engine), DriverConfig::default());
//!     let mut changes = handle.subscribe();
//!     while changes.changed().await.is_some() {
//!         println!("{} profiles tracked", handle.engine().snapshot().len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`tracker`] - catalog, resolvers, engine and tick driver
//! - [`content`] - static content database and its JSON loader
//! - [`profile`] - profile snapshots and providers
//! - [`config`] - configuration loading and validation
//! - [`metrics`] - per-engine counters
//! - [`errors`] - the library error type
//! - [`validation`] - profile id and file checks

pub mod config;
pub mod content;
pub mod errors;
pub mod metrics;
pub mod profile;
pub mod tracker;
pub mod validation;

pub use errors::TrackerError;
