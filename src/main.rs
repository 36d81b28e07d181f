//! Binary entrypoint for the progtrack CLI.
//!
//! Commands:
//! - `init` - write a starter `config.toml` and create the data directories
//! - `run` - keep progression up to date until Ctrl-C
//! - `report [--profile <id>]` - run one pass and print derived state as JSON
//! - `catalog` - print the tracked quests and hand-over items
//!
//! See the library crate docs for module-level details: `progression_tracker::`.
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::collections::BTreeMap;
use std::sync::Arc;

use progression_tracker::config::Config;
use progression_tracker::content::loader::load_content_dir;
use progression_tracker::profile::json::JsonProfileDirectory;
use progression_tracker::tracker::{
    start_tracker, DriverConfig, PassOutcome, ProfileProgress, ProgressionEngine,
};

#[derive(Parser)]
#[command(name = "progtrack")]
#[command(about = "Collector quest and hideout progression tracker")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init,
    /// Track progression until interrupted
    Run,
    /// Run one full pass and print the derived state
    Report {
        /// Only print this profile
        #[arg(short, long)]
        profile: Option<String>,
    },
    /// Print the requirement catalog
    Catalog,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Init writes the config, so there is nothing to load yet
    let pre_config = match cli.command {
        Commands::Init => None,
        _ => Some(Config::load(&cli.config).await?),
    };
    init_logging(&pre_config, cli.verbose);

    match cli.command {
        Commands::Init => {
            info!("Initializing new progtrack configuration");
            Config::create_default(&cli.config).await?;
            let cfg = Config::default();
            tokio::fs::create_dir_all(&cfg.content.data_dir)
                .await
                .with_context(|| format!("creating {}", cfg.content.data_dir))?;
            tokio::fs::create_dir_all(&cfg.profiles.dir)
                .await
                .with_context(|| format!("creating {}", cfg.profiles.dir))?;
            info!("Configuration file created at {}", cli.config);
        }
        Commands::Run => {
            let config = pre_config.ok_or_else(|| anyhow!("configuration not loaded"))?;
            info!("Starting progtrack v{}", env!("CARGO_PKG_VERSION"));
            let engine = Arc::new(build_engine(&config)?);
            let handle = start_tracker(
                engine,
                DriverConfig {
                    tick_interval: config.tracker.tick_interval(),
                },
            );
            let mut changes = handle.subscribe();
            loop {
                tokio::select! {
                    changed = changes.changed() => {
                        if changed.is_none() {
                            warn!("Change notifier closed, stopping");
                            break;
                        }
                        let engine = handle.engine();
                        let snapshot = engine.snapshot();
                        let ready = snapshot
                            .values()
                            .filter(|progress| progress.is_aggregate_ready(engine.catalog()))
                            .count();
                        let quests_done: usize =
                            snapshot.values().map(|progress| progress.completed_quest_count()).sum();
                        info!(
                            "Progression changed: {} profiles tracked, {} tracked quests completed, {} ready to hand in",
                            snapshot.len(),
                            quests_done,
                            ready
                        );
                    }
                    _ = tokio::signal::ctrl_c() => {
                        info!("Interrupt received");
                        break;
                    }
                }
            }
            handle.shutdown().await;
            let metrics = handle.engine().metrics();
            info!(
                "Stopped after {} passes ({} rejected), {} quest updates applied",
                metrics.passes_completed, metrics.passes_rejected, metrics.incremental_applied
            );
        }
        Commands::Report { profile } => {
            let config = pre_config.ok_or_else(|| anyhow!("configuration not loaded"))?;
            let engine = build_engine(&config)?;
            if let PassOutcome::AlreadyRunning = engine.recompute() {
                return Err(anyhow!("a progression pass is already running"));
            }
            let output = match profile {
                Some(id) => {
                    let progress = engine
                        .progress(&id)
                        .ok_or_else(|| anyhow!("profile {} was not processed", id))?;
                    serde_json::to_string_pretty(progress.as_ref())?
                }
                None => {
                    let snapshot = engine.snapshot();
                    let all: BTreeMap<&str, &ProfileProgress> = snapshot
                        .iter()
                        .map(|(id, progress)| (id.as_str(), progress.as_ref()))
                        .collect();
                    serde_json::to_string_pretty(&all)?
                }
            };
            println!("{}", output);
        }
        Commands::Catalog => {
            let config = pre_config.ok_or_else(|| anyhow!("configuration not loaded"))?;
            let engine = build_engine(&config)?;
            let catalog = engine.catalog();
            println!("{}", serde_json::to_string_pretty(catalog)?);
            info!(
                "{} tracked quests, {} hand-over items, {} cached hideout item names",
                catalog.required_quests().len(),
                catalog.required_items().len(),
                catalog.item_name_cache_len()
            );
        }
    }

    Ok(())
}

fn build_engine(config: &Config) -> Result<ProgressionEngine> {
    let content = load_content_dir(&config.content.data_dir)
        .with_context(|| format!("loading content from {}", config.content.data_dir))?;
    let profiles = JsonProfileDirectory::new(&config.profiles.dir)
        .with_max_bytes(config.profiles.max_profile_bytes);
    let engine = ProgressionEngine::builder(Arc::new(content), Arc::new(profiles))
        .aggregate_quest_id(config.tracker.aggregate_quest_id.clone())
        .update_threshold(config.tracker.update_interval())
        .log_updates(config.tracker.log_updates)
        .build()?;
    Ok(engine)
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let base_level = match (verbosity, config) {
        (0, Some(cfg)) => cfg.logging.level_filter(),
        (0, None) => log::LevelFilter::Info,
        (1, _) => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .as_ref()
        .and_then(|cfg| cfg.logging.file.as_ref())
        .and_then(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        });

    if let Some(f) = log_file {
        let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
        // Mirror to the console only when attached to a terminal
        let is_tty = atty::is(atty::Stream::Stdout);
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());
            if let Ok(mut guard) = write_mutex.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
        });
    }
    let _ = builder.try_init();
}
