use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use notification_store::config::{CliConfig, FileConfig};
use notification_store::{
    ContentObserver, CountObserver, InMemoryNotificationBackend, Notification, NotificationStore,
    PaginationStyle, ReadFilter, RealtimeEvent, RemoteCollaborators, SeenFilter, StoreConfig,
    StorePredicate, UnarchivePolicy,
};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    if path_buf.is_absolute() {
        return Ok(path_buf);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(path_buf))
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ReadArg {
    Read,
    Unread,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SeenArg {
    Seen,
    Unseen,
}

/// Replays a script of store operations against an in-memory backend.
#[derive(Parser, Debug)]
struct CliArgs {
    /// JSON array of notifications served by the backend, newest first.
    #[clap(value_parser = parse_path)]
    pub dataset: PathBuf,

    /// JSON-lines file, one step per line.
    #[clap(value_parser = parse_path)]
    pub script: PathBuf,

    /// Path to TOML config file. Values in it override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    #[clap(long)]
    pub page_size: Option<usize>,

    #[clap(long, value_enum)]
    pub pagination: Option<PaginationStyle>,

    #[clap(long, value_enum)]
    pub unarchive_policy: Option<UnarchivePolicy>,

    /// Restrict the store to read or unread notifications.
    #[clap(long, value_enum)]
    pub read: Option<ReadArg>,

    /// Restrict the store to seen or unseen notifications.
    #[clap(long, value_enum)]
    pub seen: Option<SeenArg>,

    /// Show archived notifications instead of unarchived ones.
    #[clap(long)]
    pub archived: bool,

    #[clap(long)]
    pub category: Vec<String>,

    #[clap(long)]
    pub topic: Vec<String>,
}

impl CliArgs {
    fn predicate(&self) -> StorePredicate {
        StorePredicate::new()
            .with_read(match self.read {
                Some(ReadArg::Read) => ReadFilter::Read,
                Some(ReadArg::Unread) => ReadFilter::Unread,
                None => ReadFilter::Unspecified,
            })
            .with_seen(match self.seen {
                Some(SeenArg::Seen) => SeenFilter::Seen,
                Some(SeenArg::Unseen) => SeenFilter::Unseen,
                None => SeenFilter::Unspecified,
            })
            .with_archived(self.archived)
            .with_categories(self.category.iter().cloned())
            .with_topics(self.topic.iter().cloned())
    }

    fn cli_config(&self) -> CliConfig {
        CliConfig {
            page_size: self.page_size,
            pagination: self.pagination,
            unarchive_policy: self.unarchive_policy,
        }
    }
}

/// One line of a replay script.
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum ReplayStep {
    Refresh,
    FetchNext,
    FetchAllPrevious,
    MarkAsRead { id: String },
    MarkAsUnread { id: String },
    Archive { id: String },
    Unarchive { id: String },
    Delete { id: String },
    MarkAllRead,
    MarkAllSeen,
    /// Adds a notification on the server side only.
    ServerInsert { notification: Notification },
    /// Removes a notification on the server side only.
    ServerRemove { id: String },
    Realtime { event: RealtimeEvent },
}

struct LoggingObserver;

impl ContentObserver for LoggingObserver {
    fn store_reloaded(&self, store: &NotificationStore) {
        info!("[{}] reloaded, {} loaded", store.name(), store.len());
    }

    fn notifications_inserted(&self, store: &NotificationStore, indexes: &[usize]) {
        info!("[{}] inserted at {:?}", store.name(), indexes);
    }

    fn notifications_changed(&self, store: &NotificationStore, indexes: &[usize]) {
        info!("[{}] changed at {:?}", store.name(), indexes);
    }

    fn notifications_deleted(&self, store: &NotificationStore, indexes: &[usize]) {
        info!("[{}] deleted at {:?}", store.name(), indexes);
    }

    fn has_next_page_changed(&self, store: &NotificationStore, has_next_page: bool) {
        info!("[{}] has next page: {}", store.name(), has_next_page);
    }
}

impl CountObserver for LoggingObserver {
    fn total_count_changed(&self, store: &NotificationStore, count: usize) {
        info!("[{}] total: {}", store.name(), count);
    }

    fn unread_count_changed(&self, store: &NotificationStore, count: usize) {
        info!("[{}] unread: {}", store.name(), count);
    }

    fn unseen_count_changed(&self, store: &NotificationStore, count: usize) {
        info!("[{}] unseen: {}", store.name(), count);
    }
}

fn load_dataset(path: &Path) -> Result<Vec<Notification>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read dataset: {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse dataset: {:?}", path))
}

fn load_script(path: &Path) -> Result<Vec<ReplayStep>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read script: {:?}", path))?;
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(number, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("Invalid step on line {} of {:?}", number + 1, path))
        })
        .collect()
}

async fn run_step(
    store: &NotificationStore,
    backend: &InMemoryNotificationBackend,
    step: ReplayStep,
) -> Result<()> {
    match step {
        ReplayStep::Refresh => {
            store.refresh().await?;
        }
        ReplayStep::FetchNext => {
            store.fetch_next().await?;
        }
        ReplayStep::FetchAllPrevious => {
            store.fetch_all_previous().await?;
        }
        ReplayStep::MarkAsRead { id } => {
            store.mark_as_read(&id).await?;
        }
        ReplayStep::MarkAsUnread { id } => {
            store.mark_as_unread(&id).await?;
        }
        ReplayStep::Archive { id } => {
            store.archive(&id).await?;
        }
        ReplayStep::Unarchive { id } => {
            store.unarchive(&id).await?;
        }
        ReplayStep::Delete { id } => store.delete(&id).await?,
        ReplayStep::MarkAllRead => store.mark_all_read().await?,
        ReplayStep::MarkAllSeen => store.mark_all_seen().await?,
        ReplayStep::ServerInsert { notification } => backend.insert_newest(notification),
        ReplayStep::ServerRemove { id } => {
            backend.remove(&id);
        }
        ReplayStep::Realtime { event } => store.apply_realtime_event(&event).await?,
    }
    Ok(())
}

fn print_state(step_number: usize, store: &NotificationStore) {
    let counters = store.counters();
    let ids: Vec<String> = store.notifications().into_iter().map(|n| n.id).collect();
    println!(
        "{:>3} total={} unread={} unseen={} has_next_page={} ids=[{}]",
        step_number,
        counters.total,
        counters.unread,
        counters.unseen,
        store.has_next_page(),
        ids.join(",")
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let config = StoreConfig::resolve(&cli_args.cli_config(), file_config)?;
    info!("Store configuration: {:?}", config);

    let dataset = load_dataset(&cli_args.dataset)?;
    let script = load_script(&cli_args.script)?;
    info!(
        "Replaying {} steps over {} notifications",
        script.len(),
        dataset.len()
    );

    let backend = Arc::new(InMemoryNotificationBackend::new(dataset));
    let predicate = cli_args.predicate();
    let store = NotificationStore::new(
        predicate.to_string(),
        predicate,
        config,
        RemoteCollaborators::from_backend(backend.clone()),
    );

    let observer = Arc::new(LoggingObserver);
    store.add_content_observer(&observer);
    store.add_count_observer(&observer);

    for (index, step) in script.into_iter().enumerate() {
        let description = format!("{:?}", step);
        if let Err(e) = run_step(&store, &backend, step).await {
            warn!("Step {} ({}) failed: {}", index + 1, description, e);
        }
        print_state(index + 1, &store);
    }

    Ok(())
}
