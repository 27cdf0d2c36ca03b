mod file_config;

pub use file_config::FileConfig;

use anyhow::{bail, Result};
use clap::ValueEnum;

/// Default number of notifications requested per page.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Which pagination contract the fetch collaborator speaks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum PaginationStyle {
    /// Opaque after/before cursors.
    #[default]
    Cursor,
    /// 1-based page numbers.
    Offset,
}

/// How `unarchive` affects the counters.
///
/// `ClearOnly` only clears `archived_at`, which can leave `total` short in an
/// unarchived view once an archived notification returns to it. `Reconcile`
/// restores the counters an archive removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum UnarchivePolicy {
    #[default]
    ClearOnly,
    Reconcile,
}

/// CLI arguments that can be used for config resolution.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub page_size: Option<usize>,
    pub pagination: Option<PaginationStyle>,
    pub unarchive_policy: Option<UnarchivePolicy>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub page_size: usize,
    pub pagination: PaginationStyle,
    pub unarchive_policy: UnarchivePolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            pagination: PaginationStyle::default(),
            unarchive_policy: UnarchivePolicy::default(),
        }
    }
}

impl StoreConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let page_size = file
            .page_size
            .or(cli.page_size)
            .unwrap_or(DEFAULT_PAGE_SIZE);
        if page_size == 0 {
            bail!("page_size must be greater than zero");
        }

        let pagination = match file.pagination {
            Some(s) => match parse_pagination_style(&s) {
                Some(style) => style,
                None => bail!("Unknown pagination style: {}", s),
            },
            None => cli.pagination.unwrap_or_default(),
        };

        let unarchive_policy = match file.unarchive_policy {
            Some(s) => match parse_unarchive_policy(&s) {
                Some(policy) => policy,
                None => bail!("Unknown unarchive policy: {}", s),
            },
            None => cli.unarchive_policy.unwrap_or_default(),
        };

        Ok(Self {
            page_size,
            pagination,
            unarchive_policy,
        })
    }
}

/// Parses a pagination style string using clap's ValueEnum trait.
fn parse_pagination_style(s: &str) -> Option<PaginationStyle> {
    PaginationStyle::from_str(s, true).ok()
}

fn parse_unarchive_policy(s: &str) -> Option<UnarchivePolicy> {
    UnarchivePolicy::from_str(s, true).ok()
}
