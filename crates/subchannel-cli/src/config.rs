//! Run settings from command-line flags and an optional TOML file.
//!
//! ```toml
//! channel = "../conda-forge"
//! output = "subchannel"
//! served_at = "https://example.org/subchannel"
//!
//! [filters]
//! keep_tree = ["python=3.10"]
//! remove = ["*-debug"]
//! subdirs = ["linux-64", "osx-arm64"]
//! ```
//!
//! Lists from the file and the command line are concatenated; a scalar given
//! on the command line replaces the file's.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use subchannel_core::{FilterOptions, UnresolvedPolicy};
use tokio::fs;

use crate::FilterArgs;

/// Output directory used when neither flag nor file names one.
pub const DEFAULT_OUTPUT: &str = "subchannel";

/// Contents of a `--config` file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Source channel directory, relative to the file.
    pub channel: Option<PathBuf>,
    /// Public URL of the source channel.
    pub source_url: Option<String>,
    /// Output directory, relative to the file.
    pub output: Option<PathBuf>,
    /// Public URL of the subchannel.
    pub served_at: Option<String>,
    /// The `[filters]` table.
    pub filters: FilterOptions,
}

impl ConfigFile {
    /// Load and parse a config file, anchoring relative paths at its directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid config TOML.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let mut config = Self::parse(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        let base = path.parent().unwrap_or(Path::new(""));
        config.channel = config.channel.map(|p| base.join(p));
        config.output = config.output.map(|p| base.join(p));
        Ok(config)
    }

    /// Parse config TOML.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

impl FilterArgs {
    /// The filter flags as raw options.
    pub fn to_options(&self) -> FilterOptions {
        FilterOptions {
            keep_tree: self.keep_tree.clone(),
            keep: self.keep.clone(),
            prune: self.prune.clone(),
            remove: self.remove.clone(),
            after: self.after.clone(),
            before: self.before.clone(),
            subdirs: self.subdirs.clone(),
            base_url: self.base_url.clone(),
            unresolved: if self.strict {
                UnresolvedPolicy::Strict
            } else {
                UnresolvedPolicy::Warn
            },
        }
    }
}

/// Everything one run needs, after merging file and flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub channel: PathBuf,
    pub source_url: Option<String>,
    pub output: PathBuf,
    pub served_at: Option<String>,
    pub filters: FilterOptions,
}

impl Settings {
    /// Merge flags over a config file.
    ///
    /// # Errors
    ///
    /// Returns an error if neither names a source channel.
    pub fn resolve(args: &FilterArgs, file: ConfigFile) -> Result<Self> {
        let channel = args
            .channel
            .clone()
            .or(file.channel)
            .context("No source channel given: pass --channel or set `channel` in the config file")?;

        let mut filters = file.filters;
        filters.merge(args.to_options());

        Ok(Self {
            channel,
            source_url: args.source_url.clone().or(file.source_url),
            output: args
                .output
                .clone()
                .or(file.output)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
            served_at: args.served_at.clone().or(file.served_at),
            filters,
        })
    }
}
