//! subchannel - filtered views of conda channels
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_panics_doc)]
//!
//! Reads the repodata of a local conda channel, keeps the records selected by
//! match specs and time bounds, and writes a new channel whose `repodata.json`
//! points back at the source channel's package files through CEP-15 `base_url`.
//!
//! # Output Layout
//!
//! ```text
//! <output>/
//! ├── index.md            # Source, served-at URL and subdir links
//! ├── subchannel.json     # Filters and per-subdir record counts
//! ├── noarch/
//! │   ├── repodata.json
//! │   ├── repodata.json.zst
//! │   ├── repodata.json.bz2
//! │   └── index.md        # Sizes and digests of the files above
//! └── linux-64/
//!     └── ...
//! ```

pub mod cmd;
pub mod config;
pub mod ops;
pub mod ui;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Version string baked in by `build.rs`.
pub const VERSION: &str = env!("SUBCHANNEL_VERSION");

/// `name version`, recorded in the published summary.
pub fn generator() -> String {
    format!("subchannel {VERSION}")
}

#[derive(Debug, Parser)]
#[command(name = "subchannel")]
#[command(author, version = VERSION, about = "Create a filtered, redirecting view of a conda channel")]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Show what would happen without making changes
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub filter: FilterArgs,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// Local directory of the source channel
    #[arg(long, short = 'c', env = "SUBCHANNEL_CHANNEL")]
    pub channel: Option<PathBuf>,

    /// URL clients know the source channel by (defaults to a file:// URL of --channel)
    #[arg(long)]
    pub source_url: Option<String>,

    /// Directory to write the subchannel to
    #[arg(long, short = 'o', env = "SUBCHANNEL_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Platform subdir to include (repeatable; noarch is always included)
    #[arg(long = "subdir", value_name = "SUBDIR")]
    pub subdirs: Vec<String>,

    /// Keep records published on or after this time (YYYY[-MM[-DD[-HH[-MM[-SS]]]]] or ts:<seconds>)
    #[arg(long, value_name = "TIME")]
    pub after: Option<String>,

    /// Keep records published on or before this time
    #[arg(long, value_name = "TIME")]
    pub before: Option<String>,

    /// Keep records matching SPEC and their whole dependency tree
    #[arg(long = "keep-tree", value_name = "SPEC")]
    pub keep_tree: Vec<String>,

    /// Keep records matching SPEC
    #[arg(long, value_name = "SPEC")]
    pub keep: Vec<String>,

    /// Drop records named like SPEC that do not satisfy it
    #[arg(long, value_name = "SPEC")]
    pub prune: Vec<String>,

    /// Drop records matching SPEC
    #[arg(long, value_name = "SPEC")]
    pub remove: Vec<String>,

    /// Where clients fetch package files from ({subdir} is substituted)
    #[arg(long, env = "SUBCHANNEL_BASE_URL")]
    pub base_url: Option<String>,

    /// URL the subchannel itself will be served at, for index.md
    #[arg(long, value_name = "URL")]
    pub served_at: Option<String>,

    /// Fail instead of warning when a kept package's dependency is missing
    #[arg(long)]
    pub strict: bool,

    /// TOML file with filter settings; command-line values are merged on top
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}
