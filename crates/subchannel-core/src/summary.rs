//! The channel-level summary artifact (`subchannel.json`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use subchannel_schema::Subdir;

use crate::graph::Unresolved;
use crate::request::FilterOptions;

/// File name of the summary artifact at the channel root.
pub const SUMMARY_FN: &str = "subchannel.json";

/// Record counts for one published subdir.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubdirSummary {
    /// Subdir name.
    pub subdir: Subdir,
    /// `info.base_url` written into the subdir's repodata.
    pub base_url: String,
    /// Records in the source subdir.
    pub records_before: usize,
    /// Records published.
    pub records_after: usize,
}

/// A requested subdir the source channel could not provide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedSubdir {
    /// Subdir name.
    pub subdir: Subdir,
    /// Why it was left out.
    pub reason: String,
}

/// What a run produced and from what.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSummary {
    /// Name and version of the tool that produced the channel.
    pub generator: String,
    /// When the run finished.
    pub generated_at: DateTime<Utc>,
    /// Source channel URL.
    pub source: String,
    /// Filters as given.
    pub filters: FilterOptions,
    /// Per-subdir counts, sorted by subdir.
    pub subdirs: Vec<SubdirSummary>,
    /// Dependencies the output cannot satisfy.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unresolved: Vec<Unresolved>,
    /// Subdirs left out because they failed to load.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<FailedSubdir>,
}

impl ChannelSummary {
    /// Records across all source subdirs.
    pub fn records_before(&self) -> usize {
        self.subdirs.iter().map(|s| s.records_before).sum()
    }

    /// Records across all published subdirs.
    pub fn records_after(&self) -> usize {
        self.subdirs.iter().map(|s| s.records_after).sum()
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
    }
}
