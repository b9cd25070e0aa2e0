//! The `repodata.json` document.
//!
//! Only the parts subchannel reads or writes are modelled; record bodies stay
//! as raw JSON objects so unknown fields survive a round trip.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The `info` block of a subdir's repodata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelInfo {
    /// Where clients fetch package files from (CEP-15).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Subdir this document describes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdir: Option<String>,
}

/// A subdir index document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepoData {
    /// Channel-level metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<ChannelInfo>,

    /// `.tar.bz2` records keyed by filename.
    #[serde(default)]
    pub packages: BTreeMap<String, Value>,

    /// `.conda` records keyed by filename.
    #[serde(default, rename = "packages.conda")]
    pub conda_packages: BTreeMap<String, Value>,

    /// Filenames the channel has withdrawn.
    #[serde(default)]
    pub removed: Vec<String>,

    /// Document schema version; `2` when `info.base_url` is present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repodata_version: Option<u32>,
}

impl RepoData {
    /// Total number of records in both package tables.
    pub fn len(&self) -> usize {
        self.packages.len() + self.conda_packages.len()
    }

    /// Whether the document holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The `base_url` declared by this document, if any.
    pub fn base_url(&self) -> Option<&str> {
        self.info.as_ref().and_then(|info| info.base_url.as_deref())
    }

    /// Consume the document and yield `(filename, entry)` pairs:
    /// `packages` first, then `packages.conda`, each sorted by filename.
    pub fn into_entries(self) -> impl Iterator<Item = (String, Value)> {
        self.packages.into_iter().chain(self.conda_packages)
    }

    /// Insert a record body under the table its filename belongs to.
    pub fn insert(&mut self, filename: &str, body: Value) {
        if filename.ends_with(".conda") {
            self.conda_packages.insert(filename.to_string(), body);
        } else {
            self.packages.insert(filename.to_string(), body);
        }
    }

    /// Canonical encoding: pretty-printed JSON with sorted keys.
    ///
    /// # Errors
    ///
    /// Returns an error only if a record body cannot be serialized, which
    /// cannot happen for values that came from JSON.
    pub fn to_canonical_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
    }

    /// Parse a document from JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a valid repodata document.
    pub fn from_json_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}
