//! Filter configuration.
//!
//! [`FilterOptions`] is the raw, string-typed input (CLI flags or a TOML
//! file). [`FilterRequest`] is the validated form the engine runs on: every
//! spec parsed, every time bound resolved, every subdir checked.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use subchannel_schema::Subdir;

use crate::error::FilterError;
use crate::matchspec::MatchSpec;
use crate::time::{Edge, parse_time};

/// What to do with dependencies the closure walk could not follow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnresolvedPolicy {
    /// Report them and publish anyway.
    #[default]
    Warn,
    /// Fail the run if any non-virtual dependency is unresolved.
    Strict,
}

/// Unvalidated filter input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterOptions {
    /// Specs whose matches are kept together with their dependency closure.
    pub keep_tree: Vec<String>,
    /// Specs whose matches are kept as-is.
    pub keep: Vec<String>,
    /// Per-name constraints: records of that name failing the spec are dropped.
    pub prune: Vec<String>,
    /// Specs whose matches are always dropped.
    pub remove: Vec<String>,
    /// Keep records published at or after this time.
    pub after: Option<String>,
    /// Keep records published at or before this time.
    pub before: Option<String>,
    /// Platform subdirs to process; `noarch` is always added.
    pub subdirs: Vec<String>,
    /// Channel-level `base_url` for the output.
    pub base_url: Option<String>,
    /// Unresolved-dependency policy.
    pub unresolved: UnresolvedPolicy,
}

impl FilterOptions {
    /// Append `other`'s lists to ours; `other`'s scalars win when set.
    pub fn merge(&mut self, other: Self) {
        self.keep_tree.extend(other.keep_tree);
        self.keep.extend(other.keep);
        self.prune.extend(other.prune);
        self.remove.extend(other.remove);
        self.subdirs.extend(other.subdirs);
        if other.after.is_some() {
            self.after = other.after;
        }
        if other.before.is_some() {
            self.before = other.before;
        }
        if other.base_url.is_some() {
            self.base_url = other.base_url;
        }
        if other.unresolved == UnresolvedPolicy::Strict {
            self.unresolved = UnresolvedPolicy::Strict;
        }
    }

    /// Whether any filter at all was given.
    pub fn has_filters(&self) -> bool {
        !(self.keep_tree.is_empty()
            && self.keep.is_empty()
            && self.prune.is_empty()
            && self.remove.is_empty()
            && self.after.is_none()
            && self.before.is_none())
    }

    /// Whether any criterion that selects records was given.
    pub fn has_selection_criteria(&self) -> bool {
        !(self.keep_tree.is_empty()
            && self.keep.is_empty()
            && self.after.is_none()
            && self.before.is_none())
    }
}

/// A validated, read-only filter configuration.
#[derive(Debug, Clone)]
pub struct FilterRequest {
    /// Tree roots.
    pub keep_tree: Vec<MatchSpec>,
    /// Plain keeps.
    pub keep: Vec<MatchSpec>,
    /// Prune constraints, applied in order.
    pub prune: Vec<MatchSpec>,
    /// Removals, applied after pruning.
    pub remove: Vec<MatchSpec>,
    /// Inclusive lower time bound.
    pub after: Option<DateTime<Utc>>,
    /// Inclusive upper time bound.
    pub before: Option<DateTime<Utc>>,
    /// Subdirs to process, sorted, always containing `noarch`.
    pub subdirs: Vec<Subdir>,
    /// Output `base_url` override.
    pub base_url: Option<String>,
    /// Unresolved-dependency policy.
    pub unresolved: UnresolvedPolicy,
}

impl FilterRequest {
    /// Validate raw options.
    ///
    /// With no subdirs given, the platform this binary runs on is used.
    ///
    /// # Errors
    ///
    /// Returns the first invalid spec, time bound or subdir found.
    pub fn from_options(options: &FilterOptions) -> Result<Self, FilterError> {
        let parse_all = |specs: &[String]| -> Result<Vec<MatchSpec>, FilterError> {
            specs
                .iter()
                .map(|s| MatchSpec::parse(s).map_err(FilterError::from))
                .collect()
        };

        let after = options
            .after
            .as_deref()
            .map(|t| parse_time(t, Edge::Start))
            .transpose()
            .map_err(|source| FilterError::InvalidTime {
                field: "after",
                source,
            })?;
        let before = options
            .before
            .as_deref()
            .map(|t| parse_time(t, Edge::End))
            .transpose()
            .map_err(|source| FilterError::InvalidTime {
                field: "before",
                source,
            })?;

        let mut subdirs = options
            .subdirs
            .iter()
            .map(|s| Subdir::new(s))
            .collect::<Result<BTreeSet<_>, _>>()?;
        if subdirs.is_empty() {
            subdirs.insert(Subdir::current());
        }
        subdirs.insert(Subdir::noarch());

        let base_url = options
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string);

        Ok(Self {
            keep_tree: parse_all(&options.keep_tree)?,
            keep: parse_all(&options.keep)?,
            prune: parse_all(&options.prune)?,
            remove: parse_all(&options.remove)?,
            after,
            before,
            subdirs: subdirs.into_iter().collect(),
            base_url,
            unresolved: options.unresolved,
        })
    }

    /// Whether any criterion that selects records is configured.
    ///
    /// Without one, selection keeps nothing.
    pub fn has_selection_criteria(&self) -> bool {
        !(self.keep_tree.is_empty()
            && self.keep.is_empty()
            && self.after.is_none()
            && self.before.is_none())
    }

    /// Whether a timestamp window is configured.
    pub fn has_time_window(&self) -> bool {
        self.after.is_some() || self.before.is_some()
    }

    /// Whether `timestamp` falls inside the window. Records without a
    /// timestamp are never inside; an unset window contains nothing.
    pub fn in_time_window(&self, timestamp: Option<DateTime<Utc>>) -> bool {
        if !self.has_time_window() {
            return false;
        }
        timestamp.is_some_and(|ts| {
            self.after.is_none_or(|after| ts >= after)
                && self.before.is_none_or(|before| ts <= before)
        })
    }
}
