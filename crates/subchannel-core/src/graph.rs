//! Dependency closure.
//!
//! Starting from a set of root records, follow every `depends` entry to every
//! record in the index that satisfies it, across all loaded subdirs. This is a
//! superset of what a solver would install: it keeps every candidate, not one
//! per name.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use subchannel_schema::{PackageRecord, RecordKey};

use crate::index::{Index, RecordId, RecordSet};
use crate::matchspec::MatchSpec;

/// Why a dependency was left out of a closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnresolvedReason {
    /// No loaded record satisfies the dependency.
    NoMatch,
    /// The dependency string could not be parsed.
    Malformed,
    /// Candidates existed but were dropped from the tree by a more specific
    /// keep spec.
    Trimmed,
    /// Candidates existed but were dropped by a prune or remove spec.
    Excluded,
}

impl std::fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::NoMatch => "no matching record",
            Self::Malformed => "malformed dependency",
            Self::Trimmed => "trimmed from tree",
            Self::Excluded => "excluded by prune/remove",
        })
    }
}

/// A dependency the walk could not follow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unresolved {
    /// Record that declared the dependency.
    pub dependent: RecordKey,
    /// The dependency string as declared.
    pub spec: String,
    /// Why it was not followed.
    pub reason: UnresolvedReason,
    /// Whether it names a conda virtual package (`__glibc`, `__osx`, ...),
    /// which never appear in a channel.
    #[serde(rename = "virtual")]
    pub is_virtual: bool,
}

impl Unresolved {
    pub(crate) fn new(dependent: RecordKey, spec: &str, reason: UnresolvedReason) -> Self {
        Self {
            dependent,
            spec: spec.to_string(),
            reason,
            is_virtual: spec.trim_start().starts_with("__"),
        }
    }
}

impl std::fmt::Display for Unresolved {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} requires '{}' ({})", self.dependent, self.spec, self.reason)
    }
}

/// Result of a closure walk.
#[derive(Debug, Clone)]
pub struct Closure<'a> {
    /// Roots plus everything reachable from them.
    pub records: RecordSet<'a>,
    /// Dependencies that matched nothing, in discovery order.
    pub unresolved: Vec<Unresolved>,
}

/// Memoised dependency-spec parsing and lookup.
///
/// The same dependency string (`python >=3.8`, `libzlib >=1.2.13,<2.0a0`)
/// appears on thousands of records; it is parsed and resolved once.
#[derive(Debug)]
pub(crate) struct DependencyResolver<'a> {
    index: &'a Index,
    cache: HashMap<String, Option<Vec<RecordId>>>,
}

impl<'a> DependencyResolver<'a> {
    pub(crate) fn new(index: &'a Index) -> Self {
        Self {
            index,
            cache: HashMap::new(),
        }
    }

    /// Candidates for `spec`, or `None` if it does not parse.
    pub(crate) fn resolve(&mut self, spec: &str) -> Option<&[RecordId]> {
        let index = self.index;
        self.cache
            .entry(spec.to_string())
            .or_insert_with(|| match MatchSpec::parse(spec) {
                Ok(parsed) => Some(index.find(&parsed)),
                Err(err) => {
                    tracing::debug!(%err, "Unparseable dependency");
                    None
                }
            })
            .as_deref()
    }
}

/// Transitive closure of `roots` over declared dependencies.
///
/// Terminates on cyclic graphs: every record is expanded at most once.
pub fn close<'a>(roots: &RecordSet<'a>, index: &'a Index) -> Closure<'a> {
    let mut resolver = DependencyResolver::new(index);
    let mut records = index.none();
    let mut unresolved = Vec::new();
    let mut queue: VecDeque<RecordId> = VecDeque::new();

    for id in roots.ids() {
        if records.insert(id) {
            queue.push_back(id);
        }
    }

    while let Some(id) = queue.pop_front() {
        let record = index.get(id);
        for dep in record.depends() {
            match resolver.resolve(dep) {
                Some([]) => {
                    unresolved.push(Unresolved::new(
                        record.key().clone(),
                        dep,
                        UnresolvedReason::NoMatch,
                    ));
                }
                Some(candidates) => {
                    for candidate in candidates {
                        if records.insert(*candidate) {
                            queue.push_back(*candidate);
                        }
                    }
                }
                None => {
                    unresolved.push(Unresolved::new(
                        record.key().clone(),
                        dep,
                        UnresolvedReason::Malformed,
                    ));
                }
            }
        }
    }

    tracing::debug!(
        roots = roots.len(),
        closure = records.len(),
        unresolved = unresolved.len(),
        "Dependency closure complete"
    );

    Closure {
        records,
        unresolved,
    }
}

/// Dependencies of `records` that matched something in the index but match
/// nothing in `within`, each reported once with `reason`.
pub(crate) fn dangling<'r>(
    records: impl IntoIterator<Item = &'r PackageRecord>,
    within: &RecordSet<'_>,
    resolver: &mut DependencyResolver<'_>,
    reason: UnresolvedReason,
) -> Vec<Unresolved> {
    let mut seen = HashSet::new();
    let mut found = Vec::new();
    for record in records {
        for dep in record.depends() {
            let Some(candidates) = resolver.resolve(dep) else {
                continue;
            };
            if candidates.is_empty() || candidates.iter().any(|id| within.contains(*id)) {
                continue;
            }
            if seen.insert((record.key(), dep.as_str())) {
                found.push(Unresolved::new(record.key().clone(), dep, reason));
            }
        }
    }
    found
}
