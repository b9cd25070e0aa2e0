//! Post-selection exclusion: per-name pruning, then blanket removal.

use crate::index::RecordSet;
use crate::matchspec::MatchSpec;
use crate::request::FilterRequest;

/// Apply every prune spec, then every remove spec.
pub fn apply<'a>(kept: RecordSet<'a>, request: &FilterRequest) -> RecordSet<'a> {
    let pruned = prune(kept, &request.prune);
    remove(pruned, &request.remove)
}

/// For each spec in order, drop records sharing the spec's name that do not
/// satisfy it. Records of other names, or outside a subdir the spec names,
/// are untouched.
///
/// A spec with a glob name prunes every name the glob matches.
pub fn prune<'a>(mut set: RecordSet<'a>, specs: &[MatchSpec]) -> RecordSet<'a> {
    for spec in specs {
        let before = set.len();
        set.retain(|record| !spec.in_scope(record) || spec.matches_constraints(record));
        tracing::debug!(spec = %spec, dropped = before - set.len(), "Pruned");
    }
    set
}

/// Drop every record matching any of `specs`.
pub fn remove<'a>(mut set: RecordSet<'a>, specs: &[MatchSpec]) -> RecordSet<'a> {
    for spec in specs {
        let before = set.len();
        set.retain(|record| !spec.matches(record));
        tracing::debug!(spec = %spec, dropped = before - set.len(), "Removed");
    }
    set
}
