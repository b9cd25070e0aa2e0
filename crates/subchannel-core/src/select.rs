//! Selection: which records survive into the output before pruning.
//!
//! Three criteria are unioned:
//! 1. the dependency closure of every record matching a `keep_tree` spec,
//! 2. every record matching a `keep` spec,
//! 3. every record whose timestamp lies inside the `after`/`before` window.

use std::collections::HashMap;

use crate::graph::{self, DependencyResolver, Unresolved, UnresolvedReason};
use crate::index::{Index, RecordSet};
use crate::matchspec::MatchSpec;
use crate::request::FilterRequest;

/// Result of the selection phase.
#[derive(Debug, Clone)]
pub struct Selection<'a> {
    /// Union of all criteria.
    pub kept: RecordSet<'a>,
    /// The trimmed `keep_tree` closure on its own.
    pub tree: RecordSet<'a>,
    /// Dependencies of tree records that the tree cannot satisfy.
    pub unresolved: Vec<Unresolved>,
}

/// Select records from `index` according to `request`.
///
/// With no selection criteria the result is empty.
pub fn select<'a>(index: &'a Index, request: &FilterRequest) -> Selection<'a> {
    let tree = keep_tree(index, request);
    let mut kept = tree.records.clone();

    if !request.keep.is_empty() {
        let count = kept.len();
        kept.extend(request.keep.iter().flat_map(|spec| index.find(spec)));
        tracing::debug!(added = kept.len() - count, "Applied keep specs");
    }

    if request.has_time_window() {
        let count = kept.len();
        kept.extend(
            index
                .iter()
                .filter(|(_, record)| request.in_time_window(record.timestamp()))
                .map(|(id, _)| id),
        );
        tracing::debug!(
            added = kept.len() - count,
            after = ?request.after,
            before = ?request.before,
            "Applied timestamp window"
        );
    }

    tracing::debug!(kept = kept.len(), total = index.len(), "Selection complete");

    Selection {
        kept,
        tree: tree.records,
        unresolved: tree.unresolved,
    }
}

/// Closure of the `keep_tree` roots, minus records re-entering through cycles.
fn keep_tree<'a>(index: &'a Index, request: &FilterRequest) -> graph::Closure<'a> {
    if request.keep_tree.is_empty() {
        return graph::Closure {
            records: index.none(),
            unresolved: Vec::new(),
        };
    }

    let mut roots = index.none();
    roots.extend(request.keep_tree.iter().flat_map(|spec| index.find(spec)));
    let mut closure = graph::close(&roots, index);

    // `python=3.10` -> `pip` -> `python` would otherwise pull in every python.
    let mut specs_by_name: HashMap<&str, Vec<&MatchSpec>> = HashMap::new();
    for spec in request.keep_tree.iter().chain(&request.keep) {
        if let Some(name) = spec.exact_name() {
            specs_by_name.entry(name).or_default().push(spec);
        }
    }
    let before = closure.records.len();
    closure.records.retain(|record| {
        specs_by_name
            .get(record.name())
            .is_none_or(|specs| specs.iter().any(|spec| spec.matches(record)))
    });
    let trimmed = before - closure.records.len();

    if trimmed > 0 {
        tracing::debug!(trimmed, "Trimmed records re-entering the tree");
        let mut resolver = DependencyResolver::new(index);
        let dangling = graph::dangling(
            closure.records.iter(),
            &closure.records,
            &mut resolver,
            UnresolvedReason::Trimmed,
        );
        closure.unresolved.extend(dangling);
    }
    closure
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::tests::record;
    use crate::request::FilterOptions;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use subchannel_schema::{PackageRecord, Subdir};

    fn request(options: FilterOptions) -> FilterRequest {
        FilterRequest::from_options(&FilterOptions {
            subdirs: vec!["linux-64".into()],
            ..options
        })
        .unwrap()
    }

    fn names(set: &RecordSet<'_>) -> Vec<String> {
        set.iter().map(ToString::to_string).collect()
    }

    fn python_index() -> Index {
        let mut builder = Index::builder();
        builder
            .push(record("linux-64", "python", "3.9", &["openssl >=3"]))
            .unwrap();
        builder
            .push(record("linux-64", "python", "3.10", &["openssl >=3", "pip"]))
            .unwrap();
        builder.push(record("linux-64", "openssl", "3.0", &[])).unwrap();
        builder.push(record("noarch", "pip", "24.0", &["python >=3.8"])).unwrap();
        builder.build()
    }

    #[test]
    fn test_no_criteria_selects_nothing() {
        let index = python_index();
        let selection = select(&index, &request(FilterOptions::default()));
        assert!(selection.kept.is_empty());
    }

    #[test]
    fn test_keep_tree_follows_dependencies() {
        let index = python_index();
        let selection = select(
            &index,
            &request(FilterOptions {
                keep_tree: vec!["python=3.10".into()],
                ..FilterOptions::default()
            }),
        );
        // pip -> python >=3.8 re-enters python-3.9, which is trimmed.
        assert_eq!(
            names(&selection.kept),
            vec!["python-3.10-0", "openssl-3.0-0", "pip-24.0-0"]
        );
        assert!(selection.unresolved.is_empty());
    }

    #[test]
    fn test_trim_reports_dangling_dependencies() {
        let mut builder = Index::builder();
        builder.push(record("linux-64", "app", "1", &["helper"])).unwrap();
        builder.push(record("linux-64", "helper", "1", &["libx <2"])).unwrap();
        builder.push(record("linux-64", "libx", "1", &[])).unwrap();
        builder.push(record("linux-64", "libx", "2", &[])).unwrap();
        let index = builder.build();

        let selection = select(
            &index,
            &request(FilterOptions {
                keep_tree: vec!["app".into()],
                keep: vec!["libx 2".into()],
                ..FilterOptions::default()
            }),
        );
        // libx-1 was trimmed from the tree; libx-2 is kept by the plain keep.
        assert_eq!(
            names(&selection.kept),
            vec!["app-1-0", "helper-1-0", "libx-2-0"]
        );
        assert_eq!(selection.unresolved.len(), 1);
        assert_eq!(selection.unresolved[0].spec, "libx <2");
        assert_eq!(selection.unresolved[0].reason, UnresolvedReason::Trimmed);
    }

    #[test]
    fn test_keep_has_no_closure() {
        let index = python_index();
        let selection = select(
            &index,
            &request(FilterOptions {
                keep: vec!["python=3.10".into()],
                ..FilterOptions::default()
            }),
        );
        assert_eq!(names(&selection.kept), vec!["python-3.10-0"]);
    }

    fn stamped(name: &str, ts: Option<i64>) -> PackageRecord {
        let mut body = json!({"name": name, "version": "1.0", "build": "0"});
        if let Some(ts) = ts {
            body["timestamp"] = json!(ts);
        }
        PackageRecord::from_json(Subdir::new("linux-64").unwrap(), &format!("{name}.conda"), body)
            .unwrap()
    }

    #[test]
    fn test_time_window_selection() {
        let ms = |y, m, d| Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap().timestamp_millis();
        let mut builder = Index::builder();
        builder.push(stamped("old", Some(ms(2022, 6, 1)))).unwrap();
        builder.push(stamped("new", Some(ms(2023, 6, 1)))).unwrap();
        builder.push(stamped("unknown", None)).unwrap();
        let index = builder.build();

        let selection = select(
            &index,
            &request(FilterOptions {
                after: Some("2023-01-01".into()),
                ..FilterOptions::default()
            }),
        );
        assert_eq!(names(&selection.kept), vec!["new-1.0-0"]);

        let selection = select(
            &index,
            &request(FilterOptions {
                before: Some("2022".into()),
                ..FilterOptions::default()
            }),
        );
        assert_eq!(names(&selection.kept), vec!["old-1.0-0"]);
    }

    #[test]
    fn test_criteria_are_unioned() {
        let ms = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap().timestamp_millis();
        let mut builder = Index::builder();
        builder.push(stamped("a", None)).unwrap();
        builder.push(stamped("b", Some(ms))).unwrap();
        builder.push(stamped("c", None)).unwrap();
        let index = builder.build();

        let selection = select(
            &index,
            &request(FilterOptions {
                keep: vec!["a".into()],
                after: Some("2023".into()),
                ..FilterOptions::default()
            }),
        );
        assert_eq!(names(&selection.kept), vec!["a-1.0-0", "b-1.0-0"]);
    }
}
