//! One filtering run: select, prune/remove, rewrite.
//!
//! The pipeline is synchronous and pure: it reads an [`Index`] and returns
//! the per-subdir documents to publish. Nothing is written here, so a fatal
//! error leaves no partial output.

use std::collections::HashSet;

use chrono::Utc;
use subchannel_schema::Subdir;

use crate::error::FilterError;
use crate::graph::{self, DependencyResolver, Unresolved, UnresolvedReason};
use crate::index::Index;
use crate::prune;
use crate::reporter::Reporter;
use crate::request::{FilterOptions, FilterRequest, UnresolvedPolicy};
use crate::rewrite::{RewrittenSubdir, rewrite};
use crate::select::select;
use crate::summary::{ChannelSummary, SubdirSummary};

/// Non-fatal findings of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A tree dependency the output cannot satisfy.
    UnresolvedDependency(Unresolved),
    /// A requested subdir ended up with no records.
    EmptySelection(Subdir),
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnresolvedDependency(u) => write!(f, "Unresolved dependency: {u}"),
            Self::EmptySelection(subdir) => write!(f, "No records selected for {subdir}"),
        }
    }
}

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    /// One document per subdir, sorted by subdir, always including `noarch`.
    pub subdirs: Vec<RewrittenSubdir>,
    /// Dependencies of kept tree records that the output cannot satisfy.
    pub unresolved: Vec<Unresolved>,
    /// Everything worth telling the user about.
    pub warnings: Vec<Warning>,
}

impl FilterOutcome {
    /// Records across all source subdirs.
    pub fn records_before(&self) -> usize {
        self.subdirs.iter().map(|s| s.source_count).sum()
    }

    /// Records across all output subdirs.
    pub fn records_after(&self) -> usize {
        self.subdirs.iter().map(RewrittenSubdir::kept_count).sum()
    }

    /// Whether the filters dropped at least one record.
    pub fn filtered_any(&self) -> bool {
        self.records_after() < self.records_before()
    }

    /// Build the summary artifact for this outcome.
    pub fn summary(&self, generator: &str, source: &str, filters: &FilterOptions) -> ChannelSummary {
        ChannelSummary {
            generator: generator.to_string(),
            generated_at: Utc::now(),
            source: source.to_string(),
            filters: filters.clone(),
            subdirs: self
                .subdirs
                .iter()
                .map(|s| SubdirSummary {
                    subdir: s.subdir.clone(),
                    base_url: s.repodata.base_url().unwrap_or_default().to_string(),
                    records_before: s.source_count,
                    records_after: s.kept_count(),
                })
                .collect(),
            unresolved: self.unresolved.clone(),
            failed: Vec::new(),
        }
    }
}

/// Run the whole filter over `index`.
///
/// # Errors
///
/// Returns [`FilterError::UnresolvedDependencies`] under
/// [`UnresolvedPolicy::Strict`] if any non-virtual dependency of the kept
/// tree cannot be satisfied by the output.
pub fn run(
    index: &Index,
    request: &FilterRequest,
    source_url: &str,
    reporter: &dyn Reporter,
) -> Result<FilterOutcome, FilterError> {
    reporter.section("Filtering");
    if !request.has_selection_criteria() {
        tracing::debug!("No selection criteria; nothing will be kept");
    }

    let selection = select(index, request);
    let kept = prune::apply(selection.kept, request);

    let mut unresolved = selection.unresolved;
    if !request.prune.is_empty() || !request.remove.is_empty() {
        let mut tree = selection.tree;
        tree.intersect(&kept);
        let mut resolver = DependencyResolver::new(index);
        let reported: HashSet<(_, _)> = unresolved
            .iter()
            .map(|u| (u.dependent.clone(), u.spec.clone()))
            .collect();
        let excluded =
            graph::dangling(tree.iter(), &kept, &mut resolver, UnresolvedReason::Excluded);
        unresolved.extend(
            excluded
                .into_iter()
                .filter(|u| !reported.contains(&(u.dependent.clone(), u.spec.clone()))),
        );
    }

    if request.unresolved == UnresolvedPolicy::Strict {
        let fatal: Vec<Unresolved> = unresolved.iter().filter(|u| !u.is_virtual).cloned().collect();
        if !fatal.is_empty() {
            return Err(FilterError::UnresolvedDependencies(fatal));
        }
    }

    let subdirs = rewrite(&kept, source_url, request.base_url.as_deref());

    let mut warnings: Vec<Warning> = unresolved
        .iter()
        .cloned()
        .map(Warning::UnresolvedDependency)
        .collect();
    for out in &subdirs {
        reporter.filtered(&out.subdir, out.source_count, out.kept_count());
        let requested = request.subdirs.contains(&out.subdir);
        let noise = out.subdir.is_noarch() && out.source_count == 0;
        if requested && out.kept_count() == 0 && !noise {
            warnings.push(Warning::EmptySelection(out.subdir.clone()));
        }
    }

    for warning in &warnings {
        tracing::warn!(%warning);
        reporter.warning(&warning.to_string());
    }

    tracing::debug!(kept = kept.len(), total = index.len(), "Pipeline complete");

    Ok(FilterOutcome {
        subdirs,
        unresolved,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::tests::record;
    use crate::reporter::NullReporter;

    fn index() -> Index {
        let mut builder = Index::builder();
        builder
            .push(record("linux-64", "python", "3.10", &["openssl >=3", "__glibc >=2.17"]))
            .unwrap();
        builder.push(record("linux-64", "openssl", "3.0", &[])).unwrap();
        builder.push(record("linux-64", "zlib", "1.2", &[])).unwrap();
        builder.build()
    }

    fn request(options: FilterOptions) -> FilterRequest {
        FilterRequest::from_options(&FilterOptions {
            subdirs: vec!["linux-64".into()],
            ..options
        })
        .unwrap()
    }

    #[test]
    fn test_run_produces_documents_and_counts() {
        let index = index();
        let outcome = run(
            &index,
            &request(FilterOptions {
                keep_tree: vec!["python".into()],
                ..FilterOptions::default()
            }),
            "https://host/ch",
            &NullReporter,
        )
        .unwrap();

        assert_eq!(outcome.records_before(), 3);
        assert_eq!(outcome.records_after(), 2);
        assert!(outcome.filtered_any());
        assert_eq!(outcome.subdirs.len(), 2);
        // Virtual packages are reported but never fatal.
        assert_eq!(outcome.unresolved.len(), 1);
        assert!(outcome.unresolved[0].is_virtual);
    }

    #[test]
    fn test_strict_fails_on_excluded_dependency() {
        let index = index();
        let options = FilterOptions {
            keep_tree: vec!["python".into()],
            remove: vec!["openssl".into()],
            unresolved: UnresolvedPolicy::Strict,
            ..FilterOptions::default()
        };
        match run(&index, &request(options), "https://host/ch", &NullReporter) {
            Err(FilterError::UnresolvedDependencies(list)) => {
                assert_eq!(list.len(), 1);
                assert_eq!(list[0].spec, "openssl >=3");
                assert_eq!(list[0].reason, UnresolvedReason::Excluded);
            }
            other => panic!("expected strict failure, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_selection_warns() {
        let index = index();
        let outcome = run(
            &index,
            &request(FilterOptions::default()),
            "https://host/ch",
            &NullReporter,
        )
        .unwrap();
        assert_eq!(outcome.records_after(), 0);
        assert_eq!(
            outcome.warnings,
            vec![Warning::EmptySelection(Subdir::new("linux-64").unwrap())]
        );
    }

    #[test]
    fn test_summary_mirrors_outcome() {
        let index = index();
        let options = FilterOptions {
            keep: vec!["zlib".into()],
            ..FilterOptions::default()
        };
        let outcome = run(&index, &request(options.clone()), "https://host/ch", &NullReporter).unwrap();
        let summary = outcome.summary("subchannel test", "https://host/ch", &options);
        assert_eq!(summary.records_before(), 3);
        assert_eq!(summary.records_after(), 1);
        assert_eq!(summary.subdirs[0].base_url, "https://host/ch/linux-64/");
    }
}
