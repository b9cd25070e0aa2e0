//! End-to-end filtering scenarios over a small fixed channel.

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;
use subchannel_core::{
    FilterError, FilterOptions, FilterOutcome, FilterRequest, Index, NullReporter, UnresolvedPolicy,
    run,
};
use subchannel_schema::{RepoData, Subdir};

const SOURCE: &str = "https://conda.example.org/main";

fn millis(y: i32, m: u32, d: u32) -> i64 {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap().timestamp_millis()
}

fn channel() -> Index {
    let linux: RepoData = serde_json::from_value(json!({
        "info": {"subdir": "linux-64"},
        "packages": {
            "openssl-3.0.13-h1_0.tar.bz2": {
                "name": "openssl", "version": "3.0.13", "build": "h1_0", "build_number": 0,
                "depends": ["ca-certificates"], "timestamp": millis(2022, 6, 1),
                "sha256": "aa", "size": 1
            }
        },
        "packages.conda": {
            "python-3.9.18-h2_0.conda": {
                "name": "python", "version": "3.9.18", "build": "h2_0", "build_number": 0,
                "depends": ["openssl >=3.0,<4.0a0"], "timestamp": millis(2022, 6, 1)
            },
            "python-3.10.13-h3_0.conda": {
                "name": "python", "version": "3.10.13", "build": "h3_0", "build_number": 0,
                "depends": ["openssl >=3.0,<4.0a0", "__glibc >=2.17"],
                "timestamp": millis(2023, 6, 1)
            }
        }
    }))
    .unwrap();
    let noarch: RepoData = serde_json::from_value(json!({
        "packages.conda": {
            "ca-certificates-2024.2.2-0.conda": {
                "name": "ca-certificates", "version": "2024.2.2", "build": "0"
            }
        }
    }))
    .unwrap();

    let mut builder = Index::builder();
    builder
        .add_repodata(&Subdir::new("linux-64").unwrap(), linux)
        .unwrap();
    builder.add_repodata(&Subdir::noarch(), noarch).unwrap();
    builder.build()
}

fn filter(options: FilterOptions) -> Result<FilterOutcome, FilterError> {
    let request = FilterRequest::from_options(&FilterOptions {
        subdirs: vec!["linux-64".into()],
        ..options
    })?;
    run(&channel(), &request, SOURCE, &NullReporter)
}

fn kept(outcome: &FilterOutcome) -> Vec<String> {
    let mut names: Vec<String> = outcome
        .subdirs
        .iter()
        .flat_map(|s| {
            s.repodata
                .packages
                .keys()
                .chain(s.repodata.conda_packages.keys())
                .cloned()
        })
        .collect();
    names.sort();
    names
}

#[test]
fn keep_tree_pulls_in_dependencies() {
    let outcome = filter(FilterOptions {
        keep_tree: vec!["python=3.10".into()],
        ..FilterOptions::default()
    })
    .unwrap();
    assert_eq!(
        kept(&outcome),
        vec![
            "ca-certificates-2024.2.2-0.conda",
            "openssl-3.0.13-h1_0.tar.bz2",
            "python-3.10.13-h3_0.conda",
        ]
    );
    assert!(outcome.unresolved.iter().all(|u| u.is_virtual));
}

#[test]
fn prune_drops_siblings_failing_the_constraint() {
    let everything = || FilterOptions {
        keep: vec!["*".into()],
        ..FilterOptions::default()
    };

    let outcome = filter(FilterOptions {
        prune: vec!["python<3.10".into()],
        ..everything()
    })
    .unwrap();
    assert_eq!(
        kept(&outcome),
        vec![
            "ca-certificates-2024.2.2-0.conda",
            "openssl-3.0.13-h1_0.tar.bz2",
            "python-3.9.18-h2_0.conda",
        ]
    );

    let outcome = filter(FilterOptions {
        prune: vec!["python>=3.10".into()],
        ..everything()
    })
    .unwrap();
    assert_eq!(
        kept(&outcome),
        vec![
            "ca-certificates-2024.2.2-0.conda",
            "openssl-3.0.13-h1_0.tar.bz2",
            "python-3.10.13-h3_0.conda",
        ]
    );
}

#[test]
fn after_selects_newer_records_only() {
    let outcome = filter(FilterOptions {
        after: Some("2023-01-01".into()),
        ..FilterOptions::default()
    })
    .unwrap();
    assert_eq!(kept(&outcome), vec!["python-3.10.13-h3_0.conda"]);
}

#[test]
fn no_selection_criteria_empties_every_subdir() {
    let outcome = filter(FilterOptions::default()).unwrap();
    assert!(kept(&outcome).is_empty());
    let subdirs: Vec<&str> = outcome.subdirs.iter().map(|s| s.subdir.as_str()).collect();
    assert_eq!(subdirs, vec!["linux-64", "noarch"]);
}

#[test]
fn output_carries_cep15_metadata() {
    let outcome = filter(FilterOptions {
        keep: vec!["openssl".into()],
        base_url: Some("https://mirror.example/main".into()),
        ..FilterOptions::default()
    })
    .unwrap();
    for out in &outcome.subdirs {
        assert_eq!(out.repodata.repodata_version, Some(2));
        assert_eq!(out.repodata.base_url().unwrap(), "https://mirror.example/main");
    }
    let linux = &outcome.subdirs[0].repodata;
    let record = &linux.packages["openssl-3.0.13-h1_0.tar.bz2"];
    assert_eq!(record["sha256"], "aa");
}

#[test]
fn strict_policy_rejects_broken_trees() {
    let result = filter(FilterOptions {
        keep_tree: vec!["python=3.10".into()],
        remove: vec!["ca-certificates".into()],
        unresolved: UnresolvedPolicy::Strict,
        ..FilterOptions::default()
    });
    assert!(matches!(result, Err(FilterError::UnresolvedDependencies(_))));
}

#[test]
fn invalid_specs_abort_the_run() {
    let result = filter(FilterOptions {
        keep: vec!["python >=".into()],
        ..FilterOptions::default()
    });
    assert!(matches!(result, Err(FilterError::InvalidSpec(_))));
}
