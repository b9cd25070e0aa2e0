//! Property-based tests for the filtering engine.
//!
//! These tests verify that:
//! - Filtering never adds records
//! - Every dependency of a kept tree record is kept or reported
//! - Pruning twice is the same as pruning once
//! - The order of remove specs does not matter
//! - All encodings decode to the same document

use std::collections::BTreeMap;

use proptest::prelude::*;
use serde_json::json;
use subchannel_core::encode::{decode, encode};
use subchannel_core::prune::{prune, remove};
use subchannel_core::select::select;
use subchannel_core::{
    FilterOptions, FilterRequest, Index, MatchSpec, NullReporter, RecordId, run,
};
use subchannel_schema::{PackageRecord, RepoData, Subdir};

const NAMES: &[&str] = &["python", "openssl", "zlib", "pip", "tzdata"];

#[derive(Debug, Clone)]
struct RecordSeed {
    subdir: &'static str,
    name: &'static str,
    version: u8,
    depends: Vec<(usize, Option<u8>)>,
}

fn arb_record() -> impl Strategy<Value = RecordSeed> {
    (
        prop::sample::select(vec!["linux-64", "noarch"]),
        prop::sample::select(NAMES.to_vec()),
        1u8..5,
        prop::collection::vec((0..NAMES.len(), prop::option::of(1u8..5)), 0..3),
    )
        .prop_map(|(subdir, name, version, depends)| RecordSeed {
            subdir,
            name,
            version,
            depends,
        })
}

/// Strategy to generate an index of up to 20 distinct records.
fn arb_index() -> impl Strategy<Value = Vec<RecordSeed>> {
    prop::collection::vec(arb_record(), 0..20).prop_map(|seeds| {
        let mut unique = BTreeMap::new();
        for seed in seeds {
            unique.entry((seed.subdir, seed.name, seed.version)).or_insert(seed);
        }
        unique.into_values().collect()
    })
}

fn arb_spec() -> impl Strategy<Value = String> {
    (
        prop::sample::select(NAMES.to_vec()),
        prop::option::of((prop::sample::select(vec![">=", "<", "=", "!="]), 1u8..5)),
    )
        .prop_map(|(name, constraint)| match constraint {
            Some((op, v)) => format!("{name}{op}{v}"),
            None => name.to_string(),
        })
}

fn build_index(seeds: &[RecordSeed]) -> Index {
    let mut builder = Index::builder();
    for seed in seeds {
        let depends: Vec<String> = seed
            .depends
            .iter()
            .map(|(dep, min)| match min {
                Some(v) => format!("{} >={v}", NAMES[*dep]),
                None => NAMES[*dep].to_string(),
            })
            .collect();
        let record = PackageRecord::from_json(
            Subdir::new(seed.subdir).unwrap(),
            &format!("{}-{}-0.conda", seed.name, seed.version),
            json!({
                "name": seed.name,
                "version": seed.version.to_string(),
                "build": "0",
                "depends": depends,
            }),
        )
        .unwrap();
        builder.push(record).unwrap();
    }
    builder.build()
}

fn parse(specs: &[String]) -> Vec<MatchSpec> {
    specs.iter().map(|s| MatchSpec::parse(s).unwrap()).collect()
}

fn request(options: FilterOptions) -> FilterRequest {
    FilterRequest::from_options(&FilterOptions {
        subdirs: vec!["linux-64".into()],
        ..options
    })
    .unwrap()
}

proptest! {
    /// Every published record exists in the source index.
    #[test]
    fn output_is_subset_of_input(
        seeds in arb_index(),
        keep_tree in prop::collection::vec(arb_spec(), 0..3),
        keep in prop::collection::vec(arb_spec(), 0..3),
        prune_specs in prop::collection::vec(arb_spec(), 0..2),
        remove_specs in prop::collection::vec(arb_spec(), 0..2),
    ) {
        let index = build_index(&seeds);
        let req = request(FilterOptions {
            keep_tree,
            keep,
            prune: prune_specs,
            remove: remove_specs,
            ..FilterOptions::default()
        });
        let outcome = run(&index, &req, "https://host/ch", &NullReporter).unwrap();

        prop_assert!(outcome.records_after() <= index.len());
        for out in &outcome.subdirs {
            for filename in out.repodata.packages.keys().chain(out.repodata.conda_packages.keys()) {
                let key = subchannel_schema::RecordKey::new(out.subdir.clone(), filename.clone());
                prop_assert!(index.lookup(&key).is_some(), "{key} not in source");
            }
        }
    }

    /// Each dependency of a tree record matches a kept record or is reported.
    #[test]
    fn tree_closure_is_complete(
        seeds in arb_index(),
        keep_tree in prop::collection::vec(arb_spec(), 1..3),
        keep in prop::collection::vec(arb_spec(), 0..2),
    ) {
        let index = build_index(&seeds);
        let req = request(FilterOptions { keep_tree, keep, ..FilterOptions::default() });
        let selection = select(&index, &req);

        for record in selection.tree.iter() {
            for dep in record.depends() {
                let spec = MatchSpec::parse(dep).unwrap();
                let satisfied = selection.kept.iter().any(|r| spec.matches(r));
                let reported = selection
                    .unresolved
                    .iter()
                    .any(|u| &u.dependent == record.key() && &u.spec == dep);
                prop_assert!(satisfied || reported, "{record} -> {dep}");
            }
        }
    }

    /// Pruning an already pruned set changes nothing.
    #[test]
    fn prune_is_idempotent(
        seeds in arb_index(),
        specs in prop::collection::vec(arb_spec(), 1..3),
    ) {
        let index = build_index(&seeds);
        let specs = parse(&specs);
        let once = prune(index.all(), &specs);
        let twice = prune(once.clone(), &specs);
        let a: Vec<RecordId> = once.ids().collect();
        let b: Vec<RecordId> = twice.ids().collect();
        prop_assert_eq!(a, b);
    }

    /// Remove specs commute.
    #[test]
    fn remove_order_is_irrelevant(
        seeds in arb_index(),
        specs in prop::collection::vec(arb_spec(), 1..4),
    ) {
        let index = build_index(&seeds);
        let forward = parse(&specs);
        let mut backward = forward.clone();
        backward.reverse();

        let a: Vec<RecordId> = remove(index.all(), &forward).ids().collect();
        let b: Vec<RecordId> = remove(index.all(), &backward).ids().collect();
        prop_assert_eq!(a, b);
    }

    /// JSON, zstd and bzip2 all decode to the same document.
    #[test]
    fn encodings_round_trip(seeds in arb_index()) {
        let mut repodata = RepoData::default();
        for seed in &seeds {
            repodata.insert(
                &format!("{}-{}-0.tar.bz2", seed.name, seed.version),
                json!({"name": seed.name, "version": seed.version.to_string()}),
            );
        }
        let encoded = encode(&repodata).unwrap();
        for (_, bytes) in encoded.iter() {
            prop_assert_eq!(&decode(bytes).unwrap(), &repodata);
        }
    }
}
