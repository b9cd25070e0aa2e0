//! In-memory channel index.
//!
//! Records live in a single arena owned by [`Index`] and are addressed by
//! [`RecordId`]. Pipeline phases never copy or mutate records; they pass
//! around [`RecordSet`] views that can only shrink.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use subchannel_schema::{PackageRecord, RecordError, RecordKey, RepoData, Subdir};

use crate::matchspec::MatchSpec;

/// Errors raised while building an [`Index`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// Two records in the same subdir share a filename.
    #[error("Duplicate record {0}")]
    DuplicateRecord(RecordKey),
}

/// Position of a record in the index arena.
///
/// Ids are assigned in load order, so sorting by id reproduces source order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(usize);

impl RecordId {
    /// Arena position.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Per-subdir metadata carried from the source channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubdirInfo {
    /// `info.base_url` declared by the source repodata, as written.
    pub source_base_url: Option<String>,
    /// `repodata_version` declared by the source repodata.
    pub repodata_version: Option<u32>,
    /// Number of records loaded.
    pub record_count: usize,
}

/// All records of one pipeline run, across every loaded subdir.
#[derive(Debug, Default)]
pub struct Index {
    records: Vec<PackageRecord>,
    by_key: HashMap<RecordKey, RecordId>,
    by_name: HashMap<String, Vec<RecordId>>,
    subdirs: BTreeMap<Subdir, SubdirInfo>,
}

impl Index {
    /// Start building an index.
    pub fn builder() -> IndexBuilder {
        IndexBuilder::default()
    }

    /// Number of records across all subdirs.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no records were loaded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The record stored under `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` came from a different index.
    pub fn get(&self, id: RecordId) -> &PackageRecord {
        &self.records[id.0]
    }

    /// Look a record up by identity.
    pub fn lookup(&self, key: &RecordKey) -> Option<RecordId> {
        self.by_key.get(key).copied()
    }

    /// Every record, in load order.
    pub fn iter(&self) -> impl Iterator<Item = (RecordId, &PackageRecord)> {
        self.records
            .iter()
            .enumerate()
            .map(|(i, record)| (RecordId(i), record))
    }

    /// Ids of every record with this exact package name, in load order.
    pub fn ids_by_name(&self, name: &str) -> &[RecordId] {
        self.by_name.get(name).map_or(&[], Vec::as_slice)
    }

    /// Ids of every record matching `spec`, in load order.
    pub fn find(&self, spec: &MatchSpec) -> Vec<RecordId> {
        match spec.exact_name() {
            Some(name) => self
                .ids_by_name(name)
                .iter()
                .copied()
                .filter(|id| spec.matches(self.get(*id)))
                .collect(),
            None => self
                .iter()
                .filter(|(_, record)| spec.matches(record))
                .map(|(id, _)| id)
                .collect(),
        }
    }

    /// Loaded subdirs and their source metadata, sorted by name.
    pub fn subdirs(&self) -> impl Iterator<Item = (&Subdir, &SubdirInfo)> {
        self.subdirs.iter()
    }

    /// Source metadata of one subdir.
    pub fn subdir_info(&self, subdir: &Subdir) -> Option<&SubdirInfo> {
        self.subdirs.get(subdir)
    }

    /// A set holding every record.
    pub fn all(&self) -> RecordSet<'_> {
        RecordSet {
            index: self,
            ids: (0..self.records.len()).map(RecordId).collect(),
        }
    }

    /// An empty set over this index.
    pub fn none(&self) -> RecordSet<'_> {
        RecordSet {
            index: self,
            ids: BTreeSet::new(),
        }
    }
}

/// Incrementally assembles an [`Index`].
#[derive(Debug, Default)]
pub struct IndexBuilder {
    index: Index,
}

impl IndexBuilder {
    /// Register a subdir without records (e.g. a missing `noarch`).
    pub fn add_subdir(&mut self, subdir: Subdir, info: SubdirInfo) -> &mut Self {
        self.index.subdirs.entry(subdir).or_insert(info);
        self
    }

    /// Add one record.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::DuplicateRecord`] if the subdir already holds a
    /// record with the same filename.
    pub fn push(&mut self, record: PackageRecord) -> Result<RecordId, IndexError> {
        let key = record.key().clone();
        if self.index.by_key.contains_key(&key) {
            return Err(IndexError::DuplicateRecord(key));
        }

        let id = RecordId(self.index.records.len());
        self.index
            .by_name
            .entry(record.name().to_string())
            .or_default()
            .push(id);
        self.index
            .subdirs
            .entry(key.subdir.clone())
            .or_default()
            .record_count += 1;
        self.index.by_key.insert(key, id);
        self.index.records.push(record);
        Ok(id)
    }

    /// Add every entry of a subdir's repodata document.
    ///
    /// Entries that are not valid records are skipped and returned so the
    /// caller can report them.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::DuplicateRecord`] if the subdir was already
    /// loaded with an overlapping filename.
    pub fn add_repodata(
        &mut self,
        subdir: &Subdir,
        repodata: RepoData,
    ) -> Result<Vec<RecordError>, IndexError> {
        let info = SubdirInfo {
            source_base_url: repodata.base_url().map(str::to_string),
            repodata_version: repodata.repodata_version,
            record_count: 0,
        };
        self.add_subdir(subdir.clone(), info);

        let mut skipped = Vec::new();
        for (filename, entry) in repodata.into_entries() {
            match PackageRecord::from_json(subdir.clone(), &filename, entry) {
                Ok(record) => {
                    self.push(record)?;
                }
                Err(err) => {
                    tracing::warn!(%err, "Skipping unreadable record");
                    skipped.push(err);
                }
            }
        }
        Ok(skipped)
    }

    /// Finish building.
    pub fn build(self) -> Index {
        self.index
    }
}

/// A subset of an [`Index`], iterated in load order.
///
/// Only narrowing operations are public; a set derived from another can never
/// hold a record its parent dropped.
#[derive(Debug, Clone)]
pub struct RecordSet<'a> {
    index: &'a Index,
    ids: BTreeSet<RecordId>,
}

impl<'a> RecordSet<'a> {
    /// The index this set draws from.
    pub fn index(&self) -> &'a Index {
        self.index
    }

    /// Number of records in the set.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Whether the set holds `id`.
    pub fn contains(&self, id: RecordId) -> bool {
        self.ids.contains(&id)
    }

    /// Ids in load order.
    pub fn ids(&self) -> impl Iterator<Item = RecordId> + '_ {
        self.ids.iter().copied()
    }

    /// Records in load order.
    pub fn iter(&self) -> impl Iterator<Item = &'a PackageRecord> + '_ {
        let index = self.index;
        self.ids.iter().map(move |id| index.get(*id))
    }

    /// Records of one subdir, in load order.
    pub fn in_subdir<'s>(
        &'s self,
        subdir: &'s Subdir,
    ) -> impl Iterator<Item = &'a PackageRecord> + 's {
        self.iter().filter(move |record| record.subdir() == subdir)
    }

    /// Keep only the records for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&PackageRecord) -> bool) {
        let index = self.index;
        self.ids.retain(|id| keep(index.get(*id)));
    }

    /// Keep only the records also in `other`.
    pub fn intersect(&mut self, other: &RecordSet<'_>) {
        self.ids.retain(|id| other.ids.contains(id));
    }

    /// This set minus every record in `other`.
    pub fn without(mut self, other: &RecordSet<'_>) -> Self {
        self.ids.retain(|id| !other.ids.contains(id));
        self
    }

    pub(crate) fn insert(&mut self, id: RecordId) -> bool {
        self.ids.insert(id)
    }

    pub(crate) fn extend(&mut self, ids: impl IntoIterator<Item = RecordId>) {
        self.ids.extend(ids);
    }
}
