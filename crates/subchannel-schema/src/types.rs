use serde::{Deserialize, Serialize};

use crate::Subdir;

/// Stable identity of a record: its subdir plus its filename.
///
/// Filenames are unique within a subdir, so this pair identifies one record
/// across the whole channel. Ordering is by subdir, then filename.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordKey {
    /// Subdir the record was loaded from.
    pub subdir: Subdir,
    /// Package filename (e.g. `python-3.10.4-h12345_0.conda`).
    pub filename: String,
}

impl RecordKey {
    /// Create a new key.
    pub fn new(subdir: Subdir, filename: impl Into<String>) -> Self {
        Self {
            subdir,
            filename: filename.into(),
        }
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.subdir, self.filename)
    }
}
