//! Package records as they appear in `repodata.json`.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{RecordKey, Subdir, Version, VersionError};

/// Timestamps above this are milliseconds; below it, seconds (year 9999 in seconds).
const MAX_SECONDS_TIMESTAMP: f64 = 253_402_300_799.0;

/// Errors raised when a repodata entry cannot be read as a record.
#[derive(thiserror::Error, Debug)]
pub enum RecordError {
    /// The entry was not a JSON object or lacked a required field.
    #[error("Malformed record {key}: {source}")]
    Malformed {
        /// Identity of the offending entry.
        key: RecordKey,
        /// Underlying decode error.
        source: serde_json::Error,
    },

    /// The `version` field is not a valid conda version.
    #[error("Record {key} has an invalid version: {source}")]
    InvalidVersion {
        /// Identity of the offending entry.
        key: RecordKey,
        /// Underlying version error.
        source: VersionError,
    },
}

#[derive(Deserialize)]
struct RecordFields {
    name: String,
    version: String,
    #[serde(default)]
    build: String,
    #[serde(default)]
    build_number: u64,
    #[serde(default)]
    depends: Vec<String>,
    #[serde(default)]
    timestamp: Option<f64>,
}

/// One package entry of a subdir's index.
///
/// The fields the engine filters on are parsed up front; the complete JSON
/// object is kept verbatim so the record is re-emitted without losing fields
/// like `sha256`, `size` or `constrains`. Records are immutable once built.
#[derive(Debug, Clone)]
pub struct PackageRecord {
    key: RecordKey,
    name: String,
    version: Version,
    build: String,
    build_number: u64,
    depends: Vec<String>,
    timestamp: Option<DateTime<Utc>>,
    body: Map<String, Value>,
}

impl PackageRecord {
    /// Build a record from a `repodata.json` entry.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::Malformed`] if the entry is not an object with at
    /// least `name` and `version`, and [`RecordError::InvalidVersion`] if the
    /// version cannot be parsed.
    pub fn from_json(subdir: Subdir, filename: &str, entry: Value) -> Result<Self, RecordError> {
        let key = RecordKey::new(subdir, filename);

        let fields = match RecordFields::deserialize(&entry) {
            Ok(fields) => fields,
            Err(source) => return Err(RecordError::Malformed { key, source }),
        };
        let version = match Version::parse(&fields.version) {
            Ok(version) => version,
            Err(source) => return Err(RecordError::InvalidVersion { key, source }),
        };
        let Value::Object(body) = entry else {
            // Serde also accepts a positional array for RecordFields.
            return Err(RecordError::Malformed {
                key,
                source: serde::de::Error::custom("record is not a JSON object"),
            });
        };

        Ok(Self {
            key,
            name: fields.name,
            version,
            build: fields.build,
            build_number: fields.build_number,
            depends: fields.depends,
            timestamp: fields.timestamp.and_then(timestamp_to_datetime),
            body,
        })
    }

    /// Identity of the record (subdir + filename).
    pub fn key(&self) -> &RecordKey {
        &self.key
    }

    /// Subdir the record belongs to.
    pub fn subdir(&self) -> &Subdir {
        &self.key.subdir
    }

    /// Package filename.
    pub fn filename(&self) -> &str {
        &self.key.filename
    }

    /// Package name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parsed version.
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Build string (e.g. `h1234567_0`).
    pub fn build(&self) -> &str {
        &self.build
    }

    /// Build number.
    pub fn build_number(&self) -> u64 {
        self.build_number
    }

    /// Dependency specs, in source order.
    pub fn depends(&self) -> &[String] {
        &self.depends
    }

    /// Upload time, if the source recorded one.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    /// The full JSON object as loaded.
    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }
}

impl std::fmt::Display for PackageRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}-{}", self.name, self.version, self.build)
    }
}

fn timestamp_to_datetime(raw: f64) -> Option<DateTime<Utc>> {
    if !raw.is_finite() {
        return None;
    }
    let millis = if raw > MAX_SECONDS_TIMESTAMP {
        raw
    } else {
        raw * 1000.0
    };
    DateTime::from_timestamp_millis(millis.round() as i64)
}
