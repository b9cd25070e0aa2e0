//! Channel subdirectories (platform partitions).
//!
//! A conda channel is split into one directory per platform (`linux-64`,
//! `osx-arm64`, ...) plus the platform-independent `noarch`.
//!
//! # Example
//!
//! ```
//! use subchannel_schema::Subdir;
//!
//! let current = Subdir::current();
//! println!("Running on: {}", current);
//! assert!(Subdir::noarch().is_noarch());
//! ```

use serde::{Deserialize, Deserializer, Serialize};

/// A validated subdir identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Subdir(String);

/// Errors raised when parsing a subdir identifier.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SubdirError {
    /// The identifier was empty.
    #[error("Empty subdir name")]
    Empty,

    /// The identifier contained a character outside `[a-z0-9_-]`.
    #[error("Invalid subdir '{0}': expected lowercase letters, digits, '-' or '_'")]
    InvalidChars(String),
}

impl Subdir {
    /// Name of the platform-independent subdir.
    pub const NOARCH: &'static str = "noarch";

    /// Parse and validate a subdir identifier.
    ///
    /// # Errors
    ///
    /// Returns [`SubdirError::Empty`] for an empty string and
    /// [`SubdirError::InvalidChars`] for anything that could not be a directory
    /// name inside a channel.
    pub fn new(name: &str) -> Result<Self, SubdirError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SubdirError::Empty);
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
        {
            return Err(SubdirError::InvalidChars(name.to_string()));
        }
        Ok(Self(name.to_string()))
    }

    /// The `noarch` subdir.
    pub fn noarch() -> Self {
        Self(Self::NOARCH.to_string())
    }

    /// Whether this is the platform-independent subdir.
    pub fn is_noarch(&self) -> bool {
        self.0 == Self::NOARCH
    }

    /// Subdir of the platform this binary was compiled for.
    pub fn current() -> Self {
        let os = match std::env::consts::OS {
            "macos" => "osx",
            "windows" => "win",
            other => other,
        };
        let arch = match std::env::consts::ARCH {
            "x86_64" => "64",
            "x86" => "32",
            "aarch64" if os == "linux" => "aarch64",
            "aarch64" => "arm64",
            "powerpc64" => "ppc64le",
            other => other,
        };
        Self(format!("{os}-{arch}"))
    }

    /// Return the subdir name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Subdir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Subdir {
    type Err = SubdirError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for Subdir {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<std::path::Path> for Subdir {
    fn as_ref(&self) -> &std::path::Path {
        std::path::Path::new(&self.0)
    }
}

impl PartialEq<str> for Subdir {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Subdir {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl<'de> Deserialize<'de> for Subdir {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(&s).map_err(serde::de::Error::custom)
    }
}
