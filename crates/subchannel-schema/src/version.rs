//! Conda version ordering.
//!
//! A version string is split into an optional epoch (`1!`), the main part and
//! an optional local part (`+local`). The main and local parts are split into
//! components on `.`, `_` and `-`, and every component into runs of digits and
//! letters:
//!
//! - `1.2.3` -> `[[1], [2], [3]]`
//! - `1.0rc1` -> `[[1], [0, "rc", 1]]`
//! - `1.a` -> `[[1], [0, "a"]]` (a component starting with a letter gets an implicit `0`)
//!
//! Elements compare as `dev < other strings < numbers < post`. Missing
//! components and elements are padded with `0`, so `1.0 == 1.0.0` and
//! `1.1a < 1.1`.

use std::cmp::Ordering;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors raised when parsing a version string.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    /// The version string was empty.
    #[error("Empty version string")]
    Empty,

    /// The version contained a character that cannot appear in a conda version.
    #[error("Invalid character '{found}' in version '{version}'")]
    InvalidChar {
        /// The offending version string.
        version: String,
        /// The first invalid character.
        found: char,
    },

    /// The epoch prefix was not a number.
    #[error("Invalid epoch in version '{0}'")]
    InvalidEpoch(String),

    /// A component between separators was empty (`1..2`).
    #[error("Empty version component in '{0}'")]
    EmptyComponent(String),
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Element {
    // Variant order is the sort order.
    Dev,
    Str(String),
    Num(u64),
    Post,
}

impl Element {
    const ZERO: Self = Self::Num(0);

    fn from_str_run(run: &str) -> Self {
        match run {
            "dev" => Self::Dev,
            "post" => Self::Post,
            other => Self::Str(other.to_string()),
        }
    }
}

type Component = Vec<Element>;

/// A parsed conda version with total ordering.
///
/// Equality is defined by ordering, so `Version::parse("1.0") == Version::parse("1.0.0")`.
/// The original string is kept for display and serialization.
#[derive(Debug, Clone)]
pub struct Version {
    source: String,
    epoch: u64,
    main: Vec<Component>,
    local: Vec<Component>,
}

impl Version {
    /// Parse a conda version string.
    ///
    /// # Errors
    ///
    /// Returns a [`VersionError`] if the string is empty, contains characters
    /// outside `[A-Za-z0-9._+!-]`, has a non-numeric epoch or an empty component.
    pub fn parse(s: &str) -> Result<Self, VersionError> {
        let source = s.trim();
        if source.is_empty() {
            return Err(VersionError::Empty);
        }
        if let Some(found) = source
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '+' | '!')))
        {
            return Err(VersionError::InvalidChar {
                version: source.to_string(),
                found,
            });
        }

        let lowered = source.to_ascii_lowercase();
        let (epoch, rest) = match lowered.split_once('!') {
            Some((epoch, rest)) => {
                let epoch = epoch
                    .parse::<u64>()
                    .map_err(|_| VersionError::InvalidEpoch(source.to_string()))?;
                (epoch, rest)
            }
            None => (0, lowered.as_str()),
        };

        let (main, local) = match rest.split_once('+') {
            Some((main, local)) => (main, Some(local)),
            None => (rest, None),
        };

        let main = parse_components(main, source)?;
        let local = match local {
            Some(local) => parse_components(local, source)?,
            None => Vec::new(),
        };

        Ok(Self {
            source: source.to_string(),
            epoch,
            main,
            local,
        })
    }

    /// Return the version string as written in the source.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether `self` begins with every component of `prefix`.
    ///
    /// Used for fuzzy matches: `1.2.3` starts with `1.2`, but `1.20` does not.
    /// Components missing from `self` count as `0`.
    pub fn starts_with(&self, prefix: &Version) -> bool {
        if self.epoch != prefix.epoch {
            return false;
        }
        if !components_start_with(&self.main, &prefix.main) {
            return false;
        }
        prefix.local.is_empty() || components_start_with(&self.local, &prefix.local)
    }
}

fn parse_components(part: &str, source: &str) -> Result<Vec<Component>, VersionError> {
    part.split(['.', '_', '-'])
        .map(|raw| {
            if raw.is_empty() {
                return Err(VersionError::EmptyComponent(source.to_string()));
            }
            Ok(parse_component(raw))
        })
        .collect()
}

fn parse_component(raw: &str) -> Component {
    let mut elements = Vec::new();
    let mut run = String::new();
    let mut run_is_digit = None;

    for c in raw.chars() {
        let is_digit = c.is_ascii_digit();
        if run_is_digit.is_some_and(|d| d != is_digit) {
            elements.push(finish_run(&run, run_is_digit == Some(true)));
            run.clear();
        }
        run.push(c);
        run_is_digit = Some(is_digit);
    }
    if !run.is_empty() {
        elements.push(finish_run(&run, run_is_digit == Some(true)));
    }

    if !matches!(elements.first(), Some(Element::Num(_))) {
        elements.insert(0, Element::ZERO);
    }
    elements
}

fn finish_run(run: &str, digits: bool) -> Element {
    if digits {
        // Absurdly long digit runs still order sensibly as strings.
        run.parse::<u64>()
            .map_or_else(|_| Element::Str(run.to_string()), Element::Num)
    } else {
        Element::from_str_run(run)
    }
}

fn compare_component(a: &[Element], b: &[Element]) -> Ordering {
    let zero = Element::ZERO;
    let len = a.len().max(b.len());
    for i in 0..len {
        let x = a.get(i).unwrap_or(&zero);
        let y = b.get(i).unwrap_or(&zero);
        match x.cmp(y) {
            Ordering::Equal => {}
            other => return other,
        }
    }
    Ordering::Equal
}

fn compare_components(a: &[Component], b: &[Component]) -> Ordering {
    let zero = vec![Element::ZERO];
    let len = a.len().max(b.len());
    for i in 0..len {
        let x = a.get(i).unwrap_or(&zero);
        let y = b.get(i).unwrap_or(&zero);
        match compare_component(x, y) {
            Ordering::Equal => {}
            other => return other,
        }
    }
    Ordering::Equal
}

fn components_start_with(version: &[Component], prefix: &[Component]) -> bool {
    let zero = vec![Element::ZERO];
    prefix.iter().enumerate().all(|(i, p)| {
        let v = version.get(i).unwrap_or(&zero);
        compare_component(v, p) == Ordering::Equal
    })
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| compare_components(&self.main, &other.main))
            .then_with(|| compare_components(&self.local, &other.local))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source)
    }
}

impl std::str::FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Version {
    fn as_ref(&self) -> &str {
        &self.source
    }
}

impl Serialize for Version {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
