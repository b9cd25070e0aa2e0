//! Conda match specifications.
//!
//! Supports:
//! - Name only: `python`, `*`, `lib*`
//! - Whitespace form: `python 3.10.*`, `python >=3.8,<4 *_cpython`
//! - Equals form: `python=3.10` (fuzzy), `python=3.10=h12*` (with build),
//!   `python==3.10.4` (exact)
//! - Operators: `==`, `!=`, `>=`, `<=`, `>`, `<`, `~=`, combined with `,`
//!   (and), `|` (or) and parentheses
//! - Channel prefix: `conda-forge::python`, `conda-forge/noarch::tzdata`
//! - Brackets: `python[version='>=3.8', build='*_cpython', build_number=1]`

use regex::Regex;
use subchannel_schema::{PackageRecord, Subdir, Version};

/// Characters that end a package name in the equals/operator form.
const NAME_TERMINATORS: &[char] = &['=', '<', '>', '!', '~', '('];

/// Characters around which whitespace is insignificant.
const OPERATOR_CHARS: &[char] = &['<', '>', '=', '!', '~', ',', '|', '(', ')'];

/// Why a match spec failed to parse.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SpecErrorKind {
    /// Nothing but whitespace.
    #[error("empty spec")]
    Empty,

    /// The name part is missing or has characters a package name cannot have.
    #[error("invalid package name '{0}'")]
    InvalidName(String),

    /// More positional parts than `name version build`.
    #[error("too many space-separated parts")]
    TooManyParts,

    /// The version expression is malformed.
    #[error("invalid version constraint '{0}'")]
    InvalidVersion(String),

    /// A parenthesis in the version expression is not balanced.
    #[error("unbalanced parentheses in '{0}'")]
    UnbalancedParens(String),

    /// The build glob is not a valid pattern.
    #[error("invalid build pattern '{0}'")]
    InvalidBuild(String),

    /// `build_number` was not a non-negative integer.
    #[error("invalid build_number '{0}'")]
    InvalidBuildNumber(String),

    /// A `channel/subdir::` prefix or `subdir=` option named an invalid subdir.
    #[error("invalid subdir '{0}'")]
    InvalidSubdir(String),

    /// The bracket block is malformed.
    #[error("malformed bracket options '{0}'")]
    MalformedBrackets(String),

    /// A bracket key this tool does not evaluate.
    #[error("unsupported bracket key '{0}'")]
    UnsupportedKey(String),
}

/// A match spec that could not be parsed.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid match spec '{spec}': {kind}")]
pub struct SpecError {
    /// The spec string as given.
    pub spec: String,
    /// What was wrong with it.
    pub kind: SpecErrorKind,
}

impl SpecError {
    fn new(spec: &str, kind: SpecErrorKind) -> Self {
        Self {
            spec: spec.to_string(),
            kind,
        }
    }
}

#[derive(Debug, Clone)]
enum NameMatcher {
    Exact(String),
    Glob(glob::Pattern),
}

impl NameMatcher {
    fn parse(name: &str) -> Result<Self, SpecErrorKind> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '+' | '*'));
        if !valid {
            return Err(SpecErrorKind::InvalidName(name.to_string()));
        }
        if name.contains('*') {
            glob::Pattern::new(name)
                .map(Self::Glob)
                .map_err(|_| SpecErrorKind::InvalidName(name.to_string()))
        } else {
            Ok(Self::Exact(name.to_string()))
        }
    }

    fn matches(&self, name: &str) -> bool {
        match self {
            Self::Exact(expected) => expected == name,
            Self::Glob(pattern) => pattern.matches(name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

/// A parsed version constraint.
#[derive(Debug, Clone)]
enum VersionSpec {
    Any,
    Compare(Operator, Version),
    StartsWith(Version),
    NotStartsWith(Version),
    Compatible { floor: Version, prefix: Version },
    Pattern(Regex),
    All(Vec<VersionSpec>),
    AnyOf(Vec<VersionSpec>),
}

impl VersionSpec {
    fn matches(&self, version: &Version) -> bool {
        match self {
            Self::Any => true,
            Self::Compare(op, bound) => match op {
                Operator::Eq => version == bound,
                Operator::Ne => version != bound,
                Operator::Gt => version > bound,
                Operator::Ge => version >= bound,
                Operator::Lt => version < bound,
                Operator::Le => version <= bound,
            },
            Self::StartsWith(prefix) => version.starts_with(prefix),
            Self::NotStartsWith(prefix) => !version.starts_with(prefix),
            Self::Compatible { floor, prefix } => version >= floor && version.starts_with(prefix),
            Self::Pattern(re) => re.is_match(&version.as_str().to_ascii_lowercase()),
            Self::All(specs) => specs.iter().all(|s| s.matches(version)),
            Self::AnyOf(specs) => specs.iter().any(|s| s.matches(version)),
        }
    }

    fn parse(expr: &str) -> Result<Self, SpecErrorKind> {
        let mut parser = VersionExprParser {
            expr,
            tokens: tokenize(expr),
            pos: 0,
        };
        let spec = parser.parse_or()?;
        if parser.pos != parser.tokens.len() {
            return Err(SpecErrorKind::UnbalancedParens(expr.to_string()));
        }
        Ok(spec)
    }

    fn parse_term(term: &str) -> Result<Self, SpecErrorKind> {
        let invalid = || SpecErrorKind::InvalidVersion(term.to_string());
        let version = |s: &str| Version::parse(s).map_err(|_| invalid());

        if term == "*" {
            return Ok(Self::Any);
        }

        if let Some(rest) = term.strip_prefix("==") {
            return match strip_wildcard(rest) {
                Some(prefix) => Ok(Self::StartsWith(version(prefix)?)),
                None => Ok(Self::Compare(Operator::Eq, version(rest)?)),
            };
        }
        if let Some(rest) = term.strip_prefix("!=") {
            return match strip_wildcard(rest) {
                Some(prefix) => Ok(Self::NotStartsWith(version(prefix)?)),
                None => Ok(Self::Compare(Operator::Ne, version(rest)?)),
            };
        }
        if let Some(rest) = term.strip_prefix("~=") {
            let floor = version(rest)?;
            let (prefix, _) = rest.rsplit_once('.').ok_or_else(invalid)?;
            return Ok(Self::Compatible {
                floor,
                prefix: version(prefix)?,
            });
        }
        for (token, op) in [
            (">=", Operator::Ge),
            ("<=", Operator::Le),
            (">", Operator::Gt),
            ("<", Operator::Lt),
        ] {
            if let Some(rest) = term.strip_prefix(token) {
                // `>=1.2.*` orders like `>=1.2`.
                let bound = strip_wildcard(rest).unwrap_or(rest);
                return Ok(Self::Compare(op, version(bound)?));
            }
        }
        if let Some(rest) = term.strip_prefix('=') {
            let prefix = strip_wildcard(rest).unwrap_or(rest);
            return Ok(Self::StartsWith(version(prefix)?));
        }

        match strip_wildcard(term) {
            Some(prefix) if !prefix.contains('*') => Ok(Self::StartsWith(version(prefix)?)),
            Some(_) => glob_regex(term).map(Self::Pattern).ok_or_else(invalid),
            None if term.contains('*') => glob_regex(term).map(Self::Pattern).ok_or_else(invalid),
            None => Ok(Self::Compare(Operator::Eq, version(term)?)),
        }
    }
}

/// `1.2.*` and `1.2*` -> `1.2`; `None` if the term has no trailing wildcard.
fn strip_wildcard(term: &str) -> Option<&str> {
    term.strip_suffix(".*")
        .or_else(|| term.strip_suffix('*'))
        .filter(|prefix| !prefix.is_empty())
}

fn glob_regex(term: &str) -> Option<Regex> {
    let body = term
        .to_ascii_lowercase()
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    Regex::new(&format!("^{body}$")).ok()
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Open,
    Close,
    Or,
    And,
    Term(String),
}

fn tokenize(expr: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut term = String::new();
    for c in expr.chars() {
        let delimiter = match c {
            '(' => Some(Token::Open),
            ')' => Some(Token::Close),
            '|' => Some(Token::Or),
            ',' => Some(Token::And),
            c if c.is_whitespace() => continue,
            _ => None,
        };
        match delimiter {
            Some(token) => {
                if !term.is_empty() {
                    tokens.push(Token::Term(std::mem::take(&mut term)));
                }
                tokens.push(token);
            }
            None => term.push(c),
        }
    }
    if !term.is_empty() {
        tokens.push(Token::Term(term));
    }
    tokens
}

struct VersionExprParser<'a> {
    expr: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl VersionExprParser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn parse_or(&mut self) -> Result<VersionSpec, SpecErrorKind> {
        let mut alternatives = vec![self.parse_and()?];
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            alternatives.push(self.parse_and()?);
        }
        Ok(if alternatives.len() == 1 {
            alternatives.remove(0)
        } else {
            VersionSpec::AnyOf(alternatives)
        })
    }

    fn parse_and(&mut self) -> Result<VersionSpec, SpecErrorKind> {
        let mut all = vec![self.parse_atom()?];
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            all.push(self.parse_atom()?);
        }
        Ok(if all.len() == 1 {
            all.remove(0)
        } else {
            VersionSpec::All(all)
        })
    }

    fn parse_atom(&mut self) -> Result<VersionSpec, SpecErrorKind> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        match token {
            Some(Token::Term(term)) => VersionSpec::parse_term(&term),
            Some(Token::Open) => {
                let inner = self.parse_or()?;
                if self.peek() != Some(&Token::Close) {
                    return Err(SpecErrorKind::UnbalancedParens(self.expr.to_string()));
                }
                self.pos += 1;
                Ok(inner)
            }
            Some(Token::Close) => Err(SpecErrorKind::UnbalancedParens(self.expr.to_string())),
            _ => Err(SpecErrorKind::InvalidVersion(self.expr.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
enum BuildMatcher {
    Exact(String),
    Glob(glob::Pattern),
}

impl BuildMatcher {
    fn parse(build: &str) -> Result<Self, SpecErrorKind> {
        if build.contains(['*', '?', '[']) {
            glob::Pattern::new(build)
                .map(Self::Glob)
                .map_err(|_| SpecErrorKind::InvalidBuild(build.to_string()))
        } else {
            Ok(Self::Exact(build.to_string()))
        }
    }

    fn matches(&self, build: &str) -> bool {
        match self {
            Self::Exact(expected) => expected == build,
            Self::Glob(pattern) => pattern.matches(build),
        }
    }
}

/// A parsed package match specification.
#[derive(Debug, Clone)]
pub struct MatchSpec {
    source: String,
    name: NameMatcher,
    version: Option<VersionSpec>,
    build: Option<BuildMatcher>,
    build_number: Option<u64>,
    subdir: Option<Subdir>,
}

impl MatchSpec {
    /// Parse a spec string such as `python>=3.10` or `openssl 3.0.* h*`.
    ///
    /// # Errors
    ///
    /// Returns a [`SpecError`] describing the first problem found.
    pub fn parse(spec: &str) -> Result<Self, SpecError> {
        Self::parse_inner(spec).map_err(|kind| SpecError::new(spec, kind))
    }

    fn parse_inner(spec: &str) -> Result<Self, SpecErrorKind> {
        let mut rest = spec.trim();
        if rest.is_empty() {
            return Err(SpecErrorKind::Empty);
        }

        let mut subdir = None;
        if let Some((channel, tail)) = rest.split_once("::") {
            if let Some((_, sub)) = channel.split_once('/') {
                subdir = Some(
                    Subdir::new(sub).map_err(|_| SpecErrorKind::InvalidSubdir(sub.to_string()))?,
                );
            }
            rest = tail.trim();
        }

        let mut options = Vec::new();
        if let Some(open) = rest.find('[') {
            if !rest.ends_with(']') {
                return Err(SpecErrorKind::MalformedBrackets(rest.to_string()));
            }
            options = parse_brackets(&rest[open + 1..rest.len() - 1])?;
            rest = rest[..open].trim_end();
        }

        let normalized = collapse_operator_spacing(rest);
        let parts: Vec<&str> = normalized.split_whitespace().collect();
        let (head, positional) = match parts.split_first() {
            Some((head, positional)) => (*head, positional),
            None => return Err(SpecErrorKind::Empty),
        };

        let name_end = head.find(NAME_TERMINATORS).unwrap_or(head.len());
        let (name, constraint) = head.split_at(name_end);
        let name = NameMatcher::parse(name)?;

        let (mut version_expr, mut build_expr): (Option<String>, Option<String>) =
            if constraint.is_empty() {
                if positional.len() > 2 {
                    return Err(SpecErrorKind::TooManyParts);
                }
                (
                    positional.first().map(|s| (*s).to_string()),
                    positional.get(1).map(|s| (*s).to_string()),
                )
            } else {
                if positional.len() > 1 {
                    return Err(SpecErrorKind::TooManyParts);
                }
                let (version, build) = split_equals_form(constraint);
                let build = build.or_else(|| positional.first().map(|s| (*s).to_string()));
                (Some(version), build)
            };

        let mut build_number = None;
        for (key, value) in options {
            match key.as_str() {
                "version" => version_expr = Some(value),
                "build" => build_expr = Some(value),
                "build_number" => {
                    build_number = Some(
                        value
                            .parse::<u64>()
                            .map_err(|_| SpecErrorKind::InvalidBuildNumber(value.clone()))?,
                    );
                }
                "subdir" => {
                    subdir = Some(
                        Subdir::new(&value).map_err(|_| SpecErrorKind::InvalidSubdir(value))?,
                    );
                }
                // Only one channel is ever loaded.
                "channel" => {}
                _ => return Err(SpecErrorKind::UnsupportedKey(key)),
            }
        }

        let version = version_expr
            .map(|expr| VersionSpec::parse(&collapse_operator_spacing(&expr)))
            .transpose()?
            .filter(|spec| !matches!(spec, VersionSpec::Any));
        let build = build_expr
            .filter(|b| b != "*")
            .map(|b| BuildMatcher::parse(&b))
            .transpose()?;

        Ok(Self {
            source: spec.trim().to_string(),
            name,
            version,
            build,
            build_number,
            subdir,
        })
    }

    /// Whether the record satisfies every part of this spec.
    pub fn matches(&self, record: &PackageRecord) -> bool {
        self.in_scope(record) && self.matches_constraints(record)
    }

    /// Whether the record falls under this spec's name and subdir, whatever
    /// its version or build.
    pub fn in_scope(&self, record: &PackageRecord) -> bool {
        self.matches_name(record.name())
            && self.subdir.as_ref().is_none_or(|s| s == record.subdir())
    }

    /// Whether the record satisfies the version, build and build-number parts,
    /// ignoring the name.
    pub fn matches_constraints(&self, record: &PackageRecord) -> bool {
        self.version
            .as_ref()
            .is_none_or(|v| v.matches(record.version()))
            && self.build.as_ref().is_none_or(|b| b.matches(record.build()))
            && self.build_number.is_none_or(|n| n == record.build_number())
    }

    /// Whether `name` matches the name part of this spec.
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.matches(name)
    }

    /// The package name, when the spec names exactly one package.
    pub fn exact_name(&self) -> Option<&str> {
        match &self.name {
            NameMatcher::Exact(name) => Some(name),
            NameMatcher::Glob(_) => None,
        }
    }

    /// Whether the spec constrains anything beyond the name.
    pub fn has_constraints(&self) -> bool {
        self.version.is_some()
            || self.build.is_some()
            || self.build_number.is_some()
            || self.subdir.is_some()
    }

    /// The spec string as given.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl std::fmt::Display for MatchSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source)
    }
}

impl std::str::FromStr for MatchSpec {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// `>= 3.8 , < 4` -> `>=3.8,<4`; other whitespace is kept as single spaces.
fn collapse_operator_spacing(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for word in s.split_whitespace() {
        let joins = (out.ends_with(OPERATOR_CHARS) && !out.ends_with(')'))
            || word.starts_with(OPERATOR_CHARS);
        if !out.is_empty() && !joins {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// Split the part after the name in `name=1.2=build` / `name==1.2` / `name>=1.2`.
fn split_equals_form(constraint: &str) -> (String, Option<String>) {
    if let Some(rest) = constraint.strip_prefix("==") {
        return match rest.split_once('=') {
            Some((version, build)) => (format!("=={version}"), Some(build.to_string())),
            None => (constraint.to_string(), None),
        };
    }
    if let Some(rest) = constraint.strip_prefix('=') {
        let (version, build) = match rest.split_once('=') {
            Some((version, build)) => (version, Some(build.to_string())),
            None => (rest, None),
        };
        let version = if version.contains([',', '|', '<', '>', '!', '~', '(']) {
            version.to_string()
        } else {
            format!("={version}")
        };
        return (version, build);
    }
    (constraint.to_string(), None)
}

fn parse_brackets(body: &str) -> Result<Vec<(String, String)>, SpecErrorKind> {
    let malformed = || SpecErrorKind::MalformedBrackets(body.to_string());
    let mut options = Vec::new();
    let mut chars = body.chars().peekable();

    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace() || *c == ',') {
            chars.next();
        }
        if chars.peek().is_none() {
            break;
        }

        let key: String = chars
            .by_ref()
            .take_while(|c| *c != '=')
            .collect::<String>()
            .trim()
            .to_string();
        if key.is_empty() {
            return Err(malformed());
        }

        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        let value = match chars.peek().copied() {
            Some(quote @ ('\'' | '"')) => {
                chars.next();
                let value: String = chars.by_ref().take_while(|c| *c != quote).collect();
                value
            }
            Some(_) => chars
                .by_ref()
                .take_while(|c| *c != ',')
                .collect::<String>()
                .trim()
                .to_string(),
            None => return Err(malformed()),
        };
        options.push((key, value));
    }
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(name: &str, version: &str, build: &str) -> PackageRecord {
        record_in("linux-64", name, version, build, 0)
    }

    fn record_in(
        subdir: &str,
        name: &str,
        version: &str,
        build: &str,
        build_number: u64,
    ) -> PackageRecord {
        PackageRecord::from_json(
            Subdir::new(subdir).unwrap(),
            &format!("{name}-{version}-{build}.conda"),
            json!({"name": name, "version": version, "build": build, "build_number": build_number}),
        )
        .unwrap()
    }

    fn spec(s: &str) -> MatchSpec {
        MatchSpec::parse(s).unwrap()
    }

    #[test]
    fn test_name_only() {
        let py = record("python", "3.10.4", "h1_0");
        assert!(spec("python").matches(&py));
        assert!(!spec("pythonx").matches(&py));
        assert!(!spec("Python").matches(&py));
        assert!(spec("*").matches(&py));
        assert!(spec("py*").matches(&py));
        assert_eq!(spec("python").exact_name(), Some("python"));
        assert_eq!(spec("py*").exact_name(), None);
        assert!(!spec("python").has_constraints());
    }

    #[test]
    fn test_fuzzy_equals() {
        let spec = spec("python=3.10");
        assert!(spec.matches(&record("python", "3.10.4", "h1_0")));
        assert!(spec.matches(&record("python", "3.10", "h1_0")));
        assert!(!spec.matches(&record("python", "3.1.0", "h1_0")));
        assert!(!spec.matches(&record("python", "3.9.18", "h1_0")));
    }

    #[test]
    fn test_bare_version_is_exact() {
        let spec = spec("python 3.10");
        assert!(spec.matches(&record("python", "3.10.0", "h1_0")));
        assert!(spec.matches(&record("python", "3.10", "other_1")));
        assert!(!spec.matches(&record("python", "3.10.4", "h1_0")));
    }

    #[test]
    fn test_exact_double_equals() {
        let spec = spec("python==3.10.4");
        assert!(spec.matches(&record("python", "3.10.4", "h1_0")));
        assert!(!spec.matches(&record("python", "3.10.5", "h1_0")));
    }

    #[test]
    fn test_comparison_operators() {
        let old = record("python", "3.9.18", "h1_0");
        let new = record("python", "3.10.4", "h1_0");
        assert!(spec("python<3.10").matches(&old));
        assert!(!spec("python<3.10").matches(&new));
        assert!(spec("python>=3.10").matches(&new));
        assert!(spec("python>3.9.18").matches(&new));
        assert!(!spec("python>3.9.18").matches(&old));
        assert!(spec("python<=3.9.18").matches(&old));
        assert!(spec("python!=3.9.18").matches(&new));
        assert!(!spec("python!=3.9.18").matches(&old));
    }

    #[test]
    fn test_compound_expressions() {
        let dep = spec("openssl >=3.0,<4.0a0");
        assert!(dep.matches(&record("openssl", "3.0.13", "h1_0")));
        assert!(!dep.matches(&record("openssl", "4.0.0", "h1_0")));
        assert!(!dep.matches(&record("openssl", "1.1.1w", "h1_0")));

        let either = spec("python 2.7.*|>=3.8");
        assert!(either.matches(&record("python", "2.7.18", "h1_0")));
        assert!(either.matches(&record("python", "3.11.0", "h1_0")));
        assert!(!either.matches(&record("python", "3.7.0", "h1_0")));

        let grouped = spec("numpy (>=1.20,<1.22)|>=1.24");
        assert!(grouped.matches(&record("numpy", "1.21.0", "h1_0")));
        assert!(!grouped.matches(&record("numpy", "1.23.0", "h1_0")));
        assert!(grouped.matches(&record("numpy", "1.26.0", "h1_0")));
    }

    #[test]
    fn test_spaced_operators() {
        let spec = spec("python >= 3.8 , < 3.11");
        assert!(spec.matches(&record("python", "3.10.4", "h1_0")));
        assert!(!spec.matches(&record("python", "3.11.0", "h1_0")));
    }

    #[test]
    fn test_compatible_release() {
        let spec = spec("pip~=23.1");
        assert!(spec.matches(&record("pip", "23.3", "h1_0")));
        assert!(!spec.matches(&record("pip", "23.0", "h1_0")));
        assert!(!spec.matches(&record("pip", "24.0", "h1_0")));
    }

    #[test]
    fn test_wildcards() {
        assert!(spec("python 3.10.*").matches(&record("python", "3.10.4", "h1_0")));
        assert!(spec("python 3.10*").matches(&record("python", "3.10.4", "h1_0")));
        assert!(!spec("python 3.10.*").matches(&record("python", "3.1.0", "h1_0")));
        assert!(spec("libfoo 1.*.3").matches(&record("libfoo", "1.7.3", "h1_0")));
        assert!(!spec("libfoo 1.*.3").matches(&record("libfoo", "1.7.4", "h1_0")));
        assert!(spec("python *").matches(&record("python", "0.1", "h1_0")));
    }

    #[test]
    fn test_build_constraints() {
        let cp = record("python", "3.10.4", "h12_0_cpython");
        assert!(spec("python 3.10.4 *_cpython").matches(&cp));
        assert!(spec("python=3.10=h12*").matches(&cp));
        assert!(!spec("python=3.10=h13*").matches(&cp));
        assert!(spec("python 3.10.4 h12_0_cpython").matches(&cp));
        assert!(spec("python>=3.10 *_cpython").matches(&cp));
    }

    #[test]
    fn test_bracket_options() {
        let rec = record_in("noarch", "tzdata", "2024a", "h0_1", 1);
        assert!(spec("tzdata[version='>=2023', build_number=1]").matches(&rec));
        assert!(!spec("tzdata[build_number=2]").matches(&rec));
        assert!(spec("tzdata[build=\"h0*\"]").matches(&rec));
        assert!(spec("tzdata[subdir=noarch]").matches(&rec));
        assert!(!spec("tzdata[subdir=linux-64]").matches(&rec));
    }

    #[test]
    fn test_channel_prefix() {
        let rec = record_in("noarch", "tzdata", "2024a", "h0", 0);
        assert!(spec("conda-forge::tzdata").matches(&rec));
        assert!(spec("conda-forge/noarch::tzdata").matches(&rec));
        assert!(!spec("conda-forge/linux-64::tzdata").matches(&rec));
    }

    #[test]
    fn test_in_scope_ignores_constraints() {
        let linux = record_in("linux-64", "python", "3.9", "h0", 0);
        let noarch = record_in("noarch", "python", "3.10", "h0", 0);
        let spec = spec("conda-forge/linux-64::python>=3.10");
        assert!(spec.in_scope(&linux));
        assert!(!spec.matches(&linux));
        assert!(!spec.in_scope(&noarch));
        assert!(!spec.in_scope(&record("openssl", "3.10", "h0")));
    }

    #[test]
    fn test_matches_constraints_ignores_name() {
        let spec = spec("python<3.10");
        assert!(spec.matches_constraints(&record("openssl", "3.0", "h0")));
        assert!(!spec.matches_constraints(&record("openssl", "3.10", "h0")));
    }

    #[test]
    fn test_parse_errors() {
        let kind = |s: &str| MatchSpec::parse(s).unwrap_err().kind;
        assert_eq!(kind(""), SpecErrorKind::Empty);
        assert_eq!(kind("   "), SpecErrorKind::Empty);
        assert!(matches!(kind(">=3.8"), SpecErrorKind::InvalidName(_)));
        assert!(matches!(kind("py$thon"), SpecErrorKind::InvalidName(_)));
        assert_eq!(kind("a 1 b c"), SpecErrorKind::TooManyParts);
        assert!(matches!(kind("python >=3..8"), SpecErrorKind::InvalidVersion(_)));
        assert!(matches!(kind("python >=&"), SpecErrorKind::InvalidVersion(_)));
        assert!(matches!(kind("python (>=3.8"), SpecErrorKind::UnbalancedParens(_)));
        assert!(matches!(kind("python >=3.8)"), SpecErrorKind::UnbalancedParens(_)));
        assert!(matches!(kind("python[build_number=x]"), SpecErrorKind::InvalidBuildNumber(_)));
        assert!(matches!(kind("python[md5=abc]"), SpecErrorKind::UnsupportedKey(_)));
        assert!(matches!(kind("python[version"), SpecErrorKind::MalformedBrackets(_)));
    }

    #[test]
    fn test_error_message_names_spec() {
        let err = MatchSpec::parse("python >=&").unwrap_err();
        assert!(err.to_string().contains("Invalid match spec 'python >=&'"));
    }

    #[test]
    fn test_display_round_trips_source() {
        assert_eq!(spec("  python >=3.8 ").to_string(), "python >=3.8");
    }
}
