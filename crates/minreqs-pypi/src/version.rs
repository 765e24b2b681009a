//! PEP 440 comparison operators and predicates.
//!
//! Versions themselves are [`pep440_rs::Version`]; this module adds the
//! operator vocabulary used in dependency specifiers and the predicates that
//! decide whether a candidate version satisfies a single clause.

use crate::error::{PypiError, Result};
use pep440_rs::Version;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Version comparison operator of a specifier clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `<=`
    LessThanEqual,
    /// `<`
    LessThan,
    /// `!=`
    NotEqual,
    /// `==`
    Equal,
    /// `>=`
    GreaterThanEqual,
    /// `>`
    GreaterThan,
    /// `~=`
    TildeEqual,
    /// `===`
    ArbitraryEqual,
}

impl Operator {
    /// Looks up an operator by its textual form.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let op = match symbol {
            "<=" => Self::LessThanEqual,
            "<" => Self::LessThan,
            "!=" => Self::NotEqual,
            "==" => Self::Equal,
            ">=" => Self::GreaterThanEqual,
            ">" => Self::GreaterThan,
            "~=" => Self::TildeEqual,
            "===" => Self::ArbitraryEqual,
            _ => return None,
        };
        Some(op)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::LessThanEqual => "<=",
            Self::LessThan => "<",
            Self::NotEqual => "!=",
            Self::Equal => "==",
            Self::GreaterThanEqual => ">=",
            Self::GreaterThan => ">",
            Self::TildeEqual => "~=",
            Self::ArbitraryEqual => "===",
        }
    }

    /// `>=` and `~=` both establish an inclusive floor.
    pub fn is_inclusive_lower_bound(self) -> bool {
        matches!(self, Self::GreaterThanEqual | Self::TildeEqual)
    }

    /// `==` and `===` pin a single version.
    pub fn is_equality(self) -> bool {
        matches!(self, Self::Equal | Self::ArbitraryEqual)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `(operator, version)` clause exactly as written in a specifier.
///
/// The version text is kept verbatim. It is only parsed when the clause is
/// evaluated (see [`CompiledConstraint`]), so a malformed version does not
/// make the whole specifier unparsable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionConstraint {
    pub operator: Operator,
    pub version: String,
}

impl VersionConstraint {
    pub fn new(operator: Operator, version: impl Into<String>) -> Self {
        Self {
            operator,
            version: version.into(),
        }
    }

    /// `==X.*` / `!=X.*` prefix clause.
    pub fn is_wildcard(&self) -> bool {
        self.version.ends_with(".*")
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.operator, self.version)
    }
}

/// Renders a clause list the way it would appear in a specifier.
pub fn display_constraints(constraints: &[VersionConstraint]) -> String {
    constraints
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// A clause whose target has been parsed and is ready to test candidates.
#[derive(Debug, Clone)]
pub struct CompiledConstraint {
    operator: Operator,
    /// Parsed target; absent only for `===`, which compares text.
    target: Option<Version>,
    wildcard: bool,
    literal: String,
}

impl CompiledConstraint {
    /// Parses the clause target.
    ///
    /// Returns `Ok(None)` when the target is not a valid PEP 440 version, or
    /// uses `.*` with an operator other than `==`/`!=`. Such clauses are
    /// skipped by the resolver.
    ///
    /// # Errors
    ///
    /// Returns [`PypiError::InvalidCompatibleRelease`] for `~=` with a
    /// single-segment target.
    pub fn compile(constraint: &VersionConstraint) -> Result<Option<Self>> {
        let literal = constraint.version.trim().to_string();

        if constraint.operator == Operator::ArbitraryEqual {
            return Ok(Some(Self {
                operator: constraint.operator,
                target: None,
                wildcard: false,
                literal,
            }));
        }

        let wildcard = constraint.is_wildcard();
        if wildcard && !matches!(constraint.operator, Operator::Equal | Operator::NotEqual) {
            return Ok(None);
        }

        let target_text = if wildcard {
            &literal[..literal.len() - 2]
        } else {
            literal.as_str()
        };
        let Some(target) = parse_version(target_text) else {
            return Ok(None);
        };

        if constraint.operator == Operator::TildeEqual && target.release().len() < 2 {
            return Err(PypiError::InvalidCompatibleRelease { version: literal });
        }

        Ok(Some(Self {
            operator: constraint.operator,
            target: Some(target),
            wildcard,
            literal,
        }))
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// Parsed target version, `None` for `===`.
    pub fn target(&self) -> Option<&Version> {
        self.target.as_ref()
    }

    /// Target text as written, trimmed.
    pub fn literal(&self) -> &str {
        &self.literal
    }

    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    /// Returns `true` if `candidate` satisfies this clause.
    pub fn contains(&self, candidate: &Version) -> bool {
        let Some(target) = &self.target else {
            return candidate.to_string().eq_ignore_ascii_case(&self.literal);
        };

        let ordering = candidate.cmp(target);
        match self.operator {
            Operator::LessThanEqual => ordering != Ordering::Greater,
            Operator::LessThan => ordering == Ordering::Less,
            Operator::GreaterThanEqual => ordering != Ordering::Less,
            Operator::GreaterThan => ordering == Ordering::Greater,
            Operator::Equal if self.wildcard => release_prefix_matches(candidate, target),
            Operator::Equal => ordering == Ordering::Equal,
            Operator::NotEqual if self.wildcard => !release_prefix_matches(candidate, target),
            Operator::NotEqual => ordering != Ordering::Equal,
            Operator::TildeEqual => compatible_release(candidate, target),
            Operator::ArbitraryEqual => candidate.to_string().eq_ignore_ascii_case(&self.literal),
        }
    }
}

/// Evaluates `candidate ~= target`.
///
/// Epochs must match, the candidate must be at least `target`, and the
/// candidate's release must agree with `target`'s release on every segment
/// but the last. Missing candidate segments read as zero.
///
/// # Errors
///
/// Returns [`PypiError::InvalidCompatibleRelease`] if `target` has fewer
/// than two release segments.
///
/// # Examples
///
/// ```
/// use minreqs_pypi::version::is_compatible_release;
/// use pep440_rs::Version;
/// use std::str::FromStr;
///
/// let v = |s: &str| Version::from_str(s).unwrap();
///
/// assert!(is_compatible_release(&v("1.7.0"), &v("1.7")).unwrap());
/// assert!(is_compatible_release(&v("1.9.3"), &v("1.7")).unwrap());
/// assert!(!is_compatible_release(&v("2.0"), &v("1.7")).unwrap());
/// assert!(!is_compatible_release(&v("1.4.2"), &v("1.4.5")).unwrap());
/// assert!(is_compatible_release(&v("1.0"), &v("1")).is_err());
/// ```
pub fn is_compatible_release(candidate: &Version, target: &Version) -> Result<bool> {
    if target.release().len() < 2 {
        return Err(PypiError::InvalidCompatibleRelease {
            version: target.to_string(),
        });
    }
    Ok(compatible_release(candidate, target))
}

fn compatible_release(candidate: &Version, target: &Version) -> bool {
    if candidate.epoch() != target.epoch() {
        return false;
    }

    let prefix_len = target.release().len().saturating_sub(1);
    let same_prefix = target.release()[..prefix_len]
        .iter()
        .enumerate()
        .all(|(i, segment)| release_segment(candidate, i) == *segment);

    same_prefix && candidate.cmp(target) != Ordering::Less
}

fn release_prefix_matches(candidate: &Version, prefix: &Version) -> bool {
    candidate.epoch() == prefix.epoch()
        && prefix
            .release()
            .iter()
            .enumerate()
            .all(|(i, segment)| release_segment(candidate, i) == *segment)
}

fn release_segment(version: &Version, index: usize) -> u64 {
    version.release().get(index).copied().unwrap_or(0)
}

/// Parses a version string, ignoring surrounding whitespace.
pub fn parse_version(version: &str) -> Option<Version> {
    Version::from_str(version.trim()).ok()
}

/// Turns raw version strings into the available-version pool.
///
/// Unparsable entries are skipped with a warning, prereleases and dev
/// releases are dropped, and duplicates (by PEP 440 equality) are collapsed.
/// The result is sorted newest first.
///
/// # Examples
///
/// ```
/// use minreqs_pypi::version::stable_versions;
///
/// let pool = stable_versions(["1.3", "1.4.1", "1.3.0", "2.0rc1", "bogus!"]);
/// let pool: Vec<String> = pool.iter().map(ToString::to_string).collect();
///
/// assert_eq!(pool, vec!["1.4.1", "1.3"]);
/// ```
pub fn stable_versions<I, S>(versions: I) -> Vec<Version>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut pool = BTreeSet::new();
    for raw in versions {
        let raw = raw.as_ref();
        match parse_version(raw) {
            Some(version) if version.any_prerelease() => {}
            Some(version) => {
                pool.insert(version);
            }
            None => tracing::warn!("skipping unparsable version '{}'", raw),
        }
    }
    pool.into_iter().rev().collect()
}
