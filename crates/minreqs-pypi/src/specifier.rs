//! PEP 508 dependency specifier scanning.
//!
//! The parser is intentionally small: it locates the package name, the
//! bracketed extras, the version clauses and the boundary of the marker, and
//! leaves the marker text itself untouched. Version text is not validated
//! here; the resolver decides what to do with clauses it cannot parse.

use crate::error::{PypiError, Result};
use crate::resolver::Pin;
use crate::version::{Operator, VersionConstraint, display_constraints};
use once_cell::sync::Lazy;
use pep508_rs::{ExtraName, PackageName};
use regex::Regex;
use std::fmt;
use std::str::FromStr;

/// Operators are listed longest first so `===` wins over `==` and `>=` over `>`.
static CONSTRAINT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(===|~=|==|!=|<=|>=|<|>)\s*([A-Za-z0-9_.*+!-]*)").expect("valid regex")
});

static NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Za-z0-9](?:[A-Za-z0-9._-]*[A-Za-z0-9])?)").expect("valid regex")
});

/// A single parsed dependency declaration.
///
/// # Examples
///
/// ```
/// use minreqs_pypi::Specifier;
/// use minreqs_pypi::version::Operator;
///
/// let spec = Specifier::parse("numpy[extra]>=1.20,<2.0; python_version<'3.12'").unwrap();
///
/// assert_eq!(spec.name(), "numpy");
/// assert_eq!(spec.extras(), ["extra"]);
/// assert_eq!(spec.constraints().len(), 2);
/// assert_eq!(spec.constraints()[0].operator, Operator::GreaterThanEqual);
/// assert_eq!(spec.marker(), Some("; python_version<'3.12'"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specifier {
    raw: String,
    requirement: String,
    name: String,
    package: PackageName,
    extras: Vec<String>,
    constraints: Vec<VersionConstraint>,
    marker: Option<String>,
}

impl Specifier {
    /// Parses one dependency specifier.
    ///
    /// # Errors
    ///
    /// - [`PypiError::NotANameRequirement`] for `name @ url` requirements
    /// - [`PypiError::InvalidSpecifier`] when the text is not a specifier at all
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = |message: &str| PypiError::invalid_specifier(input, message);

        if input.trim().is_empty() {
            return Err(invalid("empty requirement"));
        }

        let name_match = NAME_RE
            .captures(input)
            .and_then(|caps| caps.get(1))
            .ok_or_else(|| invalid("expected a package name"))?;
        let name = name_match.as_str();
        let package = PackageName::from_str(name).map_err(|e| invalid(&e.to_string()))?;

        let mut cursor = name_match.end();
        let mut extras = Vec::new();
        let after_name = &input[cursor..];
        let bracket_offset = after_name.len() - after_name.trim_start().len();
        if after_name.trim_start().starts_with('[') {
            let open = cursor + bracket_offset;
            let close = input[open..]
                .find(']')
                .map(|i| open + i)
                .ok_or_else(|| invalid("unclosed extras bracket"))?;
            extras = parse_extras(&input[open + 1..close]).map_err(|e| invalid(&e))?;
            cursor = close + 1;
        }

        if input[cursor..].trim_start().starts_with('@') {
            return Err(PypiError::NotANameRequirement {
                specifier: input.to_string(),
            });
        }

        let requirement = input[..cursor].trim_start().to_string();

        let (head, marker) = match find_marker_start(&input[cursor..]) {
            Some(offset) => {
                let split = cursor + offset;
                let head = input[..split].trim_end();
                let marker = &input[head.len()..];
                if marker.trim_start()[1..].trim().is_empty() {
                    return Err(invalid("empty environment marker"));
                }
                (head, Some(marker.to_string()))
            }
            None => (input.trim_end(), None),
        };

        // `head` can end before `cursor` only when the marker directly follows the name.
        let clauses = head.get(cursor..).unwrap_or("");
        let constraints = parse_constraints(clauses).map_err(|e| invalid(&e))?;

        Ok(Self {
            raw: input.to_string(),
            requirement,
            name: name.to_string(),
            package,
            extras,
            constraints,
            marker,
        })
    }

    /// The input text, unchanged.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Package name as written.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// PEP 503 normalized package name, used for index lookups and caching.
    pub fn package_name(&self) -> &PackageName {
        &self.package
    }

    pub fn extras(&self) -> &[String] {
        &self.extras
    }

    /// Version clauses in source order.
    pub fn constraints(&self) -> &[VersionConstraint] {
        &self.constraints
    }

    /// Marker suffix verbatim, including the `;` and any whitespace before it.
    pub fn marker(&self) -> Option<&str> {
        self.marker.as_deref()
    }

    /// First `===` clause, if any.
    pub fn arbitrary_equality(&self) -> Option<&VersionConstraint> {
        self.constraints
            .iter()
            .find(|c| c.operator == Operator::ArbitraryEqual)
    }

    /// Serializes the name and extras exactly as written, followed by `pin`
    /// and the original marker suffix.
    pub fn with_pin(&self, pin: &Pin) -> String {
        format!(
            "{}{}{}",
            self.requirement,
            pin,
            self.marker.as_deref().unwrap_or("")
        )
    }
}

impl FromStr for Specifier {
    type Err = PypiError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.requirement,
            display_constraints(&self.constraints),
            self.marker.as_deref().unwrap_or("")
        )
    }
}

fn parse_extras(list: &str) -> std::result::Result<Vec<String>, String> {
    let mut extras = Vec::new();
    for extra in list.split(',').map(str::trim) {
        if extra.is_empty() {
            if list.trim().is_empty() {
                break;
            }
            return Err("empty extra name".to_string());
        }
        ExtraName::from_str(extra).map_err(|e| e.to_string())?;
        extras.push(extra.to_string());
    }
    Ok(extras)
}

/// Byte offset of the first `;` outside of quotes.
fn find_marker_start(text: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in text.char_indices() {
        match (quote, c) {
            (None, '\'' | '"') => quote = Some(c),
            (Some(open), _) if c == open => quote = None,
            (None, ';') => return Some(i),
            _ => {}
        }
    }
    None
}

fn parse_constraints(clauses: &str) -> std::result::Result<Vec<VersionConstraint>, String> {
    let mut text = clauses.trim();
    if let Some(inner) = text.strip_prefix('(') {
        text = inner
            .strip_suffix(')')
            .ok_or_else(|| "unbalanced parenthesis".to_string())?
            .trim();
    }

    let mut constraints = Vec::new();
    let mut last_end = 0;
    for caps in CONSTRAINT_RE.captures_iter(text) {
        let (Some(whole), Some(op), Some(version)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            continue;
        };

        let gap = &text[last_end..whole.start()];
        let separators = gap.chars().filter(|&c| c == ',').count();
        let expected = usize::from(!constraints.is_empty());
        if !gap.chars().all(|c| c == ',' || c.is_whitespace()) || separators != expected {
            return Err(format!("unexpected text '{}'", gap.trim()));
        }

        if version.as_str().is_empty() {
            return Err(format!("missing version after '{}'", op.as_str()));
        }

        let operator = Operator::from_symbol(op.as_str())
            .ok_or_else(|| format!("unknown operator '{}'", op.as_str()))?;
        constraints.push(VersionConstraint::new(operator, version.as_str()));
        last_end = whole.end();
    }

    let rest = text[last_end..].trim();
    if !rest.is_empty() {
        return Err(format!("unexpected text '{}'", rest));
    }

    Ok(constraints)
}
