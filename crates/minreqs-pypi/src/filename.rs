//! Version extraction from distribution filenames listed by a package index.

use crate::index::normalize_package_name;
use once_cell::sync::Lazy;
use regex::Regex;

const PROJECT: &str = r"[A-Za-z0-9](?:[A-Za-z0-9._-]*[A-Za-z0-9])?";
const PROJECT_NODASH: &str = r"[A-Za-z0-9](?:[A-Za-z0-9._]*[A-Za-z0-9])?";
const VERSION: &str = r"[A-Za-z0-9_.!+-]+?";
const VERSION_NODASH: &str = r"[A-Za-z0-9_.!+]+?";
const ARCHIVE_EXT: &str = r"\.(?:tar|tar\.(?:bz2|gz|lz|lzma|xz|Z)|tbz|tgz|tlz|txz|zip)";
const PLATFORM: &str = r"(?:aix|cygwin|darwin|linux|macosx|solaris|sunos|[wW]in)[-.A-Za-z0-9_]*";
const PYVER: &str = r"py[0-9]+\.[0-9]+";

/// Formats whose grammar separates project and version unambiguously:
/// eggs, RPMs and wheels.
static UNAMBIGUOUS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        format!(
            r"^(?P<project>{PROJECT_NODASH})-(?P<version>{VERSION_NODASH})(?:-{PYVER}(?:-{PLATFORM})?)?\.egg$"
        ),
        format!(r"^(?P<project>{PROJECT})-(?P<version>{VERSION_NODASH})-[^-]+\.[A-Za-z0-9._]+\.rpm$"),
        format!(
            r"^(?P<project>{PROJECT_NODASH})-(?P<version>{VERSION_NODASH})(?:-[0-9][^-]*?)?-.+?-.+?-.+?\.whl$"
        ),
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid regex"))
    .collect()
});

/// Suffixes following the project name in formats where a dash may belong
/// to either the name or the version: bdist_dumb archives, MSI installers,
/// source archives and wininst executables.
static AMBIGUOUS_SUFFIXES: Lazy<Vec<String>> = Lazy::new(|| {
    vec![
        format!(r"-(?P<version>{VERSION})\.{PLATFORM}{ARCHIVE_EXT}$"),
        format!(r"-(?P<version>{VERSION})\.{PLATFORM}(?:-{PYVER})?\.msi$"),
        format!(r"-(?P<version>{VERSION}){ARCHIVE_EXT}$"),
        format!(r"-(?P<version>{VERSION})\.{PLATFORM}(?:-{PYVER})?\.exe$"),
    ]
});

/// Ambiguous suffixes matched right after a known project prefix.
static AFTER_PROJECT: Lazy<Vec<Regex>> = Lazy::new(|| {
    AMBIGUOUS_SUFFIXES
        .iter()
        .map(|suffix| Regex::new(&format!("^{suffix}")).expect("valid regex"))
        .collect()
});

/// Ambiguous suffixes behind a generic project name.
static ANY_PROJECT: Lazy<Vec<Regex>> = Lazy::new(|| {
    AMBIGUOUS_SUFFIXES
        .iter()
        .map(|suffix| Regex::new(&format!("^(?P<project>{PROJECT}){suffix}")).expect("valid regex"))
        .collect()
});

/// Extracts the version from a distribution filename.
///
/// Wheels, eggs and RPMs have an unambiguous grammar. Source archives,
/// dumb binary archives and Windows installers do not
/// (`foo-bar-1.0.tar.gz` could be project `foo` at version `bar-1.0`), so
/// the known `project` name is matched first and the generic patterns are
/// only a fallback.
///
/// # Examples
///
/// ```
/// use minreqs_pypi::filename::version_from_filename;
///
/// assert_eq!(
///     version_from_filename("numpy-1.3.0-cp26-none-win32.whl", "numpy").as_deref(),
///     Some("1.3.0")
/// );
/// assert_eq!(
///     version_from_filename("zope.interface-5.0.tar.gz", "zope-interface").as_deref(),
///     Some("5.0")
/// );
/// assert_eq!(version_from_filename("README.txt", "numpy"), None);
/// ```
pub fn version_from_filename(filename: &str, project: &str) -> Option<String> {
    let filename = filename.trim();

    UNAMBIGUOUS
        .iter()
        .find_map(|re| capture_version(re, filename))
        .or_else(|| version_after_project(filename, project))
        .or_else(|| ANY_PROJECT.iter().find_map(|re| capture_version(re, filename)))
}

fn capture_version(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.name("version"))
        .map(|m| m.as_str().to_string())
}

fn version_after_project(filename: &str, project: &str) -> Option<String> {
    let expected = normalize_package_name(project);

    filename
        .match_indices('-')
        .map(|(i, _)| (&filename[..i], &filename[i..]))
        .filter(|(prefix, _)| !prefix.is_empty() && normalize_package_name(prefix) == expected)
        .find_map(|(_, rest)| AFTER_PROJECT.iter().find_map(|re| capture_version(re, rest)))
}
