//! Package index client.
//!
//! Lists published versions through the PEP 691 JSON simple API, falling
//! back to the PEP 503 HTML page when the index does not speak JSON. Every
//! failure degrades to an empty version list in the [`VersionProvider`]
//! implementation.

use crate::error::{PypiError, Result};
use crate::filename::version_from_filename;
use crate::version::stable_versions;
use async_trait::async_trait;
use minreqs_core::VersionProvider;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Deserialize;
use std::time::Duration;

/// Default simple API root.
pub const DEFAULT_INDEX_URL: &str = "https://pypi.org/simple";

const SIMPLE_JSON_MEDIA_TYPE: &str = "application/vnd.pypi.simple.v1+json";

static ANCHOR_TEXT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r">([^<>]+)</a>").expect("valid regex"));

/// Normalize package name according to PEP 503.
///
/// Converts package name to lowercase and replaces underscores/dots with hyphens,
/// then filters out consecutive hyphens.
///
/// # Examples
///
/// ```
/// # use minreqs_pypi::index::normalize_package_name;
/// assert_eq!(normalize_package_name("Flask"), "flask");
/// assert_eq!(normalize_package_name("django_rest_framework"), "django-rest-framework");
/// assert_eq!(normalize_package_name("Pillow.Image"), "pillow-image");
/// assert_eq!(normalize_package_name("my__package"), "my-package");
/// ```
pub fn normalize_package_name(name: &str) -> String {
    name.to_lowercase()
        .replace(&['_', '.'][..], "-")
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[derive(Debug, Deserialize)]
struct SimpleProject {
    #[serde(default)]
    versions: Vec<String>,
    #[serde(default)]
    files: Vec<SimpleFile>,
}

#[derive(Debug, Deserialize)]
struct SimpleFile {
    filename: String,
}

/// Client for a PEP 503/691 simple package index.
///
/// # Examples
///
/// ```no_run
/// # use minreqs_pypi::PypiSimpleIndex;
/// # #[tokio::main]
/// # async fn main() {
/// let index = PypiSimpleIndex::new().unwrap();
///
/// let versions = index.get_versions("requests").await.unwrap();
/// assert!(!versions.is_empty());
/// # }
/// ```
#[derive(Clone)]
pub struct PypiSimpleIndex {
    client: Client,
    index_url: String,
}

impl PypiSimpleIndex {
    /// Creates a client for [`DEFAULT_INDEX_URL`].
    ///
    /// # Errors
    ///
    /// Returns [`PypiError::HttpClient`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        Self::with_index_url(DEFAULT_INDEX_URL)
    }

    /// Creates a client for another simple API root, such as a mirror.
    ///
    /// # Errors
    ///
    /// Returns [`PypiError::HttpClient`] if the HTTP client cannot be built.
    pub fn with_index_url(index_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("min-reqs/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(PypiError::HttpClient)?;

        Ok(Self {
            client,
            index_url: index_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn index_url(&self) -> &str {
        &self.index_url
    }

    /// Project page URL. Names are normalized and URL-encoded.
    pub fn project_url(&self, name: &str) -> String {
        let normalized = normalize_package_name(name);
        format!("{}/{}/", self.index_url, urlencoding::encode(&normalized))
    }

    /// Fetches the stable versions of a package, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - HTTP request fails
    /// - Index answers with a non-success status
    /// - JSON response cannot be parsed
    pub async fn get_versions(&self, name: &str) -> Result<Vec<String>> {
        let url = self.project_url(name);
        tracing::debug!("fetching {}", url);

        let response = self
            .client
            .get(&url)
            .header(
                ACCEPT,
                format!("{}, text/html;q=0.1", SIMPLE_JSON_MEDIA_TYPE),
            )
            .send()
            .await
            .map_err(|e| PypiError::registry_error(name, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PypiError::IndexStatus {
                package: name.to_string(),
                status: status.as_u16(),
            });
        }

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("json"));

        let body = response
            .text()
            .await
            .map_err(|e| PypiError::registry_error(name, e))?;

        let raw = if is_json {
            parse_simple_json(name, &body)?
        } else {
            parse_simple_html(name, &body)
        };

        Ok(stable_versions(raw)
            .iter()
            .map(ToString::to_string)
            .collect())
    }
}

/// Raw version strings from a PEP 691 project response.
///
/// Uses the top-level `versions` list when the index provides one (PEP 700),
/// otherwise derives versions from the file names.
fn parse_simple_json(name: &str, body: &str) -> Result<Vec<String>> {
    let project: SimpleProject =
        serde_json::from_str(body).map_err(|e| PypiError::api_response_error(name, e))?;

    if !project.versions.is_empty() {
        return Ok(project.versions);
    }

    Ok(project
        .files
        .iter()
        .filter_map(|file| version_from_filename(&file.filename, name))
        .collect())
}

/// Raw version strings from a PEP 503 HTML project page.
fn parse_simple_html(name: &str, body: &str) -> Vec<String> {
    ANCHOR_TEXT_RE
        .captures_iter(body)
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| version_from_filename(m.as_str(), name))
        .collect()
}

#[async_trait]
impl VersionProvider for PypiSimpleIndex {
    async fn fetch_versions(&self, package: &str) -> Vec<String> {
        match self.get_versions(package).await {
            Ok(versions) => versions,
            Err(e) => {
                tracing::warn!("failed to fetch available versions for {}: {}", package, e);
                Vec::new()
            }
        }
    }

    fn name(&self) -> &'static str {
        "index"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NUMPY_HTML: &str = r#"<!DOCTYPE html>
<html>
  <body>
    <h1>Links for numpy</h1>
    <a href="https://files.example/numpy-1.3.0.tar.gz#sha256=00">numpy-1.3.0.tar.gz</a><br />
    <a href="https://files.example/numpy-1.3.0-py2.6-win32.egg">numpy-1.3.0-py2.6-win32.egg</a><br />
    <a href="https://files.example/numpy-1.4.1.zip">numpy-1.4.1.zip</a><br />
    <a href="https://files.example/numpy-2.0.0rc1.tar.gz">numpy-2.0.0rc1.tar.gz</a><br />
    <a href="https://files.example/numpy-1.5.0-cp27-none-win32.whl">numpy-1.5.0-cp27-none-win32.whl</a><br />
  </body>
</html>
"#;

    #[test]
    fn test_normalize_package_name() {
        assert_eq!(normalize_package_name("Flask"), "flask");
        assert_eq!(normalize_package_name("zope.interface"), "zope-interface");
        assert_eq!(normalize_package_name("A__B..C"), "a-b-c");
    }

    #[test]
    fn test_project_url_is_normalized_and_encoded() {
        let index = PypiSimpleIndex::with_index_url("https://mirror.example/simple/").unwrap();
        assert_eq!(index.index_url(), "https://mirror.example/simple");
        assert_eq!(
            index.project_url("Django_REST"),
            "https://mirror.example/simple/django-rest/"
        );
        assert_eq!(
            index.project_url("a/b"),
            "https://mirror.example/simple/a%2Fb/"
        );
    }

    #[test]
    fn test_parse_simple_html() {
        let mut versions = parse_simple_html("numpy", NUMPY_HTML);
        versions.sort();
        assert_eq!(
            versions,
            vec!["1.3.0", "1.3.0", "1.4.1", "1.5.0", "2.0.0rc1"]
        );
    }

    #[test]
    fn test_parse_simple_html_installer_only_releases() {
        let body = r#"
    <a href="/f/numpy-1.0.4.win32-py2.5.exe">numpy-1.0.4.win32-py2.5.exe</a>
    <a href="/f/numpy-1.1.0.win32-py2.5.msi">numpy-1.1.0.win32-py2.5.msi</a>
    <a href="/f/numpy-1.2.0-1.i386.rpm">numpy-1.2.0-1.i386.rpm</a>
    <a href="/f/numpy-1.2.1.linux-i686.tar.gz">numpy-1.2.1.linux-i686.tar.gz</a>
"#;
        assert_eq!(
            parse_simple_html("numpy", body),
            vec!["1.0.4", "1.1.0", "1.2.0", "1.2.1"]
        );
    }

    #[test]
    fn test_parse_simple_json_prefers_versions_key() {
        let body = r#"{"name": "numpy", "versions": ["1.3.0", "1.4.1"], "files": []}"#;
        assert_eq!(
            parse_simple_json("numpy", body).unwrap(),
            vec!["1.3.0", "1.4.1"]
        );
    }

    #[test]
    fn test_parse_simple_json_from_files() {
        let body = r#"{
            "name": "numpy",
            "files": [
                {"filename": "numpy-1.3.0.tar.gz", "url": "x", "hashes": {}},
                {"filename": "numpy-1.4.1-cp27-none-win32.whl", "url": "y", "hashes": {}}
            ]
        }"#;
        assert_eq!(
            parse_simple_json("numpy", body).unwrap(),
            vec!["1.3.0", "1.4.1"]
        );
    }

    #[test]
    fn test_parse_simple_json_invalid() {
        let result = parse_simple_json("numpy", "not json");
        assert!(matches!(result, Err(PypiError::ApiResponseError { .. })));
    }

    #[tokio::test]
    async fn test_get_versions_html() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/simple/numpy/")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(NUMPY_HTML)
            .create_async()
            .await;

        let index = PypiSimpleIndex::with_index_url(format!("{}/simple", server.url())).unwrap();
        let versions = index.get_versions("numpy").await.unwrap();

        assert_eq!(versions, vec!["1.5.0", "1.4.1", "1.3.0"]);
    }

    #[tokio::test]
    async fn test_get_versions_json() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/simple/requests/")
            .match_header(
                "accept",
                mockito::Matcher::Regex("application/vnd.pypi.simple.v1\\+json".into()),
            )
            .with_status(200)
            .with_header("content-type", SIMPLE_JSON_MEDIA_TYPE)
            .with_body(r#"{"versions": ["2.0.0", "2.31.0", "3.0.0.dev1"], "files": []}"#)
            .create_async()
            .await;

        let index = PypiSimpleIndex::with_index_url(format!("{}/simple", server.url())).unwrap();
        let versions = index.get_versions("Requests").await.unwrap();

        assert_eq!(versions, vec!["2.31.0", "2.0.0"]);
    }

    #[tokio::test]
    async fn test_get_versions_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/simple/missing/")
            .with_status(404)
            .create_async()
            .await;

        let index = PypiSimpleIndex::with_index_url(format!("{}/simple", server.url())).unwrap();
        let result = index.get_versions("missing").await;

        assert!(matches!(
            result,
            Err(PypiError::IndexStatus { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn test_provider_degrades_to_empty() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/simple/broken/")
            .with_status(500)
            .create_async()
            .await;

        let index = PypiSimpleIndex::with_index_url(format!("{}/simple", server.url())).unwrap();

        assert!(index.fetch_versions("broken").await.is_empty());
        assert_eq!(index.name(), "index");
    }
}
