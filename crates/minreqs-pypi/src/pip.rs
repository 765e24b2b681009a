//! Version lookup through `pip index versions`.

use crate::error::{PypiError, Result};
use async_trait::async_trait;
use minreqs_core::VersionProvider;
use tokio::process::Command;

const AVAILABLE_VERSIONS: &str = "Available versions:";

/// Lists versions by running `pip index versions <package>`.
///
/// Requires pip 21.2 or newer on `PATH`. pip applies its own index
/// configuration unless an index URL is given explicitly.
#[derive(Debug, Clone)]
pub struct PipIndexVersions {
    program: String,
    index_url: Option<String>,
}

impl Default for PipIndexVersions {
    fn default() -> Self {
        Self {
            program: "pip".to_string(),
            index_url: None,
        }
    }
}

impl PipIndexVersions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses another executable, such as `pip3` or an absolute path.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Passes `--index-url` to pip.
    pub fn with_index_url(mut self, index_url: impl Into<String>) -> Self {
        self.index_url = Some(index_url.into());
        self
    }

    /// Runs pip and returns the versions it lists, in pip's order (newest first).
    ///
    /// # Errors
    ///
    /// Returns [`PypiError::PipFailed`] if pip cannot be spawned, exits with a
    /// failure status, or prints no version list.
    pub async fn get_versions(&self, package: &str) -> Result<Vec<String>> {
        let mut command = Command::new(&self.program);
        command.args(["index", "versions", package]);
        if let Some(index_url) = &self.index_url {
            command.args(["--index-url", index_url.as_str()]);
        }

        tracing::debug!("running {} index versions {}", self.program, package);
        let output = command
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| PypiError::pip_failed(package, e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PypiError::pip_failed(
                package,
                format!("{}: {}", output.status, stderr.trim()),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_pip_output(&stdout)
            .ok_or_else(|| PypiError::pip_failed(package, "no version list in pip output"))
    }
}

/// Extracts the comma-separated list following `Available versions:`.
///
/// # Examples
///
/// ```
/// use minreqs_pypi::pip::parse_pip_output;
///
/// let out = "numpy (2.0.0)\nAvailable versions: 2.0.0, 1.26.4, 1.3.0\n";
/// assert_eq!(parse_pip_output(out).unwrap(), vec!["2.0.0", "1.26.4", "1.3.0"]);
/// assert!(parse_pip_output("ERROR: No matching distribution found").is_none());
/// ```
pub fn parse_pip_output(output: &str) -> Option<Vec<String>> {
    let line = output
        .lines()
        .find_map(|line| line.trim().strip_prefix(AVAILABLE_VERSIONS))?;

    Some(
        line.split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(ToString::to_string)
            .collect(),
    )
}

#[async_trait]
impl VersionProvider for PipIndexVersions {
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
        "pip"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pip_output() {
        let out = "\
WARNING: pip index is currently an experimental command.
numpy (2.1.0)
Available versions: 2.1.0, 2.0.0, 1.26.4, 1.4.1, 1.3.0
  INSTALLED: 1.26.4
  LATEST:    2.1.0
";
        assert_eq!(
            parse_pip_output(out).unwrap(),
            vec!["2.1.0", "2.0.0", "1.26.4", "1.4.1", "1.3.0"]
        );
    }

    #[test]
    fn test_parse_pip_output_single_version() {
        assert_eq!(
            parse_pip_output("pkg (0.1)\nAvailable versions: 0.1").unwrap(),
            vec!["0.1"]
        );
    }

    #[test]
    fn test_parse_pip_output_missing_line() {
        assert!(parse_pip_output("").is_none());
        assert!(parse_pip_output("ERROR: No matching distribution found for nope").is_none());
    }

    #[tokio::test]
    async fn test_missing_program_degrades_to_empty() {
        let pip = PipIndexVersions::new().with_program("definitely-not-a-pip-binary");

        let result = pip.get_versions("numpy").await;
        assert!(matches!(result, Err(PypiError::PipFailed { .. })));

        assert!(pip.fetch_versions("numpy").await.is_empty());
        assert_eq!(pip.name(), "pip");
    }
}
