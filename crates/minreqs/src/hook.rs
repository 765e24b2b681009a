//! Build-system metadata hook.

use crate::config::{EnvSource, MinReqsOptions, Settings};
use crate::error::Result;
use crate::provider::build_provider;
use minreqs_core::VersionProvider;
use minreqs_pypi::Minimizer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Name under which the hook is registered with the build backend.
pub const PLUGIN_NAME: &str = "min_requirements";

/// The part of the core project metadata the hook reads and writes.
///
/// Unknown fields are kept so the whole metadata document can round-trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default, rename = "optional-dependencies")]
    pub optional_dependencies: BTreeMap<String, Vec<String>>,
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

/// Adds an optional-dependencies group holding every runtime dependency
/// pinned to its minimum version.
pub struct MinRequirementsHook {
    settings: Settings,
    provider: Arc<dyn VersionProvider>,
}

impl MinRequirementsHook {
    /// Creates the hook from its configuration table, falling back to `env`.
    ///
    /// # Errors
    ///
    /// Fails if the version provider cannot be constructed.
    pub fn new(config: &MinReqsOptions, env: &dyn EnvSource) -> Result<Self> {
        let settings = Settings::resolve(config, &MinReqsOptions::default(), env);
        let provider = build_provider(&settings)?;
        Ok(Self::with_provider(settings, provider))
    }

    /// Creates the hook with an explicit version source.
    pub fn with_provider(settings: Settings, provider: Arc<dyn VersionProvider>) -> Self {
        Self { settings, provider }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Computes the minimized dependency list.
    ///
    /// Specifiers that cannot be minimized are kept as written.
    pub async fn minimized(&self, dependencies: &[String]) -> Vec<String> {
        let minimizer = Minimizer::new(
            Arc::clone(&self.provider),
            self.settings.resolve_options(),
        );
        minimizer.minimize_all(dependencies).await
    }

    /// Inserts the configured group into `metadata`, replacing a group of the
    /// same name.
    pub async fn update(&self, metadata: &mut ProjectMetadata) {
        let minimized = self.minimized(&metadata.dependencies).await;
        tracing::debug!(
            "writing {} requirements to optional group '{}'",
            minimized.len(),
            self.settings.group
        );
        metadata
            .optional_dependencies
            .insert(self.settings.group.clone(), minimized);
    }

    /// Runs [`update`](Self::update) on a JSON metadata document.
    ///
    /// # Errors
    ///
    /// Fails if `input` is not a JSON object with the expected field types.
    pub async fn update_json(&self, input: &str) -> Result<String> {
        let mut metadata: ProjectMetadata = serde_json::from_str(input)?;
        self.update(&mut metadata).await;
        Ok(serde_json::to_string_pretty(&metadata)?)
    }
}
