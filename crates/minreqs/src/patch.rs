//! In-place patching of `pyproject.toml`.

use crate::config::{EnvSource, MinReqsOptions, Settings};
use crate::error::{Error, Result};
use crate::hook::{MinRequirementsHook, PLUGIN_NAME};
use crate::provider::build_provider;
use minreqs_core::VersionProvider;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use toml_edit::{Array, DocumentMut, Item, Table, Value};

/// What a patch run wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    pub group: String,
    pub requirements: Vec<String>,
    pub backup: PathBuf,
}

/// Adds the minimized requirements group to the project file at `path`.
///
/// Reads `project.dependencies`, copies the untouched file to `<path>.BAK`,
/// then writes the minimized list into `[project.optional-dependencies]`
/// under the configured group. Everything else in the document, comments
/// and formatting included, is preserved.
///
/// Options are layered as `explicit`, then the project's
/// `[tool.hatch.metadata.hooks.min_requirements]` table, then `env`.
///
/// # Errors
///
/// Fails if the file cannot be read or written, is not valid TOML, or has
/// no usable `[project]` table.
pub async fn patch_pyproject(
    path: &Path,
    explicit: &MinReqsOptions,
    env: &dyn EnvSource,
) -> Result<PatchOutcome> {
    patch_with(path, explicit, env, build_provider).await
}

/// Like [`patch_pyproject`], resolving versions through `provider`.
pub async fn patch_pyproject_with_provider(
    path: &Path,
    explicit: &MinReqsOptions,
    env: &dyn EnvSource,
    provider: Arc<dyn VersionProvider>,
) -> Result<PatchOutcome> {
    patch_with(path, explicit, env, |_| Ok(provider)).await
}

async fn patch_with<F>(
    path: &Path,
    explicit: &MinReqsOptions,
    env: &dyn EnvSource,
    make_provider: F,
) -> Result<PatchOutcome>
where
    F: FnOnce(&Settings) -> Result<Arc<dyn VersionProvider>>,
{
    let content = tokio::fs::read_to_string(path).await?;
    let mut doc: DocumentMut = content.parse().map_err(|e| Error::Toml {
        path: path.to_path_buf(),
        source: e,
    })?;

    let stored = stored_options(&doc);
    let settings = Settings::resolve(explicit, &stored, env);
    let dependencies = project_dependencies(&doc, path)?;

    let provider = make_provider(&settings)?;
    let hook = MinRequirementsHook::with_provider(settings, provider);
    let requirements = hook.minimized(&dependencies).await;
    let group = hook.settings().group.clone();

    let backup = backup_path(path);
    tokio::fs::write(&backup, &content).await?;
    tracing::debug!("backed up {} to {}", path.display(), backup.display());

    insert_group(&mut doc, &group, &requirements)
        .map_err(|message| Error::invalid_structure(path, message))?;
    tokio::fs::write(path, doc.to_string()).await?;

    Ok(PatchOutcome {
        group,
        requirements,
        backup,
    })
}

/// `<path>.BAK` next to the original.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".BAK");
    PathBuf::from(name)
}

/// Options stored in `[tool.hatch.metadata.hooks.min_requirements]`.
fn stored_options(doc: &DocumentMut) -> MinReqsOptions {
    ["tool", "hatch", "metadata", "hooks", PLUGIN_NAME]
        .iter()
        .try_fold(doc.as_item(), |item, key| item.get(key))
        .and_then(Item::as_table_like)
        .map(MinReqsOptions::from_table)
        .unwrap_or_default()
}

fn project_dependencies(doc: &DocumentMut, path: &Path) -> Result<Vec<String>> {
    let project = doc
        .get("project")
        .and_then(Item::as_table_like)
        .ok_or_else(|| Error::invalid_structure(path, "missing [project] table"))?;

    let Some(dependencies) = project.get("dependencies") else {
        tracing::warn!("{} declares no project.dependencies", path.display());
        return Ok(Vec::new());
    };

    let array = dependencies
        .as_array()
        .ok_or_else(|| Error::invalid_structure(path, "project.dependencies is not an array"))?;

    array
        .iter()
        .map(|value| {
            value.as_str().map(str::to_string).ok_or_else(|| {
                Error::invalid_structure(path, "project.dependencies must contain only strings")
            })
        })
        .collect()
}

fn insert_group(
    doc: &mut DocumentMut,
    group: &str,
    requirements: &[String],
) -> std::result::Result<(), String> {
    let optional = doc
        .entry("project")
        .or_insert(Item::Table(Table::new()))
        .as_table_mut()
        .ok_or("[project] must be a table")?
        .entry("optional-dependencies")
        .or_insert(Item::Table(Table::new()))
        .as_table_like_mut()
        .ok_or("project.optional-dependencies must be a table")?;

    let array: Array = requirements.iter().map(String::as_str).collect();
    optional.insert(group, Item::Value(Value::Array(array)));
    Ok(())
}
