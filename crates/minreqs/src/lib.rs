//! Pin a Python project's dependencies to the oldest versions they allow.
//!
//! The library side of the `min-reqs` tool: configuration layering, the
//! build hook that adds a minimized optional-dependencies group to project
//! metadata, and in-place patching of `pyproject.toml`. Specifier parsing
//! and version resolution live in `minreqs-pypi`.

pub mod cli;
pub mod config;
pub mod error;
pub mod hook;
pub mod patch;
pub mod provider;

pub use config::{EnvSource, MinReqsOptions, ProcessEnv, Settings};
pub use error::{Error, Result};
pub use hook::{MinRequirementsHook, ProjectMetadata};
pub use patch::{PatchOutcome, patch_pyproject, patch_pyproject_with_provider};
