//! Errors raised while parsing, resolving and fetching Python requirements.

use thiserror::Error;

/// Errors specific to PEP 508 specifier handling and PyPI version lookup.
///
/// `NotANameRequirement` is a signal rather than a failure: callers that
/// rewrite specifiers return the input unchanged when they see it.
#[derive(Error, Debug)]
pub enum PypiError {
    /// Input is not a syntactically valid PEP 508 specifier
    #[error("invalid requirement '{specifier}': {message}")]
    InvalidSpecifier { specifier: String, message: String },

    /// Input is a direct URL requirement (`name @ url`)
    #[error("'{specifier}' is a URL requirement, not a name requirement")]
    NotANameRequirement { specifier: String },

    /// Online resolution found no candidate meeting every constraint
    #[error("no available version of '{package}' satisfies '{constraints}'")]
    NoSatisfyingVersion {
        package: String,
        constraints: String,
    },

    /// `~=` used with a single release segment
    #[error("compatible release clause '~={version}' needs at least two release segments")]
    InvalidCompatibleRelease { version: String },

    /// Package index request failed
    #[error("package index request failed for '{package}': {source}")]
    RegistryError {
        package: String,
        #[source]
        source: reqwest::Error,
    },

    /// Package index answered with a non-success status
    #[error("package index returned HTTP {status} for '{package}'")]
    IndexStatus { package: String, status: u16 },

    /// Failed to deserialize a simple API response
    #[error("failed to parse package index response for '{package}': {source}")]
    ApiResponseError {
        package: String,
        #[source]
        source: serde_json::Error,
    },

    /// `pip index versions` could not be run or failed
    #[error("pip index versions failed for '{package}': {message}")]
    PipFailed { package: String, message: String },

    /// HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Result type alias for PyPI operations.
pub type Result<T> = std::result::Result<T, PypiError>;

impl PypiError {
    /// Create an invalid specifier error.
    pub fn invalid_specifier(specifier: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSpecifier {
            specifier: specifier.into(),
            message: message.into(),
        }
    }

    /// Create a registry error for a failed request.
    pub fn registry_error(package: impl Into<String>, source: reqwest::Error) -> Self {
        Self::RegistryError {
            package: package.into(),
            source,
        }
    }

    /// Create an API response error.
    pub fn api_response_error(package: impl Into<String>, error: serde_json::Error) -> Self {
        Self::ApiResponseError {
            package: package.into(),
            source: error,
        }
    }

    /// Create a pip failure error.
    pub fn pip_failed(package: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PipFailed {
            package: package.into(),
            message: message.into(),
        }
    }
}
