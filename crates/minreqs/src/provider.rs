use crate::config::Settings;
use crate::error::Result;
use minreqs_core::{CachingProvider, FallbackProvider, VersionProvider};
use minreqs_pypi::{DEFAULT_INDEX_URL, PipIndexVersions, PypiSimpleIndex};
use std::sync::Arc;

/// Builds the version source described by `settings`.
///
/// With `try_pip` the lookup runs `pip index versions` first and falls back
/// to the simple index when pip yields nothing. The result is memoized per
/// package for the lifetime of the returned provider.
///
/// # Errors
///
/// Fails if the HTTP client cannot be constructed.
pub fn build_provider(settings: &Settings) -> Result<Arc<dyn VersionProvider>> {
    let index = PypiSimpleIndex::with_index_url(&settings.index_url)?;

    if !settings.try_pip {
        return Ok(Arc::new(CachingProvider::new(index)));
    }

    let mut pip = PipIndexVersions::new();
    if settings.index_url != DEFAULT_INDEX_URL {
        pip = pip.with_index_url(&settings.index_url);
    }

    Ok(Arc::new(CachingProvider::new(FallbackProvider::new(
        pip, index,
    ))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_provider_names() {
        let provider = build_provider(&Settings::default()).unwrap();
        assert_eq!(provider.name(), "pip");

        let settings = Settings {
            try_pip: false,
            ..Default::default()
        };
        let provider = build_provider(&settings).unwrap();
        assert_eq!(provider.name(), "index");
    }

    #[tokio::test]
    async fn test_index_only_provider_hits_configured_index() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/simple/numpy/")
            .with_status(200)
            .with_header("content-type", "application/vnd.pypi.simple.v1+json")
            .with_body(r#"{"versions": ["1.3.0", "1.4.1"]}"#)
            .expect(1)
            .create_async()
            .await;

        let settings = Settings {
            try_pip: false,
            index_url: format!("{}/simple", server.url()),
            ..Default::default()
        };
        let provider = build_provider(&settings).unwrap();

        assert_eq!(provider.fetch_versions("numpy").await, vec!["1.4.1", "1.3.0"]);
        assert_eq!(provider.fetch_versions("numpy").await, vec!["1.4.1", "1.3.0"]);

        mock.assert_async().await;
    }
}
