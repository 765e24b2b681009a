//! Rewrites specifiers to their minimum-version pins.

use crate::error::{PypiError, Result};
use crate::resolver::{Pin, resolve_offline, resolve_online};
use crate::specifier::Specifier;
use minreqs_core::VersionProvider;

/// Mode flags for a rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Reason from constraint bounds only; never consult a provider.
    pub offline: bool,
    /// Pin specifiers that carry no version clause at all.
    pub pin_unconstrained: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            offline: false,
            pin_unconstrained: true,
        }
    }
}

/// Rewrites a parsed specifier to a single minimum pin.
///
/// Extras and the marker suffix are carried through untouched. The original
/// text comes back unchanged when the specifier is unconstrained and
/// `pin_unconstrained` is off, or when offline resolution is indeterminate.
///
/// # Errors
///
/// Propagates resolution failures such as
/// [`PypiError::NoSatisfyingVersion`] in online mode.
pub async fn rewrite(
    spec: &Specifier,
    options: ResolveOptions,
    provider: &dyn VersionProvider,
) -> Result<String> {
    if let Some(arbitrary) = spec.arbitrary_equality() {
        let pin = Pin {
            operator: arbitrary.operator,
            version: arbitrary.version.clone(),
        };
        return Ok(spec.with_pin(&pin));
    }

    if spec.constraints().is_empty() && !options.pin_unconstrained {
        return Ok(spec.raw().to_string());
    }

    let pin = if options.offline {
        match resolve_offline(spec.constraints())? {
            Some(pin) => pin,
            None => {
                tracing::debug!("no offline floor for '{}', leaving unchanged", spec.raw());
                return Ok(spec.raw().to_string());
            }
        }
    } else {
        let package = spec.package_name().to_string();
        resolve_online(&package, spec.constraints(), provider).await?
    };

    Ok(spec.with_pin(&pin))
}

/// Replaces the version clauses of `spec` with the minimum compatible pin.
///
/// URL requirements (`name @ url`) come back unchanged.
///
/// # Errors
///
/// - [`PypiError::InvalidSpecifier`] when `spec` cannot be parsed
/// - [`PypiError::NoSatisfyingVersion`] when online resolution finds nothing
///
/// # Examples
///
/// ```
/// use minreqs_core::StaticProvider;
/// use minreqs_pypi::{ResolveOptions, sub_min_compatible_version};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let index = StaticProvider::new().with_package("numpy", ["1.4.1", "1.3.0"]);
///
/// let online = sub_min_compatible_version("numpy>1.3", ResolveOptions::default(), &index)
///     .await
///     .unwrap();
/// assert_eq!(online, "numpy==1.4.1");
///
/// let options = ResolveOptions { offline: true, ..Default::default() };
/// let offline = sub_min_compatible_version("numpy>1.3", options, &index)
///     .await
///     .unwrap();
/// assert_eq!(offline, "numpy>1.3");
/// # }
/// ```
pub async fn sub_min_compatible_version(
    spec: &str,
    options: ResolveOptions,
    provider: &dyn VersionProvider,
) -> Result<String> {
    match Specifier::parse(spec) {
        Ok(parsed) => rewrite(&parsed, options, provider).await,
        Err(PypiError::NotANameRequirement { .. }) => {
            tracing::debug!("'{}' is not a name requirement, leaving unchanged", spec);
            Ok(spec.to_string())
        }
        Err(e) => Err(e),
    }
}

/// Batch rewriter bound to one provider and one set of options.
pub struct Minimizer<P> {
    provider: P,
    options: ResolveOptions,
}

impl<P: VersionProvider> Minimizer<P> {
    pub fn new(provider: P, options: ResolveOptions) -> Self {
        Self { provider, options }
    }

    pub fn options(&self) -> ResolveOptions {
        self.options
    }

    /// Rewrites one specifier.
    pub async fn minimize(&self, spec: &str) -> Result<String> {
        sub_min_compatible_version(spec, self.options, &self.provider).await
    }

    /// Rewrites every specifier, isolating failures.
    ///
    /// A specifier that fails to rewrite is logged and kept as written, so one
    /// bad entry never drops the rest of the batch.
    pub async fn minimize_all<S: AsRef<str>>(&self, specs: &[S]) -> Vec<String> {
        let mut minimized = Vec::with_capacity(specs.len());
        for spec in specs {
            let spec = spec.as_ref();
            match self.minimize(spec).await {
                Ok(rewritten) => minimized.push(rewritten),
                Err(e) => {
                    tracing::warn!("keeping '{}' unchanged: {}", spec, e);
                    minimized.push(spec.to_string());
                }
            }
        }
        minimized
    }

    /// Rewrites every specifier, stopping at the first failure.
    pub async fn try_minimize_all<S: AsRef<str>>(&self, specs: &[S]) -> Result<Vec<String>> {
        let mut minimized = Vec::with_capacity(specs.len());
        for spec in specs {
            minimized.push(self.minimize(spec.as_ref()).await?);
        }
        Ok(minimized)
    }
}
