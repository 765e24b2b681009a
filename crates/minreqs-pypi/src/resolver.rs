//! Minimum version resolution.
//!
//! Two strategies share one result type:
//!
//! - [`resolve_offline`] reasons from the constraint bounds alone and may
//!   give up (`Ok(None)`) when the bounds do not name a concrete floor.
//! - [`resolve_online`] asks a [`VersionProvider`] for the published versions
//!   and picks the lowest one that satisfies every clause.

use crate::error::{PypiError, Result};
use crate::version::{
    CompiledConstraint, Operator, VersionConstraint, display_constraints, stable_versions,
};
use minreqs_core::VersionProvider;
use pep440_rs::Version;
use std::fmt;

/// The final pin written back into a specifier.
///
/// Always `==` except when the source carried `===`, which is echoed as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pin {
    pub operator: Operator,
    pub version: String,
}

impl Pin {
    /// An `==` pin.
    pub fn exact(version: impl Into<String>) -> Self {
        Self {
            operator: Operator::Equal,
            version: version.into(),
        }
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.operator, self.version)
    }
}

/// Compiles every clause, dropping the ones whose targets do not parse.
fn compile_all(constraints: &[VersionConstraint]) -> Result<Vec<CompiledConstraint>> {
    let mut compiled = Vec::with_capacity(constraints.len());
    for constraint in constraints {
        match CompiledConstraint::compile(constraint)? {
            Some(c) => compiled.push(c),
            None => tracing::warn!("skipping unusable version clause '{}'", constraint),
        }
    }
    Ok(compiled)
}

/// Resolves a pin from the constraint bounds alone.
///
/// The first `==` or `===` clause wins outright. Otherwise the greatest
/// `>=`/`~=` target becomes the floor; `<`, `<=` and `>` never override it.
/// A floor excluded by a `!=` clause cannot be pinned without knowing what
/// is published. The floor is echoed using the target text exactly as
/// written.
///
/// Returns `Ok(None)` when no floor can be determined.
///
/// # Errors
///
/// Returns [`PypiError::InvalidCompatibleRelease`] for a single-segment `~=`.
///
/// # Examples
///
/// ```
/// use minreqs_pypi::resolver::resolve_offline;
/// use minreqs_pypi::version::{Operator, VersionConstraint};
///
/// let constraints = [
///     VersionConstraint::new(Operator::GreaterThanEqual, "1.20"),
///     VersionConstraint::new(Operator::TildeEqual, "1.22"),
///     VersionConstraint::new(Operator::LessThan, "2"),
/// ];
/// let pin = resolve_offline(&constraints).unwrap().unwrap();
/// assert_eq!(pin.to_string(), "==1.22");
///
/// let exclusive = [VersionConstraint::new(Operator::GreaterThan, "1.3")];
/// assert!(resolve_offline(&exclusive).unwrap().is_none());
/// ```
pub fn resolve_offline(constraints: &[VersionConstraint]) -> Result<Option<Pin>> {
    if let Some(equality) = constraints.iter().find(|c| c.operator.is_equality()) {
        return Ok(Some(Pin {
            operator: equality.operator,
            version: equality.version.trim().to_string(),
        }));
    }

    let compiled = compile_all(constraints)?;

    let floor = compiled
        .iter()
        .filter(|c| c.operator().is_inclusive_lower_bound())
        .filter_map(|c| c.target().map(|target| (target, c)))
        .max_by(|(a, _), (b, _)| a.cmp(b));

    let Some((floor, source)) = floor else {
        return Ok(None);
    };

    let excluded = compiled
        .iter()
        .filter(|c| c.operator() == Operator::NotEqual)
        .any(|c| !c.contains(floor));
    if excluded {
        tracing::debug!(
            "offline floor {} is excluded by '{}'",
            floor,
            display_constraints(constraints)
        );
        return Ok(None);
    }

    Ok(Some(Pin::exact(source.literal())))
}

/// Lowest version in `available` that satisfies every compiled clause.
///
/// Prereleases never qualify.
pub fn min_satisfying<'a>(
    available: &'a [Version],
    constraints: &[CompiledConstraint],
) -> Option<&'a Version> {
    available
        .iter()
        .filter(|v| !v.any_prerelease())
        .filter(|v| constraints.iter().all(|c| c.contains(v)))
        .min()
}

/// Resolves a pin against the versions `provider` knows for `package`.
///
/// A `===` clause short-circuits without consulting the provider. When the
/// chosen minimum equals a plain `==` target, the target text is echoed so
/// that online and offline runs agree on equality pins.
///
/// # Errors
///
/// - [`PypiError::NoSatisfyingVersion`] when nothing published fits
/// - [`PypiError::InvalidCompatibleRelease`] for a single-segment `~=`
pub async fn resolve_online(
    package: &str,
    constraints: &[VersionConstraint],
    provider: &dyn VersionProvider,
) -> Result<Pin> {
    if let Some(arbitrary) = constraints
        .iter()
        .find(|c| c.operator == Operator::ArbitraryEqual)
    {
        return Ok(Pin {
            operator: Operator::ArbitraryEqual,
            version: arbitrary.version.trim().to_string(),
        });
    }

    let compiled = compile_all(constraints)?;

    let available = stable_versions(provider.fetch_versions(package).await);
    tracing::debug!(
        "{} candidate versions for {} from {}",
        available.len(),
        package,
        provider.name()
    );

    let Some(minimum) = min_satisfying(&available, &compiled) else {
        return Err(PypiError::NoSatisfyingVersion {
            package: package.to_string(),
            constraints: display_constraints(constraints),
        });
    };

    let echoed = compiled.iter().find(|c| {
        c.operator() == Operator::Equal && !c.is_wildcard() && c.target() == Some(minimum)
    });

    Ok(match echoed {
        Some(c) => Pin::exact(c.literal()),
        None => Pin::exact(minimum.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use minreqs_core::StaticProvider;
    use std::str::FromStr;

    fn numpy() -> StaticProvider {
        StaticProvider::new().with_package(
            "numpy",
            [
                "2.0.0", "1.26.4", "1.20.1", "1.20.0", "1.7.1", "1.7.0", "1.5.0", "1.4.1",
                "1.3.0", "2.1.0rc1",
            ],
        )
    }

    fn c(op: Operator, version: &str) -> VersionConstraint {
        VersionConstraint::new(op, version)
    }

    fn offline(constraints: &[VersionConstraint]) -> Option<String> {
        resolve_offline(constraints).unwrap().map(|p| p.to_string())
    }

    #[test]
    fn test_pin_display() {
        assert_eq!(Pin::exact("1.3.0").to_string(), "==1.3.0");
        let pin = Pin {
            operator: Operator::ArbitraryEqual,
            version: "foobar".into(),
        };
        assert_eq!(pin.to_string(), "===foobar");
    }

    #[test]
    fn test_offline_unconstrained() {
        assert_eq!(offline(&[]), None);
    }

    #[test]
    fn test_offline_equality_wins_in_source_order() {
        let constraints = [
            c(Operator::GreaterThanEqual, "1.0"),
            c(Operator::Equal, "1.5"),
            c(Operator::Equal, "1.6"),
        ];
        assert_eq!(offline(&constraints).as_deref(), Some("==1.5"));

        let constraints = [c(Operator::ArbitraryEqual, "foobar"), c(Operator::LessThan, "1")];
        assert_eq!(offline(&constraints).as_deref(), Some("===foobar"));
    }

    #[test]
    fn test_offline_greatest_inclusive_floor_wins() {
        let constraints = [
            c(Operator::GreaterThanEqual, "1.20"),
            c(Operator::GreaterThanEqual, "1.5"),
        ];
        assert_eq!(offline(&constraints).as_deref(), Some("==1.20"));
    }

    #[test]
    fn test_offline_echoes_literal_floor() {
        assert_eq!(
            offline(&[c(Operator::TildeEqual, "1.7")]).as_deref(),
            Some("==1.7")
        );
        assert_eq!(
            offline(&[c(Operator::GreaterThanEqual, "1.5.0")]).as_deref(),
            Some("==1.5.0")
        );
    }

    #[test]
    fn test_offline_without_inclusive_floor() {
        for op in [
            Operator::LessThan,
            Operator::LessThanEqual,
            Operator::GreaterThan,
            Operator::NotEqual,
        ] {
            assert_eq!(offline(&[c(op, "1.3")]), None, "{}", op);
        }
    }

    #[test]
    fn test_offline_floor_with_upper_bound() {
        let constraints = [
            c(Operator::GreaterThanEqual, "1.20"),
            c(Operator::LessThan, "2.0"),
        ];
        assert_eq!(offline(&constraints).as_deref(), Some("==1.20"));
    }

    #[test]
    fn test_offline_excluded_floor_is_indeterminate() {
        let constraints = [
            c(Operator::GreaterThanEqual, "1.5"),
            c(Operator::NotEqual, "1.5.0"),
        ];
        assert_eq!(offline(&constraints), None);

        let constraints = [
            c(Operator::GreaterThanEqual, "1.5"),
            c(Operator::NotEqual, "1.4.*"),
        ];
        assert_eq!(offline(&constraints).as_deref(), Some("==1.5"));
    }

    #[test]
    fn test_offline_floor_ignores_other_bounds() {
        let cases: [(&[VersionConstraint], &str); 3] = [
            (
                &[c(Operator::GreaterThan, "1.5"), c(Operator::GreaterThanEqual, "1.5")],
                "==1.5",
            ),
            (
                &[c(Operator::GreaterThanEqual, "1.20"), c(Operator::LessThan, "1.5")],
                "==1.20",
            ),
            (
                &[c(Operator::GreaterThanEqual, "2.0"), c(Operator::TildeEqual, "1.5")],
                "==2.0",
            ),
        ];
        for (constraints, expected) in cases {
            assert_eq!(
                offline(constraints).as_deref(),
                Some(expected),
                "{}",
                display_constraints(constraints)
            );
        }
    }

    #[test]
    fn test_offline_skips_malformed_floor() {
        let constraints = [
            c(Operator::GreaterThanEqual, "not-a-version"),
            c(Operator::GreaterThanEqual, "1.2"),
        ];
        assert_eq!(offline(&constraints).as_deref(), Some("==1.2"));

        assert_eq!(offline(&[c(Operator::GreaterThanEqual, "nope")]), None);
    }

    #[test]
    fn test_offline_single_segment_compatible_release() {
        let result = resolve_offline(&[c(Operator::TildeEqual, "1")]);
        assert!(matches!(
            result,
            Err(PypiError::InvalidCompatibleRelease { .. })
        ));
    }

    #[test]
    fn test_min_satisfying() {
        let available: Vec<Version> = ["1.3.0", "1.4.1", "2.0.0a1"]
            .iter()
            .map(|v| Version::from_str(v).unwrap())
            .collect();
        let constraints = compile_all(&[c(Operator::NotEqual, "1.3.0")]).unwrap();

        let found = min_satisfying(&available, &constraints).unwrap();
        assert_eq!(found.to_string(), "1.4.1");

        let constraints = compile_all(&[c(Operator::GreaterThan, "1.5")]).unwrap();
        assert!(min_satisfying(&available, &constraints).is_none());
    }

    #[tokio::test]
    async fn test_online_unconstrained_is_lowest() {
        let pin = resolve_online("numpy", &[], &numpy()).await.unwrap();
        assert_eq!(pin.to_string(), "==1.3.0");
    }

    #[tokio::test]
    async fn test_online_constraints() {
        let provider = numpy();
        let cases = [
            (vec![c(Operator::NotEqual, "1.3.6")], "==1.3.0"),
            (vec![c(Operator::NotEqual, "1.3.0")], "==1.4.1"),
            (vec![c(Operator::TildeEqual, "1.7")], "==1.7.0"),
            (vec![c(Operator::GreaterThanEqual, "1.5.0")], "==1.5.0"),
            (vec![c(Operator::GreaterThan, "1.3")], "==1.4.1"),
            (vec![c(Operator::GreaterThan, "1.20")], "==1.20.1"),
            (vec![c(Operator::LessThan, "1.20")], "==1.3.0"),
            (
                vec![c(Operator::LessThan, "1.20"), c(Operator::NotEqual, "1.3")],
                "==1.4.1",
            ),
            (
                vec![
                    c(Operator::GreaterThanEqual, "1.20"),
                    c(Operator::LessThan, "2.0"),
                ],
                "==1.20.0",
            ),
        ];

        for (constraints, expected) in cases {
            let pin = resolve_online("numpy", &constraints, &provider)
                .await
                .unwrap();
            assert_eq!(pin.to_string(), expected, "{:?}", constraints);
        }
    }

    #[tokio::test]
    async fn test_online_never_picks_prerelease() {
        let constraints = [c(Operator::GreaterThan, "2.0.0")];
        let result = resolve_online("numpy", &constraints, &numpy()).await;
        assert!(matches!(
            result,
            Err(PypiError::NoSatisfyingVersion { .. })
        ));
    }

    #[tokio::test]
    async fn test_online_equality_echoes_literal() {
        let constraints = [c(Operator::Equal, "1.5")];
        let pin = resolve_online("numpy", &constraints, &numpy()).await.unwrap();
        assert_eq!(pin.to_string(), "==1.5");
        assert_eq!(resolve_offline(&constraints).unwrap(), Some(pin));
    }

    #[tokio::test]
    async fn test_online_wildcard_equality() {
        let constraints = [c(Operator::Equal, "1.7.*")];
        let pin = resolve_online("numpy", &constraints, &numpy()).await.unwrap();
        assert_eq!(pin.to_string(), "==1.7.0");
    }

    #[tokio::test]
    async fn test_online_arbitrary_equality_skips_provider() {
        let provider = numpy();
        let constraints = [c(Operator::ArbitraryEqual, "custom-build")];

        let pin = resolve_online("numpy", &constraints, &provider)
            .await
            .unwrap();

        assert_eq!(pin.to_string(), "===custom-build");
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_online_no_versions() {
        let result = resolve_online("missing", &[], &numpy()).await;
        match result {
            Err(PypiError::NoSatisfyingVersion { package, .. }) => assert_eq!(package, "missing"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_online_skips_unparsable_clause() {
        let constraints = [
            c(Operator::GreaterThanEqual, "garbage"),
            c(Operator::GreaterThan, "1.4.1"),
        ];
        let pin = resolve_online("numpy", &constraints, &numpy()).await.unwrap();
        assert_eq!(pin.to_string(), "==1.5.0");
    }

    #[tokio::test]
    async fn test_online_single_segment_compatible_release() {
        let result = resolve_online("numpy", &[c(Operator::TildeEqual, "1")], &numpy()).await;
        assert!(matches!(
            result,
            Err(PypiError::InvalidCompatibleRelease { .. })
        ));
    }
}
