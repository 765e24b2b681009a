//! Python requirement minimization for min-reqs.
//!
//! Turns PEP 508 dependency specifiers into pins on the lowest version they
//! allow, so a project can be tested against its declared minimum
//! requirements.
//!
//! # Features
//!
//! - **PEP 508 Scanning**: name, extras, version clauses and an opaque marker suffix
//! - **PEP 440 Predicates**: ordering, `~=`, wildcards, epochs, `===`
//! - **Offline Resolution**: floors inferred from constraint bounds alone
//! - **Online Resolution**: lowest published stable version meeting every clause
//! - **Version Providers**: PEP 503/691 simple index client and `pip index versions`
//!
//! # Examples
//!
//! ```
//! use minreqs_core::StaticProvider;
//! use minreqs_pypi::{Minimizer, ResolveOptions};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let index = StaticProvider::new()
//!     .with_package("numpy", ["1.26.4", "1.20.0", "1.3.0"])
//!     .with_package("requests", ["2.31.0", "2.0.0"]);
//!
//! let minimizer = Minimizer::new(index, ResolveOptions::default());
//! let pins = minimizer
//!     .minimize_all(&["numpy[extra]>=1.20; python_version>'3.8'", "requests"])
//!     .await;
//!
//! assert_eq!(
//!     pins,
//!     vec!["numpy[extra]==1.20.0; python_version>'3.8'", "requests==2.0.0"]
//! );
//! # }
//! ```

pub mod error;
pub mod filename;
pub mod index;
pub mod pip;
pub mod resolver;
pub mod rewriter;
pub mod specifier;
pub mod version;

pub use error::{PypiError, Result};
pub use index::{DEFAULT_INDEX_URL, PypiSimpleIndex, normalize_package_name};
pub use pip::PipIndexVersions;
pub use resolver::{Pin, resolve_offline, resolve_online};
pub use rewriter::{Minimizer, ResolveOptions, rewrite, sub_min_compatible_version};
pub use specifier::Specifier;
pub use version::{Operator, VersionConstraint};
