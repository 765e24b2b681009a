//! Core abstractions for min-reqs.
//!
//! This crate holds the pieces that do not depend on any particular package
//! ecosystem:
//!
//! - **Providers**: the [`VersionProvider`] trait every transport implements,
//!   plus combinators for caching and fallback
//! - **Cache**: [`VersionCache`], the per-process memo of fetched version
//!   lists with a single fetch per package name
//!
//! # Examples
//!
//! ```
//! use minreqs_core::{CachingProvider, StaticProvider, VersionProvider};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let index = StaticProvider::new().with_package("numpy", ["1.4.1", "1.3.0"]);
//! let provider = CachingProvider::new(index);
//!
//! let versions = provider.fetch_versions("numpy").await;
//! assert_eq!(versions, vec!["1.4.1", "1.3.0"]);
//! # }
//! ```

pub mod cache;
pub mod provider;

pub use cache::{VersionCache, VersionList};
pub use provider::{CachingProvider, FallbackProvider, StaticProvider, VersionProvider};
