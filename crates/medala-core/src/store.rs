//! The `EventStore` trait, the keyed persistence boundary.
//!
//! The trait is implemented by storage backends (e.g. `medala-store-sqlite`).
//! Higher layers ([`crate::records::Records`], `medala-api`) depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single key/value pair returned by [`EventStore::get_by_prefix`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
  pub key:   String,
  pub value: Value,
}

/// Abstraction over a namespaced key/value store with prefix scans.
///
/// There are no transactions and no cross-key ordering guarantees:
///
/// - `set` overwrites any prior value under the exact same key and is durable
///   once the future resolves.
/// - `get_by_prefix` returns matching entries in **unspecified order**.
///   Callers that need "most recent first" must sort themselves; see
///   [`crate::records::Records::scan`].
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait EventStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Associate `value` with `key`, replacing any previous value.
  fn set<'a>(
    &'a self,
    key: &'a str,
    value: Value,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Retrieve the value stored under `key`. Returns `None` if absent.
  fn get<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<Value>, Self::Error>> + Send + 'a;

  /// Return every entry whose key starts with `prefix`, in no particular
  /// order.
  fn get_by_prefix<'a>(
    &'a self,
    prefix: &'a str,
  ) -> impl Future<Output = Result<Vec<Entry>, Self::Error>> + Send + 'a;

  /// Remove `key`. Returns `true` if a value was removed.
  fn delete<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;
}
