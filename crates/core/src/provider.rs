//! Provider traits implemented by the host environment.

use std::future::Future;

use chrono::{DateTime, Utc};

/// Result type used by provider trait implementations.
pub type Result<T, E = anyhow::Error> = std::result::Result<T, E>;

/// `StateStore` is the cache bridge that carries launch data between the OIDC
/// preflight leg and the launch leg of an LTI 1.3 flow.
///
/// The contract is write-once per flow under a freshly generated opaque key,
/// read at most a few times before natural expiry; no update-in-place. A
/// `get` miss (expired or never written) is fatal to the current request but
/// recoverable by restarting the launch.
pub trait StateStore: Send + Sync {
    /// Store data by the provided key. The expiry parameter indicates when
    /// the data can be expunged from the store.
    fn put(
        &self, key: &str, data: Vec<u8>, expiry: DateTime<Utc>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Retrieve data using the provided key.
    fn get(&self, key: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Remove data using the key provided.
    fn purge(&self, key: &str) -> impl Future<Output = Result<()>> + Send;
}
