//! In-memory provider implementations.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use lti_core::StateStore;
use lti_jose::{Jwks, KeyOps, KeysetResolver, Signer};

use crate::keystore;

/// In-memory state store.
#[derive(Default, Clone, Debug)]
pub struct Store {
    store: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl Store {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, key: &str, data: Vec<u8>, _: DateTime<Utc>) -> anyhow::Result<()> {
        self.store.lock().expect("should lock").insert(key.to_string(), data);
        Ok(())
    }

    pub fn get(&self, key: &str) -> anyhow::Result<Vec<u8>> {
        let Some(data) = self.store.lock().expect("should lock").get(key).cloned() else {
            return Err(anyhow!("state not found for key: {key}"));
        };
        Ok(data)
    }

    pub fn purge(&self, key: &str) -> anyhow::Result<()> {
        self.store.lock().expect("should lock").remove(key);
        Ok(())
    }
}

/// Test provider: in-memory state store, deterministic Platform key, and a
/// stub JWKS resolver serving the test Tool's public key.
#[derive(Clone, Debug)]
pub struct Provider {
    pub state: Store,
    tool_keys: Option<Jwks>,
}

impl Provider {
    #[must_use]
    pub fn new() -> Self {
        let tool_jwk = keystore::tool_signer().public_jwk().expect("tool JWK");
        Self {
            state: Store::new(),
            tool_keys: Some(Jwks { keys: vec![tool_jwk] }),
        }
    }

    /// A provider whose JWKS resolver fails, simulating an unreachable Tool.
    #[must_use]
    pub fn with_unreachable_tool() -> Self {
        Self { state: Store::new(), tool_keys: None }
    }
}

impl Default for Provider {
    fn default() -> Self {
        Self::new()
    }
}

impl lti_1p3::Provider for Provider {}

impl StateStore for Provider {
    async fn put(&self, key: &str, data: Vec<u8>, expiry: DateTime<Utc>) -> anyhow::Result<()> {
        self.state.put(key, data, expiry)
    }

    async fn get(&self, key: &str) -> anyhow::Result<Vec<u8>> {
        self.state.get(key)
    }

    async fn purge(&self, key: &str) -> anyhow::Result<()> {
        self.state.purge(key)
    }
}

impl KeyOps for Provider {
    fn signer(&self) -> anyhow::Result<impl Signer> {
        Ok(keystore::platform_signer())
    }
}

impl KeysetResolver for Provider {
    async fn fetch(&self, url: &str) -> anyhow::Result<Jwks> {
        self.tool_keys.clone().ok_or_else(|| anyhow!("connection refused: {url}"))
    }
}
