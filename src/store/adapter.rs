//! Typed adapter over a byte store.
//!
//! Values are encoded with serde_json on the way in and decoded on the way out.

use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};

use super::KeyValueStore;
use crate::error::StoreError;

/// Encodes and decodes values at the store boundary.
#[derive(Clone)]
pub struct StoreAdapter {
    inner: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for StoreAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreAdapter").finish_non_exhaustive()
    }
}

impl StoreAdapter {
    pub fn new(inner: Arc<dyn KeyValueStore>) -> Self {
        Self { inner }
    }

    /// Reads and decodes the value under `key`.
    ///
    /// `Ok(None)` when absent or expired. A payload that does not decode as `T`
    /// is `StoreError::Decode`, never `Ok(None)`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.inner.get(key).await? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| StoreError::Decode(e.to_string())),
            None => Ok(None),
        }
    }

    /// Encodes `value` and writes it under `key` with the given expiry.
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(value).map_err(|e| StoreError::Encode(e.to_string()))?;
        self.inner.set(key, bytes, ttl).await
    }

    pub async fn close(&self) -> Result<(), StoreError> {
        self.inner.close().await
    }
}
