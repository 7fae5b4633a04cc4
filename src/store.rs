//! Raw payload snapshots, kept so a bad normalization can be traced back to
//! exactly what the provider sent.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::providers::RawPayload;

#[async_trait]
pub trait PayloadStore: Send + Sync {
    /// Persist a payload, returning a reference to it if one was written.
    async fn put(&self, payload: &RawPayload) -> anyhow::Result<Option<String>>;
}

/// Discards payloads.
pub struct NoopPayloadStore;

#[async_trait]
impl PayloadStore for NoopPayloadStore {
    async fn put(&self, _payload: &RawPayload) -> anyhow::Result<Option<String>> {
        Ok(None)
    }
}

/// Content-addressed payload store on the local filesystem.
pub struct FsPayloadStore {
    root: PathBuf,
}

impl FsPayloadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a `cas:sha256:<hex>` reference to its file path.
    pub fn resolve(&self, payload_ref: &str) -> Option<PathBuf> {
        let hex = payload_ref.strip_prefix("cas:sha256:")?;
        if hex.len() < 4 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        Some(cas_path(&self.root, hex))
    }
}

fn cas_path(root: &Path, hex: &str) -> PathBuf {
    root.join("sha256").join(&hex[0..2]).join(&hex[2..4]).join(hex)
}

#[async_trait]
impl PayloadStore for FsPayloadStore {
    async fn put(&self, payload: &RawPayload) -> anyhow::Result<Option<String>> {
        let hex = hex::encode(Sha256::digest(&payload.body));
        let path = cas_path(&self.root, &hex);
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        if !tokio::fs::try_exists(&path).await? {
            tokio::fs::write(&path, &payload.body).await?;
        }
        Ok(Some(format!("cas:sha256:{hex}")))
    }
}
