use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};

use crate::model::Credentials;

pub const CREDENTIALS_FILE: &str = "credentials.json";

/// Saved servers and their credentials.
///
/// Reads are served from memory; every update is written through to disk
/// when the store is file-backed.
#[derive(Clone)]
pub struct CredentialStore {
    path: Option<PathBuf>,
    cache: Arc<Mutex<Credentials>>,
}

impl CredentialStore {
    pub fn open(dir: &Path) -> Result<Self> {
        let path = dir.join(CREDENTIALS_FILE);
        let creds = if path.exists() {
            let bytes = fs::read(&path).context("read credentials.json")?;
            let creds: Credentials =
                serde_json::from_slice(&bytes).context("parse credentials.json")?;
            if creds.version != 1 {
                anyhow::bail!("unsupported credentials version {}", creds.version);
            }
            creds
        } else {
            Credentials::default()
        };
        Ok(Self {
            path: Some(path),
            cache: Arc::new(Mutex::new(creds)),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            cache: Arc::new(Mutex::new(Credentials::default())),
        }
    }

    pub fn credentials(&self) -> Credentials {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Apply `f` to the cached credentials and persist the result.
    ///
    /// The in-memory copy is updated even if the write fails.
    pub fn update<T>(&self, f: impl FnOnce(&mut Credentials) -> T) -> Result<T> {
        let (out, snapshot) = {
            let mut creds = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
            let out = f(&mut creds);
            (out, creds.clone())
        };
        self.persist(&snapshot)?;
        Ok(out)
    }

    fn persist(&self, creds: &Credentials) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let bytes = serde_json::to_vec_pretty(creds).context("serialize credentials")?;
        write_atomic(path, &bytes).context("write credentials.json")?;
        Ok(())
    }
}

pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("create parent directories")?;
    }
    let tmp = path.with_extension(format!("tmp.{}", std::process::id()));
    fs::write(&tmp, bytes).with_context(|| format!("write temp file {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
