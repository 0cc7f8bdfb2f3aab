use crate::error::Error;
use anyhow::Result;
use log::warn;
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Small JSON key-value file standing in for browser local storage
pub struct LocalStorage {
    path: PathBuf,
}

impl LocalStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.read_all().await?.remove(key))
    }

    pub async fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut entries = self.read_all().await?;
        entries.insert(key.to_string(), value);
        self.write_all(&entries).await
    }

    pub async fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.read_all().await?;
        if entries.remove(key).is_some() {
            self.write_all(&entries).await?;
        }
        Ok(())
    }

    async fn read_all(&self) -> Result<Map<String, Value>> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(Error::Storage(format!("Failed to read {:?}: {}", self.path, e)).into())
            }
        };

        match serde_json::from_slice::<Value>(&raw) {
            Ok(Value::Object(entries)) => Ok(entries),
            _ => {
                warn!("Ignoring unreadable local storage file {:?}", self.path);
                Ok(Map::new())
            }
        }
    }

    async fn write_all(&self, entries: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::Storage(format!("Failed to create {:?}: {}", parent, e)))?;
        }

        let body = serde_json::to_vec_pretty(entries)
            .map_err(|e| Error::Serialization(format!("Failed to encode local storage: {}", e)))?;

        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, body)
            .await
            .map_err(|e| Error::Storage(format!("Failed to write {:?}: {}", tmp, e)))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| Error::Storage(format!("Failed to replace {:?}: {}", self.path, e)))?;
        Ok(())
    }
}
