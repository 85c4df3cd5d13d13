use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::fs::operations::{modify_locked, read_locked, write_locked};

use super::KeyValueStore;

/// The main realization of [KeyValueStore]. Each key is stored as `<key>.json` inside
/// `store_dir`.
pub struct JsonFileStore {
    store_dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(store_dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&store_dir)?;

        Ok(Self { store_dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.store_dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for JsonFileStore {
    async fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T> {
        let path = self.path_for(key);
        let Some(contents) = read_locked(&path)
            .await
            .with_context(|| format!("Failed to read {path:?}"))?
        else {
            debug!("No value stored for {key}, using default");
            return Ok(default);
        };
        // A file created but never written (e.g. interrupted first write) holds nothing yet.
        if contents.trim().is_empty() {
            return Ok(default);
        }
        serde_json::from_str(&contents).with_context(|| format!("Malformed value in {path:?}"))
    }

    async fn update<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let path = self.path_for(key);
        let buffer = serde_json::to_vec(value)?;
        write_locked(&path, &buffer)
            .await
            .with_context(|| format!("Failed to write {path:?}"))
    }

    async fn modify<T, R, F>(&self, key: &str, default: T, change: F) -> Result<R>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut T) -> R,
    {
        let path = self.path_for(key);
        modify_locked(&path, |contents| {
            let mut value = if contents.trim().is_empty() {
                default
            } else {
                serde_json::from_str(contents)
                    .with_context(|| format!("Malformed value in {path:?}"))?
            };
            let result = change(&mut value);
            Ok((serde_json::to_vec(&value)?, result))
        })
        .await
        .with_context(|| format!("Failed to modify {path:?}"))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use anyhow::Result;
    use tempfile::tempdir;

    use crate::storage::{file_store::JsonFileStore, KeyValueStore};

    #[tokio::test]
    async fn test_get_returns_default_when_absent() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonFileStore::new(dir.path().join("store"))?;
        let value: Vec<u32> = store.get("numbers", vec![7]).await?;
        assert_eq!(value, vec![7]);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_then_get() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonFileStore::new(dir.path().to_owned())?;
        store.update("numbers", &vec![1, 2, 3]).await?;
        let value: Vec<u32> = store.get("numbers", vec![]).await?;
        assert_eq!(value, vec![1, 2, 3]);
        assert!(dir.path().join("numbers.json").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_value_is_an_error() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonFileStore::new(dir.path().to_owned())?;
        fs::write(dir.path().join("numbers.json"), "[1, 2")?;
        let result: Result<Vec<u32>> = store.get("numbers", vec![]).await;
        assert!(result.is_err());
        Ok(())
    }
}
