use std::{collections::HashMap, sync::Mutex};
#[cfg(test)]
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{anyhow, Result};
use serde::{de::DeserializeOwned, Serialize};

use super::KeyValueStore;

/// Keeps values as JSON in memory. Values go through serde the same way
/// [JsonFileStore](super::file_store::JsonFileStore) does, so both behave alike.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, serde_json::Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    async fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T> {
        let value = self
            .values
            .lock()
            .map_err(|_| anyhow!("Memory store lock poisoned"))?
            .get(key)
            .cloned();
        match value {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(default),
        }
    }

    async fn update<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.values
            .lock()
            .map_err(|_| anyhow!("Memory store lock poisoned"))?
            .insert(key.to_owned(), value);
        Ok(())
    }

    async fn modify<T, R, F>(&self, key: &str, default: T, change: F) -> Result<R>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut T) -> R,
    {
        let mut values = self
            .values
            .lock()
            .map_err(|_| anyhow!("Memory store lock poisoned"))?;
        let mut value = match values.get(key) {
            Some(value) => serde_json::from_value(value.clone())?,
            None => default,
        };
        let result = change(&mut value);
        values.insert(key.to_owned(), serde_json::to_value(&value)?);
        Ok(result)
    }
}

/// [MemoryStore] that fails reads or writes on demand.
#[cfg(test)]
#[derive(Default)]
pub struct FailingStore {
    inner: MemoryStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

#[cfg(test)]
impl FailingStore {
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check(&self, flag: &AtomicBool, what: &str) -> Result<()> {
        if flag.load(Ordering::SeqCst) {
            Err(anyhow!("Store refused to {what}"))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
impl KeyValueStore for FailingStore {
    async fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T> {
        self.check(&self.fail_reads, "read")?;
        self.inner.get(key, default).await
    }

    async fn update<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.check(&self.fail_writes, "write")?;
        self.inner.update(key, value).await
    }

    async fn modify<T, R, F>(&self, key: &str, default: T, change: F) -> Result<R>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut T) -> R,
    {
        self.check(&self.fail_reads, "read")?;
        self.check(&self.fail_writes, "write")?;
        self.inner.modify(key, default, change).await
    }
}
