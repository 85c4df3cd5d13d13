//! Storage is organized around a key-value seam, [KeyValueStore]:
//!  - The whole entry list lives under one key, [entry_store::ENTRIES_KEY].
//!  - [entry_store::EntryStore] changes that list through [KeyValueStore::modify], merging
//!    entries by (date, project).
//!  - [file_store::JsonFileStore] keeps every key in its own JSON file, [memory::MemoryStore]
//!    keeps them in memory for embedding hosts and tests.

pub mod entities;
pub mod entry_store;
pub mod file_store;
pub mod memory;

use std::{future::Future, ops::Deref};

use anyhow::Result;
use serde::{de::DeserializeOwned, Serialize};

/// Interface for abstracting persistence of values under string keys.
pub trait KeyValueStore {
    /// Returns the value stored under `key`, or `default` if nothing was stored yet.
    fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> impl Future<Output = Result<T>>;

    /// Replaces the value stored under `key`.
    fn update<T: Serialize>(&self, key: &str, value: &T) -> impl Future<Output = Result<()>>;

    /// Applies `change` to the value stored under `key` (or `default`) and stores the result.
    /// Nobody else can read or write `key` between the read and the write.
    fn modify<T, R, F>(&self, key: &str, default: T, change: F) -> impl Future<Output = Result<R>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut T) -> R;
}

impl<S: Deref> KeyValueStore for S
where
    S::Target: KeyValueStore,
{
    fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> impl Future<Output = Result<T>> {
        self.deref().get(key, default)
    }

    fn update<T: Serialize>(&self, key: &str, value: &T) -> impl Future<Output = Result<()>> {
        self.deref().update(key, value)
    }

    fn modify<T, R, F>(&self, key: &str, default: T, change: F) -> impl Future<Output = Result<R>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut T) -> R,
    {
        self.deref().modify(key, default, change)
    }
}
