// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::DataStore;
use anyhow::Result;
use serde::{de::DeserializeOwned, Serialize};
use std::marker::PhantomData;

/// Typed view over a scoped [`DataStore`] location. One repository reads and
/// writes exactly one `T` at its scope.
#[derive(Debug)]
pub struct Repository<T> {
    store: DataStore,
    _p: PhantomData<T>,
}

impl<T> Repository<T> {
    pub fn new(store: DataStore) -> Self {
        Self {
            store,
            _p: PhantomData,
        }
    }
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _p: PhantomData,
        }
    }
}

impl<T> From<Repository<T>> for DataStore {
    fn from(value: Repository<T>) -> Self {
        value.store
    }
}

impl<T> From<&Repository<T>> for DataStore {
    fn from(value: &Repository<T>) -> Self {
        value.store.clone()
    }
}

impl<T> Repository<T>
where
    T: Serialize + DeserializeOwned,
{
    pub async fn read(&self) -> Result<Option<T>> {
        self.store.read().await
    }

    pub fn write(&self, value: &T) {
        self.store.write(value)
    }

    pub async fn write_sync(&self, value: &T) -> Result<()> {
        self.store.write_sync(value).await
    }

    pub fn clear(&self) {
        self.store.clear()
    }
}
