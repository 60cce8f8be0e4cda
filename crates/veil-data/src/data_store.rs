// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::borrow::Cow;

use crate::{Get, InMemStore, Insert, InsertSync, IntoKey, Remove, SledStore};
use actix::{Addr, Recipient};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::error;

#[derive(Clone, Debug)]
pub enum StoreAddr {
    InMem(Addr<InMemStore>),
    Sled(Addr<SledStore>),
}

/// Proxy for the KV store. A DataStore is scopable: deriving a child store
/// with `scope` namespaces every key under the parent's prefix.
#[derive(Clone, Debug)]
pub struct DataStore {
    scope: Vec<u8>,
    addr: StoreAddr,
    get: Recipient<Get>,
    insert: Recipient<Insert>,
    insert_sync: Recipient<InsertSync>,
    remove: Recipient<Remove>,
}

impl DataStore {
    /// Read data at the scope location
    pub async fn read<T>(&self) -> Result<Option<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        let Some(bytes) = self.get.send(Get::new(&self.scope)).await? else {
            return Ok(None);
        };

        Ok(Some(bincode::deserialize(&bytes)?))
    }

    /// Writes data to the scope location
    pub fn write<T: Serialize>(&self, value: T) {
        let Ok(serialized) = bincode::serialize(&value) else {
            let str_key = self.get_scope().unwrap_or(Cow::Borrowed("<bad key>"));
            error!("Could not serialize value passed to {}", str_key);
            return;
        };
        let msg = Insert::new(&self.scope, serialized);
        self.insert.do_send(msg)
    }

    /// Writes data synchronously to the scope location
    pub async fn write_sync<T: Serialize>(&self, value: T) -> Result<()> {
        let serialized = bincode::serialize(&value).with_context(|| {
            let str_key = self.get_scope().unwrap_or(Cow::Borrowed("<bad key>"));
            anyhow!("Could not serialize value passed to {}", str_key)
        })?;

        let msg = InsertSync::new(&self.scope, serialized);
        self.insert_sync.send(msg).await??;
        Ok(())
    }

    /// Removes data from the scope location
    pub fn clear(&self) {
        self.remove.do_send(Remove::new(&self.scope))
    }

    /// Get the scope as a string
    pub fn get_scope(&self) -> Result<Cow<str>> {
        Ok(String::from_utf8_lossy(&self.scope))
    }

    /// Get a reference to the addr enum
    pub fn get_addr(&self) -> &StoreAddr {
        &self.addr
    }

    /// Changes the scope for the data store.
    /// Note that if the scope does not start with a slash one is appended.
    pub fn scope<K: IntoKey>(&self, key: K) -> Self {
        let mut scope = self.scope.clone();
        let encoded_key = key.into_key();
        if !encoded_key.starts_with(&[b'/']) {
            scope.extend("/".into_key());
        }
        scope.extend(encoded_key);
        Self {
            addr: self.addr.clone(),
            get: self.get.clone(),
            insert: self.insert.clone(),
            insert_sync: self.insert_sync.clone(),
            remove: self.remove.clone(),
            scope,
        }
    }

    /// Derive a store whose scope is replaced with the given key.
    pub fn base<K: IntoKey>(&self, key: K) -> Self {
        Self {
            addr: self.addr.clone(),
            get: self.get.clone(),
            insert: self.insert.clone(),
            insert_sync: self.insert_sync.clone(),
            remove: self.remove.clone(),
            scope: key.into_key(),
        }
    }
}

impl From<&Addr<InMemStore>> for DataStore {
    fn from(addr: &Addr<InMemStore>) -> Self {
        Self {
            addr: StoreAddr::InMem(addr.clone()),
            get: addr.clone().recipient(),
            insert: addr.clone().recipient(),
            insert_sync: addr.clone().recipient(),
            remove: addr.clone().recipient(),
            scope: vec![],
        }
    }
}

impl From<&Addr<SledStore>> for DataStore {
    fn from(addr: &Addr<SledStore>) -> Self {
        Self {
            addr: StoreAddr::Sled(addr.clone()),
            get: addr.clone().recipient(),
            insert: addr.clone().recipient(),
            insert_sync: addr.clone().recipient(),
            remove: addr.clone().recipient(),
            scope: vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix::Actor;

    #[actix::test]
    async fn scopes_compose() -> Result<()> {
        let addr = InMemStore::new(false).start();
        let store = DataStore::from(&addr);
        assert_eq!(
            store.base("//foo").scope("bar").scope("/baz").get_scope()?,
            "//foo/bar/baz"
        );
        Ok(())
    }

    #[actix::test]
    async fn scoped_stores_do_not_collide() -> Result<()> {
        let addr = InMemStore::new(false).start();
        let store = DataStore::from(&addr);
        let a = store.scope("a");
        let b = store.scope("b");

        a.write_sync(&1u64).await?;
        b.write_sync(&2u64).await?;

        assert_eq!(a.read::<u64>().await?, Some(1));
        assert_eq!(b.read::<u64>().await?, Some(2));
        Ok(())
    }
}
