// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::{Context, Result};
use sled::Tree;
use std::path::Path;

use crate::{Get, Insert, Remove};

pub struct SledDb {
    db: Tree,
}

impl SledDb {
    pub fn new(path: &Path, tree: &str) -> Result<Self> {
        let db = sled::open(path)
            .with_context(|| format!("Could not open database at {:?}", path))?
            .open_tree(tree)
            .with_context(|| format!("Could not open tree '{}'", tree))?;
        Ok(Self { db })
    }

    pub fn insert(&mut self, msg: Insert) -> Result<()> {
        self.db
            .insert(msg.key(), msg.value().to_vec())
            .context("Could not insert data into db")?;

        Ok(())
    }

    pub fn remove(&mut self, msg: Remove) -> Result<()> {
        self.db
            .remove(msg.key())
            .context("Could not remove data from db")?;
        Ok(())
    }

    pub fn get(&self, event: Get) -> Result<Option<Vec<u8>>> {
        let key = event.key();
        let str_key = String::from_utf8_lossy(key).into_owned();
        let res = self
            .db
            .get(key)
            .context(format!("Failed to fetch {}", str_key))?;

        Ok(res.map(|v| v.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn writes_survive_reopen() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("store.db");

        {
            let mut db = SledDb::new(&path, "datastore")?;
            db.insert(Insert::new(b"key".to_vec(), b"value".to_vec()))?;
        }

        let db = SledDb::new(&path, "datastore")?;
        let got = db.get(Get::new(b"key".to_vec()))?;
        assert_eq!(got, Some(b"value".to_vec()));
        Ok(())
    }

    #[test]
    fn remove_deletes_key() -> Result<()> {
        let dir = tempdir()?;
        let mut db = SledDb::new(&dir.path().join("store.db"), "datastore")?;
        db.insert(Insert::new(b"key".to_vec(), b"value".to_vec()))?;
        db.remove(Remove::new(b"key".to_vec()))?;
        assert_eq!(db.get(Get::new(b"key".to_vec()))?, None);
        Ok(())
    }
}
