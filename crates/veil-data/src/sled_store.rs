// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{Get, Insert, InsertSync, Remove, SledDb};
use actix::{Actor, Addr, Handler};
use anyhow::Result;
use std::path::Path;
use tracing::{error, info};

/// Actor wrapper around [`SledDb`]. Fire-and-forget writes log failures;
/// [`InsertSync`] reports them to the caller.
pub struct SledStore {
    db: SledDb,
}

impl Actor for SledStore {
    type Context = actix::Context<Self>;
}

impl SledStore {
    pub fn new(path: &Path) -> Result<Addr<Self>> {
        info!("Starting SledStore with {:?}", path);
        let db = SledDb::new(path, "datastore")?;

        Ok(Self { db }.start())
    }
}

impl Handler<Insert> for SledStore {
    type Result = ();

    fn handle(&mut self, event: Insert, _: &mut Self::Context) -> Self::Result {
        if let Err(err) = self.db.insert(event) {
            error!("{}", err);
        }
    }
}

impl Handler<InsertSync> for SledStore {
    type Result = Result<()>;

    fn handle(&mut self, event: InsertSync, _: &mut Self::Context) -> Self::Result {
        self.db.insert(event.into())
    }
}

impl Handler<Remove> for SledStore {
    type Result = ();

    fn handle(&mut self, event: Remove, _: &mut Self::Context) -> Self::Result {
        if let Err(err) = self.db.remove(event) {
            error!("{}", err);
        }
    }
}

impl Handler<Get> for SledStore {
    type Result = Option<Vec<u8>>;

    fn handle(&mut self, event: Get, _: &mut Self::Context) -> Self::Result {
        match self.db.get(event) {
            Ok(v) => v,
            Err(err) => {
                error!("{}", err);
                None
            }
        }
    }
}
