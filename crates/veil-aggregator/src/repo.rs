// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{BatchLedger, DecryptionContexts};
use veil_config::StoreKeys;
use veil_data::{Repositories, Repository};

pub trait LedgerRepositoryFactory {
    fn ledger(&self) -> Repository<BatchLedger>;
}

impl LedgerRepositoryFactory for Repositories {
    fn ledger(&self) -> Repository<BatchLedger> {
        Repository::new(self.store.scope(StoreKeys::ledger()))
    }
}

pub trait ContextsRepositoryFactory {
    fn contexts(&self) -> Repository<DecryptionContexts>;
}

impl ContextsRepositoryFactory for Repositories {
    fn contexts(&self) -> Repository<DecryptionContexts> {
        Repository::new(self.store.scope(StoreKeys::contexts()))
    }
}
