// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::RegistryState;
use veil_config::StoreKeys;
use veil_data::{Repositories, Repository};

pub trait RegistryRepositoryFactory {
    fn registry(&self) -> Repository<RegistryState>;
}

impl RegistryRepositoryFactory for Repositories {
    fn registry(&self) -> Repository<RegistryState> {
        Repository::new(self.store.scope(StoreKeys::registry()))
    }
}
