// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

/// Single source of truth for store scopes so two components can never
/// accidentally share a key.
pub struct StoreKeys;

impl StoreKeys {
    pub fn registry() -> String {
        String::from("//registry")
    }

    pub fn ledger() -> String {
        String::from("//ledger")
    }

    pub fn contexts() -> String {
        String::from("//contexts")
    }
}
