// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use actix::Message;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

#[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rtype(result = "()")]
pub struct VeilError {
    pub err_type: VeilErrorType,
    pub message: String,
}

impl Display for VeilError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Origin of a failure surfaced on the bus.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VeilErrorType {
    Registry,
    Ledger,
    Decryption,
    Data,
}

impl VeilError {
    pub fn new(err_type: VeilErrorType, message: &str) -> Self {
        Self {
            err_type,
            message: message.to_string(),
        }
    }
}
