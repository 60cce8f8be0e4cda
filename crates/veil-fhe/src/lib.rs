// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod ciphertext;
mod fhe;
mod oracle;
mod utils;

#[cfg(feature = "test-utils")]
pub mod loopback;

pub use ciphertext::*;
pub use fhe::*;
pub use oracle::*;
pub use utils::*;
