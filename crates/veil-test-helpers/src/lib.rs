// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod scripted_oracle;
mod system;
mod utils;

pub use scripted_oracle::*;
pub use system::*;
pub use utils::*;
