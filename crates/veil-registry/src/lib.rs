// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod access;
mod rate_limit;
mod registry;
mod repo;

pub use access::*;
pub use rate_limit::*;
pub use registry::*;
pub use repo::*;
