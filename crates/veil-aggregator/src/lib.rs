// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod batch;
mod commitment;
mod contexts;
mod coordinator;
mod repo;

pub use batch::*;
pub use commitment::*;
pub use contexts::*;
pub use coordinator::*;
pub use repo::*;
