// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod bytes;
mod formatters;
mod rng;

pub use bytes::*;
pub use formatters::*;
pub use rng::*;
