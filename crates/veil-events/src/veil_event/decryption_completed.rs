// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{BatchId, RequestId};
use actix::Message;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// The only authoritative publication of plaintext totals for a batch.
#[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rtype(result = "()")]
pub struct DecryptionCompleted {
    pub request_id: RequestId,
    pub batch_id: BatchId,
    pub sentiment: u64,
    pub keyword: u64,
    pub poll_option_one: u64,
    pub poll_option_two: u64,
}

impl Display for DecryptionCompleted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "request_id: {}, batch_id: {}, sentiment: {}, keyword: {}, poll_option_one: {}, poll_option_two: {}",
            self.request_id,
            self.batch_id,
            self.sentiment,
            self.keyword,
            self.poll_option_one,
            self.poll_option_two
        )
    }
}
