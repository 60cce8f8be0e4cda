// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::BatchId;
use actix::Message;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

#[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rtype(result = "()")]
pub struct SubmissionReceived {
    pub batch_id: BatchId,
    pub provider: String,
    /// Submission count after this contribution was applied.
    pub submission_count: u64,
}

impl Display for SubmissionReceived {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "batch_id: {}, provider: {}, submission_count: {}",
            self.batch_id, self.provider, self.submission_count
        )
    }
}
