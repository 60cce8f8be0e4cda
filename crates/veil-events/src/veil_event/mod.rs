// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod batch_closed;
mod batch_opened;
mod cooldown_changed;
mod decryption_completed;
mod decryption_requested;
mod ownership_transferred;
mod pause_changed;
mod provider_added;
mod provider_removed;
mod submission_received;
mod test_event;
mod veil_error;

pub use batch_closed::*;
pub use batch_opened::*;
pub use cooldown_changed::*;
pub use decryption_completed::*;
pub use decryption_requested::*;
pub use ownership_transferred::*;
pub use pause_changed::*;
pub use provider_added::*;
pub use provider_removed::*;
pub use submission_received::*;
pub use test_event::*;
pub use veil_error::*;

use crate::{BatchId, ErrorEvent, Event, EventId};
use actix::Message;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to help define From traits for VeilEvent
macro_rules! impl_from_event {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for VeilEvent {
                fn from(data: $variant) -> Self {
                    VeilEvent::$variant {
                        id: EventId::hash(data.clone()),
                        data,
                    }
                }
            }
        )*
    };
}

/// Every observable state change in the coordinator, published on the bus.
#[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rtype(result = "()")]
pub enum VeilEvent {
    BatchOpened {
        id: EventId,
        data: BatchOpened,
    },
    BatchClosed {
        id: EventId,
        data: BatchClosed,
    },
    SubmissionReceived {
        id: EventId,
        data: SubmissionReceived,
    },
    DecryptionRequested {
        id: EventId,
        data: DecryptionRequested,
    },
    DecryptionCompleted {
        id: EventId,
        data: DecryptionCompleted,
    },
    OwnershipTransferred {
        id: EventId,
        data: OwnershipTransferred,
    },
    ProviderAdded {
        id: EventId,
        data: ProviderAdded,
    },
    ProviderRemoved {
        id: EventId,
        data: ProviderRemoved,
    },
    PauseChanged {
        id: EventId,
        data: PauseChanged,
    },
    CooldownChanged {
        id: EventId,
        data: CooldownChanged,
    },
    VeilError {
        id: EventId,
        data: VeilError,
    },
    /// This is a test event to use in testing
    TestEvent {
        id: EventId,
        data: TestEvent,
    },
}

impl VeilEvent {
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }

    pub fn get_id(&self) -> EventId {
        self.clone().into()
    }

    pub fn get_batch_id(&self) -> Option<BatchId> {
        match self.clone() {
            VeilEvent::BatchOpened { data, .. } => Some(data.batch_id),
            VeilEvent::BatchClosed { data, .. } => Some(data.batch_id),
            VeilEvent::SubmissionReceived { data, .. } => Some(data.batch_id),
            VeilEvent::DecryptionRequested { data, .. } => Some(data.batch_id),
            VeilEvent::DecryptionCompleted { data, .. } => Some(data.batch_id),
            _ => None,
        }
    }

    pub fn get_data(&self) -> String {
        match self.clone() {
            VeilEvent::BatchOpened { data, .. } => format!("{}", data),
            VeilEvent::BatchClosed { data, .. } => format!("{}", data),
            VeilEvent::SubmissionReceived { data, .. } => format!("{}", data),
            VeilEvent::DecryptionRequested { data, .. } => format!("{}", data),
            VeilEvent::DecryptionCompleted { data, .. } => format!("{}", data),
            VeilEvent::OwnershipTransferred { data, .. } => format!("{}", data),
            VeilEvent::ProviderAdded { data, .. } => format!("{}", data),
            VeilEvent::ProviderRemoved { data, .. } => format!("{}", data),
            VeilEvent::PauseChanged { data, .. } => format!("{}", data),
            VeilEvent::CooldownChanged { data, .. } => format!("{}", data),
            VeilEvent::VeilError { data, .. } => format!("{:?}", data),
            VeilEvent::TestEvent { data, .. } => format!("{:?}", data),
        }
    }
}

impl Event for VeilEvent {
    type Id = EventId;

    fn event_type(&self) -> String {
        let s = format!("{:?}", self);
        extract_event_name(&s).to_string()
    }

    fn event_id(&self) -> Self::Id {
        self.get_id()
    }
}

impl ErrorEvent for VeilEvent {
    type Error = VeilError;
    type ErrorType = VeilErrorType;

    fn as_error(&self) -> Option<&Self::Error> {
        match self {
            VeilEvent::VeilError { data, .. } => Some(data),
            _ => None,
        }
    }

    fn from_error(err_type: Self::ErrorType, error: anyhow::Error) -> Self {
        VeilEvent::from(VeilError::new(err_type, error.to_string().as_str()))
    }
}

impl From<VeilEvent> for EventId {
    fn from(value: VeilEvent) -> Self {
        match value {
            VeilEvent::BatchOpened { id, .. } => id,
            VeilEvent::BatchClosed { id, .. } => id,
            VeilEvent::SubmissionReceived { id, .. } => id,
            VeilEvent::DecryptionRequested { id, .. } => id,
            VeilEvent::DecryptionCompleted { id, .. } => id,
            VeilEvent::OwnershipTransferred { id, .. } => id,
            VeilEvent::ProviderAdded { id, .. } => id,
            VeilEvent::ProviderRemoved { id, .. } => id,
            VeilEvent::PauseChanged { id, .. } => id,
            VeilEvent::CooldownChanged { id, .. } => id,
            VeilEvent::VeilError { id, .. } => id,
            VeilEvent::TestEvent { id, .. } => id,
        }
    }
}

impl_from_event!(
    BatchOpened,
    BatchClosed,
    SubmissionReceived,
    DecryptionRequested,
    DecryptionCompleted,
    OwnershipTransferred,
    ProviderAdded,
    ProviderRemoved,
    PauseChanged,
    CooldownChanged,
    VeilError,
    TestEvent
);

impl fmt::Display for VeilEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format!("{}({})", self.event_type(), self.get_data()))
    }
}

fn extract_event_name(s: &str) -> &str {
    let bytes = s.as_bytes();
    for (i, &item) in bytes.iter().enumerate() {
        if item == b' ' || item == b'(' || item == b'{' {
            return &s[..i];
        }
    }
    s
}
