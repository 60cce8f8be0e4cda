// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use actix::Message;
use std::fmt::Display;
use std::hash::Hash;

/// Trait that must be implemented by events used with EventBus
pub trait Event:
    Message<Result = ()> + Clone + Display + Send + Sync + Unpin + Sized + 'static
{
    type Id: Hash + Eq + Clone + Unpin + Send + Sync + Display;

    fn event_type(&self) -> String;
    fn event_id(&self) -> Self::Id;
}

/// Trait for events that can carry an error
pub trait ErrorEvent: Event {
    /// Error payload associated with this event
    type Error: Clone + Send + 'static;
    /// Coarse classification of the error's origin
    type ErrorType;

    fn as_error(&self) -> Option<&Self::Error>;
    fn from_error(err_type: Self::ErrorType, error: anyhow::Error) -> Self;
}
