//! Concrete sync strategies.
//!
//! Each strategy owns one domain's slice of state and implements the
//! [`SyncStrategy`](crate::SyncStrategy) contract. None of them calls
//! another; they coordinate only through the session context and the
//! decoded-event dispatch path.

mod calling;
mod missing_events;
mod registration;
mod self_profile;

pub use calling::CallingStrategy;
pub use missing_events::MissingEventsStrategy;
pub use registration::{DeviceRegistration, DeviceRegistrationStrategy};
pub use self_profile::{SelfProfilePayload, SelfProfileStrategy};
