//! Registers this device with the server, once per session.
//!
//! The first thing a fresh session sends is a `POST /devices` carrying the
//! configured device name; the server needs the device on record before it
//! will fan out update events to it. Registration is offered until it
//! succeeds and never again afterwards.

use serde::{Deserialize, Serialize};

use quill_sync_types::{OutboundRequest, TransportResponse};

use crate::context::SessionContext;
use crate::strategy::{StrategyError, SyncStrategy};

/// Wire payload of `POST /devices` (MessagePack).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRegistration {
    /// Human-readable device name shown in the user's device list.
    pub name: String,
}

/// Sync strategy for one-shot device registration.
#[derive(Debug)]
pub struct DeviceRegistrationStrategy {
    device_name: String,
    registered: bool,
    in_flight: bool,
}

impl DeviceRegistrationStrategy {
    /// Create the strategy for the configured device name.
    pub fn new(device_name: String) -> Self {
        Self {
            device_name,
            registered: false,
            in_flight: false,
        }
    }
}

impl SyncStrategy for DeviceRegistrationStrategy {
    fn name(&self) -> &str {
        "device-registration"
    }

    fn next_request(
        &mut self,
        _ctx: &SessionContext,
    ) -> Result<Option<OutboundRequest>, StrategyError> {
        if self.registered || self.in_flight {
            return Ok(None);
        }

        let payload = DeviceRegistration {
            name: self.device_name.clone(),
        };
        let body = rmp_serde::to_vec(&payload)
            .map_err(|e| StrategyError::Failed(format!("encoding device registration: {}", e)))?;
        self.in_flight = true;
        Ok(Some(OutboundRequest::post("/devices", body)))
    }

    fn did_complete_request(&mut self, response: &TransportResponse, _ctx: &SessionContext) {
        self.in_flight = false;
        if response.is_success() {
            self.registered = true;
        } else {
            // Offered again next tick; the transport owns retry timing.
            tracing::debug!(
                "device registration failed with status {}",
                response.status
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_carries_the_device_name() {
        let ctx = SessionContext::new();
        let mut strategy = DeviceRegistrationStrategy::new("Mel's laptop".into());

        let request = strategy.next_request(&ctx).unwrap().unwrap();

        assert_eq!(request.path, "/devices");
        let payload: DeviceRegistration =
            rmp_serde::from_slice(request.payload.as_deref().unwrap()).unwrap();
        assert_eq!(payload.name, "Mel's laptop");
    }

    #[test]
    fn registers_exactly_once() {
        let ctx = SessionContext::new();
        let mut strategy = DeviceRegistrationStrategy::new("laptop".into());
        strategy.next_request(&ctx).unwrap().unwrap();

        strategy.did_complete_request(&TransportResponse::ok(), &ctx);

        assert!(strategy.next_request(&ctx).unwrap().is_none());
        assert!(strategy.next_request(&ctx).unwrap().is_none());
    }

    #[test]
    fn no_second_request_while_in_flight() {
        let ctx = SessionContext::new();
        let mut strategy = DeviceRegistrationStrategy::new("laptop".into());
        strategy.next_request(&ctx).unwrap().unwrap();

        assert!(strategy.next_request(&ctx).unwrap().is_none());
    }

    #[test]
    fn failed_registration_is_offered_again() {
        let ctx = SessionContext::new();
        let mut strategy = DeviceRegistrationStrategy::new("laptop".into());
        strategy.next_request(&ctx).unwrap().unwrap();

        strategy.did_complete_request(&TransportResponse::error(500), &ctx);

        let retry = strategy.next_request(&ctx).unwrap().unwrap();
        assert_eq!(retry.path, "/devices");
    }
}
